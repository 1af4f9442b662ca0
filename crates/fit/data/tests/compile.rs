//! End-to-end compilation through a data source.

use std::sync::Arc;

use fit_data::{
    AttrId, EffectBuildStatus, EffectId, EffectRow, ExprId, ExpressionNode, FieldValue,
    ModDomain, ModOperator, Modifier, Source, StaticDataHandler,
};

fn node(id: u32) -> ExpressionNode {
    ExpressionNode::new(ExprId(id))
}

fn leaf(id: u32, operand: u32) -> ExpressionNode {
    let mut n = node(id);
    n.operand = Some(FieldValue::Int(i64::from(operand)));
    n
}

fn join(id: u32, operand: u32, arg1: u32, arg2: u32) -> ExpressionNode {
    let mut n = leaf(id, operand);
    n.arg1 = Some(ExprId(arg1));
    n.arg2 = Some(ExprId(arg2));
    n
}

/// One valid add/remove item-modifier pair rooted at expressions 7 and 8.
fn seed_item_modifier(handler: &mut StaticDataHandler) {
    let mut domain = leaf(1, 24);
    domain.value = Some(FieldValue::from("Ship"));
    let mut tgt_attr = leaf(2, 22);
    tgt_attr.attr_id = Some(FieldValue::Int(9));
    let mut optr = leaf(3, 21);
    optr.value = Some(FieldValue::from("PostPercent"));
    let mut src_attr = leaf(4, 22);
    // Dumps routinely encode ids as strings.
    src_attr.attr_id = Some(FieldValue::from("327"));
    let tgt_spec = join(5, 12, 1, 2);
    let optr_tgt = join(6, 31, 3, 5);
    let add = join(7, 6, 6, 4);
    let rm = join(8, 58, 6, 4);
    for n in [domain, tgt_attr, optr, src_attr, tgt_spec, optr_tgt, add, rm] {
        handler.put_expression(n);
    }
}

fn effect_row(pre: u32, post: u32) -> EffectRow {
    EffectRow {
        category: 0,
        pre_expression: Some(ExprId(pre)),
        post_expression: Some(ExprId(post)),
        ..EffectRow::default()
    }
}

#[test]
fn modifiers_compile_lazily_and_once() {
    let mut handler = StaticDataHandler::new();
    seed_item_modifier(&mut handler);
    handler.put_effect(EffectId(1), effect_row(7, 8));
    let source = Source::new(Arc::new(handler));

    let effect = source.effect(EffectId(1)).unwrap();
    assert_eq!(effect.build_status(), None, "compiled before first access");

    let compiled = effect.modifiers(&source);
    assert_eq!(compiled.status, EffectBuildStatus::Success);
    assert_eq!(
        compiled.modifiers,
        vec![Modifier::Item {
            domain: ModDomain::Ship,
            tgt_attr_id: AttrId(9),
            operator: ModOperator::PostPercent,
            src_attr_id: AttrId(327),
        }]
    );
    assert_eq!(effect.build_status(), Some(EffectBuildStatus::Success));

    // Second access returns the same compiled list by reference.
    let again = effect.modifiers(&source);
    assert!(std::ptr::eq(compiled, again));
}

#[test]
fn effects_without_expressions_have_no_modifiers() {
    let mut handler = StaticDataHandler::new();
    handler.put_effect(
        EffectId(2),
        EffectRow {
            category: 4,
            ..EffectRow::default()
        },
    );
    let source = Source::new(Arc::new(handler));

    let effect = source.effect(EffectId(2)).unwrap();
    let compiled = effect.modifiers(&source);
    assert_eq!(compiled.status, EffectBuildStatus::Success);
    assert!(compiled.modifiers.is_empty());
}

#[test]
fn spliced_garbage_degrades_to_partial_success() {
    let mut handler = StaticDataHandler::new();
    seed_item_modifier(&mut handler);
    // Branch 20 reuses a definition operand as a statement: invalid.
    handler.put_expression(join(20, 26, 6, 4));
    handler.put_expression(join(21, 17, 20, 7));
    handler.put_expression(join(22, 17, 20, 8));
    handler.put_effect(EffectId(3), effect_row(21, 22));
    let source = Source::new(Arc::new(handler));

    let effect = source.effect(EffectId(3)).unwrap();
    let compiled = effect.modifiers(&source);
    assert_eq!(compiled.status, EffectBuildStatus::SuccessPartial);
    assert_eq!(compiled.modifiers.len(), 1);
}

#[test]
fn unsupported_root_is_a_hard_failure() {
    let mut handler = StaticDataHandler::new();
    seed_item_modifier(&mut handler);
    handler.put_expression(join(30, 26, 6, 4));
    handler.put_effect(EffectId(4), effect_row(30, 8));
    let source = Source::new(Arc::new(handler));

    let effect = source.effect(EffectId(4)).unwrap();
    let compiled = effect.modifiers(&source);
    assert_eq!(compiled.status, EffectBuildStatus::Error);
    assert!(compiled.modifiers.is_empty());
}

#[test]
fn dangling_expression_reference_fails_that_effect_only() {
    let mut handler = StaticDataHandler::new();
    seed_item_modifier(&mut handler);
    handler.put_effect(EffectId(5), effect_row(999, 8));
    handler.put_effect(EffectId(6), effect_row(7, 8));
    let source = Source::new(Arc::new(handler));

    let broken = source.effect(EffectId(5)).unwrap();
    assert_eq!(
        broken.modifiers(&source).status,
        EffectBuildStatus::Error
    );

    let healthy = source.effect(EffectId(6)).unwrap();
    assert_eq!(
        healthy.modifiers(&source).status,
        EffectBuildStatus::Success
    );
}
