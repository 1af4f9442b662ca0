//! Shared dataset fixtures for integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::Arc;

use fit_data::{
    AttrId, AttrRow, CategoryId, EffectId, EffectRow, ExpressionNode, GroupId, Modifier, Source,
    StaticDataHandler, TypeId, TypeRow,
};

/// Raw effect-category ids as the dataset encodes them.
pub const PASSIVE: u32 = 0;
pub const ACTIVE: u32 = 1;
pub const ONLINE: u32 = 4;
pub const OVERLOAD: u32 = 5;

/// Incrementally assembles an in-memory dataset.
pub struct DatasetBuilder {
    handler: StaticDataHandler,
    next_attr: u32,
    next_effect: u32,
    next_type: u32,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            handler: StaticDataHandler::new(),
            next_attr: 1000,
            next_effect: 1000,
            next_type: 1000,
        }
    }

    pub fn attr(&mut self) -> AttrId {
        self.attr_with(true, None)
    }

    pub fn attr_with(&mut self, stackable: bool, default_value: Option<f64>) -> AttrId {
        let id = AttrId(self.next_attr);
        self.next_attr += 1;
        self.handler.put_attr(
            id,
            AttrRow {
                stackable,
                high_is_good: true,
                default_value,
            },
        );
        id
    }

    /// Declares metadata for a well-known attribute id.
    pub fn known_attr(&mut self, id: AttrId, stackable: bool) {
        self.handler.put_attr(
            id,
            AttrRow {
                stackable,
                high_is_good: true,
                default_value: None,
            },
        );
    }

    pub fn effect(&mut self, category: u32, modifiers: &[Modifier]) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        self.handler.put_effect(
            id,
            EffectRow {
                category,
                modifiers: modifiers.to_vec(),
                ..EffectRow::default()
            },
        );
        id
    }

    pub fn effect_row(&mut self, row: EffectRow) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect += 1;
        self.handler.put_effect(id, row);
        id
    }

    pub fn put_expression(&mut self, node: ExpressionNode) {
        self.handler.put_expression(node);
    }

    pub fn item_type(&mut self, attrs: &[(AttrId, f64)], effects: &[EffectId]) -> TypeId {
        self.item_type_full(GroupId(1), attrs, effects, None)
    }

    pub fn item_type_in_group(
        &mut self,
        group: GroupId,
        attrs: &[(AttrId, f64)],
        effects: &[EffectId],
    ) -> TypeId {
        self.item_type_full(group, attrs, effects, None)
    }

    pub fn item_type_full(
        &mut self,
        group: GroupId,
        attrs: &[(AttrId, f64)],
        effects: &[EffectId],
        default_effect: Option<EffectId>,
    ) -> TypeId {
        let id = TypeId(self.next_type);
        self.next_type += 1;
        self.handler.put_type(
            id,
            TypeRow {
                group_id: group,
                category_id: CategoryId(1),
                attrs: attrs.to_vec(),
                effect_ids: effects.to_vec(),
                default_effect_id: default_effect,
                fighter_abilities: Vec::new(),
            },
        );
        id
    }

    pub fn source(self) -> Source {
        Source::new(Arc::new(self.handler))
    }
}

/// Tolerance-based float comparison; chained percent/multiplier math
/// accumulates floating point error.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}",
    );
}
