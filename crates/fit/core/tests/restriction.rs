//! Restriction validation integration tests.

mod common;

use fit_data::{defs::attrs, GroupId, State};
use fit_core::{Fit, Rack, RestrictionErrorData, RestrictionKind};

use common::{DatasetBuilder, ONLINE, PASSIVE};

/// Pulls the violations of one item out of the validation result.
fn violations_of(
    err: &fit_core::ValidationError,
    item: fit_core::ItemId,
) -> Vec<&fit_core::RestrictionViolation> {
    err.items.get(&item).map(|v| v.iter().collect()).unwrap_or_default()
}

#[test]
fn calibration_overuse_taints_all_consumers() {
    let mut d = DatasetBuilder::new();
    let ship_type = d.item_type(&[(attrs::UPGRADE_CAPACITY, 40.0)], &[]);
    let rig_25 = d.item_type(&[(attrs::UPGRADE_COST, 25.0)], &[]);
    let rig_20 = d.item_type(&[(attrs::UPGRADE_COST, 20.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    let a = fit.add_rig(rig_25).unwrap();
    let b = fit.add_rig(rig_20).unwrap();

    let err = fit.validate().unwrap_err();
    for (rig, own_cost) in [(a, 25.0), (b, 20.0)] {
        let violations = violations_of(&err, rig);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, RestrictionKind::Calibration);
        match violations[0].error {
            RestrictionErrorData::Resource {
                total_use,
                output,
                item_use,
            } => {
                assert_eq!(total_use, 45.0);
                assert_eq!(output, 40.0);
                assert_eq!(item_use, own_cost);
            }
            ref other => panic!("unexpected payload {other:?}"),
        }
    }
}

#[test]
fn calibration_at_exact_capacity_passes() {
    let mut d = DatasetBuilder::new();
    let ship_type = d.item_type(&[(attrs::UPGRADE_CAPACITY, 40.0)], &[]);
    let rig_25 = d.item_type(&[(attrs::UPGRADE_COST, 25.0)], &[]);
    let rig_15 = d.item_type(&[(attrs::UPGRADE_COST, 15.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    fit.add_rig(rig_25).unwrap();
    fit.add_rig(rig_15).unwrap();

    assert!(fit.validate().is_ok());
}

#[test]
fn cpu_check_uses_modified_values() {
    let mut d = DatasetBuilder::new();
    d.known_attr(attrs::CPU, true);
    d.known_attr(attrs::CPU_OUTPUT, true);
    let src = d.attr();
    // Online effect halving the module's own cpu need.
    let effect = d.effect(
        ONLINE,
        &[fit_data::Modifier::Item {
            domain: fit_data::ModDomain::Itself,
            tgt_attr_id: attrs::CPU,
            operator: fit_data::ModOperator::PostMul,
            src_attr_id: src,
        }],
    );
    let ship_type = d.item_type(&[(attrs::CPU_OUTPUT, 50.0)], &[]);
    let module_type = d.item_type(&[(attrs::CPU, 80.0), (src, 0.5)], &[effect]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    let module = fit.add_module(Rack::High, module_type).unwrap();

    // Offline: 80 > 50.
    assert!(fit.validate().is_err());

    // Online: halved to 40, fits.
    fit.set_state(module, State::Online).unwrap();
    assert!(fit.validate().is_ok());
}

#[test]
fn charge_size_mismatch_taints_the_charge() {
    let mut d = DatasetBuilder::new();
    let container_type = d.item_type(&[(attrs::CHARGE_SIZE, 3.0)], &[]);
    let wrong_charge = d.item_type(&[(attrs::CHARGE_SIZE, 2.0)], &[]);
    let sizeless_charge = d.item_type(&[], &[]);
    let right_charge = d.item_type(&[(attrs::CHARGE_SIZE, 3.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    let module = fit.add_module(Rack::High, container_type).unwrap();

    let charge = fit.set_charge(module, wrong_charge).unwrap();
    let err = fit.validate().unwrap_err();
    let violations = violations_of(&err, charge);
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].error,
        RestrictionErrorData::ChargeSize {
            size: Some(2.0),
            allowed_size: 3.0,
        }
    );

    fit.remove_item(charge).unwrap();
    let charge = fit.set_charge(module, sizeless_charge).unwrap();
    let err = fit.validate().unwrap_err();
    assert_eq!(
        violations_of(&err, charge)[0].error,
        RestrictionErrorData::ChargeSize {
            size: None,
            allowed_size: 3.0,
        }
    );

    fit.remove_item(charge).unwrap();
    fit.set_charge(module, right_charge).unwrap();
    assert!(fit.validate().is_ok());
}

#[test]
fn unsized_containers_accept_any_charge() {
    let mut d = DatasetBuilder::new();
    let container_type = d.item_type(&[], &[]);
    let charge_type = d.item_type(&[(attrs::CHARGE_SIZE, 2.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    let module = fit.add_module(Rack::High, container_type).unwrap();
    fit.set_charge(module, charge_type).unwrap();

    assert!(fit.validate().is_ok());
}

#[test]
fn group_cap_limits_fitted_modules() {
    let mut d = DatasetBuilder::new();
    let group = GroupId(55);
    let capped = d.item_type_in_group(group, &[(attrs::MAX_GROUP_FITTED, 1.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    let a = fit.add_module(Rack::Med, capped).unwrap();
    let b = fit.add_module(Rack::Med, capped).unwrap();

    let err = fit.validate().unwrap_err();
    for module in [a, b] {
        let violations = violations_of(&err, module);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, RestrictionKind::MaxGroupFitted);
        match violations[0].error {
            RestrictionErrorData::MaxGroup {
                group_id,
                quantity,
                max_allowed,
            } => {
                assert_eq!(group_id, group);
                assert_eq!(quantity, 2);
                assert_eq!(max_allowed, 1.0);
            }
            ref other => panic!("unexpected payload {other:?}"),
        }
    }

    fit.remove_item(b).unwrap();
    assert!(fit.validate().is_ok());
}

#[test]
fn missing_and_undertrained_skills_are_reported() {
    let mut d = DatasetBuilder::new();
    let skill_type = d.item_type(&[], &[]);
    let module_type = d.item_type(
        &[
            (attrs::REQUIRED_SKILL_1, f64::from(skill_type.0)),
            (attrs::REQUIRED_SKILL_1_LEVEL, 3.0),
        ],
        &[],
    );

    let mut fit = Fit::with_source(d.source());
    let module = fit.add_module(Rack::Low, module_type).unwrap();

    // No skill at all.
    let err = fit.validate().unwrap_err();
    match &violations_of(&err, module)[0].error {
        RestrictionErrorData::SkillRequirement { missing } => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].skill_type_id, skill_type);
            assert_eq!(missing[0].required_level, 3);
            assert_eq!(missing[0].fitted_level, None);
        }
        other => panic!("unexpected payload {other:?}"),
    }

    // Undertrained.
    let skill = fit.add_skill(skill_type, 2).unwrap();
    let err = fit.validate().unwrap_err();
    match &violations_of(&err, module)[0].error {
        RestrictionErrorData::SkillRequirement { missing } => {
            assert_eq!(missing[0].fitted_level, Some(2));
        }
        other => panic!("unexpected payload {other:?}"),
    }

    // Trained high enough.
    fit.remove_item(skill).unwrap();
    fit.add_skill(skill_type, 3).unwrap();
    assert!(fit.validate().is_ok());
}

#[test]
fn states_above_the_type_maximum_are_flagged() {
    let mut d = DatasetBuilder::new();
    let passive_effect = d.effect(PASSIVE, &[]);
    let online_effect = d.effect(ONLINE, &[]);
    let passive_only = d.item_type(&[], &[passive_effect]);
    let onlineable = d.item_type(&[], &[online_effect]);

    let mut fit = Fit::with_source(d.source());
    let stuck = fit.add_module(Rack::High, passive_only).unwrap();
    let fine = fit.add_module(Rack::High, onlineable).unwrap();
    fit.set_state(stuck, State::Online).unwrap();
    fit.set_state(fine, State::Online).unwrap();

    let err = fit.validate().unwrap_err();
    assert_eq!(
        violations_of(&err, stuck)[0].error,
        RestrictionErrorData::ItemState {
            state: State::Online,
            max_state: State::Offline,
        }
    );
    assert!(violations_of(&err, fine).is_empty());
}

#[test]
fn contract_violations_fail_fast() {
    let mut d = DatasetBuilder::new();
    let module_type = d.item_type(&[], &[]);
    let charge_type = d.item_type(&[], &[]);
    let skill_type = d.item_type(&[], &[]);

    let mut fit = Fit::with_source(d.source());
    let module = fit.add_module(Rack::High, module_type).unwrap();
    fit.set_charge(module, charge_type).unwrap();

    assert!(matches!(
        fit.set_charge(module, charge_type),
        Err(fit_core::FitError::ChargeAlreadyLoaded(_)),
    ));

    fit.add_skill(skill_type, 5).unwrap();
    assert!(matches!(
        fit.add_skill(skill_type, 5),
        Err(fit_core::FitError::DuplicateSkill(_)),
    ));

    assert!(matches!(
        fit.remove_item(fit_core::ItemId(9999)),
        Err(fit_core::FitError::ItemNotFound(_)),
    ));
}
