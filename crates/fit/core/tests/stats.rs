//! Stat view integration tests.

mod common;

use fit_data::{defs::attrs, EffectRow, ModDomain, ModOperator, Modifier, State};
use fit_core::{DamageProfile, Fit, Rack};

use common::{assert_close, DatasetBuilder, ONLINE};

#[test]
fn cpu_output_follows_module_effects_end_to_end() {
    let mut d = DatasetBuilder::new();
    d.known_attr(attrs::CPU_OUTPUT, true);
    let src = d.attr();
    let effect = d.effect(
        ONLINE,
        &[Modifier::Item {
            domain: ModDomain::Ship,
            tgt_attr_id: attrs::CPU_OUTPUT,
            operator: ModOperator::PostMul,
            src_attr_id: src,
        }],
    );
    let ship_type = d.item_type(&[(attrs::CPU_OUTPUT, 200.0)], &[]);
    let module_type = d.item_type(&[(src, 2.0)], &[effect]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    let module = fit.add_module(Rack::High, module_type).unwrap();
    fit.set_state(module, State::Online).unwrap();

    assert_eq!(fit.stats().cpu().output, Some(400.0));

    fit.remove_item(module).unwrap();
    assert_eq!(fit.stats().cpu().output, Some(200.0));
}

#[test]
fn resource_used_sums_modified_consumer_values() {
    let mut d = DatasetBuilder::new();
    d.known_attr(attrs::CPU, true);
    d.known_attr(attrs::CPU_OUTPUT, true);
    let ship_type = d.item_type(&[(attrs::CPU_OUTPUT, 100.0)], &[]);
    let module_a = d.item_type(&[(attrs::CPU, 25.0)], &[]);
    let module_b = d.item_type(&[(attrs::CPU, 10.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    fit.add_module(Rack::High, module_a).unwrap();
    fit.add_module(Rack::Med, module_b).unwrap();

    let cpu = fit.stats().cpu();
    assert_close(cpu.used, 35.0);
    assert_eq!(cpu.output, Some(100.0));
}

#[test]
fn missing_ship_yields_none_not_zero() {
    let mut d = DatasetBuilder::new();
    let module_type = d.item_type(&[(attrs::CPU, 25.0)], &[]);

    let mut fit = Fit::with_source(d.source());
    fit.add_module(Rack::High, module_type).unwrap();

    let cpu = fit.stats().cpu();
    assert_eq!(cpu.output, None);
    assert_close(cpu.used, 25.0);

    // No consumers at all: used is legitimately zero.
    assert_close(fit.stats().calibration().used, 0.0);
    assert_eq!(fit.stats().calibration().output, None);
}

#[test]
fn slot_counts_track_racks() {
    let mut d = DatasetBuilder::new();
    let ship_type = d.item_type(
        &[
            (attrs::HI_SLOTS, 8.0),
            (attrs::MED_SLOTS, 5.0),
            (attrs::RIG_SLOTS, 3.0),
        ],
        &[],
    );
    let module_type = d.item_type(&[], &[]);
    let rig_type = d.item_type(&[], &[]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();
    fit.add_module(Rack::High, module_type).unwrap();
    fit.add_module(Rack::High, module_type).unwrap();
    fit.add_module(Rack::Med, module_type).unwrap();
    fit.add_rig(rig_type).unwrap();

    let high = fit.stats().high_slots();
    assert_eq!((high.used, high.total), (2, Some(8.0)));
    let med = fit.stats().med_slots();
    assert_eq!((med.used, med.total), (1, Some(5.0)));
    // The hull declares no low-slot attribute: total is unknown, not zero.
    let low = fit.stats().low_slots();
    assert_eq!((low.used, low.total), (0, None));
    let rigs = fit.stats().rig_slots();
    assert_eq!((rigs.used, rigs.total), (1, Some(3.0)));
}

#[test]
fn ehp_weighs_resonances_against_the_profile() {
    let mut d = DatasetBuilder::new();
    let mut ship_attrs = vec![
        (attrs::HP, 100.0),
        (attrs::ARMOR_HP, 200.0),
        (attrs::SHIELD_CAPACITY, 300.0),
    ];
    // Armor resists half of everything; hull and shield resist nothing
    // (resonance defaults to 1).
    for resonance in [
        attrs::ARMOR_EM_DMG_RESONANCE,
        attrs::ARMOR_THERMAL_DMG_RESONANCE,
        attrs::ARMOR_KINETIC_DMG_RESONANCE,
        attrs::ARMOR_EXPLOSIVE_DMG_RESONANCE,
    ] {
        ship_attrs.push((resonance, 0.5));
    }
    let ship_type = d.item_type(&ship_attrs, &[]);

    let mut fit = Fit::with_source(d.source());
    fit.set_ship(ship_type).unwrap();

    let ehp = fit.stats().ehp(&DamageProfile::uniform());
    assert_close(ehp.hull.unwrap(), 100.0);
    assert_close(ehp.armor.unwrap(), 400.0);
    assert_close(ehp.shield.unwrap(), 300.0);
    assert_close(ehp.total().unwrap(), 800.0);
}

#[test]
fn ehp_without_a_ship_is_unknown() {
    let d = DatasetBuilder::new();
    let mut fit = Fit::with_source(d.source());
    let ehp = fit.stats().ehp(&DamageProfile::uniform());
    assert_eq!(ehp.total(), None);
}

#[test]
fn volley_and_dps_come_from_the_loaded_charge() {
    let mut d = DatasetBuilder::new();
    let duration = d.attr();
    let cycle_effect = d.effect_row(EffectRow {
        category: common::ACTIVE,
        duration_attr_id: Some(duration),
        ..EffectRow::default()
    });
    let launcher_type = {
        let attrs_list = [(attrs::DMG_MULTIPLIER, 2.0), (duration, 5000.0)];
        d.item_type_full(
            fit_data::GroupId(1),
            &attrs_list,
            &[cycle_effect],
            Some(cycle_effect),
        )
    };
    let charge_type = d.item_type(
        &[
            (attrs::EM_DMG, 5.0),
            (attrs::THERMAL_DMG, 5.0),
            (attrs::KINETIC_DMG, 5.0),
            (attrs::EXPLOSIVE_DMG, 5.0),
        ],
        &[],
    );

    let mut fit = Fit::with_source(d.source());
    let launcher = fit.add_module(Rack::High, launcher_type).unwrap();
    fit.set_charge(launcher, charge_type).unwrap();

    assert_close(fit.stats().volley(launcher).unwrap(), 40.0);
    assert_close(fit.stats().dps(launcher).unwrap(), 8.0);
}

#[test]
fn volley_is_unknown_without_damage_attributes() {
    let mut d = DatasetBuilder::new();
    let module_type = d.item_type(&[], &[]);

    let mut fit = Fit::with_source(d.source());
    let module = fit.add_module(Rack::High, module_type).unwrap();

    assert_eq!(fit.stats().volley(module), None);
    assert_eq!(fit.stats().dps(module), None);
}
