//! Read-only stat views.
//!
//! Stats are computed purely from modified attribute values at read time;
//! they keep no state of their own beyond what the calculation service
//! already caches. A missing ship or attribute yields `None`, never a zero
//! default; a "used" total with no contributors is legitimately 0.

use fit_data::{defs::attrs, defs::effects, AttrId};

use crate::calc::CalcService;
use crate::item::ItemId;
use crate::store::ItemStore;

/// Consumption versus output of one shared resource.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceUse {
    pub used: f64,
    pub output: Option<f64>,
}

/// Occupancy of one slot class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotUse {
    pub used: usize,
    pub total: Option<f64>,
}

/// Incoming damage split used to weigh resistances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageProfile {
    pub em: f64,
    pub thermal: f64,
    pub kinetic: f64,
    pub explosive: f64,
}

impl DamageProfile {
    /// Equal parts of all four damage kinds.
    pub fn uniform() -> Self {
        Self {
            em: 25.0,
            thermal: 25.0,
            kinetic: 25.0,
            explosive: 25.0,
        }
    }

    fn total(&self) -> f64 {
        self.em + self.thermal + self.kinetic + self.explosive
    }
}

/// Effective hitpoints per tanking layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ehp {
    pub hull: Option<f64>,
    pub armor: Option<f64>,
    pub shield: Option<f64>,
}

impl Ehp {
    /// Sum of the layers that resolved.
    pub fn total(&self) -> Option<f64> {
        let layers = [self.hull, self.armor, self.shield];
        if layers.iter().all(Option::is_none) {
            return None;
        }
        Some(layers.iter().flatten().sum())
    }
}

/// The resonance attributes of one tanking layer: hp, then em/thermal/
/// kinetic/explosive resonance.
struct Layer {
    hp: AttrId,
    resonances: [AttrId; 4],
}

const HULL: Layer = Layer {
    hp: attrs::HP,
    resonances: [
        attrs::EM_DMG_RESONANCE,
        attrs::THERMAL_DMG_RESONANCE,
        attrs::KINETIC_DMG_RESONANCE,
        attrs::EXPLOSIVE_DMG_RESONANCE,
    ],
};
const ARMOR: Layer = Layer {
    hp: attrs::ARMOR_HP,
    resonances: [
        attrs::ARMOR_EM_DMG_RESONANCE,
        attrs::ARMOR_THERMAL_DMG_RESONANCE,
        attrs::ARMOR_KINETIC_DMG_RESONANCE,
        attrs::ARMOR_EXPLOSIVE_DMG_RESONANCE,
    ],
};
const SHIELD: Layer = Layer {
    hp: attrs::SHIELD_CAPACITY,
    resonances: [
        attrs::SHIELD_EM_DMG_RESONANCE,
        attrs::SHIELD_THERMAL_DMG_RESONANCE,
        attrs::SHIELD_KINETIC_DMG_RESONANCE,
        attrs::SHIELD_EXPLOSIVE_DMG_RESONANCE,
    ],
};

/// Read-through stat accessor over one fit.
pub struct StatsView<'a> {
    pub(crate) store: &'a mut ItemStore,
    pub(crate) calc: &'a mut CalcService,
}

impl StatsView<'_> {
    fn attr(&mut self, item: ItemId, attr: AttrId) -> Option<f64> {
        self.calc.attr_value(self.store, item, attr).ok()
    }

    fn ship_attr(&mut self, attr: AttrId) -> Option<f64> {
        let ship = self.store.ship?;
        self.attr(ship, attr)
    }

    /// Sums the modified use attribute over every item whose type declares
    /// it, against the ship's output attribute.
    fn resource(&mut self, use_attr: AttrId, output_attr: AttrId) -> ResourceUse {
        let users: Vec<ItemId> = self
            .store
            .ids()
            .filter(|id| {
                self.store
                    .item_type(*id)
                    .is_some_and(|t| t.attr(use_attr).is_some())
            })
            .collect();
        let mut used = 0.0;
        for user in users {
            if let Some(value) = self.attr(user, use_attr) {
                used += value;
            }
        }
        ResourceUse {
            used,
            output: self.ship_attr(output_attr),
        }
    }

    pub fn cpu(&mut self) -> ResourceUse {
        self.resource(attrs::CPU, attrs::CPU_OUTPUT)
    }

    pub fn powergrid(&mut self) -> ResourceUse {
        self.resource(attrs::POWER, attrs::POWER_OUTPUT)
    }

    pub fn calibration(&mut self) -> ResourceUse {
        self.resource(attrs::UPGRADE_COST, attrs::UPGRADE_CAPACITY)
    }

    pub fn drone_bandwidth(&mut self) -> ResourceUse {
        self.resource(attrs::DRONE_BANDWIDTH_USED, attrs::DRONE_BANDWIDTH)
    }

    pub fn high_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.store.modules_high.len(),
            total: self.ship_attr(attrs::HI_SLOTS),
        }
    }

    pub fn med_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.store.modules_med.len(),
            total: self.ship_attr(attrs::MED_SLOTS),
        }
    }

    pub fn low_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.store.modules_low.len(),
            total: self.ship_attr(attrs::LOW_SLOTS),
        }
    }

    pub fn rig_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.store.rigs.len(),
            total: self.ship_attr(attrs::RIG_SLOTS),
        }
    }

    pub fn subsystem_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.store.subsystems.len(),
            total: self.ship_attr(attrs::MAX_SUBSYSTEMS),
        }
    }

    /// Hardpoint occupancy, counted via the fitting marker effects.
    pub fn turret_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.count_modules_with_effect(effects::TURRET_FITTED),
            total: self.ship_attr(attrs::TURRET_SLOTS_LEFT),
        }
    }

    pub fn launcher_slots(&mut self) -> SlotUse {
        SlotUse {
            used: self.count_modules_with_effect(effects::LAUNCHER_FITTED),
            total: self.ship_attr(attrs::LAUNCHER_SLOTS_LEFT),
        }
    }

    fn count_modules_with_effect(&mut self, effect: fit_data::EffectId) -> usize {
        self.store
            .ids()
            .filter(|id| {
                self.store
                    .item(*id)
                    .is_some_and(|item| item.kind.is_module())
                    && self
                        .store
                        .item_type(*id)
                        .is_some_and(|t| t.has_effect(effect))
            })
            .count()
    }

    /// Ship effective hitpoints against a damage profile.
    pub fn ehp(&mut self, profile: &DamageProfile) -> Ehp {
        Ehp {
            hull: self.layer_ehp(&HULL, profile),
            armor: self.layer_ehp(&ARMOR, profile),
            shield: self.layer_ehp(&SHIELD, profile),
        }
    }

    fn layer_ehp(&mut self, layer: &Layer, profile: &DamageProfile) -> Option<f64> {
        let ship = self.store.ship?;
        let hp = self.attr(ship, layer.hp)?;
        let total = profile.total();
        if total <= 0.0 {
            return None;
        }
        let weights = [profile.em, profile.thermal, profile.kinetic, profile.explosive];
        let mut weighted_resonance = 0.0;
        for (weight, resonance_attr) in weights.iter().zip(layer.resonances) {
            // A layer without a declared resonance takes full damage of
            // that kind.
            let resonance = self.attr(ship, resonance_attr).unwrap_or(1.0);
            weighted_resonance += weight / total * resonance;
        }
        if weighted_resonance <= 0.0 {
            return None;
        }
        Some(hp / weighted_resonance)
    }

    /// Damage of one cycle of the item (or its loaded charge).
    pub fn volley(&mut self, item: ItemId) -> Option<f64> {
        let dmg_item = self
            .store
            .item(item)
            .and_then(|i| i.charge())
            .unwrap_or(item);
        let kinds = [
            attrs::EM_DMG,
            attrs::THERMAL_DMG,
            attrs::KINETIC_DMG,
            attrs::EXPLOSIVE_DMG,
        ];
        let mut dmg = None;
        for kind in kinds {
            if let Some(value) = self.attr(dmg_item, kind) {
                *dmg.get_or_insert(0.0) += value;
            }
        }
        let multiplier = self.attr(item, attrs::DMG_MULTIPLIER).unwrap_or(1.0);
        dmg.map(|d| d * multiplier)
    }

    /// Sustained damage per second, from volley and cycle time.
    pub fn dps(&mut self, item: ItemId) -> Option<f64> {
        let volley = self.volley(item)?;
        let duration_attr = self
            .store
            .item_type(item)?
            .default_effect()?
            .duration_attr_id?;
        let cycle_ms = self.attr(item, duration_attr)?;
        if cycle_ms <= 0.0 {
            return None;
        }
        Some(volley / (cycle_ms / 1000.0))
    }

    /// Number of drones in the fit.
    pub fn drones(&mut self) -> usize {
        self.store.drones.len()
    }
}
