//! Runtime items.
//!
//! An item is a mutable runtime instance of a dataset type placed into a fit.
//! Behavioral differences between slot classes are expressed through a closed
//! kind enum plus optional capability fields (loaded charge, trained skill
//! level), not through a type hierarchy.

use std::collections::HashMap;
use std::fmt;

use fit_data::{AttrId, Effect, EffectId, State, TypeId};

/// Fit-scoped identifier of a runtime item.
///
/// Ids are allocated by the fit when the item is created and never reused,
/// so an id uniquely names one placement for the fit's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placement domain of an item, assigned by its slot class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Domain {
    Ship,
    Character,
    /// System-wide items; reserved, nothing in the core places items here.
    Space,
}

/// Slot class of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Ship,
    Character,
    ModuleHigh,
    ModuleMed,
    ModuleLow,
    Rig,
    Subsystem,
    Drone,
    Implant,
    Booster,
    Skill,
    Charge,
}

impl ItemKind {
    pub fn domain(self) -> Domain {
        match self {
            Self::Ship
            | Self::ModuleHigh
            | Self::ModuleMed
            | Self::ModuleLow
            | Self::Rig
            | Self::Subsystem
            | Self::Drone
            | Self::Charge => Domain::Ship,
            Self::Character | Self::Implant | Self::Booster | Self::Skill => Domain::Character,
        }
    }

    pub fn is_module(self) -> bool {
        matches!(self, Self::ModuleHigh | Self::ModuleMed | Self::ModuleLow)
    }

    /// Owner-bound items: launched entities belonging to the character
    /// rather than to a hull slot.
    pub fn is_owner_bound(self) -> bool {
        matches!(self, Self::Drone)
    }
}

/// Per-item override of one effect's run behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectMode {
    /// Follow every rule: state gating plus the side-effect switch.
    #[default]
    FullCompliance,
    /// Follow state gating only; chance-based side effects run too.
    StateCompliance,
    /// Run unconditionally.
    ForceRun,
    /// Never run.
    ForceStop,
}

/// A runtime item.
pub struct Item {
    pub id: ItemId,
    pub type_id: TypeId,
    pub kind: ItemKind,
    state: State,
    effect_modes: HashMap<EffectId, EffectMode>,
    /// Loaded charge (modules only).
    charge: Option<ItemId>,
    /// Containing module (charges only).
    container: Option<ItemId>,
    /// Trained level (skills only).
    skill_level: Option<u32>,
    /// Resolved attribute values, owned by the calculation service.
    pub(crate) cache: HashMap<AttrId, f64>,
}

impl Item {
    pub(crate) fn new(id: ItemId, type_id: TypeId, kind: ItemKind) -> Self {
        Self {
            id,
            type_id,
            kind,
            state: State::Offline,
            effect_modes: HashMap::new(),
            charge: None,
            container: None,
            skill_level: None,
            cache: HashMap::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn effect_mode(&self, effect: EffectId) -> EffectMode {
        self.effect_modes.get(&effect).copied().unwrap_or_default()
    }

    pub(crate) fn set_effect_mode(&mut self, effect: EffectId, mode: EffectMode) {
        if mode == EffectMode::default() {
            self.effect_modes.remove(&effect);
        } else {
            self.effect_modes.insert(effect, mode);
        }
    }

    pub fn charge(&self) -> Option<ItemId> {
        self.charge
    }

    pub(crate) fn set_charge(&mut self, charge: Option<ItemId>) {
        self.charge = charge;
    }

    pub fn container(&self) -> Option<ItemId> {
        self.container
    }

    pub(crate) fn set_container(&mut self, container: Option<ItemId>) {
        self.container = container;
    }

    pub fn skill_level(&self) -> Option<u32> {
        self.skill_level
    }

    pub(crate) fn set_skill_level(&mut self, level: u32) {
        self.skill_level = Some(level);
    }

    /// The item across the container/charge link, whichever way around.
    pub fn other(&self) -> Option<ItemId> {
        self.charge.or(self.container)
    }

    /// Whether an effect currently runs on this item.
    pub fn effect_running(&self, effect: &Effect) -> bool {
        match self.effect_mode(effect.id) {
            EffectMode::ForceStop => false,
            EffectMode::ForceRun => true,
            EffectMode::StateCompliance => self.state >= effect.activation_state(),
            EffectMode::FullCompliance => {
                self.state >= effect.activation_state() && !effect.is_side_effect()
            }
        }
    }
}
