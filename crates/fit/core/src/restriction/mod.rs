//! Fitting-legality restrictions.
//!
//! Each restriction is an independent register subscribed to the fit's
//! message bus, maintaining the minimal membership set it needs, and
//! validating purely from already-computed attribute values. Violations are
//! a deliberate result type, fully expected in normal use; they are never
//! logged as errors.

mod charge_size;
mod max_group;
mod resource;
mod skill;
mod state;

use std::collections::HashMap;

use fit_data::{defs::attrs, GroupId, State, TypeId};

use crate::calc::CalcService;
use crate::item::ItemId;
use crate::msg::{Message, MessageKind};
use crate::store::ItemStore;

use charge_size::ChargeSizeRegister;
use max_group::MaxGroupRegister;
use resource::ResourceRegister;
use skill::SkillRegister;
use state::StateRegister;

/// Identifies one restriction rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestrictionKind {
    Cpu,
    PowerGrid,
    Calibration,
    DroneBandwidth,
    ChargeSize,
    MaxGroupFitted,
    SkillRequirement,
    ItemState,
}

/// A skill a type requires but the fit lacks or undertrains.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MissingSkill {
    pub skill_type_id: TypeId,
    pub required_level: u32,
    pub fitted_level: Option<u32>,
}

/// Rule-specific violation payload.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestrictionErrorData {
    /// Resource consumers collectively exceed the ship's output.
    Resource {
        total_use: f64,
        output: f64,
        item_use: f64,
    },
    /// Loaded charge size does not match the container's declared size.
    ChargeSize {
        size: Option<f64>,
        allowed_size: f64,
    },
    /// More items of the group fitted than the item's type allows.
    MaxGroup {
        group_id: GroupId,
        quantity: usize,
        max_allowed: f64,
    },
    /// Required skills absent or undertrained.
    SkillRequirement { missing: Vec<MissingSkill> },
    /// Item state above what its type's effects permit.
    ItemState { state: State, max_state: State },
}

/// One violation found during validation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionViolation {
    pub kind: RestrictionKind,
    pub error: RestrictionErrorData,
}

/// Aggregate validation failure: every tainted item with its violations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{} item(s) violate fitting restrictions", .items.len())]
pub struct ValidationError {
    pub items: HashMap<ItemId, Vec<RestrictionViolation>>,
}

/// The closed set of restriction registers of one fit.
pub(crate) struct RestrictionTracker {
    registers: Vec<Register>,
}

/// Closed register variant; validation and message handling dispatch over
/// this tag exhaustively.
enum Register {
    Resource(ResourceRegister),
    ChargeSize(ChargeSizeRegister),
    MaxGroup(MaxGroupRegister),
    Skill(SkillRegister),
    State(StateRegister),
}

impl Register {
    fn kind(&self) -> RestrictionKind {
        match self {
            Self::Resource(r) => r.kind,
            Self::ChargeSize(_) => RestrictionKind::ChargeSize,
            Self::MaxGroup(_) => RestrictionKind::MaxGroupFitted,
            Self::Skill(_) => RestrictionKind::SkillRequirement,
            Self::State(_) => RestrictionKind::ItemState,
        }
    }

    fn notify(&mut self, store: &ItemStore, msg: &Message) {
        match self {
            Self::Resource(r) => r.notify(store, msg),
            Self::ChargeSize(r) => r.notify(store, msg),
            Self::MaxGroup(r) => r.notify(store, msg),
            Self::Skill(r) => r.notify(store, msg),
            Self::State(r) => r.notify(store, msg),
        }
    }

    fn validate(
        &self,
        store: &mut ItemStore,
        calc: &mut CalcService,
    ) -> HashMap<ItemId, RestrictionErrorData> {
        match self {
            Self::Resource(r) => r.validate(store, calc),
            Self::ChargeSize(r) => r.validate(store),
            Self::MaxGroup(r) => r.validate(store, calc),
            Self::Skill(r) => r.validate(store),
            Self::State(r) => r.validate(store),
        }
    }

    fn references(&self, item: ItemId) -> bool {
        match self {
            Self::Resource(r) => r.references(item),
            Self::ChargeSize(r) => r.references(item),
            Self::MaxGroup(r) => r.references(item),
            Self::Skill(r) => r.references(item),
            Self::State(r) => r.references(item),
        }
    }
}

/// Membership maintenance interests shared by all registers.
pub(crate) const INTERESTS: &[MessageKind] = &[
    MessageKind::ItemAdded,
    MessageKind::ItemRemoved,
    MessageKind::SourceChanged,
];

impl RestrictionTracker {
    pub fn new() -> Self {
        Self {
            registers: vec![
                Register::Resource(ResourceRegister::new(
                    RestrictionKind::Cpu,
                    attrs::CPU_OUTPUT,
                    attrs::CPU,
                )),
                Register::Resource(ResourceRegister::new(
                    RestrictionKind::PowerGrid,
                    attrs::POWER_OUTPUT,
                    attrs::POWER,
                )),
                Register::Resource(ResourceRegister::new(
                    RestrictionKind::Calibration,
                    attrs::UPGRADE_CAPACITY,
                    attrs::UPGRADE_COST,
                )),
                Register::Resource(ResourceRegister::new(
                    RestrictionKind::DroneBandwidth,
                    attrs::DRONE_BANDWIDTH,
                    attrs::DRONE_BANDWIDTH_USED,
                )),
                Register::ChargeSize(ChargeSizeRegister::new()),
                Register::MaxGroup(MaxGroupRegister::new()),
                Register::Skill(SkillRegister::new()),
                Register::State(StateRegister::new()),
            ],
        }
    }

    /// Register kinds in subscription order.
    pub fn kinds(&self) -> Vec<RestrictionKind> {
        self.registers.iter().map(Register::kind).collect()
    }

    pub fn notify(&mut self, kind: RestrictionKind, store: &ItemStore, msg: &Message) {
        for register in &mut self.registers {
            if register.kind() == kind {
                register.notify(store, msg);
            }
        }
    }

    /// Runs every register, aggregating tainted items across rules.
    pub fn validate(
        &self,
        store: &mut ItemStore,
        calc: &mut CalcService,
    ) -> Result<(), ValidationError> {
        let mut items: HashMap<ItemId, Vec<RestrictionViolation>> = HashMap::new();
        for register in &self.registers {
            for (item, error) in register.validate(store, calc) {
                items.entry(item).or_default().push(RestrictionViolation {
                    kind: register.kind(),
                    error,
                });
            }
        }
        if items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { items })
        }
    }

    /// True when no register membership references the item.
    pub fn references(&self, item: ItemId) -> bool {
        self.registers.iter().any(|r| r.references(item))
    }
}
