//! Runtime model of the fitting engine.
//!
//! A [`Fit`] aggregates a ship hull, its attached items and a data source,
//! and answers two questions: what is the modified value of any attribute on
//! any item, and which fitting rules does the current loadout violate.
//!
//! Attribute values react to structural changes through a per-fit message
//! bus: mutations publish typed messages, the calculation service invalidates
//! exactly the affected cache entries, and subsequent reads recompute lazily.
//! The engine is single-threaded and synchronous; every public operation runs
//! to completion before returning.

pub mod calc;
pub mod fit;
pub mod item;
pub mod msg;
pub mod restriction;
pub mod stats;

mod store;

pub use calc::{AttrValueError, ModificationError};
pub use fit::{Fit, FitError, Rack};
pub use item::{Domain, EffectMode, Item, ItemId, ItemKind};
pub use msg::{Message, MessageKind};
pub use restriction::{
    MissingSkill, RestrictionErrorData, RestrictionKind, RestrictionViolation, ValidationError,
};
pub use stats::{DamageProfile, Ehp, ResourceUse, SlotUse, StatsView};
