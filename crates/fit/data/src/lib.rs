//! Static dataset model for the fitting engine.
//!
//! This crate owns everything that is immutable per data source: identifier
//! spaces, attribute metadata, item types, effects, the compiled modifier
//! model, the raw expression-node table, the compiler that turns expression
//! trees into modifiers, and the data-source contract with its decoded-object
//! arena.
//!
//! Nothing in here knows about fits or runtime items; the runtime crate
//! consumes these objects by shared reference.

pub mod attr;
pub mod compiler;
pub mod defs;
pub mod effect;
pub mod etype;
pub mod expr;
pub mod modifier;
pub mod source;
pub mod state;

pub use attr::Attribute;
pub use compiler::{CompileError, OperandKind};
pub use defs::{AbilityId, AttrId, CategoryId, EffectId, ExprId, GroupId, TypeId};
pub use effect::{CompiledModifiers, Effect, EffectBuildStatus, EffectRef};
pub use etype::{FighterAbility, ItemType, ItemTypeRef};
pub use expr::{ExpressionLookup, ExpressionNode, FieldValue};
pub use modifier::{ModDomain, ModOperator, Modifier, SkillRef};
pub use source::{AttrRow, DataHandler, EffectRow, Source, SourceError, StaticDataHandler, TypeRow};
pub use state::{EffectCategory, State};
