//! Effects: named bundles of modifiers plus activation metadata.

use std::sync::{Arc, OnceLock};

use crate::compiler;
use crate::defs::{AttrId, EffectId, ExprId};
use crate::expr::ExpressionLookup;
use crate::modifier::Modifier;
use crate::state::{EffectCategory, State};

/// Outcome of compiling one effect's expression trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectBuildStatus {
    /// Every statement compiled.
    Success,
    /// Some statements failed but at least one modifier was extracted.
    SuccessPartial,
    /// Nothing usable came out of the trees.
    Error,
}

/// Compiled modifier list of an effect, with its build status.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompiledModifiers {
    pub modifiers: Vec<Modifier>,
    pub status: EffectBuildStatus,
}

impl CompiledModifiers {
    pub fn empty(status: EffectBuildStatus) -> Self {
        Self {
            modifiers: Vec::new(),
            status,
        }
    }
}

/// Immutable effect metadata.
///
/// The modifier list is compiled from the pre/post expression trees on first
/// access and cached for the lifetime of the effect; effects are shared by
/// reference across every type and item carrying them.
#[derive(Debug)]
pub struct Effect {
    pub id: EffectId,
    pub category: EffectCategory,
    pub pre_expression: Option<ExprId>,
    pub post_expression: Option<ExprId>,
    pub duration_attr_id: Option<AttrId>,
    pub discharge_attr_id: Option<AttrId>,
    pub range_attr_id: Option<AttrId>,
    pub falloff_attr_id: Option<AttrId>,
    pub tracking_speed_attr_id: Option<AttrId>,
    /// Marks side effects: the effect runs only when explicitly switched on.
    pub usage_chance_attr_id: Option<AttrId>,
    compiled: OnceLock<CompiledModifiers>,
}

impl Effect {
    pub fn new(id: EffectId, category: EffectCategory) -> Self {
        Self {
            id,
            category,
            pre_expression: None,
            post_expression: None,
            duration_attr_id: None,
            discharge_attr_id: None,
            range_attr_id: None,
            falloff_attr_id: None,
            tracking_speed_attr_id: None,
            usage_chance_attr_id: None,
            compiled: OnceLock::new(),
        }
    }

    /// Attaches the pre/post expression tree roots (builder pattern).
    #[must_use]
    pub fn with_expressions(mut self, pre: Option<ExprId>, post: Option<ExprId>) -> Self {
        self.pre_expression = pre;
        self.post_expression = post;
        self
    }

    #[must_use]
    pub fn with_duration_attr(mut self, attr: AttrId) -> Self {
        self.duration_attr_id = Some(attr);
        self
    }

    #[must_use]
    pub fn with_usage_chance_attr(mut self, attr: AttrId) -> Self {
        self.usage_chance_attr_id = Some(attr);
        self
    }

    /// Pre-fills the compiled modifier list, bypassing the expression
    /// compiler. Used for datasets that ship compiled modifiers and for
    /// fixtures (builder pattern).
    #[must_use]
    pub fn with_compiled(self, modifiers: Vec<Modifier>) -> Self {
        let _ = self.compiled.set(CompiledModifiers {
            modifiers,
            status: EffectBuildStatus::Success,
        });
        self
    }

    /// Creates an effect with a pre-built modifier list.
    pub fn with_modifiers(
        id: EffectId,
        category: EffectCategory,
        modifiers: Vec<Modifier>,
    ) -> Self {
        Self::new(id, category).with_compiled(modifiers)
    }

    /// Minimum item state at which this effect runs.
    pub fn activation_state(&self) -> State {
        self.category.activation_state()
    }

    /// Whether this effect is a chance-based side effect, off by default.
    pub fn is_side_effect(&self) -> bool {
        self.usage_chance_attr_id.is_some()
    }

    /// Returns the compiled modifiers, building them on first access.
    ///
    /// Compilation never fails outward; failures are folded into the build
    /// status and an empty or partial modifier list.
    pub fn modifiers(&self, exprs: &dyn ExpressionLookup) -> &CompiledModifiers {
        self.compiled.get_or_init(|| compiler::compile(self, exprs))
    }

    /// Build status, if the effect has been compiled already.
    pub fn build_status(&self) -> Option<EffectBuildStatus> {
        self.compiled.get().map(|c| c.status)
    }
}

/// Shared handle to an effect.
pub type EffectRef = Arc<Effect>;
