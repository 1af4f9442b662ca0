//! Modifier-expression compiler.
//!
//! Turns one effect's pre/post expression trees into a flat list of
//! [`Modifier`] values. The pre tree supplies "add modifier" statements, the
//! post tree "remove modifier" statements; since modifiers are declarative at
//! the model level, both collapse into one deduplicated list, and the remove
//! tree only serves as a structural cross-check of the add tree.
//!
//! Failure handling is deliberately asymmetric. A tree whose root operand is
//! not understood fails the whole effect: the effect's structure is unknown.
//! A failure inside a splice is localized to that branch: a splice batches
//! independent statements, so siblings still contribute. All failures end up
//! in the build status; none escape as errors.

mod error;
mod tree;

use std::collections::HashSet;

use tracing::{error, warn};

use crate::defs::ExprId;
use crate::effect::{CompiledModifiers, Effect, EffectBuildStatus};
use crate::expr::ExpressionLookup;
use crate::modifier::Modifier;

pub use error::CompileError;
pub use tree::OperandKind;

use tree::{BranchResult, Polarity, TreeWalker};

/// Compiles an effect's expression trees into modifiers.
///
/// Never fails outward; problems are reported through the returned build
/// status and a single aggregated log line per effect.
pub(crate) fn compile(effect: &Effect, exprs: &dyn ExpressionLookup) -> CompiledModifiers {
    let Some(pre_root) = effect.pre_expression else {
        // Effects without expression trees (fitting markers and the like)
        // simply have no modifiers.
        return CompiledModifiers::empty(EffectBuildStatus::Success);
    };

    let walker = TreeWalker::new(exprs);

    let pre_branches = match walker.collect_statements(pre_root) {
        Ok(branches) => branches,
        Err(err) => {
            error!(effect = %effect.id, %err, "unsupported expression root");
            return CompiledModifiers::empty(EffectBuildStatus::Error);
        }
    };

    let post_branches = match effect.post_expression {
        Some(post_root) => match walker.collect_statements(post_root) {
            Ok(branches) => Some(branches),
            Err(err) => {
                warn!(effect = %effect.id, %err, "unsupported removal expression root");
                None
            }
        },
        None => None,
    };

    let mut adds: Vec<Modifier> = Vec::new();
    let mut removes: Vec<Modifier> = Vec::new();
    let mut failed_branches: HashSet<ExprId> = HashSet::new();

    let mut take = |branches: Vec<BranchResult>, failed: &mut HashSet<ExprId>| {
        for branch in branches {
            match branch {
                Ok(stmt) => match stmt.polarity {
                    Polarity::Add => adds.push(stmt.modifier),
                    Polarity::Remove => removes.push(stmt.modifier),
                },
                Err((branch_root, _)) => {
                    // The same malformed subtree commonly appears in both
                    // trees; count it once.
                    failed.insert(branch_root);
                }
            }
        }
    };
    take(pre_branches, &mut failed_branches);
    if let Some(branches) = post_branches {
        take(branches, &mut failed_branches);
    }

    if effect.post_expression.is_some() && !mirrors(&adds, &removes) {
        warn!(
            effect = %effect.id,
            "removal expression tree does not mirror the addition tree",
        );
    }

    // Collapse add/remove duplicates into one declarative list, preserving
    // first-seen order.
    let mut seen = HashSet::new();
    let mut modifiers = Vec::new();
    for modifier in adds.into_iter().chain(removes) {
        if seen.insert(modifier) {
            modifiers.push(modifier);
        }
    }

    let error_count = failed_branches.len();
    let status = if error_count == 0 {
        EffectBuildStatus::Success
    } else if modifiers.is_empty() {
        EffectBuildStatus::Error
    } else {
        EffectBuildStatus::SuccessPartial
    };
    if error_count > 0 {
        error!(
            "effect {}, building {} modifiers: {} build errors",
            effect.id,
            modifiers.len() + error_count,
            error_count,
        );
    }

    CompiledModifiers { modifiers, status }
}

/// Checks that add and remove statements describe the same modifier multiset.
fn mirrors(adds: &[Modifier], removes: &[Modifier]) -> bool {
    if adds.len() != removes.len() {
        return false;
    }
    let mut pending: Vec<&Modifier> = removes.iter().collect();
    for add in adds {
        match pending.iter().position(|rm| *rm == add) {
            Some(idx) => {
                pending.swap_remove(idx);
            }
            None => return false,
        }
    }
    pending.is_empty()
}
