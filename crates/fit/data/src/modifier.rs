//! The modifier model.
//!
//! A modifier is a declarative rule compiled out of an effect's expression
//! trees: which items it targets (filter + domain + optional extra argument),
//! which attribute on those items it modifies, with which operator, and which
//! attribute on the carrying item supplies the modification strength.
//!
//! The kind set is closed on purpose: target resolution and value fetching
//! are exhaustive matches in the calculation engine, not open-ended dispatch.

use strum::{Display, EnumIter};

use crate::defs::{AttrId, GroupId, TypeId};

/// Target domain of a modifier.
///
/// Domains name a placement class relative to the carrying item. `Itself`
/// points at the carrier, `Other` at the carrier's counterpart across the
/// container/charge link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModDomain {
    Itself,
    Character,
    Ship,
    Target,
    Other,
}

/// Modification operator.
///
/// Declaration order is evaluation order: operators are applied tier by tier
/// from `PreAssign` down to `PostAssign`, regardless of the order modifiers
/// were gathered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModOperator {
    PreAssign,
    PreMul,
    PreDiv,
    ModAdd,
    ModSub,
    PostMul,
    PostDiv,
    PostPercent,
    PostAssign,
}

impl ModOperator {
    /// Operators which replace the running value instead of combining with it.
    pub fn is_assignment(self) -> bool {
        matches!(self, Self::PreAssign | Self::PostAssign)
    }
}

/// Reference to a skill type in skill-requirement filters.
///
/// `CurrentSelf` is a dataset sentinel resolved at match time to the type of
/// the item carrying the modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillRef {
    Type(TypeId),
    CurrentSelf,
}

/// A compiled modifier, one of five target-filter kinds.
///
/// Modifiers are immutable value objects, safe to share between every item
/// carrying the same effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Modifier {
    /// Affects exactly one item resolved from the domain (the carrier, its
    /// ship, its character, or its "other" counterpart).
    Item {
        domain: ModDomain,
        tgt_attr_id: AttrId,
        operator: ModOperator,
        src_attr_id: AttrId,
    },
    /// Affects every item placed in the domain.
    Domain {
        domain: ModDomain,
        tgt_attr_id: AttrId,
        operator: ModOperator,
        src_attr_id: AttrId,
    },
    /// Affects domain members whose type belongs to the group.
    DomainGroup {
        domain: ModDomain,
        group_id: GroupId,
        tgt_attr_id: AttrId,
        operator: ModOperator,
        src_attr_id: AttrId,
    },
    /// Affects domain members whose type requires the skill.
    DomainSkillrq {
        domain: ModDomain,
        skill: SkillRef,
        tgt_attr_id: AttrId,
        operator: ModOperator,
        src_attr_id: AttrId,
    },
    /// Affects owner-bound items (launched drones) whose type requires the
    /// skill, regardless of domain placement.
    OwnerSkillrq {
        skill: SkillRef,
        tgt_attr_id: AttrId,
        operator: ModOperator,
        src_attr_id: AttrId,
    },
}

impl Modifier {
    /// Attribute this modifier writes to on its targets.
    pub fn tgt_attr_id(&self) -> AttrId {
        match *self {
            Self::Item { tgt_attr_id, .. }
            | Self::Domain { tgt_attr_id, .. }
            | Self::DomainGroup { tgt_attr_id, .. }
            | Self::DomainSkillrq { tgt_attr_id, .. }
            | Self::OwnerSkillrq { tgt_attr_id, .. } => tgt_attr_id,
        }
    }

    /// Attribute on the carrier supplying the modification strength.
    pub fn src_attr_id(&self) -> AttrId {
        match *self {
            Self::Item { src_attr_id, .. }
            | Self::Domain { src_attr_id, .. }
            | Self::DomainGroup { src_attr_id, .. }
            | Self::DomainSkillrq { src_attr_id, .. }
            | Self::OwnerSkillrq { src_attr_id, .. } => src_attr_id,
        }
    }

    pub fn operator(&self) -> ModOperator {
        match *self {
            Self::Item { operator, .. }
            | Self::Domain { operator, .. }
            | Self::DomainGroup { operator, .. }
            | Self::DomainSkillrq { operator, .. }
            | Self::OwnerSkillrq { operator, .. } => operator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::AttrId;

    #[test]
    fn operator_order_matches_evaluation_order() {
        assert!(ModOperator::PreAssign < ModOperator::PreMul);
        assert!(ModOperator::ModSub < ModOperator::PostMul);
        assert!(ModOperator::PostPercent < ModOperator::PostAssign);
    }

    #[test]
    fn accessors_cover_every_kind() {
        let m = Modifier::OwnerSkillrq {
            skill: SkillRef::CurrentSelf,
            tgt_attr_id: AttrId(1),
            operator: ModOperator::PostPercent,
            src_attr_id: AttrId(2),
        };
        assert_eq!(m.tgt_attr_id(), AttrId(1));
        assert_eq!(m.src_attr_id(), AttrId(2));
        assert_eq!(m.operator(), ModOperator::PostPercent);
    }
}
