//! Raw expression nodes.
//!
//! Effects encode their modifiers as binary expression trees stored flat in a
//! table, nodes referencing each other by id. The encoding is externally
//! authored and loosely typed: identifier fields arrive as numbers or as
//! strings holding numbers, and any field may be absent. Nothing here is
//! validated; the compiler performs all typed, fallible extraction.

use std::sync::Arc;

use crate::defs::ExprId;

/// A loosely-typed scalar field of an expression node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Coerces the field to an integer id, accepting numeric strings.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Int(v) => u32::try_from(*v).ok(),
            Self::Text(s) => s.trim().parse::<u32>().ok(),
        }
    }

    /// Returns the textual form, if the field is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Int(_) => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// One node of the expression table.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpressionNode {
    pub id: ExprId,
    /// Raw operand kind; unknown values are a compiler concern.
    pub operand: Option<FieldValue>,
    pub arg1: Option<ExprId>,
    pub arg2: Option<ExprId>,
    /// Literal payload of leaf definitions (domain names, operator names,
    /// integer literals).
    pub value: Option<FieldValue>,
    pub attr_id: Option<FieldValue>,
    pub type_id: Option<FieldValue>,
    pub group_id: Option<FieldValue>,
}

impl ExpressionNode {
    pub fn new(id: ExprId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Lookup into the flat expression table.
///
/// Implemented by data sources; the compiler only ever sees this seam.
pub trait ExpressionLookup {
    fn node(&self, id: ExprId) -> Option<Arc<ExpressionNode>>;
}
