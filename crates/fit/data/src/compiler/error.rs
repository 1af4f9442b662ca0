//! Compiler error kinds.

use crate::defs::ExprId;

/// A failure while building modifiers out of an expression tree.
///
/// Compile errors never escape the compiler: they either fail the whole
/// effect (unsupported root) or are folded into the build status as localized
/// branch failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("expression {0} not found")]
    NodeMissing(ExprId),

    #[error("expression {0} carries no operand")]
    OperandMissing(ExprId),

    #[error("expression {0} has unsupported operand {1}")]
    OperandUnsupported(ExprId, String),

    #[error("expression {0} is missing argument {1}")]
    ArgMissing(ExprId, u8),

    #[error("expression {0}: {1} failed to parse")]
    FieldMalformed(ExprId, &'static str),

    #[error("expression {0} names unknown domain {1:?}")]
    DomainUnknown(ExprId, String),

    #[error("expression {0} names unknown operator {1:?}")]
    OperatorUnknown(ExprId, String),

    #[error("expression tree exceeds depth limit at {0}")]
    TooDeep(ExprId),

    #[error("expression {0} is part of a cycle")]
    Cyclic(ExprId),
}
