//! Recursive descent over the expression tree.
//!
//! The walker flattens splice chains into independent branch statements,
//! then parses each statement through a fixed shape: mutation root →
//! operator/target join → target specification → leaf definitions. Branch
//! failures are isolated; only an unsupported operand at the very root of a
//! tree aborts the walk as a whole.

use std::collections::HashSet;
use std::sync::Arc;

use crate::defs::{AttrId, ExprId, GroupId, TypeId};
use crate::expr::{ExpressionLookup, ExpressionNode};
use crate::modifier::{ModDomain, ModOperator, Modifier, SkillRef};

use super::error::CompileError;

/// Splice chains are authored data; anything deeper than this is malformed.
const MAX_SPLICE_DEPTH: usize = 64;

/// Operand vocabulary of the expression encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    AddItemMod,
    AddDomainGroupMod,
    AddDomainMod,
    AddDomainSkillrqMod,
    AddOwnerSkillrqMod,
    ItemAttr,
    Splice,
    DefOperator,
    DefAttr,
    DefDomain,
    DefGroup,
    DefInt,
    DefType,
    OperatorTgt,
    GetType,
    DomainGroup,
    DomainSkillrq,
    RmItemMod,
    RmDomainGroupMod,
    RmDomainMod,
    RmDomainSkillrqMod,
    RmOwnerSkillrqMod,
}

impl OperandKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            6 => Some(Self::AddItemMod),
            7 => Some(Self::AddDomainGroupMod),
            8 => Some(Self::AddDomainMod),
            9 => Some(Self::AddDomainSkillrqMod),
            11 => Some(Self::AddOwnerSkillrqMod),
            12 => Some(Self::ItemAttr),
            17 => Some(Self::Splice),
            21 => Some(Self::DefOperator),
            22 => Some(Self::DefAttr),
            24 => Some(Self::DefDomain),
            26 => Some(Self::DefGroup),
            27 => Some(Self::DefInt),
            29 => Some(Self::DefType),
            31 => Some(Self::OperatorTgt),
            36 => Some(Self::GetType),
            48 => Some(Self::DomainGroup),
            49 => Some(Self::DomainSkillrq),
            58 => Some(Self::RmItemMod),
            59 => Some(Self::RmDomainGroupMod),
            60 => Some(Self::RmDomainMod),
            61 => Some(Self::RmDomainSkillrqMod),
            62 => Some(Self::RmOwnerSkillrqMod),
            _ => None,
        }
    }
}

/// Whether a mutation root adds or removes its modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Add,
    Remove,
}

/// One successfully parsed mutation statement.
#[derive(Clone, Debug)]
pub struct Statement {
    pub polarity: Polarity,
    pub modifier: Modifier,
}

/// Outcome of one branch of a (possibly spliced) tree.
pub type BranchResult = Result<Statement, (ExprId, CompileError)>;

/// Target specification: which items, filtered how, and which attribute.
enum TargetSpec {
    Domain(ModDomain),
    DomainGroup(ModDomain, GroupId),
    DomainSkillrq(ModDomain, SkillRef),
}

pub struct TreeWalker<'a> {
    exprs: &'a dyn ExpressionLookup,
}

impl<'a> TreeWalker<'a> {
    pub fn new(exprs: &'a dyn ExpressionLookup) -> Self {
        Self { exprs }
    }

    /// Flattens the tree rooted at `root` into branch statements.
    ///
    /// Returns `Err` only for a root-level failure (unsupported or missing
    /// root operand), which fails the effect as a whole. Branch-level
    /// failures are returned inline so siblings still contribute.
    pub fn collect_statements(&self, root: ExprId) -> Result<Vec<BranchResult>, CompileError> {
        let mut out = Vec::new();
        let mut path = HashSet::new();
        self.flatten(root, 0, &mut path, &mut out, true)?;
        Ok(out)
    }

    fn flatten(
        &self,
        id: ExprId,
        depth: usize,
        path: &mut HashSet<ExprId>,
        out: &mut Vec<BranchResult>,
        is_root: bool,
    ) -> Result<(), CompileError> {
        let soft = |out: &mut Vec<BranchResult>, err: CompileError| {
            out.push(Err((id, err)));
            Ok(())
        };

        if depth > MAX_SPLICE_DEPTH {
            let err = CompileError::TooDeep(id);
            return if is_root { Err(err) } else { soft(out, err) };
        }
        if !path.insert(id) {
            let err = CompileError::Cyclic(id);
            return if is_root { Err(err) } else { soft(out, err) };
        }

        let result = (|| -> Result<(), CompileError> {
            let node = match self.node(id) {
                Ok(node) => node,
                Err(err) => {
                    return if is_root { Err(err) } else { soft(out, err) };
                }
            };
            let kind = match self.operand_kind(&node) {
                Ok(kind) => kind,
                Err(err) => {
                    return if is_root { Err(err) } else { soft(out, err) };
                }
            };
            match kind {
                OperandKind::Splice => {
                    // Both sides are visited independently; a failure in one
                    // must not block extraction from the other.
                    for (n, arg) in [(1u8, node.arg1), (2u8, node.arg2)] {
                        match arg {
                            Some(child) => self.flatten(child, depth + 1, path, out, false)?,
                            None => out.push(Err((id, CompileError::ArgMissing(id, n)))),
                        }
                    }
                    Ok(())
                }
                _ => match self.statement_polarity(kind) {
                    Some(polarity) => {
                        out.push(
                            self.build_statement(&node, kind, polarity)
                                .map_err(|e| (id, e)),
                        );
                        Ok(())
                    }
                    None => {
                        let err =
                            CompileError::OperandUnsupported(id, format!("{kind:?}"));
                        if is_root { Err(err) } else { soft(out, err) }
                    }
                },
            }
        })();
        path.remove(&id);
        result
    }

    fn statement_polarity(&self, kind: OperandKind) -> Option<Polarity> {
        match kind {
            OperandKind::AddItemMod
            | OperandKind::AddDomainMod
            | OperandKind::AddDomainGroupMod
            | OperandKind::AddDomainSkillrqMod
            | OperandKind::AddOwnerSkillrqMod => Some(Polarity::Add),
            OperandKind::RmItemMod
            | OperandKind::RmDomainMod
            | OperandKind::RmDomainGroupMod
            | OperandKind::RmDomainSkillrqMod
            | OperandKind::RmOwnerSkillrqMod => Some(Polarity::Remove),
            _ => None,
        }
    }

    /// Parses one mutation statement: operator/target join on arg1, source
    /// attribute on arg2.
    fn build_statement(
        &self,
        node: &ExpressionNode,
        kind: OperandKind,
        polarity: Polarity,
    ) -> Result<Statement, CompileError> {
        let optr_tgt = self.child(node, 1)?;
        let src_node = self.child(node, 2)?;

        self.expect_kind(&optr_tgt, OperandKind::OperatorTgt)?;
        let optr_node = self.child(&optr_tgt, 1)?;
        let tgt_spec_node = self.child(&optr_tgt, 2)?;

        let operator = self.parse_operator(&optr_node)?;
        let (target, tgt_attr_id) = self.parse_target_spec(&tgt_spec_node)?;
        let src_attr_id = self.parse_attr(&src_node)?;

        let modifier = match (kind, target) {
            (OperandKind::AddItemMod | OperandKind::RmItemMod, TargetSpec::Domain(domain)) => {
                Modifier::Item {
                    domain,
                    tgt_attr_id,
                    operator,
                    src_attr_id,
                }
            }
            (OperandKind::AddDomainMod | OperandKind::RmDomainMod, TargetSpec::Domain(domain)) => {
                Modifier::Domain {
                    domain,
                    tgt_attr_id,
                    operator,
                    src_attr_id,
                }
            }
            (
                OperandKind::AddDomainGroupMod | OperandKind::RmDomainGroupMod,
                TargetSpec::DomainGroup(domain, group_id),
            ) => Modifier::DomainGroup {
                domain,
                group_id,
                tgt_attr_id,
                operator,
                src_attr_id,
            },
            (
                OperandKind::AddDomainSkillrqMod | OperandKind::RmDomainSkillrqMod,
                TargetSpec::DomainSkillrq(domain, skill),
            ) => Modifier::DomainSkillrq {
                domain,
                skill,
                tgt_attr_id,
                operator,
                src_attr_id,
            },
            (
                OperandKind::AddOwnerSkillrqMod | OperandKind::RmOwnerSkillrqMod,
                TargetSpec::DomainSkillrq(_, skill),
            ) => Modifier::OwnerSkillrq {
                skill,
                tgt_attr_id,
                operator,
                src_attr_id,
            },
            _ => {
                return Err(CompileError::FieldMalformed(
                    node.id,
                    "target filter does not fit the statement kind",
                ));
            }
        };

        Ok(Statement { polarity, modifier })
    }

    /// Parses an item/attribute join into a target spec plus attribute.
    fn parse_target_spec(
        &self,
        node: &ExpressionNode,
    ) -> Result<(TargetSpec, AttrId), CompileError> {
        self.expect_kind(node, OperandKind::ItemAttr)?;
        let items_node = self.child(node, 1)?;
        let attr_node = self.child(node, 2)?;
        let tgt_attr_id = self.parse_attr(&attr_node)?;

        let spec = match self.operand_kind(&items_node)? {
            OperandKind::DefDomain => TargetSpec::Domain(self.parse_domain(&items_node)?),
            OperandKind::DomainGroup => {
                let domain = self.parse_domain(&*self.child(&items_node, 1)?)?;
                let group = self.parse_group(&*self.child(&items_node, 2)?)?;
                TargetSpec::DomainGroup(domain, group)
            }
            OperandKind::DomainSkillrq => {
                let domain = self.parse_domain(&*self.child(&items_node, 1)?)?;
                let skill = self.parse_skill(&*self.child(&items_node, 2)?)?;
                TargetSpec::DomainSkillrq(domain, skill)
            }
            kind => {
                return Err(CompileError::OperandUnsupported(
                    items_node.id,
                    format!("{kind:?}"),
                ));
            }
        };
        Ok((spec, tgt_attr_id))
    }

    fn parse_domain(&self, node: &ExpressionNode) -> Result<ModDomain, CompileError> {
        self.expect_kind(node, OperandKind::DefDomain)?;
        let text = node
            .value
            .as_ref()
            .and_then(|v| v.as_text())
            .ok_or(CompileError::FieldMalformed(node.id, "domain name"))?;
        match text {
            "Self" => Ok(ModDomain::Itself),
            "Char" => Ok(ModDomain::Character),
            "Ship" => Ok(ModDomain::Ship),
            "Target" => Ok(ModDomain::Target),
            "Other" => Ok(ModDomain::Other),
            other => Err(CompileError::DomainUnknown(node.id, other.to_owned())),
        }
    }

    fn parse_operator(&self, node: &ExpressionNode) -> Result<ModOperator, CompileError> {
        self.expect_kind(node, OperandKind::DefOperator)?;
        let text = node
            .value
            .as_ref()
            .and_then(|v| v.as_text())
            .ok_or(CompileError::FieldMalformed(node.id, "operator name"))?;
        match text {
            "PreAssignment" => Ok(ModOperator::PreAssign),
            "PreMul" => Ok(ModOperator::PreMul),
            "PreDiv" => Ok(ModOperator::PreDiv),
            "ModAdd" => Ok(ModOperator::ModAdd),
            "ModSub" => Ok(ModOperator::ModSub),
            "PostMul" => Ok(ModOperator::PostMul),
            "PostDiv" => Ok(ModOperator::PostDiv),
            "PostPercent" => Ok(ModOperator::PostPercent),
            "PostAssignment" => Ok(ModOperator::PostAssign),
            other => Err(CompileError::OperatorUnknown(node.id, other.to_owned())),
        }
    }

    fn parse_attr(&self, node: &ExpressionNode) -> Result<AttrId, CompileError> {
        self.expect_kind(node, OperandKind::DefAttr)?;
        node.attr_id
            .as_ref()
            .and_then(|v| v.as_u32())
            .map(AttrId)
            .ok_or(CompileError::FieldMalformed(node.id, "attribute id"))
    }

    fn parse_group(&self, node: &ExpressionNode) -> Result<GroupId, CompileError> {
        // Groups arrive either as a group definition or as a bare integer
        // literal, depending on dump vintage.
        match self.operand_kind(node)? {
            OperandKind::DefGroup => node
                .group_id
                .as_ref()
                .or(node.value.as_ref())
                .and_then(|v| v.as_u32())
                .map(GroupId)
                .ok_or(CompileError::FieldMalformed(node.id, "group id")),
            OperandKind::DefInt => node
                .value
                .as_ref()
                .and_then(|v| v.as_u32())
                .map(GroupId)
                .ok_or(CompileError::FieldMalformed(node.id, "group literal")),
            kind => Err(CompileError::OperandUnsupported(
                node.id,
                format!("{kind:?}"),
            )),
        }
    }

    fn parse_skill(&self, node: &ExpressionNode) -> Result<SkillRef, CompileError> {
        match self.operand_kind(node)? {
            OperandKind::DefType => node
                .type_id
                .as_ref()
                .and_then(|v| v.as_u32())
                .map(|id| SkillRef::Type(TypeId(id)))
                .ok_or(CompileError::FieldMalformed(node.id, "skill type id")),
            // get_type(Self) resolves the requirement against the carrier's
            // own type at match time.
            OperandKind::GetType => {
                let arg = self.child(node, 1)?;
                match self.parse_domain(&arg)? {
                    ModDomain::Itself => Ok(SkillRef::CurrentSelf),
                    _ => Err(CompileError::FieldMalformed(node.id, "self type reference")),
                }
            }
            kind => Err(CompileError::OperandUnsupported(
                node.id,
                format!("{kind:?}"),
            )),
        }
    }

    fn node(&self, id: ExprId) -> Result<Arc<ExpressionNode>, CompileError> {
        self.exprs.node(id).ok_or(CompileError::NodeMissing(id))
    }

    fn child(&self, node: &ExpressionNode, n: u8) -> Result<Arc<ExpressionNode>, CompileError> {
        let arg = if n == 1 { node.arg1 } else { node.arg2 };
        let id = arg.ok_or(CompileError::ArgMissing(node.id, n))?;
        self.node(id)
    }

    fn operand_kind(&self, node: &ExpressionNode) -> Result<OperandKind, CompileError> {
        let raw = node
            .operand
            .as_ref()
            .ok_or(CompileError::OperandMissing(node.id))?;
        let raw_id = raw
            .as_u32()
            .ok_or(CompileError::FieldMalformed(node.id, "operand id"))?;
        OperandKind::from_raw(raw_id)
            .ok_or_else(|| CompileError::OperandUnsupported(node.id, raw_id.to_string()))
    }

    fn expect_kind(
        &self,
        node: &ExpressionNode,
        expected: OperandKind,
    ) -> Result<(), CompileError> {
        let kind = self.operand_kind(node)?;
        if kind == expected {
            Ok(())
        } else {
            Err(CompileError::OperandUnsupported(
                node.id,
                format!("{kind:?}"),
            ))
        }
    }
}
