//! Serde mirror of the JSON dump format.

use std::collections::HashMap;

use serde::Deserialize;

use fit_data::{
    AttrId, AttrRow, EffectId, EffectRow, ExprId, ExpressionNode, FieldValue, TypeRow,
};
use fit_data::{CategoryId, GroupId};

/// Dump flags arrive as booleans or as 0/1 integers.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    pub fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TypeEntry {
    #[serde(rename = "groupID", default)]
    pub group_id: u32,
    #[serde(rename = "categoryID", default)]
    pub category_id: u32,
    #[serde(default)]
    pub attributes: HashMap<String, f64>,
    #[serde(default)]
    pub effects: Vec<u32>,
    #[serde(rename = "defaultEffect", default)]
    pub default_effect: Option<u32>,
}

impl TypeEntry {
    pub fn into_row(self) -> TypeRow {
        TypeRow {
            group_id: GroupId(self.group_id),
            category_id: CategoryId(self.category_id),
            attrs: self
                .attributes
                .into_iter()
                .filter_map(|(key, value)| Some((AttrId(key.parse().ok()?), value)))
                .collect(),
            effect_ids: self.effects.into_iter().map(EffectId).collect(),
            default_effect_id: self.default_effect.map(EffectId),
            fighter_abilities: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttrEntry {
    #[serde(default)]
    pub stackable: Option<Flag>,
    #[serde(rename = "highIsGood", default)]
    pub high_is_good: Option<Flag>,
    #[serde(rename = "defaultValue", default)]
    pub default_value: Option<f64>,
}

impl AttrEntry {
    pub fn into_row(self) -> AttrRow {
        AttrRow {
            stackable: self.stackable.map_or(true, Flag::as_bool),
            high_is_good: self.high_is_good.map_or(true, Flag::as_bool),
            default_value: self.default_value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EffectEntry {
    #[serde(rename = "effectCategory", default)]
    pub category: u32,
    #[serde(rename = "preExpression", default)]
    pub pre_expression: Option<u32>,
    #[serde(rename = "postExpression", default)]
    pub post_expression: Option<u32>,
    #[serde(rename = "durationAttributeID", default)]
    pub duration_attr: Option<u32>,
    #[serde(rename = "dischargeAttributeID", default)]
    pub discharge_attr: Option<u32>,
    #[serde(rename = "rangeAttributeID", default)]
    pub range_attr: Option<u32>,
    #[serde(rename = "falloffAttributeID", default)]
    pub falloff_attr: Option<u32>,
    #[serde(rename = "trackingSpeedAttributeID", default)]
    pub tracking_speed_attr: Option<u32>,
    #[serde(rename = "fittingUsageChanceAttributeID", default)]
    pub usage_chance_attr: Option<u32>,
}

impl EffectEntry {
    pub fn into_row(self) -> EffectRow {
        EffectRow {
            category: self.category,
            pre_expression: self.pre_expression.map(ExprId),
            post_expression: self.post_expression.map(ExprId),
            duration_attr_id: self.duration_attr.map(AttrId),
            discharge_attr_id: self.discharge_attr.map(AttrId),
            range_attr_id: self.range_attr.map(AttrId),
            falloff_attr_id: self.falloff_attr.map(AttrId),
            tracking_speed_attr_id: self.tracking_speed_attr.map(AttrId),
            usage_chance_attr_id: self.usage_chance_attr.map(AttrId),
            modifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpressionEntry {
    #[serde(rename = "operandID", default)]
    pub operand: Option<FieldValue>,
    #[serde(default)]
    pub arg1: Option<u32>,
    #[serde(default)]
    pub arg2: Option<u32>,
    #[serde(rename = "expressionValue", default)]
    pub value: Option<FieldValue>,
    #[serde(rename = "expressionAttributeID", default)]
    pub attr_id: Option<FieldValue>,
    #[serde(rename = "expressionTypeID", default)]
    pub type_id: Option<FieldValue>,
    #[serde(rename = "expressionGroupID", default)]
    pub group_id: Option<FieldValue>,
}

impl ExpressionEntry {
    pub fn into_node(self, id: ExprId) -> ExpressionNode {
        let mut node = ExpressionNode::new(id);
        node.operand = self.operand;
        node.arg1 = self.arg1.map(ExprId);
        node.arg2 = self.arg2.map(ExprId);
        node.value = self.value;
        node.attr_id = self.attr_id;
        node.type_id = self.type_id;
        node.group_id = self.group_id;
        node
    }
}
