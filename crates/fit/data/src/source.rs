//! Data-source contract and decoded-object arena.
//!
//! A [`DataHandler`] supplies raw, immutable dataset rows by id. A [`Source`]
//! wraps one handler with an id-keyed arena of decoded objects: attributes,
//! effects, item types and expression nodes are built once on first access
//! and shared by reference afterwards. The arena is generational: evicting it
//! (on dataset reloads) bumps a generation counter so holders of stale
//! handles can tell they must re-resolve.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use crate::attr::Attribute;
use crate::defs::{AbilityId, AttrId, CategoryId, EffectId, ExprId, GroupId, TypeId};
use crate::effect::{Effect, EffectRef};
use crate::etype::{FighterAbility, ItemType, ItemTypeRef};
use crate::expr::{ExpressionLookup, ExpressionNode};
use crate::modifier::Modifier;
use crate::state::EffectCategory;

/// Raw attribute row.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttrRow {
    pub stackable: bool,
    pub high_is_good: bool,
    pub default_value: Option<f64>,
}

/// Raw effect row.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRow {
    /// Raw category id; decoded via [`EffectCategory::from_raw`].
    pub category: u32,
    pub pre_expression: Option<ExprId>,
    pub post_expression: Option<ExprId>,
    pub duration_attr_id: Option<AttrId>,
    pub discharge_attr_id: Option<AttrId>,
    pub range_attr_id: Option<AttrId>,
    pub falloff_attr_id: Option<AttrId>,
    pub tracking_speed_attr_id: Option<AttrId>,
    pub usage_chance_attr_id: Option<AttrId>,
    /// Pre-compiled modifier cache; when non-empty, the expression trees
    /// are not consulted at all.
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<Modifier>,
}

/// Raw item-type row.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRow {
    pub group_id: GroupId,
    pub category_id: CategoryId,
    pub attrs: Vec<(AttrId, f64)>,
    pub effect_ids: Vec<EffectId>,
    pub default_effect_id: Option<EffectId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fighter_abilities: Vec<(AbilityId, FighterAbility)>,
}

/// Supplies raw dataset rows by id.
///
/// Implementations are assumed immutable for the lifetime of the handler;
/// results are safe to decode once and cache by identity.
pub trait DataHandler {
    fn type_row(&self, id: TypeId) -> Option<TypeRow>;
    fn attr_row(&self, id: AttrId) -> Option<AttrRow>;
    fn effect_row(&self, id: EffectId) -> Option<EffectRow>;
    fn expression_row(&self, id: ExprId) -> Option<ExpressionNode>;
}

/// Failure to resolve a dataset entity.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("item type {0} not found")]
    TypeNotFound(TypeId),
    #[error("effect {0} not found")]
    EffectNotFound(EffectId),
    #[error("effect {0} has unknown category {1}")]
    UnknownEffectCategory(EffectId, u32),
}

/// One data source: a handler plus its decoded-object arena.
///
/// Single-threaded by design: the arena uses interior mutability and the
/// decoded objects themselves are immutable and freely shareable.
pub struct Source {
    handler: Arc<dyn DataHandler>,
    types: RefCell<HashMap<TypeId, ItemTypeRef>>,
    attrs: RefCell<HashMap<AttrId, Arc<Attribute>>>,
    effects: RefCell<HashMap<EffectId, EffectRef>>,
    exprs: RefCell<HashMap<ExprId, Arc<ExpressionNode>>>,
    generation: Cell<u64>,
}

impl Source {
    pub fn new(handler: Arc<dyn DataHandler>) -> Self {
        Self {
            handler,
            types: RefCell::new(HashMap::new()),
            attrs: RefCell::new(HashMap::new()),
            effects: RefCell::new(HashMap::new()),
            exprs: RefCell::new(HashMap::new()),
            generation: Cell::new(0),
        }
    }

    /// Resolves an item type, decoding and caching it on first access.
    pub fn item_type(&self, id: TypeId) -> Result<ItemTypeRef, SourceError> {
        if let Some(decoded) = self.types.borrow().get(&id) {
            return Ok(Arc::clone(decoded));
        }
        let row = self
            .handler
            .type_row(id)
            .ok_or(SourceError::TypeNotFound(id))?;
        let mut effects = Vec::with_capacity(row.effect_ids.len());
        for effect_id in &row.effect_ids {
            effects.push(self.effect(*effect_id)?);
        }
        let default_effect = match row.default_effect_id {
            Some(effect_id) => Some(self.effect(effect_id)?),
            None => None,
        };
        let decoded = Arc::new(ItemType::new(
            id,
            row.group_id,
            row.category_id,
            row.attrs.into_iter().collect(),
            effects,
            default_effect,
            row.fighter_abilities.into_iter().collect(),
        ));
        self.types.borrow_mut().insert(id, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Resolves attribute metadata; unknown attributes decode to permissive
    /// defaults (stackable, no default value) so dumps with sparse attribute
    /// tables keep working.
    pub fn attribute(&self, id: AttrId) -> Arc<Attribute> {
        if let Some(decoded) = self.attrs.borrow().get(&id) {
            return Arc::clone(decoded);
        }
        let decoded = match self.handler.attr_row(id) {
            Some(row) => Arc::new(Attribute::new(
                id,
                row.stackable,
                row.high_is_good,
                row.default_value,
            )),
            None => Arc::new(Attribute::new(id, true, true, None)),
        };
        self.attrs.borrow_mut().insert(id, Arc::clone(&decoded));
        decoded
    }

    /// Resolves an effect, decoding and caching it on first access.
    pub fn effect(&self, id: EffectId) -> Result<EffectRef, SourceError> {
        if let Some(decoded) = self.effects.borrow().get(&id) {
            return Ok(Arc::clone(decoded));
        }
        let row = self
            .handler
            .effect_row(id)
            .ok_or(SourceError::EffectNotFound(id))?;
        let category = EffectCategory::from_raw(row.category)
            .ok_or(SourceError::UnknownEffectCategory(id, row.category))?;
        let mut effect = Effect::new(id, category)
            .with_expressions(row.pre_expression, row.post_expression);
        effect.duration_attr_id = row.duration_attr_id;
        effect.discharge_attr_id = row.discharge_attr_id;
        effect.range_attr_id = row.range_attr_id;
        effect.falloff_attr_id = row.falloff_attr_id;
        effect.tracking_speed_attr_id = row.tracking_speed_attr_id;
        effect.usage_chance_attr_id = row.usage_chance_attr_id;
        if !row.modifiers.is_empty() {
            effect = effect.with_compiled(row.modifiers);
        }
        let decoded = Arc::new(effect);
        self.effects.borrow_mut().insert(id, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Drops every decoded object and bumps the arena generation.
    ///
    /// Called when the underlying dataset is reloaded or switched away from.
    pub fn evict_all(&self) {
        self.types.borrow_mut().clear();
        self.attrs.borrow_mut().clear();
        self.effects.borrow_mut().clear();
        self.exprs.borrow_mut().clear();
        self.generation.set(self.generation.get() + 1);
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }
}

impl ExpressionLookup for Source {
    fn node(&self, id: ExprId) -> Option<Arc<ExpressionNode>> {
        if let Some(node) = self.exprs.borrow().get(&id) {
            return Some(Arc::clone(node));
        }
        let node = Arc::new(self.handler.expression_row(id)?);
        self.exprs.borrow_mut().insert(id, Arc::clone(&node));
        Some(node)
    }
}

/// Builder-style in-memory data handler.
///
/// Useful for programmatically assembled datasets and as the backing store
/// for loaders that read entire dumps up front.
#[derive(Default)]
pub struct StaticDataHandler {
    types: HashMap<TypeId, TypeRow>,
    attrs: HashMap<AttrId, AttrRow>,
    effects: HashMap<EffectId, EffectRow>,
    exprs: HashMap<ExprId, ExpressionNode>,
}

impl StaticDataHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_type(&mut self, id: TypeId, row: TypeRow) -> &mut Self {
        self.types.insert(id, row);
        self
    }

    pub fn put_attr(&mut self, id: AttrId, row: AttrRow) -> &mut Self {
        self.attrs.insert(id, row);
        self
    }

    pub fn put_effect(&mut self, id: EffectId, row: EffectRow) -> &mut Self {
        self.effects.insert(id, row);
        self
    }

    pub fn put_expression(&mut self, node: ExpressionNode) -> &mut Self {
        self.exprs.insert(node.id, node);
        self
    }
}

impl DataHandler for StaticDataHandler {
    fn type_row(&self, id: TypeId) -> Option<TypeRow> {
        self.types.get(&id).cloned()
    }

    fn attr_row(&self, id: AttrId) -> Option<AttrRow> {
        self.attrs.get(&id).cloned()
    }

    fn effect_row(&self, id: EffectId) -> Option<EffectRow> {
        self.effects.get(&id).cloned()
    }

    fn expression_row(&self, id: ExprId) -> Option<ExpressionNode> {
        self.exprs.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_with_type() -> StaticDataHandler {
        let mut handler = StaticDataHandler::new();
        handler.put_effect(
            EffectId(16),
            EffectRow {
                category: 4,
                ..EffectRow::default()
            },
        );
        handler.put_type(
            TypeId(100),
            TypeRow {
                group_id: GroupId(5),
                category_id: CategoryId(7),
                attrs: vec![(AttrId(50), 25.0)],
                effect_ids: vec![EffectId(16)],
                default_effect_id: None,
                fighter_abilities: Vec::new(),
            },
        );
        handler
    }

    #[test]
    fn decoded_types_are_shared_by_identity() {
        let source = Source::new(Arc::new(handler_with_type()));
        let a = source.item_type(TypeId(100)).unwrap();
        let b = source.item_type(TypeId(100)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.attr(AttrId(50)), Some(25.0));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let source = Source::new(Arc::new(StaticDataHandler::new()));
        assert_eq!(
            source.item_type(TypeId(1)).unwrap_err(),
            SourceError::TypeNotFound(TypeId(1)),
        );
    }

    #[test]
    fn eviction_bumps_generation_and_rebuilds() {
        let source = Source::new(Arc::new(handler_with_type()));
        let before = source.item_type(TypeId(100)).unwrap();
        assert_eq!(source.generation(), 0);

        source.evict_all();
        assert_eq!(source.generation(), 1);

        let after = source.item_type(TypeId(100)).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn unknown_attribute_decodes_to_permissive_default() {
        let source = Source::new(Arc::new(StaticDataHandler::new()));
        let attr = source.attribute(AttrId(9));
        assert!(attr.stackable);
        assert_eq!(attr.default_value, None);
    }
}
