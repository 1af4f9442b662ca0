//! Central item store of a fit.

use std::collections::HashMap;

use fit_data::{ItemTypeRef, Source, TypeId};

use crate::item::{Item, ItemId, ItemKind};

/// Owns every item of a fit plus the slot containers referencing them.
///
/// Iteration order over items is insertion order, which keeps modifier
/// gathering deterministic.
pub(crate) struct ItemStore {
    pub source: Option<Source>,
    items: HashMap<ItemId, Item>,
    order: Vec<ItemId>,
    next_id: u64,
    pub ship: Option<ItemId>,
    pub character: Option<ItemId>,
    pub modules_high: Vec<ItemId>,
    pub modules_med: Vec<ItemId>,
    pub modules_low: Vec<ItemId>,
    pub rigs: Vec<ItemId>,
    pub subsystems: Vec<ItemId>,
    pub drones: Vec<ItemId>,
    pub implants: Vec<ItemId>,
    pub boosters: Vec<ItemId>,
    pub skills: HashMap<TypeId, ItemId>,
}

impl ItemStore {
    pub fn new(source: Option<Source>) -> Self {
        Self {
            source,
            items: HashMap::new(),
            order: Vec::new(),
            next_id: 0,
            ship: None,
            character: None,
            modules_high: Vec::new(),
            modules_med: Vec::new(),
            modules_low: Vec::new(),
            rigs: Vec::new(),
            subsystems: Vec::new(),
            drones: Vec::new(),
            implants: Vec::new(),
            boosters: Vec::new(),
            skills: HashMap::new(),
        }
    }

    /// Creates a new item; the caller places it into a container and
    /// publishes the addition.
    pub fn insert(&mut self, type_id: TypeId, kind: ItemKind) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, Item::new(id, type_id, kind));
        self.order.push(id);
        id
    }

    /// Drops an item from the store; container references must already be
    /// unlinked.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let item = self.items.remove(&id)?;
        self.order.retain(|other| *other != id);
        Some(item)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// All item ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Number of ids handed out so far; ids below this bound either live in
    /// the store or belonged to removed items.
    pub fn allocated_ids(&self) -> u64 {
        self.next_id
    }

    /// Resolves an item's dataset type through the active source.
    pub fn item_type(&self, id: ItemId) -> Option<ItemTypeRef> {
        let item = self.item(id)?;
        self.source.as_ref()?.item_type(item.type_id).ok()
    }

    /// Trained level of a fitted skill.
    pub fn skill_level(&self, skill: TypeId) -> Option<u32> {
        let id = self.skills.get(&skill)?;
        self.item(*id)?.skill_level()
    }

}
