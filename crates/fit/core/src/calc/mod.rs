//! Attribute calculation service.
//!
//! Resolution is lazy and memoized: an attribute is computed on first read,
//! cached on the item, and registered in a reverse-dependency index so that
//! later structural changes invalidate exactly the entries they can affect,
//! transitively, and nothing else.

mod apply;
mod error;

use std::collections::{HashMap, HashSet};

use tracing::warn;

use fit_data::{defs::attrs, AttrId, Effect, EffectId, ModDomain, ModOperator, Modifier, SkillRef, State};

use crate::item::{Domain, EffectMode, Item, ItemId, ItemKind};
use crate::msg::{Message, MessageKind};
use crate::store::ItemStore;

use apply::ModificationSet;
pub use error::{AttrValueError, ModificationError};

/// One (item, attribute) cache slot.
type Slot = (ItemId, AttrId);

/// Message kinds the service reacts to.
pub(crate) const INTERESTS: &[MessageKind] = &[
    MessageKind::ItemAdded,
    MessageKind::ItemRemoved,
    MessageKind::StatesActivated,
    MessageKind::StatesDeactivated,
    MessageKind::EffectsStarted,
    MessageKind::EffectsStopped,
    MessageKind::SourceChanged,
];

pub(crate) struct CalcService {
    /// source slot -> dependent slots to invalidate when the source changes.
    deps: HashMap<Slot, HashSet<Slot>>,
    /// dependent slot -> source slots it was computed from.
    rdeps: HashMap<Slot, HashSet<Slot>>,
    /// Number of actual computations (cache misses); test instrumentation.
    recomputes: u64,
}

impl CalcService {
    pub fn new() -> Self {
        Self {
            deps: HashMap::new(),
            rdeps: HashMap::new(),
            recomputes: 0,
        }
    }

    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Resolves the modified value of an attribute on an item.
    pub fn attr_value(
        &mut self,
        store: &mut ItemStore,
        item_id: ItemId,
        attr_id: AttrId,
    ) -> Result<f64, AttrValueError> {
        {
            let item = store
                .item(item_id)
                .ok_or(AttrValueError::ItemNotFound(item_id))?;
            if let Some(cached) = item.cache.get(&attr_id) {
                return Ok(*cached);
            }
        }
        self.recomputes += 1;

        let (itype, attr_meta) = {
            let source = store.source.as_ref().ok_or(AttrValueError::NoSource)?;
            let item = store.item(item_id).expect("checked above");
            (source.item_type(item.type_id)?, source.attribute(attr_id))
        };

        let mut base = itype.attr(attr_id).or(attr_meta.default_value);
        // Trained skill levels live on the runtime item, not in the dataset.
        if attr_id == attrs::SKILL_LEVEL {
            if let Some(level) = store.item(item_id).and_then(|i| i.skill_level()) {
                base = Some(f64::from(level));
            }
        }

        let affectors: Vec<(ItemId, Modifier)> = self
            .gather_affectors(store, item_id)
            .into_iter()
            .filter(|(_, m)| m.tgt_attr_id() == attr_id)
            .collect();

        let mut mods = ModificationSet::default();
        let mut edges: Vec<Slot> = Vec::new();
        for (carrier, modifier) in affectors {
            match self.get_modification(store, carrier, &modifier) {
                Ok((operator, value)) => {
                    mods.push(operator, value);
                    edges.push((carrier, modifier.src_attr_id()));
                }
                Err(err) => {
                    warn!(item = %item_id, attr = %attr_id, %err, "skipping modification");
                }
            }
        }

        let value = match base {
            Some(base) => mods.apply(base, &attr_meta),
            // No base anywhere; only an assigning modifier can still give
            // the attribute a defined value.
            None if mods.has_assignment() => mods.apply(0.0, &attr_meta),
            None => {
                return Err(AttrValueError::Missing {
                    item: item_id,
                    attr: attr_id,
                });
            }
        };

        for source_slot in edges {
            self.deps
                .entry(source_slot)
                .or_default()
                .insert((item_id, attr_id));
            self.rdeps
                .entry((item_id, attr_id))
                .or_default()
                .insert(source_slot);
        }
        store
            .item_mut(item_id)
            .expect("checked above")
            .cache
            .insert(attr_id, value);
        Ok(value)
    }

    /// Operator and resolved source value of one modification.
    fn get_modification(
        &mut self,
        store: &mut ItemStore,
        carrier: ItemId,
        modifier: &Modifier,
    ) -> Result<(ModOperator, f64), ModificationError> {
        let value = self.attr_value(store, carrier, modifier.src_attr_id())?;
        Ok((modifier.operator(), value))
    }

    /// Every (carrier, modifier) pair currently affecting the item, in
    /// deterministic gathering order. Re-evaluated on every computation;
    /// target matching is never cached across structural changes.
    pub fn gather_affectors(&self, store: &ItemStore, target: ItemId) -> Vec<(ItemId, Modifier)> {
        let mut out = Vec::new();
        let Some(source) = store.source.as_ref() else {
            return out;
        };
        for carrier_id in store.ids() {
            let carrier = store.item(carrier_id).expect("id from store order");
            let Ok(ctype) = source.item_type(carrier.type_id) else {
                continue;
            };
            for effect in ctype.effects() {
                if !carrier.effect_running(effect) {
                    continue;
                }
                for modifier in &effect.modifiers(source).modifiers {
                    if matches(store, carrier_id, modifier, target) {
                        out.push((carrier_id, *modifier));
                    }
                }
            }
        }
        out
    }

    /// Reacts to structural changes by invalidating exactly the cache
    /// entries whose active-modifier set could have changed.
    pub fn notify(&mut self, store: &mut ItemStore, msg: &Message) {
        match msg {
            // The carrier's running modifiers start or stop applying.
            Message::ItemAdded(item) => {
                self.invalidate_carrier_targets(store, *item, Item::effect_running);
            }
            Message::ItemRemoved(item) => {
                self.invalidate_carrier_targets(store, *item, Item::effect_running);
                self.purge_item(store, *item);
            }
            Message::StatesActivated { item, states }
            | Message::StatesDeactivated { item, states } => {
                let crossed: HashSet<State> = states.iter().copied().collect();
                self.invalidate_carrier_targets(store, *item, move |carrier, effect| {
                    state_transition_affects(carrier, effect, &crossed)
                });
            }
            Message::EffectsStarted { item, effects }
            | Message::EffectsStopped { item, effects } => {
                let toggled: HashSet<EffectId> = effects.iter().copied().collect();
                self.invalidate_carrier_targets(store, *item, move |_, effect| {
                    toggled.contains(&effect.id)
                });
            }
            Message::SourceChanged => self.clear_all(store),
        }
    }

    /// Invalidates the current targets of the carrier's modifiers, for every
    /// effect accepted by the filter.
    fn invalidate_carrier_targets<F>(&mut self, store: &mut ItemStore, carrier: ItemId, filter: F)
    where
        F: Fn(&Item, &Effect) -> bool,
    {
        let mut slots: Vec<Slot> = Vec::new();
        {
            let Some(source) = store.source.as_ref() else {
                return;
            };
            let Some(item) = store.item(carrier) else {
                return;
            };
            let Ok(ctype) = source.item_type(item.type_id) else {
                return;
            };
            for effect in ctype.effects() {
                if !filter(item, effect) {
                    continue;
                }
                for modifier in &effect.modifiers(source).modifiers {
                    for target in resolve_targets(store, carrier, modifier) {
                        slots.push((target, modifier.tgt_attr_id()));
                    }
                }
            }
        }
        for (item, attr) in slots {
            self.invalidate(store, item, attr);
        }
    }

    /// Clears one cache slot and, transitively, every recorded dependent.
    pub fn invalidate(&mut self, store: &mut ItemStore, item: ItemId, attr: AttrId) {
        let mut stack: Vec<Slot> = vec![(item, attr)];
        let mut visited: HashSet<Slot> = HashSet::new();
        while let Some(slot) = stack.pop() {
            if !visited.insert(slot) {
                continue;
            }
            if let Some(it) = store.item_mut(slot.0) {
                it.cache.remove(&slot.1);
            }
            // Everything computed from this slot is stale too.
            if let Some(dependents) = self.deps.remove(&slot) {
                stack.extend(dependents);
            }
            // Drop the edges this slot contributed as a dependent; they are
            // re-recorded on the next computation.
            if let Some(sources) = self.rdeps.remove(&slot) {
                for source_slot in sources {
                    if let Some(set) = self.deps.get_mut(&source_slot) {
                        set.remove(&slot);
                        if set.is_empty() {
                            self.deps.remove(&source_slot);
                        }
                    }
                }
            }
        }
    }

    /// Removes every trace of an item: cache, and dependency edges in both
    /// directions (invalidating dependents of the departing entries).
    fn purge_item(&mut self, store: &mut ItemStore, item: ItemId) {
        let cached: Vec<AttrId> = store
            .item(item)
            .map(|i| i.cache.keys().copied().collect())
            .unwrap_or_default();
        for attr in cached {
            self.invalidate(store, item, attr);
        }
        let as_source: Vec<Slot> = self
            .deps
            .keys()
            .filter(|slot| slot.0 == item)
            .copied()
            .collect();
        for slot in as_source {
            if let Some(dependents) = self.deps.remove(&slot) {
                for (dep_item, dep_attr) in dependents {
                    self.invalidate(store, dep_item, dep_attr);
                }
            }
        }
    }

    fn clear_all(&mut self, store: &mut ItemStore) {
        let ids: Vec<ItemId> = store.ids().collect();
        for id in ids {
            if let Some(item) = store.item_mut(id) {
                item.cache.clear();
            }
        }
        self.deps.clear();
        self.rdeps.clear();
    }

    /// True when no cache entry or dependency edge references an item that
    /// is no longer in the store.
    pub fn buffers_clean(&self, store: &ItemStore) -> bool {
        let live = |slot: &Slot| store.contains(slot.0);
        self.deps
            .iter()
            .all(|(src, deps)| live(src) && deps.iter().all(live))
            && self.rdeps.iter().all(|(dep, srcs)| live(dep) && srcs.iter().all(live))
    }
}

/// Whether a modifier carried by `carrier` currently applies to `target`.
fn matches(store: &ItemStore, carrier: ItemId, modifier: &Modifier, target: ItemId) -> bool {
    let Some(target_item) = store.item(target) else {
        return false;
    };
    match *modifier {
        Modifier::Item { domain, .. } => resolve_direct(store, carrier, domain) == Some(target),
        Modifier::Domain { domain, .. } => filter_domain(store, carrier, domain)
            .is_some_and(|d| target_item.kind.domain() == d),
        Modifier::DomainGroup {
            domain, group_id, ..
        } => {
            filter_domain(store, carrier, domain).is_some_and(|d| target_item.kind.domain() == d)
                && store.item_type(target).is_some_and(|t| t.group_id == group_id)
        }
        Modifier::DomainSkillrq { domain, skill, .. } => {
            filter_domain(store, carrier, domain).is_some_and(|d| target_item.kind.domain() == d)
                && target_requires(store, carrier, target, skill)
        }
        Modifier::OwnerSkillrq { skill, .. } => {
            target_item.kind.is_owner_bound() && target_requires(store, carrier, target, skill)
        }
    }
}

/// Current targets of one modifier.
fn resolve_targets(store: &ItemStore, carrier: ItemId, modifier: &Modifier) -> Vec<ItemId> {
    store
        .ids()
        .filter(|target| matches(store, carrier, modifier, *target))
        .collect()
}

/// Single-item resolution of an item-filter domain. Unsupported domains
/// resolve to nothing, silently.
fn resolve_direct(store: &ItemStore, carrier: ItemId, domain: ModDomain) -> Option<ItemId> {
    match domain {
        ModDomain::Itself => Some(carrier),
        ModDomain::Ship => store.ship,
        ModDomain::Character => store.character,
        ModDomain::Other => store.item(carrier).and_then(|i| i.other()),
        ModDomain::Target => None,
    }
}

/// Placement domain a domain-filter modifier sweeps over.
fn filter_domain(store: &ItemStore, carrier: ItemId, domain: ModDomain) -> Option<Domain> {
    match domain {
        ModDomain::Ship => Some(Domain::Ship),
        ModDomain::Character => Some(Domain::Character),
        // A domain filter rooted at the carrier only makes sense when the
        // carrier anchors a domain.
        ModDomain::Itself => match store.item(carrier).map(|i| i.kind) {
            Some(ItemKind::Ship) => Some(Domain::Ship),
            Some(ItemKind::Character) => Some(Domain::Character),
            _ => None,
        },
        ModDomain::Target | ModDomain::Other => None,
    }
}

/// Whether a state transition crossing `crossed` changes the effect's
/// running status. Forced modes pin the running set, and side effects stay
/// off under full compliance no matter the state.
fn state_transition_affects(carrier: &Item, effect: &Effect, crossed: &HashSet<State>) -> bool {
    match carrier.effect_mode(effect.id) {
        EffectMode::ForceRun | EffectMode::ForceStop => false,
        EffectMode::StateCompliance => crossed.contains(&effect.activation_state()),
        EffectMode::FullCompliance => {
            !effect.is_side_effect() && crossed.contains(&effect.activation_state())
        }
    }
}

/// Whether the target's type requires the referenced skill; `CurrentSelf`
/// resolves against the carrier's own type.
fn target_requires(store: &ItemStore, carrier: ItemId, target: ItemId, skill: SkillRef) -> bool {
    let skill_type = match skill {
        SkillRef::Type(id) => id,
        SkillRef::CurrentSelf => match store.item(carrier) {
            Some(item) => item.type_id,
            None => return false,
        },
    };
    store
        .item_type(target)
        .is_some_and(|t| t.requires_skill(skill_type))
}
