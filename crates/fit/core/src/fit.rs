//! The fit aggregate.
//!
//! A fit owns its items, its data source, the message bus, the calculation
//! service and the restriction registers. Every public mutation runs to
//! completion synchronously: place/unlink the item, then publish the
//! structural message so subscribers adjust their state before the call
//! returns.

use fit_data::{AttrId, EffectId, Modifier, Source, State, TypeId};

use crate::calc::{AttrValueError, CalcService};
use crate::item::{EffectMode, Item, ItemId, ItemKind};
use crate::msg::{Message, MessageBus, SubscriberTag};
use crate::restriction::{RestrictionTracker, ValidationError};
use crate::stats::StatsView;
use crate::store::ItemStore;

/// Module rack of a fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rack {
    High,
    Med,
    Low,
}

/// Contract violations on the fit's public surface.
///
/// These are programming errors of the caller and fail fast; everything
/// data-driven (unresolvable attributes, rule violations) is reported
/// through dedicated result types instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    #[error("no data source is set")]
    NoSource,
    #[error("item {0} is not in this fit")]
    ItemNotFound(ItemId),
    #[error("item {0} is not a module")]
    NotAModule(ItemId),
    #[error("module {0} already has a charge loaded")]
    ChargeAlreadyLoaded(ItemId),
    #[error("skill {0} is already fitted")]
    DuplicateSkill(TypeId),
}

/// One fitted ship: aggregate root of the engine.
pub struct Fit {
    store: ItemStore,
    calc: CalcService,
    restrictions: RestrictionTracker,
    bus: MessageBus,
}

impl Fit {
    /// Creates an empty fit without a data source.
    pub fn new() -> Self {
        let mut bus = MessageBus::new();
        let calc = CalcService::new();
        let restrictions = RestrictionTracker::new();
        // Subscription order is observable: the calculation service reacts
        // before any restriction register.
        bus.subscribe(SubscriberTag::Calc, crate::calc::INTERESTS);
        for kind in restrictions.kinds() {
            bus.subscribe(
                SubscriberTag::Restriction(kind),
                crate::restriction::INTERESTS,
            );
        }
        Self {
            store: ItemStore::new(None),
            calc,
            restrictions,
            bus,
        }
    }

    pub fn with_source(source: Source) -> Self {
        let mut fit = Self::new();
        fit.store.source = Some(source);
        fit
    }

    /// Replaces or drops the data source, invalidating everything.
    pub fn set_source(&mut self, source: Option<Source>) {
        self.store.source = source;
        self.publish(Message::SourceChanged);
    }

    pub fn has_source(&self) -> bool {
        self.store.source.is_some()
    }

    // ------------------------------------------------------------------
    // Item placement
    // ------------------------------------------------------------------

    /// Sets the ship hull, replacing any previous one.
    pub fn set_ship(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        if let Some(old) = self.store.ship {
            self.remove_item(old)?;
        }
        let id = self.store.insert(type_id, ItemKind::Ship);
        self.store.ship = Some(id);
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    /// Sets the character, replacing any previous one.
    pub fn set_character(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        if let Some(old) = self.store.character {
            self.remove_item(old)?;
        }
        let id = self.store.insert(type_id, ItemKind::Character);
        self.store.character = Some(id);
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    pub fn add_module(&mut self, rack: Rack, type_id: TypeId) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        let kind = match rack {
            Rack::High => ItemKind::ModuleHigh,
            Rack::Med => ItemKind::ModuleMed,
            Rack::Low => ItemKind::ModuleLow,
        };
        let id = self.store.insert(type_id, kind);
        match rack {
            Rack::High => self.store.modules_high.push(id),
            Rack::Med => self.store.modules_med.push(id),
            Rack::Low => self.store.modules_low.push(id),
        }
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    pub fn add_rig(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.add_simple(type_id, ItemKind::Rig)
    }

    pub fn add_subsystem(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.add_simple(type_id, ItemKind::Subsystem)
    }

    pub fn add_drone(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.add_simple(type_id, ItemKind::Drone)
    }

    pub fn add_implant(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.add_simple(type_id, ItemKind::Implant)
    }

    pub fn add_booster(&mut self, type_id: TypeId) -> Result<ItemId, FitError> {
        self.add_simple(type_id, ItemKind::Booster)
    }

    fn add_simple(&mut self, type_id: TypeId, kind: ItemKind) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        let id = self.store.insert(type_id, kind);
        match kind {
            ItemKind::Rig => self.store.rigs.push(id),
            ItemKind::Subsystem => self.store.subsystems.push(id),
            ItemKind::Drone => self.store.drones.push(id),
            ItemKind::Implant => self.store.implants.push(id),
            ItemKind::Booster => self.store.boosters.push(id),
            _ => unreachable!("add_simple only handles unordered slot kinds"),
        }
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    /// Fits a skill at the given trained level. At most one skill per type.
    pub fn add_skill(&mut self, type_id: TypeId, level: u32) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        if self.store.skills.contains_key(&type_id) {
            return Err(FitError::DuplicateSkill(type_id));
        }
        let id = self.store.insert(type_id, ItemKind::Skill);
        self.store
            .item_mut(id)
            .expect("just inserted")
            .set_skill_level(level);
        self.store.skills.insert(type_id, id);
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    /// Loads a charge into a module.
    pub fn set_charge(&mut self, module: ItemId, type_id: TypeId) -> Result<ItemId, FitError> {
        self.ensure_source()?;
        let module_item = self
            .store
            .item(module)
            .ok_or(FitError::ItemNotFound(module))?;
        if !module_item.kind.is_module() {
            return Err(FitError::NotAModule(module));
        }
        if module_item.charge().is_some() {
            return Err(FitError::ChargeAlreadyLoaded(module));
        }
        let id = self.store.insert(type_id, ItemKind::Charge);
        self.store
            .item_mut(id)
            .expect("just inserted")
            .set_container(Some(module));
        self.store
            .item_mut(module)
            .expect("checked above")
            .set_charge(Some(id));
        self.publish(Message::ItemAdded(id));
        Ok(id)
    }

    /// Removes an item (and its loaded charge, if any) from the fit.
    ///
    /// Subscribers are notified while the item is still present, so all of
    /// its bookkeeping can be unwound; afterwards no cache entry, dependency
    /// edge or membership set may reference it.
    pub fn remove_item(&mut self, id: ItemId) -> Result<(), FitError> {
        let item = self.store.item(id).ok_or(FitError::ItemNotFound(id))?;
        if let Some(charge) = item.charge() {
            self.remove_item(charge)?;
        }
        self.publish(Message::ItemRemoved(id));

        let (kind, type_id, container) = {
            let item = self.store.item(id).expect("still present during removal");
            (item.kind, item.type_id, item.container())
        };
        match kind {
            ItemKind::Ship => self.store.ship = None,
            ItemKind::Character => self.store.character = None,
            ItemKind::ModuleHigh => self.store.modules_high.retain(|m| *m != id),
            ItemKind::ModuleMed => self.store.modules_med.retain(|m| *m != id),
            ItemKind::ModuleLow => self.store.modules_low.retain(|m| *m != id),
            ItemKind::Rig => self.store.rigs.retain(|m| *m != id),
            ItemKind::Subsystem => self.store.subsystems.retain(|m| *m != id),
            ItemKind::Drone => self.store.drones.retain(|m| *m != id),
            ItemKind::Implant => self.store.implants.retain(|m| *m != id),
            ItemKind::Booster => self.store.boosters.retain(|m| *m != id),
            ItemKind::Skill => {
                self.store.skills.remove(&type_id);
            }
            ItemKind::Charge => {
                if let Some(container) = container {
                    if let Some(container_item) = self.store.item_mut(container) {
                        container_item.set_charge(None);
                    }
                }
            }
        }
        self.store.remove(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Item mutation
    // ------------------------------------------------------------------

    /// Moves an item to a new state, publishing the crossed states.
    pub fn set_state(&mut self, id: ItemId, state: State) -> Result<(), FitError> {
        let item = self.store.item_mut(id).ok_or(FitError::ItemNotFound(id))?;
        let old = item.state();
        if old == state {
            return Ok(());
        }
        item.set_state(state);
        let crossed: Vec<State> = [State::Online, State::Active, State::Overload]
            .into_iter()
            .filter(|s| (old.min(state) < *s) && (*s <= old.max(state)))
            .collect();
        if state > old {
            self.publish(Message::StatesActivated {
                item: id,
                states: crossed,
            });
        } else {
            self.publish(Message::StatesDeactivated {
                item: id,
                states: crossed,
            });
        }
        Ok(())
    }

    /// Overrides how one effect runs on an item, publishing the effects
    /// whose running status actually changed.
    pub fn set_effect_mode(
        &mut self,
        id: ItemId,
        effect_id: EffectId,
        mode: EffectMode,
    ) -> Result<(), FitError> {
        if !self.store.contains(id) {
            return Err(FitError::ItemNotFound(id));
        }
        let was_running = self.effect_running(id, effect_id);
        self.store
            .item_mut(id)
            .expect("checked above")
            .set_effect_mode(effect_id, mode);
        let now_running = self.effect_running(id, effect_id);

        if was_running != now_running {
            let msg = if now_running == Some(true) {
                Message::EffectsStarted {
                    item: id,
                    effects: vec![effect_id],
                }
            } else {
                Message::EffectsStopped {
                    item: id,
                    effects: vec![effect_id],
                }
            };
            self.publish(msg);
        }
        Ok(())
    }

    fn effect_running(&self, id: ItemId, effect_id: EffectId) -> Option<bool> {
        let item = self.store.item(id)?;
        let itype = self.store.item_type(id)?;
        let effect = itype.effect(effect_id)?;
        Some(item.effect_running(effect))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Modified value of an attribute on an item.
    pub fn attr_value(&mut self, id: ItemId, attr: AttrId) -> Result<f64, AttrValueError> {
        self.calc.attr_value(&mut self.store, id, attr)
    }

    /// Every (carrier, modifier) pair currently affecting an item;
    /// introspection and debugging surface.
    pub fn modifiers_affecting(&self, id: ItemId) -> Vec<(ItemId, Modifier)> {
        self.calc.gather_affectors(&self.store, id)
    }

    /// Runs every restriction register against the fit.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.restrictions.validate(&mut self.store, &mut self.calc)
    }

    /// Read-only stat views over the fit.
    pub fn stats(&mut self) -> StatsView<'_> {
        StatsView {
            store: &mut self.store,
            calc: &mut self.calc,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.store.item(id)
    }

    pub fn ship(&self) -> Option<ItemId> {
        self.store.ship
    }

    pub fn character(&self) -> Option<ItemId> {
        self.store.character
    }

    pub fn modules(&self, rack: Rack) -> &[ItemId] {
        match rack {
            Rack::High => &self.store.modules_high,
            Rack::Med => &self.store.modules_med,
            Rack::Low => &self.store.modules_low,
        }
    }

    pub fn drones(&self) -> &[ItemId] {
        &self.store.drones
    }

    pub fn rigs(&self) -> &[ItemId] {
        &self.store.rigs
    }

    pub fn implants(&self) -> &[ItemId] {
        &self.store.implants
    }

    pub fn item_count(&self) -> usize {
        self.store.len()
    }

    // ------------------------------------------------------------------
    // Introspection probes
    // ------------------------------------------------------------------

    /// Number of cache-miss computations performed so far.
    pub fn recompute_count(&self) -> u64 {
        self.calc.recompute_count()
    }

    /// True when no internal buffer (cache, dependency edge, membership
    /// set) references an item that is no longer in the fit.
    pub fn buffers_clean(&self) -> bool {
        self.calc.buffers_clean(&self.store)
            && !self
                .departed_ids()
                .iter()
                .any(|id| self.restrictions.references(*id))
    }

    /// Ids that were allocated at some point but are gone from the store.
    ///
    /// Membership sets can only hold ids handed out earlier, so scanning the
    /// allocated range is exact.
    fn departed_ids(&self) -> Vec<ItemId> {
        let live: std::collections::HashSet<ItemId> = self.store.ids().collect();
        (0..self.store.allocated_ids())
            .map(ItemId)
            .filter(|id| !live.contains(id))
            .collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_source(&self) -> Result<(), FitError> {
        if self.store.source.is_some() {
            Ok(())
        } else {
            Err(FitError::NoSource)
        }
    }

    /// Delivers one message to every interested subscriber in subscription
    /// order. Handlers must not mutate fit structure re-entrantly.
    fn publish(&mut self, msg: Message) {
        self.bus.begin_dispatch();
        for tag in self.bus.route(msg.kind()) {
            match tag {
                SubscriberTag::Calc => self.calc.notify(&mut self.store, &msg),
                SubscriberTag::Restriction(kind) => {
                    self.restrictions.notify(kind, &self.store, &msg)
                }
            }
        }
        self.bus.end_dispatch();
    }
}

impl Default for Fit {
    fn default() -> Self {
        Self::new()
    }
}
