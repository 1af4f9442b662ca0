//! Per-fit message bus.
//!
//! Structural mutations are announced as typed messages, delivered
//! synchronously to subscribers in subscription order. Subscribers are the
//! fit's own services (the calculation service and the restriction
//! registers), routed by tag through an exhaustive match rather than dynamic
//! dispatch, so the subscriber set stays closed and checkable.
//!
//! Handlers must not trigger further structural mutations: re-entrant
//! publishing is a contract violation, caught by an assertion.

use std::cell::Cell;

use strum::EnumDiscriminants;

use fit_data::{EffectId, State};

use crate::item::ItemId;
use crate::restriction::RestrictionKind;

/// A structural change to the fit.
#[derive(Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(MessageKind), derive(Hash))]
pub enum Message {
    /// An item was placed into the fit (already present in the store).
    ItemAdded(ItemId),
    /// An item is about to leave the fit (still present in the store).
    ItemRemoved(ItemId),
    /// The item's state rose; `states` lists the newly entered states.
    StatesActivated { item: ItemId, states: Vec<State> },
    /// The item's state fell; `states` lists the states left behind.
    StatesDeactivated { item: ItemId, states: Vec<State> },
    /// Effects switched on by an effect-mode change.
    EffectsStarted { item: ItemId, effects: Vec<EffectId> },
    /// Effects switched off by an effect-mode change.
    EffectsStopped { item: ItemId, effects: Vec<EffectId> },
    /// The fit's data source was replaced or dropped.
    SourceChanged,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        MessageKind::from(self)
    }
}

/// Identifies a subscriber service within the fit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SubscriberTag {
    Calc,
    Restriction(RestrictionKind),
}

/// Subscription registry of one fit.
///
/// Keeps subscribers in subscription order; this order is observable through
/// handler side effects and must stay stable.
pub(crate) struct MessageBus {
    entries: Vec<(SubscriberTag, &'static [MessageKind])>,
    dispatching: Cell<bool>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            dispatching: Cell::new(false),
        }
    }

    pub fn subscribe(&mut self, tag: SubscriberTag, kinds: &'static [MessageKind]) {
        self.entries.push((tag, kinds));
    }

    /// Subscribers interested in `kind`, in subscription order.
    pub fn route(&self, kind: MessageKind) -> Vec<SubscriberTag> {
        self.entries
            .iter()
            .filter(|(_, kinds)| kinds.contains(&kind))
            .map(|(tag, _)| *tag)
            .collect()
    }

    pub fn begin_dispatch(&self) {
        assert!(
            !self.dispatching.get(),
            "structural mutation published during message dispatch",
        );
        self.dispatching.set(true);
    }

    pub fn end_dispatch(&self) {
        self.dispatching.set(false);
    }
}
