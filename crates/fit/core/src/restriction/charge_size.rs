//! Container/charge size matching.

use std::collections::HashMap;

use fit_data::defs::attrs;

use crate::item::ItemId;
use crate::msg::Message;
use crate::store::ItemStore;

use super::RestrictionErrorData;

/// A loaded charge must match its container's declared charge size.
///
/// Containers without a size accept anything; a sized container rejects
/// charges that declare no size or a different one. Sizes are compared as
/// unmodified type attributes.
pub(crate) struct ChargeSizeRegister {
    containers: Vec<ItemId>,
}

impl ChargeSizeRegister {
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
        }
    }

    fn tracks(&self, store: &ItemStore, item: ItemId) -> bool {
        let Some(it) = store.item(item) else {
            return false;
        };
        it.kind.is_module()
            && store
                .item_type(item)
                .is_some_and(|t| t.attr(attrs::CHARGE_SIZE).is_some())
    }

    pub fn notify(&mut self, store: &ItemStore, msg: &Message) {
        match msg {
            Message::ItemAdded(item) => {
                if self.tracks(store, *item) {
                    self.containers.push(*item);
                }
            }
            Message::ItemRemoved(item) => self.containers.retain(|other| other != item),
            Message::SourceChanged => {
                self.containers.clear();
                let ids: Vec<ItemId> = store.ids().collect();
                for id in ids {
                    if self.tracks(store, id) {
                        self.containers.push(id);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn validate(&self, store: &mut ItemStore) -> HashMap<ItemId, RestrictionErrorData> {
        let mut tainted = HashMap::new();
        for container in &self.containers {
            let Some(charge) = store.item(*container).and_then(|i| i.charge()) else {
                continue;
            };
            let Some(allowed_size) =
                store.item_type(*container).and_then(|t| t.attr(attrs::CHARGE_SIZE))
            else {
                continue;
            };
            let size = store.item_type(charge).and_then(|t| t.attr(attrs::CHARGE_SIZE));
            if size != Some(allowed_size) {
                tainted.insert(
                    charge,
                    RestrictionErrorData::ChargeSize { size, allowed_size },
                );
            }
        }
        tainted
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.containers.contains(&item)
    }
}
