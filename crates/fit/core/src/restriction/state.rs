//! Item-state limits.

use std::collections::HashMap;

use crate::item::ItemId;
use crate::msg::Message;
use crate::store::ItemStore;

use super::RestrictionErrorData;

/// Items must not be in a state above what their type's effects permit.
pub(crate) struct StateRegister {
    tracked: Vec<ItemId>,
}

impl StateRegister {
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
        }
    }

    pub fn notify(&mut self, _store: &ItemStore, msg: &Message) {
        match msg {
            Message::ItemAdded(item) => self.tracked.push(*item),
            Message::ItemRemoved(item) => self.tracked.retain(|other| other != item),
            _ => {}
        }
    }

    pub fn validate(&self, store: &mut ItemStore) -> HashMap<ItemId, RestrictionErrorData> {
        let mut tainted = HashMap::new();
        for item in &self.tracked {
            let Some(it) = store.item(*item) else {
                continue;
            };
            let Some(itype) = store.item_type(*item) else {
                continue;
            };
            let max_state = itype.max_state();
            if it.state() > max_state {
                tainted.insert(
                    *item,
                    RestrictionErrorData::ItemState {
                        state: it.state(),
                        max_state,
                    },
                );
            }
        }
        tainted
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.tracked.contains(&item)
    }
}
