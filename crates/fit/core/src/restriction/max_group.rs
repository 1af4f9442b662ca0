//! Per-group fitting caps.

use std::collections::{HashMap, HashSet};

use fit_data::{defs::attrs, GroupId};

use crate::calc::CalcService;
use crate::item::ItemId;
use crate::msg::Message;
use crate::store::ItemStore;

use super::RestrictionErrorData;

/// Modules of certain groups may only be fitted up to a cap.
///
/// Every module with a group enters the per-group census; only modules whose
/// type declares the cap attribute are actually restricted. The cap is read
/// as a modified value at validation time.
pub(crate) struct MaxGroupRegister {
    group_items: HashMap<GroupId, HashSet<ItemId>>,
    restricted: HashSet<ItemId>,
}

impl MaxGroupRegister {
    pub fn new() -> Self {
        Self {
            group_items: HashMap::new(),
            restricted: HashSet::new(),
        }
    }

    fn register(&mut self, store: &ItemStore, item: ItemId) {
        let Some(it) = store.item(item) else {
            return;
        };
        if !it.kind.is_module() {
            return;
        }
        let Some(itype) = store.item_type(item) else {
            return;
        };
        self.group_items.entry(itype.group_id).or_default().insert(item);
        if itype.attr(attrs::MAX_GROUP_FITTED).is_some() {
            self.restricted.insert(item);
        }
    }

    fn unregister(&mut self, item: ItemId) {
        self.group_items.retain(|_, members| {
            members.remove(&item);
            !members.is_empty()
        });
        self.restricted.remove(&item);
    }

    pub fn notify(&mut self, store: &ItemStore, msg: &Message) {
        match msg {
            Message::ItemAdded(item) => self.register(store, *item),
            Message::ItemRemoved(item) => self.unregister(*item),
            Message::SourceChanged => {
                self.group_items.clear();
                self.restricted.clear();
                let ids: Vec<ItemId> = store.ids().collect();
                for id in ids {
                    self.register(store, id);
                }
            }
            _ => {}
        }
    }

    pub fn validate(
        &self,
        store: &mut ItemStore,
        calc: &mut CalcService,
    ) -> HashMap<ItemId, RestrictionErrorData> {
        let mut tainted = HashMap::new();
        // Deterministic reporting order.
        let mut restricted: Vec<ItemId> = self.restricted.iter().copied().collect();
        restricted.sort();
        for item in restricted {
            let Some(itype) = store.item_type(item) else {
                continue;
            };
            let group_id = itype.group_id;
            let quantity = self.group_items.get(&group_id).map_or(0, HashSet::len);
            let Ok(max_allowed) = calc.attr_value(store, item, attrs::MAX_GROUP_FITTED) else {
                continue;
            };
            if quantity as f64 > max_allowed {
                tainted.insert(
                    item,
                    RestrictionErrorData::MaxGroup {
                        group_id,
                        quantity,
                        max_allowed,
                    },
                );
            }
        }
        tainted
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.restricted.contains(&item)
            || self.group_items.values().any(|members| members.contains(&item))
    }
}
