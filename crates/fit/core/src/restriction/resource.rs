//! Shared-resource restrictions (cpu, powergrid, calibration, bandwidth).

use std::collections::HashMap;

use fit_data::AttrId;

use crate::calc::CalcService;
use crate::item::ItemId;
use crate::msg::Message;
use crate::store::ItemStore;

use super::{RestrictionErrorData, RestrictionKind};

/// Consumers must not collectively exceed the ship's resource output.
///
/// Membership is keyed on the consumer's type declaring the use attribute;
/// the consumed amounts and the output are read as modified values at
/// validation time.
pub(crate) struct ResourceRegister {
    pub kind: RestrictionKind,
    output_attr: AttrId,
    use_attr: AttrId,
    users: Vec<ItemId>,
}

impl ResourceRegister {
    pub fn new(kind: RestrictionKind, output_attr: AttrId, use_attr: AttrId) -> Self {
        Self {
            kind,
            output_attr,
            use_attr,
            users: Vec::new(),
        }
    }

    fn tracks(&self, store: &ItemStore, item: ItemId) -> bool {
        store
            .item_type(item)
            .is_some_and(|t| t.attr(self.use_attr).is_some())
    }

    pub fn notify(&mut self, store: &ItemStore, msg: &Message) {
        match msg {
            Message::ItemAdded(item) => {
                if self.tracks(store, *item) {
                    self.users.push(*item);
                }
            }
            Message::ItemRemoved(item) => self.users.retain(|other| other != item),
            Message::SourceChanged => {
                // Type data changed under us; rebuild membership.
                self.users.clear();
                let ids: Vec<ItemId> = store.ids().collect();
                for id in ids {
                    if self.tracks(store, id) {
                        self.users.push(id);
                    }
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
        let output = store
            .ship
            .and_then(|ship| calc.attr_value(store, ship, self.output_attr).ok())
            .unwrap_or(0.0);

        let mut uses: Vec<(ItemId, f64)> = Vec::new();
        for user in &self.users {
            if let Ok(value) = calc.attr_value(store, *user, self.use_attr) {
                uses.push((*user, value));
            }
        }
        let total_use: f64 = uses.iter().map(|(_, v)| v).sum();
        if total_use > output {
            for (item, item_use) in uses {
                tainted.insert(
                    item,
                    RestrictionErrorData::Resource {
                        total_use,
                        output,
                        item_use,
                    },
                );
            }
        }
        tainted
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.users.contains(&item)
    }
}
