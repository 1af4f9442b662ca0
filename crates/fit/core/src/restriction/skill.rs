//! Skill-requirement checks.

use std::collections::HashMap;

use crate::item::ItemId;
use crate::msg::Message;
use crate::store::ItemStore;

use super::{MissingSkill, RestrictionErrorData};

/// Every fitted item's required skills must be present at sufficient level.
pub(crate) struct SkillRegister {
    tracked: Vec<ItemId>,
}

impl SkillRegister {
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
        }
    }

    fn tracks(&self, store: &ItemStore, item: ItemId) -> bool {
        store
            .item_type(item)
            .is_some_and(|t| !t.required_skills().is_empty())
    }

    pub fn notify(&mut self, store: &ItemStore, msg: &Message) {
        match msg {
            Message::ItemAdded(item) => {
                if self.tracks(store, *item) {
                    self.tracked.push(*item);
                }
            }
            Message::ItemRemoved(item) => self.tracked.retain(|other| other != item),
            Message::SourceChanged => {
                self.tracked.clear();
                let ids: Vec<ItemId> = store.ids().collect();
                for id in ids {
                    if self.tracks(store, id) {
                        self.tracked.push(id);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn validate(&self, store: &mut ItemStore) -> HashMap<ItemId, RestrictionErrorData> {
        let mut tainted = HashMap::new();
        for item in &self.tracked {
            let Some(itype) = store.item_type(*item) else {
                continue;
            };
            let mut missing: Vec<MissingSkill> = itype
                .required_skills()
                .iter()
                .filter_map(|(skill_type_id, required_level)| {
                    let fitted_level = store.skill_level(*skill_type_id);
                    if fitted_level.is_some_and(|lvl| lvl >= *required_level) {
                        None
                    } else {
                        Some(MissingSkill {
                            skill_type_id: *skill_type_id,
                            required_level: *required_level,
                            fitted_level,
                        })
                    }
                })
                .collect();
            if !missing.is_empty() {
                missing.sort_by_key(|m| m.skill_type_id);
                tainted.insert(*item, RestrictionErrorData::SkillRequirement { missing });
            }
        }
        tainted
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.tracked.contains(&item)
    }
}
