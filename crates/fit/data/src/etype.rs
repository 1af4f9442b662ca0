//! Item types: immutable per-source static metadata.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::defs::{attrs, AbilityId, AttrId, CategoryId, EffectId, GroupId, TypeId};
use crate::effect::EffectRef;
use crate::state::State;

/// One fighter-squadron ability of a type.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FighterAbility {
    pub cooldown_time: Option<f64>,
    pub charge_quantity: Option<u32>,
    pub rearm_time: Option<f64>,
}

/// The six attribute pairs declaring a type's skill requirements.
const SKILLRQ_ATTRS: [(AttrId, AttrId); 6] = [
    (attrs::REQUIRED_SKILL_1, attrs::REQUIRED_SKILL_1_LEVEL),
    (attrs::REQUIRED_SKILL_2, attrs::REQUIRED_SKILL_2_LEVEL),
    (attrs::REQUIRED_SKILL_3, attrs::REQUIRED_SKILL_3_LEVEL),
    (attrs::REQUIRED_SKILL_4, attrs::REQUIRED_SKILL_4_LEVEL),
    (attrs::REQUIRED_SKILL_5, attrs::REQUIRED_SKILL_5_LEVEL),
    (attrs::REQUIRED_SKILL_6, attrs::REQUIRED_SKILL_6_LEVEL),
];

/// Immutable metadata of one item type.
///
/// Constructed once per id per data source and shared by reference across
/// all items using it; never mutated after construction. Derived views
/// (required skills, maximum state) are computed once on first access.
#[derive(Debug)]
pub struct ItemType {
    pub id: TypeId,
    pub group_id: GroupId,
    pub category_id: CategoryId,
    attrs: HashMap<AttrId, f64>,
    effects: Vec<EffectRef>,
    default_effect: Option<EffectRef>,
    fighter_abilities: HashMap<AbilityId, FighterAbility>,
    required_skills: OnceLock<HashMap<TypeId, u32>>,
    max_state: OnceLock<State>,
}

impl ItemType {
    pub fn new(
        id: TypeId,
        group_id: GroupId,
        category_id: CategoryId,
        attrs: HashMap<AttrId, f64>,
        effects: Vec<EffectRef>,
        default_effect: Option<EffectRef>,
        fighter_abilities: HashMap<AbilityId, FighterAbility>,
    ) -> Self {
        Self {
            id,
            group_id,
            category_id,
            attrs,
            effects,
            default_effect,
            fighter_abilities,
            required_skills: OnceLock::new(),
            max_state: OnceLock::new(),
        }
    }

    /// Base value of an attribute, if the type defines one.
    pub fn attr(&self, id: AttrId) -> Option<f64> {
        self.attrs.get(&id).copied()
    }

    pub fn attrs(&self) -> &HashMap<AttrId, f64> {
        &self.attrs
    }

    pub fn effects(&self) -> &[EffectRef] {
        &self.effects
    }

    pub fn effect(&self, id: EffectId) -> Option<&EffectRef> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn has_effect(&self, id: EffectId) -> bool {
        self.effect(id).is_some()
    }

    pub fn default_effect(&self) -> Option<&EffectRef> {
        self.default_effect.as_ref()
    }

    pub fn fighter_abilities(&self) -> &HashMap<AbilityId, FighterAbility> {
        &self.fighter_abilities
    }

    /// Skill requirements of this type, as skill type id to required level.
    ///
    /// Collapsed from the six skill-type/skill-level attribute pairs; a pair
    /// missing either half is skipped.
    pub fn required_skills(&self) -> &HashMap<TypeId, u32> {
        self.required_skills.get_or_init(|| {
            let mut skills = HashMap::new();
            for (type_attr, level_attr) in SKILLRQ_ATTRS {
                let Some(skill_type) = self.attrs.get(&type_attr) else {
                    continue;
                };
                let Some(level) = self.attrs.get(&level_attr) else {
                    continue;
                };
                skills.insert(TypeId(*skill_type as u32), *level as u32);
            }
            skills
        })
    }

    /// Whether this type declares a requirement on the given skill.
    pub fn requires_skill(&self, skill: TypeId) -> bool {
        self.required_skills().contains_key(&skill)
    }

    /// Highest state any of this type's effects permits.
    ///
    /// Every type can be at least offline, even with no effects at all.
    pub fn max_state(&self) -> State {
        *self.max_state.get_or_init(|| {
            self.effects
                .iter()
                .map(|e| e.activation_state())
                .fold(State::Offline, State::max)
        })
    }
}

/// Shared handle to an item type.
pub type ItemTypeRef = Arc<ItemType>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use crate::state::EffectCategory;

    fn mktype(attrs: HashMap<AttrId, f64>, effects: Vec<EffectRef>) -> ItemType {
        ItemType::new(
            TypeId(1),
            GroupId(1),
            CategoryId(1),
            attrs,
            effects,
            None,
            HashMap::new(),
        )
    }

    #[test]
    fn required_skills_collapse_pairs() {
        let mut attrs = HashMap::new();
        attrs.insert(attrs::REQUIRED_SKILL_1, 3300.0);
        attrs.insert(attrs::REQUIRED_SKILL_1_LEVEL, 4.0);
        // Half a pair: level without skill type, must be ignored.
        attrs.insert(attrs::REQUIRED_SKILL_2_LEVEL, 5.0);
        attrs.insert(attrs::REQUIRED_SKILL_3, 3301.0);
        attrs.insert(attrs::REQUIRED_SKILL_3_LEVEL, 1.0);
        let t = mktype(attrs, Vec::new());

        let skills = t.required_skills();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills.get(&TypeId(3300)), Some(&4));
        assert_eq!(skills.get(&TypeId(3301)), Some(&1));
        assert!(t.requires_skill(TypeId(3300)));
        assert!(!t.requires_skill(TypeId(9999)));
    }

    #[test]
    fn max_state_is_highest_effect_state() {
        let t = mktype(HashMap::new(), Vec::new());
        assert_eq!(t.max_state(), State::Offline);

        let effects = vec![
            Arc::new(Effect::new(EffectId(1), EffectCategory::Passive)),
            Arc::new(Effect::new(EffectId(2), EffectCategory::Active)),
            Arc::new(Effect::new(EffectId(3), EffectCategory::Online)),
        ];
        let t = mktype(HashMap::new(), effects);
        assert_eq!(t.max_state(), State::Active);
    }
}
