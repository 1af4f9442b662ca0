//! Identifier newtypes and well-known dataset ids.
//!
//! All static-data entities are referenced by numeric id. The newtypes keep
//! the id spaces apart at compile time; the `attrs`/`effects` modules pin the
//! handful of ids the engine itself needs to know about (resource outputs,
//! skill-requirement pairs, slot counts), using the values found in the
//! canonical dataset dumps so real dumps stay loadable.

use core::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

id_newtype!(
    /// Identifier of an item type.
    TypeId
);
id_newtype!(
    /// Identifier of a type group.
    GroupId
);
id_newtype!(
    /// Identifier of a type category.
    CategoryId
);
id_newtype!(
    /// Identifier of an attribute.
    AttrId
);
id_newtype!(
    /// Identifier of an effect.
    EffectId
);
id_newtype!(
    /// Identifier of an expression node.
    ExprId
);
id_newtype!(
    /// Identifier of a fighter ability.
    AbilityId
);

/// Well-known attribute ids used by the engine, restrictions and stats.
pub mod attrs {
    use super::AttrId;

    // Resources
    pub const CPU: AttrId = AttrId(50);
    pub const CPU_OUTPUT: AttrId = AttrId(48);
    pub const POWER: AttrId = AttrId(30);
    pub const POWER_OUTPUT: AttrId = AttrId(11);
    pub const UPGRADE_COST: AttrId = AttrId(1153);
    pub const UPGRADE_CAPACITY: AttrId = AttrId(1132);
    pub const DRONE_BANDWIDTH: AttrId = AttrId(1271);
    pub const DRONE_BANDWIDTH_USED: AttrId = AttrId(1272);

    // Slots
    pub const HI_SLOTS: AttrId = AttrId(14);
    pub const MED_SLOTS: AttrId = AttrId(13);
    pub const LOW_SLOTS: AttrId = AttrId(12);
    pub const RIG_SLOTS: AttrId = AttrId(1137);
    pub const MAX_SUBSYSTEMS: AttrId = AttrId(1367);
    pub const TURRET_SLOTS_LEFT: AttrId = AttrId(102);
    pub const LAUNCHER_SLOTS_LEFT: AttrId = AttrId(101);

    // Tanking
    pub const HP: AttrId = AttrId(9);
    pub const ARMOR_HP: AttrId = AttrId(265);
    pub const SHIELD_CAPACITY: AttrId = AttrId(263);
    pub const EM_DMG_RESONANCE: AttrId = AttrId(113);
    pub const THERMAL_DMG_RESONANCE: AttrId = AttrId(110);
    pub const KINETIC_DMG_RESONANCE: AttrId = AttrId(109);
    pub const EXPLOSIVE_DMG_RESONANCE: AttrId = AttrId(111);
    pub const ARMOR_EM_DMG_RESONANCE: AttrId = AttrId(267);
    pub const ARMOR_THERMAL_DMG_RESONANCE: AttrId = AttrId(270);
    pub const ARMOR_KINETIC_DMG_RESONANCE: AttrId = AttrId(269);
    pub const ARMOR_EXPLOSIVE_DMG_RESONANCE: AttrId = AttrId(268);
    pub const SHIELD_EM_DMG_RESONANCE: AttrId = AttrId(271);
    pub const SHIELD_THERMAL_DMG_RESONANCE: AttrId = AttrId(274);
    pub const SHIELD_KINETIC_DMG_RESONANCE: AttrId = AttrId(273);
    pub const SHIELD_EXPLOSIVE_DMG_RESONANCE: AttrId = AttrId(272);

    // Damage
    pub const EM_DMG: AttrId = AttrId(114);
    pub const THERMAL_DMG: AttrId = AttrId(118);
    pub const KINETIC_DMG: AttrId = AttrId(117);
    pub const EXPLOSIVE_DMG: AttrId = AttrId(116);
    pub const DMG_MULTIPLIER: AttrId = AttrId(64);

    // Charges
    pub const CHARGE_SIZE: AttrId = AttrId(128);

    // Skill requirements; the six type/level attribute pairs collapse into
    // the required-skills map on the item type.
    pub const REQUIRED_SKILL_1: AttrId = AttrId(182);
    pub const REQUIRED_SKILL_1_LEVEL: AttrId = AttrId(277);
    pub const REQUIRED_SKILL_2: AttrId = AttrId(183);
    pub const REQUIRED_SKILL_2_LEVEL: AttrId = AttrId(278);
    pub const REQUIRED_SKILL_3: AttrId = AttrId(184);
    pub const REQUIRED_SKILL_3_LEVEL: AttrId = AttrId(279);
    pub const REQUIRED_SKILL_4: AttrId = AttrId(1285);
    pub const REQUIRED_SKILL_4_LEVEL: AttrId = AttrId(1286);
    pub const REQUIRED_SKILL_5: AttrId = AttrId(1289);
    pub const REQUIRED_SKILL_5_LEVEL: AttrId = AttrId(1287);
    pub const REQUIRED_SKILL_6: AttrId = AttrId(1290);
    pub const REQUIRED_SKILL_6_LEVEL: AttrId = AttrId(1288);
    pub const SKILL_LEVEL: AttrId = AttrId(280);

    // Fitting restrictions
    pub const MAX_GROUP_FITTED: AttrId = AttrId(1544);
}

/// Well-known effect ids.
pub mod effects {
    use super::EffectId;

    pub const HI_POWER: EffectId = EffectId(12);
    pub const MED_POWER: EffectId = EffectId(13);
    pub const LO_POWER: EffectId = EffectId(11);
    pub const RIG_SLOT: EffectId = EffectId(2663);
    pub const SUBSYSTEM: EffectId = EffectId(3772);
    pub const ONLINE: EffectId = EffectId(16);
    pub const TURRET_FITTED: EffectId = EffectId(42);
    pub const LAUNCHER_FITTED: EffectId = EffectId(40);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_spaces_are_distinct_types() {
        let t = TypeId(7);
        let a = AttrId(7);
        assert_eq!(t.0, a.0);
        assert_eq!(format!("{t}"), "7");
    }
}
