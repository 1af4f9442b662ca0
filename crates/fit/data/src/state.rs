//! Item states and effect categories.

use strum::{Display, EnumIter};

/// Operational state of a fitted item.
///
/// States are strictly ordered: every state implies all states below it, so
/// an `Active` module is also considered online. Effects declare the minimum
/// state at which they run via their category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    #[default]
    Offline,
    Online,
    Active,
    Overload,
}

/// Category of an effect, as declared by the dataset.
///
/// The category decides when an effect runs and what kind of effect it is
/// (always-on, cycling, targeted, area-of-effect, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    Passive,
    Active,
    Target,
    Area,
    Online,
    Overload,
    Dungeon,
    System,
}

impl EffectCategory {
    /// Decodes the raw dataset category id.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Passive),
            1 => Some(Self::Active),
            2 => Some(Self::Target),
            3 => Some(Self::Area),
            4 => Some(Self::Online),
            5 => Some(Self::Overload),
            6 => Some(Self::Dungeon),
            7 => Some(Self::System),
            _ => None,
        }
    }

    /// Minimum item state at which effects of this category run.
    pub fn activation_state(self) -> State {
        match self {
            Self::Passive | Self::Area | Self::Dungeon | Self::System => State::Offline,
            Self::Online => State::Online,
            Self::Active | Self::Target => State::Active,
            Self::Overload => State::Overload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered() {
        assert!(State::Offline < State::Online);
        assert!(State::Online < State::Active);
        assert!(State::Active < State::Overload);
    }

    #[test]
    fn passive_effects_run_from_offline() {
        assert_eq!(EffectCategory::Passive.activation_state(), State::Offline);
        assert_eq!(EffectCategory::Online.activation_state(), State::Online);
        assert_eq!(EffectCategory::Target.activation_state(), State::Active);
        assert_eq!(EffectCategory::Overload.activation_state(), State::Overload);
    }

    #[test]
    fn raw_category_roundtrip() {
        assert_eq!(EffectCategory::from_raw(0), Some(EffectCategory::Passive));
        assert_eq!(EffectCategory::from_raw(5), Some(EffectCategory::Overload));
        assert_eq!(EffectCategory::from_raw(42), None);
    }
}
