//! Attribute metadata.

use crate::defs::AttrId;

/// Static metadata of one attribute.
///
/// Attribute metadata governs how modified values are computed: whether
/// multiple multiplicative modifiers stack freely or are penalized, which
/// direction counts as an improvement, and what base value to assume when an
/// item type does not carry one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub id: AttrId,
    /// When false, same-direction multiplicative modifiers are subject to
    /// the diminishing-returns stacking penalty.
    pub stackable: bool,
    /// When true, higher values are better; used to classify penalized
    /// modifiers as bonuses or penalties.
    pub high_is_good: bool,
    /// Fallback base value used when the item type defines none.
    pub default_value: Option<f64>,
}

impl Attribute {
    pub fn new(
        id: AttrId,
        stackable: bool,
        high_is_good: bool,
        default_value: Option<f64>,
    ) -> Self {
        Self {
            id,
            stackable,
            high_is_good,
            default_value,
        }
    }
}
