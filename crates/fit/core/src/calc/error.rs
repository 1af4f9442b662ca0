//! Calculation errors.

use fit_data::{AttrId, SourceError};

use crate::item::ItemId;

/// Failure to resolve an attribute value.
///
/// Surfaced to the caller of the attribute accessor; consumers that can live
/// without the value (stats, restrictions) treat it as "unknown", never as
/// zero.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttrValueError {
    #[error("item {0} is not in this fit")]
    ItemNotFound(ItemId),

    #[error("no data source is set")]
    NoSource,

    #[error(transparent)]
    Source(#[from] SourceError),

    /// Neither a base value, a metadata default, nor an assigning modifier
    /// exists for the attribute.
    #[error("attribute {attr} cannot be resolved on item {item}")]
    Missing { item: ItemId, attr: AttrId },
}

/// A single modification whose source value could not be resolved.
///
/// Logged and skipped by the engine; never aborts resolution of the rest of
/// the target attribute's modifier set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("modification source value could not be resolved: {0}")]
pub struct ModificationError(#[from] pub AttrValueError);
