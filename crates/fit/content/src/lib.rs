//! JSON dataset loaders.
//!
//! Loads the static-data dump (type, attribute, effect and expression
//! tables) from JSON files into an in-memory [`DataHandler`] the engine can
//! resolve ids against. The dump format is externally authored and loosely
//! typed; this crate absorbs its quirks (string object keys, flags encoded
//! as 0/1, fields that are numbers or strings) so nothing downstream has to.

mod handler;
mod schema;

pub use handler::JsonDataHandler;
