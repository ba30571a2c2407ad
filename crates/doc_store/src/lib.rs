//! Schemaless document collections for MedVision.
//!
//! Collections are JSON arrays persisted whole into the key-value
//! substrate under `table:<name>`. Every operation loads the full
//! collection, works on the in-memory snapshot, and writes the whole
//! collection back; there is no indexing and no partial update.

mod error;
mod query;
mod store;

pub use error::*;
pub use query::*;
pub use store::*;

use serde_json::{Map, Value};

/// A schemaless document stored in a named collection.
pub type Document = Map<String, Value>;

/// Generated unique id field.
pub const FIELD_ID: &str = "id";

/// Generated creation timestamp field (RFC 3339 UTC).
pub const FIELD_CREATED_AT: &str = "created_at";
