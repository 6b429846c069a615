//! Domain models for interactions, connections and the profile cache

pub mod connection;
pub mod interaction;
pub mod profile;

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

pub use connection::{Connection, ConnectionRecord};
pub use interaction::{
    InteractionContext, InteractionRecord, InteractionsResponse, InteractionsResult,
    LocaleParameters, ParameterEntry,
};
pub use profile::ProfileCache;

/// Parameter values keyed by parameter id
pub type ParameterMap = HashMap<String, Vec<String>>;

/// Convert `[{id, value}]` parameter entries into a map; a repeated id
/// replaces the values of the earlier entry.
pub fn parameters_to_map(entries: &[ParameterEntry]) -> ParameterMap {
    entries
        .iter()
        .map(|entry| (entry.id.clone(), entry.value.clone()))
        .collect()
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
