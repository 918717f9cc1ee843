//! Serde helpers for backend payloads.

use serde::{Deserialize, Deserializer};

/// Read an explicit `null` the same way as a missing field.
///
/// The backend serializes absent inventory and prices as `null`; pair this
/// with `#[serde(default)]` so both shapes land on the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
