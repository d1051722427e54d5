//! The token endpoint reports `expires_in` either as a bare integer or as an
//! integer wrapped in a string, depending on which backend answered.
//!
//! Use with `#[serde(with = "crate::codec::expires_in")]`.

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

pub fn serialize<S>(seconds: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(*seconds)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ExpiresInVisitor)
}

struct ExpiresInVisitor;

impl<'de> Visitor<'de> for ExpiresInVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer number of seconds, or a string containing one")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
        value
            .parse::<i64>()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    // Anything else (floats, booleans, null) falls through to the default
    // `invalid_type` rejection.
}
