//! Serde helpers for fixed-size byte arrays written as hex strings, optionally `0x` prefixed.

use std::fmt;

use serde::{
    de::{Error, Visitor},
    Deserializer, Serializer,
};

pub fn serialize<const N: usize, S>(value: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(value))
}

struct HexVisitor<const N: usize>;
impl<'de, const N: usize> Visitor<'de> for HexVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a hex string of {N} bytes")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let digits = v.strip_prefix("0x").unwrap_or(v);
        let mut buf = [0u8; N];
        hex::decode_to_slice(digits, &mut buf).map_err(|e| E::custom(format!("{v}: {e}")))?;
        Ok(buf)
    }
}

pub fn deserialize<'de, const N: usize, D>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_str(HexVisitor::<N>)
}
