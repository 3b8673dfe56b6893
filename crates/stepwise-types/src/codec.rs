//! Per-type codec: how one step's value crosses into and out of the
//! session's string storage.
//!
//! Codecs are attached explicitly to each workflow node at definition
//! time -- there is no ambient/global lookup. `Codec::json` covers the
//! common case of any serde-serializable value; `Codec::new` lets a step
//! supply a bespoke pair (compact formats, legacy encodings).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A stored session value failed to parse under the expected codec.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Encode/decode pair converting a step's value type to/from the session's
/// string storage. Cheap to clone; both halves are shared closures.
pub struct Codec<A> {
    encode: Arc<dyn Fn(&A) -> String + Send + Sync>,
    decode: Arc<dyn Fn(&str) -> Result<A, DecodeError> + Send + Sync>,
}

impl<A> Codec<A> {
    /// Build a codec from an explicit encode/decode pair.
    pub fn new(
        encode: impl Fn(&A) -> String + Send + Sync + 'static,
        decode: impl Fn(&str) -> Result<A, DecodeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Serialize a value for session storage.
    pub fn encode(&self, value: &A) -> String {
        (self.encode)(value)
    }

    /// Parse a stored session string back into the value type.
    pub fn decode(&self, raw: &str) -> Result<A, DecodeError> {
        (self.decode)(raw)
    }
}

impl<A> Codec<A>
where
    A: Serialize + DeserializeOwned,
{
    /// JSON codec for any serde-serializable value type.
    pub fn json() -> Self {
        Self::new(
            |value: &A| serde_json::to_string(value).unwrap_or_default(),
            |raw| serde_json::from_str(raw).map_err(|e| DecodeError(e.to_string())),
        )
    }
}

impl<A> Clone for Codec<A> {
    fn clone(&self) -> Self {
        Self {
            encode: self.encode.clone(),
            decode: self.decode.clone(),
        }
    }
}

impl<A> fmt::Debug for Codec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Codec")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_codec_roundtrip_string() {
        let codec: Codec<String> = Codec::json();
        let encoded = codec.encode(&"Alice".to_string());
        assert_eq!(codec.decode(&encoded).unwrap(), "Alice");
    }

    #[test]
    fn test_json_codec_roundtrip_struct() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Answer {
            text: String,
            score: u32,
        }

        let codec: Codec<Answer> = Codec::json();
        let value = Answer {
            text: "ok".to_string(),
            score: 7,
        };
        assert_eq!(codec.decode(&codec.encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_json_codec_rejects_malformed_input() {
        let codec: Codec<u32> = Codec::json();
        let err = codec.decode("not a number").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_custom_codec_pair() {
        // Plain-text codec for u32, no JSON quoting.
        let codec = Codec::new(
            |n: &u32| n.to_string(),
            |raw| raw.parse::<u32>().map_err(|e| DecodeError(e.to_string())),
        );
        assert_eq!(codec.encode(&30), "30");
        assert_eq!(codec.decode("30").unwrap(), 30);
        assert!(codec.decode("thirty").is_err());
    }
}
