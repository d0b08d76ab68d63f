//! Opaque identifiers exposed to clients.
//!
//! Internal UUIDs never appear in request paths directly; the boundary
//! decodes tokens back into UUIDs before anything reaches the payment engine.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced while decoding an opaque identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdCodecError {
    /// The token is not valid for this codec.
    #[error("malformed identifier: {0}")]
    Malformed(String),
}

/// Converts internal UUIDs to client-facing tokens and back.
pub trait IdCodec: Send + Sync {
    /// Encodes a UUID into a token.
    fn encode(&self, id: Uuid) -> String;

    /// Decodes a token into a UUID.
    fn decode(&self, token: &str) -> Result<Uuid, IdCodecError>;
}

/// URL-safe base64 of the 16 UUID bytes (22 characters, no padding).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64IdCodec;

impl IdCodec for Base64IdCodec {
    fn encode(&self, id: Uuid) -> String {
        base64_url::encode(id.as_bytes())
    }

    fn decode(&self, token: &str) -> Result<Uuid, IdCodecError> {
        let bytes =
            base64_url::decode(token).map_err(|_| IdCodecError::Malformed(token.to_string()))?;
        Uuid::from_slice(&bytes).map_err(|_| IdCodecError::Malformed(token.to_string()))
    }
}

/// Hyphenated UUID strings, for deployments that do not hide identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainIdCodec;

impl IdCodec for PlainIdCodec {
    fn encode(&self, id: Uuid) -> String {
        id.to_string()
    }

    fn decode(&self, token: &str) -> Result<Uuid, IdCodecError> {
        Uuid::parse_str(token).map_err(|_| IdCodecError::Malformed(token.to_string()))
    }
}

/// Returns the codec selected by configuration.
#[must_use]
pub fn codec_for(opaque: bool) -> Box<dyn IdCodec> {
    if opaque {
        Box::new(Base64IdCodec)
    } else {
        Box::new(PlainIdCodec)
    }
}
