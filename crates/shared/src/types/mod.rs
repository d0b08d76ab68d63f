//! Common types used across the application.

pub mod id;
pub mod opaque;
pub mod pagination;

pub use id::*;
pub use opaque::{Base64IdCodec, IdCodec, IdCodecError, PlainIdCodec, codec_for};
pub use pagination::{PageMeta, PageRequest, PageResponse};
