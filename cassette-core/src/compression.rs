//! Compression hook for negotiated frame-body compression.

use crate::error::Result;

/// Collaborator that inflates compressed response bodies.
///
/// The core performs no compression itself: when an implementation is
/// injected, its [`algorithm`](Decompressor::algorithm) name is offered
/// in STARTUP, and response bodies carrying the compressed flag are
/// passed through [`decompress`](Decompressor::decompress) before any
/// further decoding. Without one, a compressed frame is a protocol
/// error.
pub trait Decompressor {
    /// The algorithm name offered in the STARTUP option map.
    fn algorithm(&self) -> &str;

    /// Inflates one compressed frame body.
    fn decompress(&self, body: &[u8]) -> Result<Vec<u8>>;
}
