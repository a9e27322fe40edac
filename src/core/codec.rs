//! Purpose: Define the seam to the external binary codec.
//! Exports: `Codec`, `CodecSession`.
//! Role: Opaque boundary; all byte-level layout work lives behind this trait.
//! Invariants: Registration happens once per client; calls thread the session.
//! Invariants: Encode returns raw hex without prefix; decode receives it prefixed.
#![allow(clippy::result_large_err)]

use crate::core::error::Error;
use crate::core::value::FlatValue;

/// Opaque handle issued by [`Codec::register`] and threaded through every
/// subsequent call, so implementations need no global lookup tables.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CodecSession(u64);

impl CodecSession {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// The external codec contract.
///
/// Implementations must be safe for concurrent calls against a shared handle;
/// this layer adds no locking of its own.
pub trait Codec: Send + Sync {
    /// One-time registration of the raw schema document, so the codec can
    /// prepare its own per-method binary layout.
    fn register(&self, document: &str) -> Result<CodecSession, Error>;

    /// Encode flat arguments for a method call; returns raw hex, no prefix.
    fn encode_input(
        &self,
        session: CodecSession,
        method: &str,
        args: &[FlatValue],
    ) -> Result<String, Error>;

    /// Decode a `0x`-prefixed calldata payload into flat input values.
    fn decode_input(
        &self,
        session: CodecSession,
        method: &str,
        data: &str,
    ) -> Result<Vec<FlatValue>, Error>;

    /// Decode a `0x`-prefixed return payload into flat output values.
    fn decode_output(
        &self,
        session: CodecSession,
        method: &str,
        data: &str,
    ) -> Result<Vec<FlatValue>, Error>;
}
