//! Purpose: Shared core library crate used by the `abilite` CLI and tests.
//! Exports: `api` (client, schema, marshaling, errors) and `core` internals.
//! Role: Internal library backing the binary; stable surface lives in `api`.
//! Invariants: Byte-level codec work stays behind the `api::Codec` seam.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub(crate) mod json;
