//! Purpose: Define the stable public Rust API boundary for abilite.
//! Exports: Client, schema, value, marshaling, codec, and error types.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path callers should depend on.
//! Invariants: Everything exported here is immutable after construction.

mod client;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::codec::{Codec, CodecSession};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::marshal::{deserialize, serialize};
pub use crate::core::schema::{Abi, BaseType, Method, Parameter, TypeExpr};
pub use crate::core::value::{FlatValue, Value};
pub use client::AbiClient;
