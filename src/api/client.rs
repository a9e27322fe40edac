//! Purpose: Tie the registry, marshaling engine, and external codec together.
//! Exports: `AbiClient`.
//! Role: Wire adapter; normalizes the hex prefix and contextualizes codec failures.
//! Invariants: Hex returned from encode always carries the `0x` prefix.
//! Invariants: Decode forwards hex to the codec exactly as received.
//! Invariants: The schema is registered with the codec once, at construction.
#![allow(clippy::result_large_err)]

use crate::core::codec::{Codec, CodecSession};
use crate::core::error::Error;
use crate::core::marshal::{deserialize, serialize};
use crate::core::schema::Abi;
use crate::core::value::{FlatValue, Value};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

/// Schema-driven encode/decode over an external codec.
///
/// Holds no mutable state; one client may serve concurrent calls as long as
/// the codec tolerates a shared session.
pub struct AbiClient {
    abi: Abi,
    codec: Arc<dyn Codec>,
    session: CodecSession,
}

impl AbiClient {
    pub fn new(document: &str, codec: Arc<dyn Codec>) -> Result<Self, Error> {
        let abi = Abi::from_json(document)?;
        let session = codec.register(abi.document())?;
        debug!(
            methods = abi.methods().len(),
            session = session.id(),
            "registered abi with codec"
        );
        Ok(Self {
            abi,
            codec,
            session,
        })
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// Serialize structured inputs and encode them; returns `0x`-prefixed hex.
    pub fn encode_input(&self, method: &str, values: &[Value]) -> Result<String, Error> {
        let found = self.abi.method(method)?;
        let args = serialize(&found.inputs, values).map_err(|err| err.with_method(method))?;
        debug!(method, args = args.len(), "encoding input");
        match self.codec.encode_input(self.session, method, &args) {
            Ok(raw) => Ok(format!("0x{raw}")),
            Err(err) => Err(wrap_codec_failure(err, method, values, &args)),
        }
    }

    /// Decode a calldata payload back into structured input values.
    pub fn decode_input(&self, method: &str, data: &str) -> Result<Value, Error> {
        let found = self.abi.method(method)?;
        let flats = self
            .codec
            .decode_input(self.session, method, data)
            .map_err(|err| err.with_method(method))?;
        deserialize(&found.inputs, &flats).map_err(|err| err.with_method(method))
    }

    /// Decode a return payload into structured output values.
    pub fn decode_output(&self, method: &str, data: &str) -> Result<Value, Error> {
        let found = self.abi.method(method)?;
        let flats = self
            .codec
            .decode_output(self.session, method, data)
            .map_err(|err| err.with_method(method))?;
        deserialize(&found.outputs, &flats).map_err(|err| err.with_method(method))
    }
}

/// Re-raise a codec failure with the original structured values and the
/// derived flat arguments attached, to aid debugging of malformed inputs.
fn wrap_codec_failure(err: Error, method: &str, values: &[Value], args: &[FlatValue]) -> Error {
    let values_json = JsonValue::Array(values.iter().map(Value::to_json).collect());
    let args_json = JsonValue::Array(args.iter().map(FlatValue::to_json).collect());
    err.with_method(method)
        .with_hint(format!("values={values_json}\nargs={args_json}"))
}

#[cfg(test)]
mod tests {
    use super::AbiClient;
    use crate::core::codec::{Codec, CodecSession};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::value::{FlatValue, Value};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    const DOC: &str = r#"[{
        "name":"transfer",
        "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
        "outputs":[{"name":"","type":"bool"}]
    }]"#;

    /// Records registrations and echoes deterministic payloads.
    struct RecordingCodec {
        registrations: AtomicU64,
    }

    impl RecordingCodec {
        fn new() -> Self {
            Self {
                registrations: AtomicU64::new(0),
            }
        }
    }

    impl Codec for RecordingCodec {
        fn register(&self, document: &str) -> Result<CodecSession, Error> {
            assert!(document.contains("transfer"));
            let id = self.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(CodecSession::new(id + 7))
        }

        fn encode_input(
            &self,
            session: CodecSession,
            method: &str,
            args: &[FlatValue],
        ) -> Result<String, Error> {
            assert_eq!(session.id(), 7);
            assert_eq!(method, "transfer");
            Ok(format!("{:02x}", args.len()))
        }

        fn decode_input(
            &self,
            session: CodecSession,
            _method: &str,
            data: &str,
        ) -> Result<Vec<FlatValue>, Error> {
            assert_eq!(session.id(), 7);
            assert!(data.starts_with("0x"), "decode receives prefixed hex");
            Ok(vec![FlatValue::text("0xAAAA"), FlatValue::text("5")])
        }

        fn decode_output(
            &self,
            session: CodecSession,
            _method: &str,
            _data: &str,
        ) -> Result<Vec<FlatValue>, Error> {
            assert_eq!(session.id(), 7);
            Ok(vec![FlatValue::Bool(true)])
        }
    }

    struct RejectingCodec;

    impl Codec for RejectingCodec {
        fn register(&self, _document: &str) -> Result<CodecSession, Error> {
            Ok(CodecSession::new(1))
        }

        fn encode_input(
            &self,
            _session: CodecSession,
            _method: &str,
            _args: &[FlatValue],
        ) -> Result<String, Error> {
            Err(Error::new(ErrorKind::Codec).with_message("layout rejected the arguments"))
        }

        fn decode_input(
            &self,
            _session: CodecSession,
            _method: &str,
            _data: &str,
        ) -> Result<Vec<FlatValue>, Error> {
            Err(Error::new(ErrorKind::Codec).with_message("bad payload"))
        }

        fn decode_output(
            &self,
            _session: CodecSession,
            _method: &str,
            _data: &str,
        ) -> Result<Vec<FlatValue>, Error> {
            Err(Error::new(ErrorKind::Codec).with_message("bad payload"))
        }
    }

    #[test]
    fn registers_once_and_threads_the_session() {
        let codec = Arc::new(RecordingCodec::new());
        let client = AbiClient::new(DOC, codec.clone()).expect("client");
        assert_eq!(codec.registrations.load(Ordering::SeqCst), 1);

        let hex = client
            .encode_input("transfer", &[Value::from("0xAAAA"), Value::from(5u64)])
            .expect("encode");
        assert_eq!(hex, "0x02");
        assert_eq!(codec.registrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn decode_paths_pick_the_right_parameter_list() {
        let client = AbiClient::new(DOC, Arc::new(RecordingCodec::new())).expect("client");

        let inputs = client.decode_input("transfer", "0xfeed").expect("inputs");
        assert_eq!(
            inputs,
            Value::Seq(vec![Value::from("0xAAAA"), Value::from(5u64)])
        );

        // Single output parameter comes back bare.
        let output = client.decode_output("transfer", "0xfeed").expect("output");
        assert_eq!(output, Value::Bool(true));
    }

    #[test]
    fn unknown_method_fails_before_reaching_the_codec() {
        let client = AbiClient::new(DOC, Arc::new(RecordingCodec::new())).expect("client");
        let err = client.encode_input("absent", &[]).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MethodNotFound);
    }

    #[test]
    fn codec_failure_carries_values_and_flat_args() {
        let client = AbiClient::new(DOC, Arc::new(RejectingCodec)).expect("client");
        let err = client
            .encode_input("transfer", &[Value::from("0xAAAA"), Value::from(5u64)])
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(err.method(), Some("transfer"));
        let hint = err.hint().expect("hint");
        assert!(hint.contains(r#"values=["0xAAAA","5"]"#));
        assert!(hint.contains(r#"args=["0xAAAA","5"]"#));
    }

    #[test]
    fn marshal_failures_name_the_method() {
        let client = AbiClient::new(DOC, Arc::new(RecordingCodec::new())).expect("client");
        let err = client
            .encode_input("transfer", &[Value::from("0xAAAA")])
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::ArityMismatch);
        assert_eq!(err.method(), Some("transfer"));
    }
}
