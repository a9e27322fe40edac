//! Purpose: Parse ABI schema documents and resolve methods by name.
//! Exports: `Abi`, `Method`, `Parameter`, `TypeExpr`, `BaseType`.
//! Role: Interface registry; owns the parsed type grammar driving marshaling.
//! Invariants: Type strings are parsed once at load; recursion never re-parses.
//! Invariants: Lookup returns the first descriptor with a matching name.
//! Notes: Document well-formedness beyond the type grammar is the codec's concern.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::json;
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BaseType {
    Uint(u16),
    Int(u16),
    Bool,
    Address,
    Bytes,
    FixedBytes(u8),
    String,
    Tuple,
}

/// A type expression parsed from the schema grammar `<baseToken>("[]")*`.
///
/// The array depth is counted once at load; peeling one level yields the
/// element expression without touching the original string again.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TypeExpr {
    base: BaseType,
    depth: usize,
}

impl TypeExpr {
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut token = source;
        let mut depth = 0usize;
        while let Some(stripped) = token.strip_suffix("[]") {
            token = stripped;
            depth += 1;
        }
        let base = parse_base_token(token, source)?;
        Ok(Self { base, depth })
    }

    pub fn base(&self) -> BaseType {
        self.base
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_array(&self) -> bool {
        self.depth > 0
    }

    pub fn is_tuple(&self) -> bool {
        self.depth == 0 && self.base == BaseType::Tuple
    }

    pub fn is_integer(&self) -> bool {
        self.depth == 0 && matches!(self.base, BaseType::Uint(_) | BaseType::Int(_))
    }

    /// The element expression with one array marker removed.
    pub fn element(&self) -> TypeExpr {
        debug_assert!(self.depth > 0, "element() on a non-array type");
        TypeExpr {
            base: self.base,
            depth: self.depth.saturating_sub(1),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            BaseType::Uint(bits) => write!(f, "uint{bits}")?,
            BaseType::Int(bits) => write!(f, "int{bits}")?,
            BaseType::Bool => write!(f, "bool")?,
            BaseType::Address => write!(f, "address")?,
            BaseType::Bytes => write!(f, "bytes")?,
            BaseType::FixedBytes(len) => write!(f, "bytes{len}")?,
            BaseType::String => write!(f, "string")?,
            BaseType::Tuple => write!(f, "tuple")?,
        }
        for _ in 0..self.depth {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

fn parse_base_token(token: &str, source: &str) -> Result<BaseType, Error> {
    match token {
        "bool" => return Ok(BaseType::Bool),
        "address" => return Ok(BaseType::Address),
        "string" => return Ok(BaseType::String),
        "bytes" => return Ok(BaseType::Bytes),
        "tuple" => return Ok(BaseType::Tuple),
        "uint" => return Ok(BaseType::Uint(256)),
        "int" => return Ok(BaseType::Int(256)),
        _ => {}
    }
    if let Some(digits) = token.strip_prefix("uint") {
        return parse_bits(digits, source).map(BaseType::Uint);
    }
    if let Some(digits) = token.strip_prefix("int") {
        return parse_bits(digits, source).map(BaseType::Int);
    }
    if let Some(digits) = token.strip_prefix("bytes") {
        let len: u8 = digits
            .parse()
            .ok()
            .filter(|len| (1..=32).contains(len))
            .ok_or_else(|| unsupported_type(source))?;
        return Ok(BaseType::FixedBytes(len));
    }
    Err(unsupported_type(source))
}

fn parse_bits(digits: &str, source: &str) -> Result<u16, Error> {
    digits
        .parse::<u16>()
        .ok()
        .filter(|bits| (8..=256).contains(bits) && bits % 8 == 0)
        .ok_or_else(|| unsupported_type(source))
}

fn unsupported_type(source: &str) -> Error {
    Error::new(ErrorKind::Schema).with_message(format!("unsupported type `{source}`"))
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeExpr,
    /// Populated only for tuple bases, in schema declaration order.
    pub components: Vec<Parameter>,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
}

/// The interface registry: an ordered method list resolved by name.
///
/// Immutable after construction. The raw document is retained verbatim so the
/// wire adapter can forward it to the external codec at registration.
#[derive(Clone, Debug)]
pub struct Abi {
    methods: Vec<Method>,
    document: String,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParameter>,
    #[serde(default)]
    outputs: Vec<RawParameter>,
}

#[derive(Deserialize)]
struct RawParameter {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    components: Vec<RawParameter>,
}

impl Abi {
    pub fn from_json(document: &str) -> Result<Self, Error> {
        let entries: Vec<RawEntry> = json::parse::from_str(document).map_err(|err| {
            Error::new(ErrorKind::Schema)
                .with_message("invalid abi document")
                .with_source(err)
        })?;

        let mut methods = Vec::new();
        for entry in entries {
            // Documents may interleave events, constructors, and fallbacks.
            if entry.kind.as_deref().is_some_and(|kind| kind != "function") {
                continue;
            }
            let Some(name) = entry.name else {
                continue;
            };
            methods.push(Method {
                name,
                inputs: build_parameters(entry.inputs)?,
                outputs: build_parameters(entry.outputs)?,
            });
        }

        Ok(Self {
            methods,
            document: document.to_string(),
        })
    }

    /// First descriptor whose name matches; overloads are not disambiguated.
    pub fn method(&self, name: &str) -> Result<&Method, Error> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .ok_or_else(|| {
                Error::new(ErrorKind::MethodNotFound)
                    .with_message("method is not declared in the abi")
                    .with_method(name)
            })
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The schema document exactly as loaded, for codec registration.
    pub fn document(&self) -> &str {
        &self.document
    }
}

fn build_parameters(raw: Vec<RawParameter>) -> Result<Vec<Parameter>, Error> {
    raw.into_iter().map(build_parameter).collect()
}

fn build_parameter(raw: RawParameter) -> Result<Parameter, Error> {
    let ty = TypeExpr::parse(&raw.ty).map_err(|err| err.with_param(raw.name.clone()))?;
    Ok(Parameter {
        name: raw.name,
        ty,
        components: build_parameters(raw.components)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{Abi, BaseType, ErrorKind, TypeExpr};

    #[test]
    fn parses_array_depth_by_counting_markers() {
        let ty = TypeExpr::parse("uint256[][]").expect("type");
        assert_eq!(ty.base(), BaseType::Uint(256));
        assert_eq!(ty.depth(), 2);

        let elem = ty.element();
        assert_eq!(elem.depth(), 1);
        assert_eq!(elem.element().depth(), 0);
        assert!(elem.element().is_integer());
    }

    #[test]
    fn bare_integer_tokens_default_to_256_bits() {
        assert_eq!(TypeExpr::parse("uint").expect("uint").base(), BaseType::Uint(256));
        assert_eq!(TypeExpr::parse("int").expect("int").base(), BaseType::Int(256));
    }

    #[test]
    fn fixed_bytes_widths_are_bounded() {
        assert_eq!(
            TypeExpr::parse("bytes32").expect("bytes32").base(),
            BaseType::FixedBytes(32)
        );
        let err = TypeExpr::parse("bytes33").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn rejects_unknown_tokens_and_fixed_size_arrays() {
        assert_eq!(
            TypeExpr::parse("float64").expect_err("err").kind(),
            ErrorKind::Schema
        );
        // The grammar only admits `[]` markers; sized arrays are not peeled.
        assert_eq!(
            TypeExpr::parse("uint256[3]").expect_err("err").kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn rejects_unaligned_integer_widths() {
        assert_eq!(
            TypeExpr::parse("uint7").expect_err("err").kind(),
            ErrorKind::Schema
        );
        assert_eq!(
            TypeExpr::parse("uint512").expect_err("err").kind(),
            ErrorKind::Schema
        );
    }

    #[test]
    fn display_round_trips_the_token_form() {
        for source in ["uint256[][]", "tuple[]", "bytes4", "address", "string"] {
            let ty = TypeExpr::parse(source).expect("type");
            assert_eq!(ty.to_string(), source);
        }
    }

    #[test]
    fn lookup_returns_first_match() {
        let doc = r#"[
            {"name":"pick","inputs":[{"name":"a","type":"uint256"}],"outputs":[]},
            {"name":"pick","inputs":[{"name":"b","type":"address"}],"outputs":[]}
        ]"#;
        let abi = Abi::from_json(doc).expect("abi");
        let method = abi.method("pick").expect("method");
        assert_eq!(method.inputs[0].name, "a");
    }

    #[test]
    fn missing_method_is_a_named_error() {
        let abi = Abi::from_json("[]").expect("abi");
        let err = abi.method("absent").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MethodNotFound);
        assert_eq!(err.method(), Some("absent"));
    }

    #[test]
    fn skips_non_function_entries() {
        let doc = r#"[
            {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address"}]},
            {"type":"constructor","inputs":[{"name":"owner","type":"address"}]},
            {"type":"function","name":"ping","inputs":[],"outputs":[]}
        ]"#;
        let abi = Abi::from_json(doc).expect("abi");
        assert_eq!(abi.methods().len(), 1);
        assert_eq!(abi.methods()[0].name, "ping");
        assert!(abi.method("Transfer").is_err());
    }

    #[test]
    fn tuple_components_parse_recursively() {
        let doc = r#"[{
            "name":"fill",
            "inputs":[{
                "name":"orders","type":"tuple[]",
                "components":[
                    {"name":"maker","type":"address"},
                    {"name":"amounts","type":"uint128[]"}
                ]
            }],
            "outputs":[]
        }]"#;
        let abi = Abi::from_json(doc).expect("abi");
        let orders = &abi.method("fill").expect("method").inputs[0];
        assert!(orders.ty.is_array());
        assert!(orders.ty.element().is_tuple());
        assert_eq!(orders.components.len(), 2);
        assert_eq!(orders.components[1].ty.to_string(), "uint128[]");
    }

    #[test]
    fn bad_type_in_component_names_the_parameter() {
        let doc = r#"[{"name":"f","inputs":[{"name":"x","type":"uint255"}],"outputs":[]}]"#;
        let err = Abi::from_json(doc).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.param(), Some("x"));
    }

    #[test]
    fn document_is_retained_verbatim() {
        let doc = r#"[{"name":"ping","inputs":[],"outputs":[]}]"#;
        let abi = Abi::from_json(doc).expect("abi");
        assert_eq!(abi.document(), doc);
    }
}
