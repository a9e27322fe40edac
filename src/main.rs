//! Purpose: `abilite` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit one JSON document per line on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

use abilite::api::{
    Abi, Error, ErrorKind, FlatValue, Method, Parameter, Value, deserialize, serialize,
    to_exit_code,
};

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(exit_code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(err.to_string()));
            }
        },
    };

    match cli.command {
        Command::Methods { abi } => run_methods(&abi),
        Command::Flatten {
            abi,
            method,
            values,
        } => run_flatten(&abi, &method, values),
        Command::Expand {
            abi,
            method,
            values,
            outputs,
        } => run_expand(&abi, &method, values, outputs),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "abilite", &mut io::stdout());
            Ok(())
        }
    }?;
    Ok(0)
}

#[derive(Parser)]
#[command(
    name = "abilite",
    version,
    about = "Schema-driven ABI marshaling toolkit",
    long_about = r#"Inspect ABI schema documents and dry-run the marshaling layer.

`flatten` serializes structured JSON values into the flat, ordered form an
external codec consumes; `expand` rebuilds structured values from flat ones.
Byte-level encoding itself lives in the external codec and is not performed
here."#,
    after_help = r#"EXAMPLES
  $ abilite methods --abi erc20.json
  $ abilite flatten --abi erc20.json --method transfer --values '["0xAAAA", "1000"]'
  $ echo '[["0xAAAA", "1000"]]' | abilite expand --abi exchange.json --method fill

  $ abilite <command> --help"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List methods parsed from an ABI document")]
    Methods {
        #[arg(long, value_hint = ValueHint::FilePath, help = "Path to the ABI JSON document")]
        abi: PathBuf,
    },
    #[command(about = "Serialize structured values into flat codec arguments")]
    Flatten {
        #[arg(long, value_hint = ValueHint::FilePath, help = "Path to the ABI JSON document")]
        abi: PathBuf,
        #[arg(long, help = "Method name to serialize against")]
        method: String,
        #[arg(long, help = "JSON array of structured values (default: stdin)")]
        values: Option<String>,
    },
    #[command(about = "Rebuild structured values from flat codec values")]
    Expand {
        #[arg(long, value_hint = ValueHint::FilePath, help = "Path to the ABI JSON document")]
        abi: PathBuf,
        #[arg(long, help = "Method name to deserialize against")]
        method: String,
        #[arg(long, help = "JSON array of flat values (default: stdin)")]
        values: Option<String>,
        #[arg(long, help = "Use the method outputs instead of its inputs")]
        outputs: bool,
    },
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn run_methods(abi_path: &Path) -> Result<(), Error> {
    let abi = load_abi(abi_path)?;
    for method in abi.methods() {
        println!("{}", serde_json::to_string(&method_json(method)).map_err(internal_json)?);
    }
    Ok(())
}

fn run_flatten(abi_path: &Path, method: &str, values: Option<String>) -> Result<(), Error> {
    let abi = load_abi(abi_path)?;
    let found = abi.method(method)?;
    let values = parse_structured_values(&read_values_arg(values)?)?;
    let flats = serialize(&found.inputs, &values).map_err(|err| err.with_method(method))?;
    let rendered = JsonValue::Array(flats.iter().map(FlatValue::to_json).collect());
    println!("{}", serde_json::to_string(&rendered).map_err(internal_json)?);
    Ok(())
}

fn run_expand(
    abi_path: &Path,
    method: &str,
    values: Option<String>,
    outputs: bool,
) -> Result<(), Error> {
    let abi = load_abi(abi_path)?;
    let found = abi.method(method)?;
    let params = if outputs {
        &found.outputs
    } else {
        &found.inputs
    };
    let flats = parse_flat_values(&read_values_arg(values)?)?;
    let value = deserialize(params, &flats).map_err(|err| err.with_method(method))?;
    println!("{}", serde_json::to_string(&value.to_json()).map_err(internal_json)?);
    Ok(())
}

fn load_abi(path: &Path) -> Result<Abi, Error> {
    let document = std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("failed to read abi document `{}`", path.display()))
            .with_source(err)
    })?;
    Abi::from_json(&document)
}

fn read_values_arg(values: Option<String>) -> Result<String, Error> {
    if let Some(values) = values {
        return Ok(values);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("failed to read values from stdin")
            .with_source(err)
    })?;
    Ok(buffer)
}

fn parse_values_array(input: &str) -> Result<Vec<JsonValue>, Error> {
    let parsed: JsonValue = serde_json::from_str(input).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("values must be valid JSON")
            .with_source(err)
    })?;
    match parsed {
        JsonValue::Array(items) => Ok(items),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("values must be a JSON array, one entry per parameter")),
    }
}

fn parse_structured_values(input: &str) -> Result<Vec<Value>, Error> {
    parse_values_array(input)?
        .iter()
        .map(Value::from_json)
        .collect()
}

fn parse_flat_values(input: &str) -> Result<Vec<FlatValue>, Error> {
    parse_values_array(input)?
        .iter()
        .map(FlatValue::from_json)
        .collect()
}

fn method_json(method: &Method) -> JsonValue {
    json!({
        "name": method.name,
        "inputs": method.inputs.iter().map(parameter_json).collect::<Vec<_>>(),
        "outputs": method.outputs.iter().map(parameter_json).collect::<Vec<_>>(),
        "signature": describe_method(method),
    })
}

fn parameter_json(param: &Parameter) -> JsonValue {
    let mut entry = Map::new();
    entry.insert("name".to_string(), json!(param.name));
    entry.insert("type".to_string(), json!(param.ty.to_string()));
    if !param.components.is_empty() {
        entry.insert(
            "components".to_string(),
            param.components.iter().map(parameter_json).collect(),
        );
    }
    JsonValue::Object(entry)
}

/// Human-readable rendering with tuples expanded, e.g.
/// `fill((address,uint256)[]) -> (bool)`.
fn describe_method(method: &Method) -> String {
    let inputs = method
        .inputs
        .iter()
        .map(describe_parameter)
        .collect::<Vec<_>>()
        .join(",");
    let outputs = method
        .outputs
        .iter()
        .map(describe_parameter)
        .collect::<Vec<_>>()
        .join(",");
    format!("{}({inputs}) -> ({outputs})", method.name)
}

fn describe_parameter(param: &Parameter) -> String {
    if !param.ty.is_tuple() && param.components.is_empty() {
        return param.ty.to_string();
    }
    let fields = param
        .components
        .iter()
        .map(describe_parameter)
        .collect::<Vec<_>>()
        .join(",");
    let markers = "[]".repeat(param.ty.depth());
    format!("({fields}){markers}")
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_text(err: &Error) -> String {
    let mut text = err.to_string();
    if let Some(hint) = err.hint() {
        text.push_str("\nhint: ");
        text.push_str(hint);
    }
    text
}

fn error_json(err: &Error) -> JsonValue {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    if let Some(message) = err.message() {
        inner.insert("message".to_string(), json!(message));
    }
    if let Some(method) = err.method() {
        inner.insert("method".to_string(), json!(method));
    }
    if let Some(param) = err.param() {
        inner.insert("param".to_string(), json!(param));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let mut outer = Map::new();
    outer.insert("error".to_string(), JsonValue::Object(inner));
    JsonValue::Object(outer)
}

fn internal_json(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("json encode failed")
        .with_source(err)
}
