//! CLI for `reva`.
//!
//! Checks a recorded request against an `OpenAPI` operation without running
//! a server. Operation, request and options files may be YAML or JSON.
//!
//! # Subcommands
//!
//! ```text
//! # Validate a request; prints {"ok": ...} and exits 1 when invalid
//! reva validate --operation op.yaml --request request.json
//!
//! # Same, with options from a file and per-run policy flags
//! reva validate \
//!   --operation op.yaml \
//!   --request request.json \
//!   --config reva.yaml \
//!   --group path,query \
//!   --allow-additional all
//!
//! # Print the synthesized per-location parameter schemas
//! reva schemas --operation op.yaml
//! ```
//!
//! Set `RUST_LOG=reva=debug` to trace each validated location on stderr.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use reva::{
    AdditionalParameters, Location, Operation, Reva, RevaOptions, RevaOverrides, RevaRequest,
};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

/// Validate HTTP requests against `OpenAPI` operations.
#[derive(Parser)]
#[command(name = "reva", version, about)]
enum Cli {
    /// Validate a recorded request against an operation.
    ///
    /// Prints the outcome as JSON on stdout. Exits with status 1 when the
    /// request is invalid.
    Validate(ValidateArgs),

    /// Print the schemas synthesized from an operation's parameters.
    Schemas(SchemasArgs),
}

#[derive(Parser)]
struct ValidateArgs {
    /// Path to the operation object (dereferenced, YAML or JSON).
    #[arg(short, long)]
    operation: PathBuf,

    /// Path to the request (`queryParameters`, `pathParameters`, `headers`,
    /// `body`).
    #[arg(short, long)]
    request: PathBuf,

    /// Path to an options file. CLI flags override values from it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore the body schema's top-level `required` list.
    #[arg(long)]
    partial_body: bool,

    /// Comma-separated locations validated together as one object.
    #[arg(long, value_delimiter = ',')]
    group: Vec<Location>,

    /// Locations accepting undeclared keys: `all`, `none`, or a
    /// comma-separated list (e.g. `header,cookie`).
    #[arg(long, value_parser = parse_additional)]
    allow_additional: Option<AdditionalParameters>,
}

#[derive(Parser)]
struct SchemasArgs {
    /// Path to the operation object (dereferenced, YAML or JSON).
    #[arg(short, long)]
    operation: PathBuf,

    /// Path to an options file (only `allowAdditionalParameters` matters).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Validate(args) => run_validate(&args),
        Cli::Schemas(args) => run_schemas(&args),
    }
}

fn parse_additional(raw: &str) -> Result<AdditionalParameters, String> {
    match raw.trim() {
        "all" | "true" => Ok(AdditionalParameters::All),
        "none" | "false" | "" => Ok(AdditionalParameters::Only(Vec::new())),
        list => list
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Location>, _>>()
            .map(AdditionalParameters::Only),
    }
}

fn load_options(path: Option<&Path>) -> anyhow::Result<RevaOptions> {
    match path {
        Some(path) => {
            eprintln!("Loading config: {}", path.display());
            RevaOptions::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Ok(RevaOptions::default()),
    }
}

fn load_operation(path: &Path) -> anyhow::Result<Operation> {
    Operation::load(path).with_context(|| format!("Failed to load operation: {}", path.display()))
}

fn overrides(args: &ValidateArgs) -> RevaOverrides {
    let mut overrides = RevaOverrides::default();
    if args.partial_body {
        overrides = overrides.partial_body(true);
    }
    if !args.group.is_empty() {
        overrides = overrides.grouped_parameters(&args.group);
    }
    if let Some(policy) = &args.allow_additional {
        overrides = overrides.allow_additional_parameters(policy.clone());
    }
    overrides
}

fn run_validate(args: &ValidateArgs) -> anyhow::Result<ExitCode> {
    let options = load_options(args.config.as_deref())?;
    let operation = load_operation(&args.operation)?;
    let request = RevaRequest::load(&args.request)
        .with_context(|| format!("Failed to load request: {}", args.request.display()))?;

    let reva = Reva::new(options).context("Failed to build validator")?;
    let outcome = reva
        .validate_with(&operation, &request, &overrides(args))
        .context("Validation could not run")?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.is_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Request is invalid ({} errors)", outcome.errors().len());
        Ok(ExitCode::FAILURE)
    }
}

fn run_schemas(args: &SchemasArgs) -> anyhow::Result<ExitCode> {
    let options = load_options(args.config.as_deref())?;
    let operation = load_operation(&args.operation)?;
    let reva = Reva::new(options).context("Failed to build validator")?;

    println!("{}", serde_json::to_string_pretty(&schemas_json(&reva, &operation))?);
    Ok(ExitCode::SUCCESS)
}

fn schemas_json(reva: &Reva, operation: &Operation) -> Value {
    let schemas: Map<String, Value> = reva
        .parameter_schemas(operation)
        .into_iter()
        .map(|(location, schema)| (location.to_string(), schema.to_schema()))
        .collect();
    Value::Object(schemas)
}
