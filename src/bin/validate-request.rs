use anyhow::{Context, Result};
use clap::Parser;
use layer_registry::app::ports::RequestValidatorPort;
use layer_registry::infra::schema_validator::JsonSchemaValidator;
use serde_json::Value;
use std::{fs, path::PathBuf};

/// Validate a registration request JSON file against the registration schema.
#[derive(Parser, Debug)]
#[command(name = "validate-request", version, about = "Validate a registration request against the schema")]
struct Cli {
    /// Path to the request JSON file to validate
    path: PathBuf,

    /// Optional path to a schema file (defaults to the built-in registration schema)
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let validator = match &args.schema {
        Some(path) => JsonSchemaValidator::from_schema(load_json(path)?)?,
        None => JsonSchemaValidator::new()?,
    };
    let instance = load_json(&args.path)?;

    let errors = validator.validate(&instance);
    if errors.is_empty() {
        println!("valid");
        Ok(())
    } else {
        eprintln!("invalid:");
        for error in errors {
            eprintln!("- {}", error);
        }
        std::process::exit(1)
    }
}
