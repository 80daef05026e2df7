//! Subcommands and shared input handling for the query-validator CLI.

pub mod bytecode;
pub mod chains;
pub mod output;
pub mod render;
pub mod sql;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use query_validator::{ParameterContext, ParameterContextBuilder};
use std::fs;
use std::path::PathBuf;

/// Whether the validated input was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Rejected,
}

impl Verdict {
    pub fn from_pass(pass: bool) -> Self {
        if pass {
            Verdict::Valid
        } else {
            Verdict::Rejected
        }
    }
}

/// Query text plus its parameters, shared by `sql` and `render`.
#[derive(Args, Debug)]
pub struct QueryInput {
    /// Query text
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub query: Option<String>,

    /// Read the query from a file
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Parameter value for `${key}` placeholders (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// JSON file with parameters: an object or an array of [key, value] pairs
    #[arg(long = "params", value_name = "FILE")]
    pub params_file: Option<PathBuf>,
}

impl QueryInput {
    pub fn query_text(&self) -> Result<String> {
        match (&self.query, &self.file) {
            (Some(query), _) => Ok(query.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("failed to read query file {}", path.display())),
            (None, None) => Err(anyhow!("no query given, pass QUERY or --file")),
        }
    }

    /// File parameters first, then `--param` values, so the command line wins.
    pub fn parameters(&self) -> Result<ParameterContext> {
        let mut builder = ParameterContextBuilder::new();

        if let Some(path) = &self.params_file {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read parameter file {}", path.display()))?;
            let from_file: ParameterContext = serde_json::from_str(&raw)
                .with_context(|| format!("invalid parameter file {}", path.display()))?;
            for (key, value) in from_file.iter() {
                builder.append(key, value);
            }
        }

        for pair in &self.params {
            let (key, value) = parse_param(pair)?;
            builder.append(key, value);
        }

        Ok(builder.build())
    }
}

/// Split `key=value`; the value may itself contain `=`.
pub fn parse_param(pair: &str) -> Result<(&str, &str)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid --param {:?}, expected KEY=VALUE", pair))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid --param {:?}, key is empty", pair));
    }
    Ok((key, value))
}
