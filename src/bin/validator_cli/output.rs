//! Output formatting for the query-validator CLI
//!
//! Every command prints either human-readable text or pretty JSON.

use query_validator::{ChainType, ValidationOutcome};
use serde::Serialize;

/// What was validated, shown next to the outcome.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Sql,
    Render,
    Bytecode,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Target::Sql => "SQL query",
            Target::Render => "Render query",
            Target::Bytecode => "Bytecode",
        }
    }
}

/// Format a validation outcome for the terminal
pub fn format_outcome(target: Target, chain: Option<ChainType>, outcome: &ValidationOutcome) -> String {
    let subject = match chain {
        Some(chain) => format!("{} for {}", target.label(), chain),
        None => target.label().to_string(),
    };

    match outcome.kind() {
        None => format!("\x1b[32m✓ {} is valid\x1b[0m\n", subject),
        Some(kind) => format!(
            "\x1b[31m✗ {} is invalid\x1b[0m\n  [{}] {}\n",
            subject,
            kind.code(),
            outcome.message()
        ),
    }
}

/// Format a validation outcome as JSON
pub fn format_outcome_json(
    target: Target,
    chain: Option<ChainType>,
    outcome: &ValidationOutcome,
) -> String {
    #[derive(Serialize)]
    struct OutcomeJson<'a> {
        target: Target,
        #[serde(skip_serializing_if = "Option::is_none")]
        chain: Option<ChainType>,
        #[serde(flatten)]
        outcome: &'a ValidationOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    }

    let json = OutcomeJson {
        target,
        chain,
        outcome,
        code: outcome.kind().map(|kind| kind.code()),
    };
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
}

/// Print an outcome in the requested format
pub fn print_outcome(
    target: Target,
    chain: Option<ChainType>,
    outcome: &ValidationOutcome,
    json_output: bool,
) {
    if json_output {
        println!("{}", format_outcome_json(target, chain, outcome));
    } else {
        print!("{}", format_outcome(target, chain, outcome));
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    if json_output {
        #[derive(Serialize)]
        struct ErrorJson {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            cause: Option<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            cause: error.source().map(|e| e.to_string()),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        let mut out = format!("\x1b[31mError:\x1b[0m {}\n", error);
        let mut causes = error.chain().skip(1).peekable();
        if causes.peek().is_some() {
            out.push_str("Caused by:\n");
            for (idx, cause) in causes.enumerate() {
                out.push_str(&format!("  {}: {}\n", idx + 1, cause));
            }
        }
        out
    }
}
