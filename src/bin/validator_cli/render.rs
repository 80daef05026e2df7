//! `render` command: validate a render query.

use anyhow::Result;
use clap::Parser;
use query_validator::validate_sql_renders;

use super::output::{print_outcome, Target};
use super::{QueryInput, Verdict};

#[derive(Parser, Debug)]
pub struct RenderCmd {
    #[command(flatten)]
    pub input: QueryInput,
}

impl RenderCmd {
    pub fn execute(&self, json_output: bool) -> Result<Verdict> {
        let query = self.input.query_text()?;
        let params = self.input.parameters()?;

        let outcome = validate_sql_renders(&query, &params);
        print_outcome(Target::Render, None, &outcome, json_output);
        Ok(Verdict::from_pass(outcome.is_pass()))
    }
}
