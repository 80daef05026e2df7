//! `sql` command: validate a daemon query for one chain.

use anyhow::Result;
use clap::Parser;
use query_validator::{validate_sql, ChainType};
use tracing::debug;

use super::output::{print_outcome, Target};
use super::{QueryInput, Verdict};

#[derive(Parser, Debug)]
pub struct SqlCmd {
    /// Chain the query runs against (sui, evm, aptos)
    #[arg(long, short)]
    pub chain: ChainType,

    #[command(flatten)]
    pub input: QueryInput,
}

impl SqlCmd {
    pub fn execute(&self, json_output: bool) -> Result<Verdict> {
        let query = self.input.query_text()?;
        let params = self.input.parameters()?;
        debug!(chain = %self.chain, params = params.len(), "sql command");

        let outcome = validate_sql(self.chain, &query, &params);
        print_outcome(Target::Sql, Some(self.chain), &outcome, json_output);
        Ok(Verdict::from_pass(outcome.is_pass()))
    }
}
