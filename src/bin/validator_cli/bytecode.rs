//! `bytecode` command: validate a compiled AssemblyScript module.

use anyhow::{Context, Result};
use clap::Parser;
use query_validator::{validate_assembly_script_bytecode, ChainType};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::output::{print_outcome, Target};
use super::Verdict;

#[derive(Parser, Debug)]
pub struct BytecodeCmd {
    /// Chain the daemon is deployed on (sui, evm, aptos)
    #[arg(long, short)]
    pub chain: ChainType,

    /// Path to the compiled `.wasm` module
    pub module: PathBuf,
}

impl BytecodeCmd {
    pub fn execute(&self, json_output: bool) -> Result<Verdict> {
        let bytes = fs::read(&self.module)
            .with_context(|| format!("failed to read module {}", self.module.display()))?;
        debug!(chain = %self.chain, path = %self.module.display(), bytes = bytes.len(), "bytecode command");

        let outcome = validate_assembly_script_bytecode(self.chain, &bytes);
        print_outcome(Target::Bytecode, Some(self.chain), &outcome, json_output);
        Ok(Verdict::from_pass(outcome.is_pass()))
    }
}
