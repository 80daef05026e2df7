//! query-validator: check daemon queries and modules before deployment
//!
//! ## Example Usage
//!
//! ```bash
//! # Validate an EVM query with a parameter
//! query-validator sql --chain evm --param min_height=100 \
//!     'SELECT * FROM blocks WHERE height > ${min_height}'
//!
//! # Validate a render query from a file
//! query-validator render --file report.sql
//!
//! # Validate a compiled AssemblyScript daemon for APTOS
//! query-validator bytecode --chain aptos build/daemon.wasm
//!
//! # Show tables, functions and imports per chain
//! query-validator chains --json
//! ```
//!
//! Exit status: 0 when the input is valid, 1 when it is rejected, 2 on
//! usage or I/O errors.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod validator_cli;

use validator_cli::{
    bytecode::BytecodeCmd, chains::ChainsCmd, output::format_error, render::RenderCmd,
    sql::SqlCmd, Verdict,
};

#[derive(Parser)]
#[command(
    name = "query-validator",
    author,
    version,
    about = "Validate daemon SQL queries, render queries and AssemblyScript bytecode",
    long_about = "Checks daemon inputs against the rules of a blockchain (SUI, EVM or APTOS) \
                  without executing them.\n\n\
                  Exit status is 0 for valid input, 1 for rejected input and 2 for errors."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (show validation stages)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a daemon SQL query for a chain
    Sql(SqlCmd),

    /// Validate a render query (chain-independent)
    Render(RenderCmd),

    /// Validate a compiled AssemblyScript module for a chain
    Bytecode(BytecodeCmd),

    /// List the rules registered for every chain
    Chains(ChainsCmd),
}

fn main() -> ExitCode {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();

    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match command {
        Commands::Sql(cmd) => cmd.execute(json),
        Commands::Render(cmd) => cmd.execute(json),
        Commands::Bytecode(cmd) => cmd.execute(json),
        Commands::Chains(cmd) => cmd.execute(json),
    };

    match result {
        Ok(Verdict::Valid) => ExitCode::SUCCESS,
        Ok(Verdict::Rejected) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{}", format_error(&err, json).trim_end());
            ExitCode::from(2)
        }
    }
}
