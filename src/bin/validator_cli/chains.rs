//! `chains` command: show the registered rules.

use anyhow::{Context, Result};
use clap::Parser;
use query_validator::{ChainRules, ChainType, Registry};
use serde_json::json;

use super::Verdict;

#[derive(Parser, Debug)]
pub struct ChainsCmd {
    /// Only show this chain
    #[arg(long, short)]
    pub chain: Option<ChainType>,
}

impl ChainsCmd {
    pub fn execute(&self, json_output: bool) -> Result<Verdict> {
        let registry = Registry::global();
        let chains: Vec<&ChainRules> = ChainType::ALL
            .into_iter()
            .filter(|chain| self.chain.map_or(true, |only| only == *chain))
            .map(|chain| registry.rules_for(chain))
            .collect();

        if json_output {
            let mut value = json!({
                "limits": registry.limits(),
                "chains": chains,
            });
            if self.chain.is_none() {
                value["render"] = serde_json::to_value(registry.render_rules())
                    .context("failed to serialize render rules")?;
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            for rules in &chains {
                print!("{}", format_chain(rules));
            }
            if self.chain.is_none() {
                let render = registry.render_rules();
                println!("\x1b[1mRender\x1b[0m");
                println!("  Dialect: {:?}", render.dialect);
                println!("  Functions: {}", join(&render.allowed_functions));
                println!();
            }
            println!(
                "Max query size: {} bytes",
                registry.limits().max_query_bytes
            );
        }
        Ok(Verdict::Valid)
    }
}

fn join<'a>(words: impl IntoIterator<Item = &'a &'static str>) -> String {
    words.into_iter().copied().collect::<Vec<_>>().join(", ")
}

fn format_chain(rules: &ChainRules) -> String {
    let mut out = format!(
        "\x1b[1m{}\x1b[0m (selector {})\n",
        rules.chain,
        rules.chain.as_u8()
    );
    out.push_str(&format!("  Dialect: {:?}\n", rules.sql.dialect));

    if let Some(tables) = &rules.sql.tables {
        out.push_str("  Tables:\n");
        for table in tables.values() {
            out.push_str(&format!(
                "    \x1b[36m{}\x1b[0m ({})\n",
                table.name,
                table.columns.join(", ")
            ));
        }
    }
    out.push_str(&format!(
        "  Reserved: {}\n",
        join(&rules.sql.reserved_keywords)
    ));
    out.push_str(&format!(
        "  Functions: {}\n",
        join(&rules.sql.allowed_functions)
    ));
    out.push_str(&format!(
        "  Imports: {}\n",
        join(&rules.bytecode.allowed_imports)
    ));
    out.push_str(&format!(
        "  Memory: {} pages, tables: {} elements\n\n",
        rules.bytecode.max_memory_pages, rules.bytecode.max_table_elements
    ));
    out
}
