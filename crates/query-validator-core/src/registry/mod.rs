//! Chain rule registry.
//!
//! Maps each [`ChainType`] to the rules its queries and modules are checked
//! against. The registry is built once and never mutated, so a shared
//! reference can be read from any number of threads.
//!
//! ```
//! use query_validator_core::{GrammarDialect, Registry, ValidationLimits};
//! use query_validator_types::ChainType;
//!
//! let registry = Registry::new(ValidationLimits::default());
//! let evm = registry.rules_for(ChainType::Evm);
//! assert_eq!(evm.sql.dialect, GrammarDialect::PostgreSql);
//! assert!(evm.sql.is_reserved("wei"));
//! assert!(evm.bytecode.allows_import("env", "abort"));
//! ```

pub mod schema;

use crate::errors::RuleScope;
use crate::limits::ValidationLimits;
use query_validator_types::ChainType;
use serde::Serialize;
use sqlparser::dialect::{AnsiDialect, Dialect, GenericDialect, PostgreSqlDialect};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub use schema::TableDef;

static GLOBAL: LazyLock<Registry> = LazyLock::new(|| Registry::new(ValidationLimits::from_env()));

/// Grammar used to tokenize and parse query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarDialect {
    Generic,
    PostgreSql,
    Ansi,
}

impl GrammarDialect {
    pub fn for_chain(chain: ChainType) -> Self {
        match chain {
            ChainType::Sui => GrammarDialect::Generic,
            ChainType::Evm => GrammarDialect::PostgreSql,
            ChainType::Aptos => GrammarDialect::Ansi,
        }
    }

    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            GrammarDialect::Generic => Box::new(GenericDialect {}),
            GrammarDialect::PostgreSql => Box::new(PostgreSqlDialect {}),
            GrammarDialect::Ansi => Box::new(AnsiDialect {}),
        }
    }
}

/// Lexical and semantic rules for one query surface.
#[derive(Debug, Clone, Serialize)]
pub struct DialectRules {
    #[serde(skip)]
    pub scope: RuleScope,
    pub dialect: GrammarDialect,
    pub reserved_keywords: BTreeSet<&'static str>,
    pub allowed_functions: BTreeSet<&'static str>,
    /// Queryable tables by name. `None` disables schema checks (render mode).
    pub tables: Option<BTreeMap<&'static str, TableDef>>,
}

impl DialectRules {
    fn for_chain(chain: ChainType) -> Self {
        let tables = schema::tables(chain)
            .iter()
            .map(|table| (table.name, *table))
            .collect();
        Self {
            scope: RuleScope::Chain(chain),
            dialect: GrammarDialect::for_chain(chain),
            reserved_keywords: schema::SHARED_RESERVED
                .iter()
                .chain(schema::reserved_keywords(chain))
                .copied()
                .collect(),
            allowed_functions: schema::COMMON_FUNCTIONS
                .iter()
                .chain(schema::chain_functions(chain))
                .copied()
                .collect(),
            tables: Some(tables),
        }
    }

    fn render() -> Self {
        Self {
            scope: RuleScope::Render,
            dialect: GrammarDialect::Generic,
            reserved_keywords: schema::SHARED_RESERVED.iter().copied().collect(),
            allowed_functions: schema::COMMON_FUNCTIONS.iter().copied().collect(),
            tables: None,
        }
    }

    /// Case-insensitive reserved word check.
    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved_keywords
            .contains(word.to_ascii_lowercase().as_str())
    }

    /// Case-insensitive function allowlist check.
    pub fn allows_function(&self, name: &str) -> bool {
        self.allowed_functions
            .contains(name.to_ascii_lowercase().as_str())
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables
            .as_ref()?
            .get(name.to_ascii_lowercase().as_str())
    }
}

/// What a compiled module may import and how large it may be.
#[derive(Debug, Clone, Serialize)]
pub struct BytecodePolicy {
    /// `module.field` names.
    pub allowed_imports: BTreeSet<&'static str>,
    pub max_memory_pages: u64,
    pub max_table_elements: u64,
}

impl BytecodePolicy {
    fn for_chain(chain: ChainType, limits: &ValidationLimits) -> Self {
        Self {
            allowed_imports: schema::COMMON_IMPORTS
                .iter()
                .chain(schema::chain_imports(chain))
                .copied()
                .collect(),
            max_memory_pages: limits.memory_pages(chain),
            max_table_elements: limits.max_table_elements,
        }
    }

    pub fn allows_import(&self, module: &str, field: &str) -> bool {
        self.allowed_imports
            .contains(format!("{}.{}", module, field).as_str())
    }
}

/// Everything a chain is validated against.
#[derive(Debug, Clone, Serialize)]
pub struct ChainRules {
    pub chain: ChainType,
    pub sql: DialectRules,
    pub bytecode: BytecodePolicy,
}

impl ChainRules {
    fn new(chain: ChainType, limits: &ValidationLimits) -> Self {
        Self {
            chain,
            sql: DialectRules::for_chain(chain),
            bytecode: BytecodePolicy::for_chain(chain, limits),
        }
    }
}

/// Immutable table of chain rules plus the chain-independent render rules.
#[derive(Debug, Clone)]
pub struct Registry {
    sui: ChainRules,
    evm: ChainRules,
    aptos: ChainRules,
    render: DialectRules,
    limits: ValidationLimits,
}

impl Registry {
    /// Process-wide registry configured from the environment on first use.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn new(limits: ValidationLimits) -> Self {
        Self {
            sui: ChainRules::new(ChainType::Sui, &limits),
            evm: ChainRules::new(ChainType::Evm, &limits),
            aptos: ChainRules::new(ChainType::Aptos, &limits),
            render: DialectRules::render(),
            limits,
        }
    }

    pub fn rules_for(&self, chain: ChainType) -> &ChainRules {
        match chain {
            ChainType::Sui => &self.sui,
            ChainType::Evm => &self.evm,
            ChainType::Aptos => &self.aptos,
        }
    }

    pub fn render_rules(&self) -> &DialectRules {
        &self.render
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(ValidationLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sync<T: Sync>() {}

    #[test]
    fn registry_is_shareable() {
        assert_sync::<Registry>();
    }

    #[test]
    fn dialect_per_chain() {
        let registry = Registry::default();
        assert_eq!(
            registry.rules_for(ChainType::Sui).sql.dialect,
            GrammarDialect::Generic
        );
        assert_eq!(
            registry.rules_for(ChainType::Evm).sql.dialect,
            GrammarDialect::PostgreSql
        );
        assert_eq!(
            registry.rules_for(ChainType::Aptos).sql.dialect,
            GrammarDialect::Ansi
        );
        assert_eq!(registry.render_rules().dialect, GrammarDialect::Generic);
    }

    #[test]
    fn reserved_words_are_chain_specific() {
        let registry = Registry::default();
        let sui = &registry.rules_for(ChainType::Sui).sql;
        let evm = &registry.rules_for(ChainType::Evm).sql;

        assert!(sui.is_reserved("CHECKPOINT"));
        assert!(!evm.is_reserved("checkpoint"));
        assert!(evm.is_reserved("gwei"));
        assert!(sui.is_reserved("account_state"));
        assert!(registry.render_rules().is_reserved("storage_slot"));
        assert!(!registry.render_rules().is_reserved("checkpoint"));
    }

    #[test]
    fn functions_match_case_insensitively() {
        let registry = Registry::default();
        let evm = &registry.rules_for(ChainType::Evm).sql;
        assert!(evm.allows_function("COUNT"));
        assert!(evm.allows_function("Evm_As_Uint256"));
        assert!(!evm.allows_function("as_uint64"));
        assert!(registry
            .rules_for(ChainType::Aptos)
            .sql
            .allows_function("struct_field"));
        assert!(!registry.render_rules().allows_function("struct_field"));
    }

    #[test]
    fn aptos_does_not_allow_env_abort() {
        let registry = Registry::default();
        assert!(!registry
            .rules_for(ChainType::Aptos)
            .bytecode
            .allows_import("env", "abort"));
        assert!(registry
            .rules_for(ChainType::Sui)
            .bytecode
            .allows_import("env", "abort"));
        assert!(registry
            .rules_for(ChainType::Aptos)
            .bytecode
            .allows_import("mamoru", "query"));
    }

    #[test]
    fn bytecode_ceilings_follow_limits() {
        let limits = ValidationLimits::default()
            .with_memory_pages(ChainType::Sui, 8)
            .with_max_table_elements(3);
        let registry = Registry::new(limits);
        let sui = &registry.rules_for(ChainType::Sui).bytecode;
        assert_eq!(sui.max_memory_pages, 8);
        assert_eq!(sui.max_table_elements, 3);
        assert_eq!(registry.rules_for(ChainType::Evm).bytecode.max_memory_pages, 512);
    }

    #[test]
    fn table_lookup_ignores_case() {
        let registry = Registry::default();
        let evm = &registry.rules_for(ChainType::Evm).sql;
        assert!(evm.table("BLOCKS").is_some());
        assert!(evm.table("checkpoint_events").is_none());
        assert!(registry.render_rules().table("blocks").is_none());
    }
}
