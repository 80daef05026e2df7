//! Resource ceilings applied during validation.
//!
//! Defaults can be overridden through the environment, which is read once
//! when the global [`Registry`](crate::Registry) is first touched:
//!
//! | Variable | Applies to | Default |
//! |----------|------------|---------|
//! | `QUERY_VALIDATOR_MAX_QUERY_BYTES` | SQL and render text | 65 536 |
//! | `QUERY_VALIDATOR_MAX_EXPRESSION_DEPTH` | SQL and render text | 256 |
//! | `QUERY_VALIDATOR_MAX_MEMORY_PAGES` | every chain | SUI 256, EVM 512, APTOS 256 |
//! | `QUERY_VALIDATOR_MAX_TABLE_ELEMENTS` | every chain | 10 000 |

use query_validator_types::env_utils::{env_limit_or, env_var};
use query_validator_types::ChainType;
use serde::Serialize;

pub const DEFAULT_MAX_QUERY_BYTES: u64 = 64 * 1024;
pub const DEFAULT_MAX_EXPRESSION_DEPTH: u64 = 256;
pub const DEFAULT_MAX_TABLE_ELEMENTS: u64 = 10_000;
pub const DEFAULT_SUI_MEMORY_PAGES: u64 = 256;
pub const DEFAULT_EVM_MEMORY_PAGES: u64 = 512;
pub const DEFAULT_APTOS_MEMORY_PAGES: u64 = 256;

pub const ENV_MAX_QUERY_BYTES: &str = "QUERY_VALIDATOR_MAX_QUERY_BYTES";
pub const ENV_MAX_EXPRESSION_DEPTH: &str = "QUERY_VALIDATOR_MAX_EXPRESSION_DEPTH";
pub const ENV_MAX_MEMORY_PAGES: &str = "QUERY_VALIDATOR_MAX_MEMORY_PAGES";
pub const ENV_MAX_TABLE_ELEMENTS: &str = "QUERY_VALIDATOR_MAX_TABLE_ELEMENTS";

/// Size ceilings for queries and bytecode modules.
///
/// # Example
///
/// ```
/// use query_validator_core::ValidationLimits;
/// use query_validator_types::ChainType;
///
/// let limits = ValidationLimits::default()
///     .with_max_query_bytes(1024)
///     .with_memory_pages(ChainType::Evm, 16);
/// assert_eq!(limits.max_query_bytes, 1024);
/// assert_eq!(limits.memory_pages(ChainType::Evm), 16);
/// assert_eq!(limits.memory_pages(ChainType::Sui), 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationLimits {
    /// Maximum byte length of a SQL or render query.
    pub max_query_bytes: u64,

    /// Maximum operator chain depth of a SQL or render query, summed over
    /// enclosing parentheses.
    pub max_expression_depth: u64,

    /// Maximum initial/maximum element count of any table.
    pub max_table_elements: u64,

    /// Maximum memory pages (64 KiB each) per chain.
    pub sui_memory_pages: u64,
    pub evm_memory_pages: u64,
    pub aptos_memory_pages: u64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_query_bytes: DEFAULT_MAX_QUERY_BYTES,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            max_table_elements: DEFAULT_MAX_TABLE_ELEMENTS,
            sui_memory_pages: DEFAULT_SUI_MEMORY_PAGES,
            evm_memory_pages: DEFAULT_EVM_MEMORY_PAGES,
            aptos_memory_pages: DEFAULT_APTOS_MEMORY_PAGES,
        }
    }
}

impl ValidationLimits {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut limits = Self {
            max_query_bytes: env_limit_or(ENV_MAX_QUERY_BYTES, DEFAULT_MAX_QUERY_BYTES),
            max_expression_depth: env_limit_or(
                ENV_MAX_EXPRESSION_DEPTH,
                DEFAULT_MAX_EXPRESSION_DEPTH,
            ),
            max_table_elements: env_limit_or(ENV_MAX_TABLE_ELEMENTS, DEFAULT_MAX_TABLE_ELEMENTS),
            ..Self::default()
        };
        if let Some(pages) = env_var::<u64>(ENV_MAX_MEMORY_PAGES).filter(|p| *p > 0) {
            for chain in ChainType::ALL {
                limits = limits.with_memory_pages(chain, pages);
            }
        }
        limits
    }

    pub fn memory_pages(&self, chain: ChainType) -> u64 {
        match chain {
            ChainType::Sui => self.sui_memory_pages,
            ChainType::Evm => self.evm_memory_pages,
            ChainType::Aptos => self.aptos_memory_pages,
        }
    }

    pub fn with_max_query_bytes(mut self, bytes: u64) -> Self {
        self.max_query_bytes = bytes;
        self
    }

    pub fn with_max_expression_depth(mut self, depth: u64) -> Self {
        self.max_expression_depth = depth;
        self
    }

    pub fn with_max_table_elements(mut self, elements: u64) -> Self {
        self.max_table_elements = elements;
        self
    }

    pub fn with_memory_pages(mut self, chain: ChainType, pages: u64) -> Self {
        match chain {
            ChainType::Sui => self.sui_memory_pages = pages,
            ChainType::Evm => self.evm_memory_pages = pages,
            ChainType::Aptos => self.aptos_memory_pages = pages,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_chain_ceilings() {
        let limits = ValidationLimits::default();
        assert_eq!(limits.max_query_bytes, 65_536);
        assert_eq!(limits.max_expression_depth, 256);
        assert_eq!(limits.max_table_elements, 10_000);
        assert_eq!(limits.memory_pages(ChainType::Sui), 256);
        assert_eq!(limits.memory_pages(ChainType::Evm), 512);
        assert_eq!(limits.memory_pages(ChainType::Aptos), 256);
    }

    #[test]
    fn builders_override_single_fields() {
        let limits = ValidationLimits::default()
            .with_max_table_elements(5)
            .with_memory_pages(ChainType::Aptos, 1);
        assert_eq!(limits.max_table_elements, 5);
        assert_eq!(limits.memory_pages(ChainType::Aptos), 1);
        assert_eq!(limits.memory_pages(ChainType::Evm), 512);
    }

    fn clear_env() {
        for key in [
            ENV_MAX_QUERY_BYTES,
            ENV_MAX_EXPRESSION_DEPTH,
            ENV_MAX_MEMORY_PAGES,
            ENV_MAX_TABLE_ELEMENTS,
        ] {
            std::env::remove_var(key);
        }
    }

    // One test so the process-wide variables are never raced.
    #[test]
    fn from_env_overrides() {
        clear_env();
        assert_eq!(ValidationLimits::from_env(), ValidationLimits::default());

        std::env::set_var(ENV_MAX_QUERY_BYTES, "2048");
        std::env::set_var(ENV_MAX_EXPRESSION_DEPTH, "64");
        std::env::set_var(ENV_MAX_MEMORY_PAGES, "32");
        std::env::set_var(ENV_MAX_TABLE_ELEMENTS, "100");
        let limits = ValidationLimits::from_env();
        assert_eq!(limits.max_query_bytes, 2048);
        assert_eq!(limits.max_expression_depth, 64);
        assert_eq!(limits.max_table_elements, 100);
        for chain in ChainType::ALL {
            assert_eq!(limits.memory_pages(chain), 32, "{chain}");
        }

        // Zero and garbage fall back to the defaults.
        std::env::set_var(ENV_MAX_QUERY_BYTES, "0");
        std::env::set_var(ENV_MAX_EXPRESSION_DEPTH, "deep");
        std::env::set_var(ENV_MAX_MEMORY_PAGES, "0");
        std::env::set_var(ENV_MAX_TABLE_ELEMENTS, "-5");
        assert_eq!(ValidationLimits::from_env(), ValidationLimits::default());

        clear_env();
    }
}
