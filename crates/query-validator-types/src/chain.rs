//! Chain selector shared by every validation entry point.
//!
//! Chains cross process boundaries as a small integer (`Sui = 0`, `Evm = 1`,
//! `Aptos = 2`). Conversion from the raw value goes through [`TryFrom<u8>`],
//! which is the only place an out-of-range selector can be observed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blockchain backend a query or module is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainType {
    Sui,
    Evm,
    Aptos,
}

impl ChainType {
    /// All chains, in wire order.
    pub const ALL: [ChainType; 3] = [ChainType::Sui, ChainType::Evm, ChainType::Aptos];

    /// Wire value used by host processes.
    pub fn as_u8(self) -> u8 {
        match self {
            ChainType::Sui => 0,
            ChainType::Evm => 1,
            ChainType::Aptos => 2,
        }
    }

    /// Upper-case display name (`SUI`, `EVM`, `APTOS`).
    pub fn name(self) -> &'static str {
        match self {
            ChainType::Sui => "SUI",
            ChainType::Evm => "EVM",
            ChainType::Aptos => "APTOS",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw chain selector outside the three known values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidChainSelector(pub u8);

impl fmt::Display for InvalidChainSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid chain selector {} (expected 0 = SUI, 1 = EVM or 2 = APTOS)",
            self.0
        )
    }
}

impl std::error::Error for InvalidChainSelector {}

impl TryFrom<u8> for ChainType {
    type Error = InvalidChainSelector;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChainType::Sui),
            1 => Ok(ChainType::Evm),
            2 => Ok(ChainType::Aptos),
            other => Err(InvalidChainSelector(other)),
        }
    }
}

/// Error returned when a chain name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChainName(pub String);

impl fmt::Display for UnknownChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown chain \"{}\" (expected one of: sui, evm, aptos)",
            self.0
        )
    }
}

impl std::error::Error for UnknownChainName {}

impl FromStr for ChainType {
    type Err = UnknownChainName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sui" => Ok(ChainType::Sui),
            "evm" => Ok(ChainType::Evm),
            "aptos" => Ok(ChainType::Aptos),
            _ => Err(UnknownChainName(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_roundtrip() {
        for chain in ChainType::ALL {
            assert_eq!(ChainType::try_from(chain.as_u8()), Ok(chain));
        }
    }

    #[test]
    fn out_of_range_selector_is_rejected() {
        assert_eq!(ChainType::try_from(3), Err(InvalidChainSelector(3)));
        assert_eq!(ChainType::try_from(255), Err(InvalidChainSelector(255)));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("SUI".parse::<ChainType>(), Ok(ChainType::Sui));
        assert_eq!(" evm ".parse::<ChainType>(), Ok(ChainType::Evm));
        assert_eq!("Aptos".parse::<ChainType>(), Ok(ChainType::Aptos));
        assert!("solana".parse::<ChainType>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ChainType::Aptos).unwrap();
        assert_eq!(json, "\"aptos\"");
        let chain: ChainType = serde_json::from_str("\"evm\"").unwrap();
        assert_eq!(chain, ChainType::Evm);
    }
}
