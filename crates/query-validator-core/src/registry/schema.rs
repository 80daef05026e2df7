//! Static per-chain vocabulary: tables, reserved words, UDFs and host imports.
//!
//! Table layouts mirror the row types the daemon exposes to queries for each
//! chain. Everything here is lower case; lookups lowercase their input first.

use query_validator_types::ChainType;
use serde::Serialize;

/// A queryable table and its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl TableDef {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

const fn table(name: &'static str, columns: &'static [&'static str]) -> TableDef {
    TableDef { name, columns }
}

// =============================================================================
// SUI
// =============================================================================

const SUI_TABLES: &[TableDef] = &[
    table(
        "transactions",
        &[
            "seq",
            "digest",
            "time",
            "gas_used",
            "gas_computation_cost",
            "gas_storage_cost",
            "gas_budget",
            "sender",
            "kind",
        ],
    ),
    table(
        "call_traces",
        &[
            "seq",
            "tx_seq",
            "depth",
            "call_type",
            "gas_used",
            "transaction_module",
            "function",
        ],
    ),
    table("call_trace_type_args", &["seq", "call_trace_seq", "arg"]),
    table("call_trace_args", &["seq", "call_trace_seq", "arg"]),
    table(
        "events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "type",
            "contents",
        ],
    ),
    table(
        "move_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "type",
            "contents",
        ],
    ),
    table("publish_events", &["tx_seq", "package_id", "sender"]),
    table(
        "coin_balance_change_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "change_type",
            "owner_address",
            "coin_type",
            "coin_object_id",
            "version",
            "amount",
        ],
    ),
    table("epoch_change_events", &["tx_seq", "epoch_id"]),
    table("checkpoint_events", &["tx_seq", "checkpoint_seq"]),
    table(
        "transfer_object_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "recipient_address",
            "object_type",
            "object_id",
            "version",
        ],
    ),
    table(
        "mutate_object_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "object_type",
            "object_id",
            "version",
        ],
    ),
    table(
        "delete_object_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "object_id",
            "version",
        ],
    ),
    table(
        "new_object_events",
        &[
            "tx_seq",
            "package_id",
            "transaction_module",
            "sender",
            "recipient_address",
            "object_type",
            "object_id",
            "version",
        ],
    ),
];

// =============================================================================
// EVM
// =============================================================================

const EVM_TABLES: &[TableDef] = &[
    table(
        "blocks",
        &[
            "block_index",
            "height",
            "hash",
            "parent_hash",
            "state_root",
            "nonce",
            "status",
            "timestamp",
            "block_reward",
            "fee_recipient",
            "total_difficulty",
            "size",
            "gas_used",
            "gas_limit",
            "burnt_fees",
            "pos_proposed_on_time",
            "pos_slot",
            "pos_epoch",
            "pos_proposer_index",
            "pos_slot_root_hash",
            "pos_beacon_chain_deposit_count",
            "pos_slot_graffiti",
            "pos_block_randomness",
            "pos_random_reveal",
        ],
    ),
    table(
        "transactions",
        &[
            "tx_index",
            "tx_hash",
            "block_index",
            "type",
            "nonce",
            "status",
            "timestamp",
            "from",
            "to",
            "value",
            "fee",
            "gas_price",
            "gas_limit",
            "gas_used",
            "input",
            "size",
        ],
    ),
    table("transaction_args", &["tx_index", "block_index", "arg"]),
    table(
        "call_traces",
        &[
            "seq",
            "tx_index",
            "block_index",
            "depth",
            "type",
            "from",
            "to",
            "value",
            "gas_limit",
            "gas_used",
            "method_id",
            "input",
        ],
    ),
    table(
        "call_trace_args",
        &["call_trace_seq", "tx_index", "block_index", "arg"],
    ),
    table(
        "events",
        &[
            "index",
            "tx_index",
            "tx_hash",
            "block_number",
            "block_hash",
            "address",
            "data",
        ],
    ),
    table("event_topics", &["event_index", "topic"]),
];

// =============================================================================
// APTOS
// =============================================================================

const APTOS_TABLES: &[TableDef] = &[
    table("blocks", &["hash", "height", "epoch", "timestamp_usecs"]),
    table(
        "transactions",
        &[
            "seq",
            "block_hash",
            "hash",
            "event_root_hash",
            "state_change_hash",
            "gas_used",
            "max_gas_amount",
            "gas_unit_price",
            "expiration_timestamp_secs",
            "status",
            "sender",
            "sequence_number",
        ],
    ),
    table(
        "events",
        &["tx_seq", "key", "sequence_number", "type", "data"],
    ),
    table(
        "call_traces",
        &[
            "seq",
            "tx_seq",
            "depth",
            "call_type",
            "gas_used",
            "transaction_module",
            "function",
        ],
    ),
    table("call_trace_type_args", &["seq", "call_trace_seq", "arg"]),
    table("call_trace_args", &["seq", "call_trace_seq", "arg"]),
];

pub fn tables(chain: ChainType) -> &'static [TableDef] {
    match chain {
        ChainType::Sui => SUI_TABLES,
        ChainType::Evm => EVM_TABLES,
        ChainType::Aptos => APTOS_TABLES,
    }
}

// =============================================================================
// Reserved words
// =============================================================================

/// Engine-internal names, reserved everywhere including render queries.
pub const SHARED_RESERVED: &[&str] = &["account_state", "storage_slot"];

pub fn reserved_keywords(chain: ChainType) -> &'static [&'static str] {
    match chain {
        ChainType::Sui => &["object", "package", "checkpoint", "epoch"],
        ChainType::Evm => &["contract", "wei", "gwei"],
        ChainType::Aptos => &["resource", "script", "move_module"],
    }
}

// =============================================================================
// Functions
// =============================================================================

pub const COMMON_FUNCTIONS: &[&str] = &[
    "count",
    "sum",
    "min",
    "max",
    "avg",
    "coalesce",
    "nullif",
    "lower",
    "upper",
    "length",
    "char_length",
    "trim",
    "concat",
    "substr",
    "substring",
    "abs",
    "round",
    "floor",
    "ceil",
    "to_hex",
    "date_trunc",
    "now",
    "current_timestamp",
];

const MOVE_UDFS: &[&str] = &["as_uint64", "as_boolean", "as_string", "struct_field"];

const EVM_UDFS: &[&str] = &[
    "evm_parse_tx_input",
    "evm_take_token",
    "evm_as_boolean",
    "evm_as_address",
    "evm_as_uint256",
    "evm_as_int256",
    "evm_as_string",
    "evm_as_bytes",
    "evm_as_fixed_bytes",
    "evm_as_array",
    "evm_as_fixed_array",
    "evm_as_tuple",
];

pub fn chain_functions(chain: ChainType) -> &'static [&'static str] {
    match chain {
        ChainType::Sui | ChainType::Aptos => MOVE_UDFS,
        ChainType::Evm => EVM_UDFS,
    }
}

// =============================================================================
// Host imports
// =============================================================================

/// Host functions every daemon runtime provides.
pub const COMMON_IMPORTS: &[&str] = &[
    "mamoru.query",
    "mamoru.report",
    "mamoru.http",
    "mamoru.parameter",
    "mamoru.u256_from_str",
];

pub fn chain_imports(chain: ChainType) -> &'static [&'static str] {
    match chain {
        ChainType::Sui => &[
            "env.abort",
            "mamoru_sui.get_transactions",
            "mamoru_sui.get_call_traces",
            "mamoru_sui.get_call_trace_type_args",
            "mamoru_sui.get_call_trace_args",
            "mamoru_sui.get_events",
            "mamoru_sui.get_call_trace_arg_by_id",
        ],
        ChainType::Evm => &[
            "env.abort",
            "mamoru_evm.get_blocks",
            "mamoru_evm.get_transactions",
            "mamoru_evm.get_call_traces",
            "mamoru_evm.get_events",
            "mamoru_evm.parse_tx_input",
        ],
        // No `env.abort`: the APTOS runtime traps instead of calling back.
        ChainType::Aptos => &[
            "mamoru_aptos.get_blocks",
            "mamoru_aptos.get_transactions",
            "mamoru_aptos.get_call_traces",
            "mamoru_aptos.get_call_trace_type_args",
            "mamoru_aptos.get_call_trace_args",
            "mamoru_aptos.get_events",
            "mamoru_aptos.get_call_trace_arg_by_id",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn no_column_uses_its_own_chains_reserved_word() {
        for chain in ChainType::ALL {
            let reserved: HashSet<_> = reserved_keywords(chain)
                .iter()
                .chain(SHARED_RESERVED)
                .collect();
            for table in tables(chain) {
                assert!(!reserved.contains(&table.name), "{chain}: {}", table.name);
                for column in table.columns {
                    assert!(
                        !reserved.contains(column),
                        "{chain}: {}.{column} is reserved",
                        table.name
                    );
                }
            }
        }
    }

    #[test]
    fn table_names_are_unique_per_chain() {
        for chain in ChainType::ALL {
            let mut seen = HashSet::new();
            for table in tables(chain) {
                assert!(seen.insert(table.name), "{chain}: duplicate {}", table.name);
            }
        }
    }

    #[test]
    fn block_tables_expose_height() {
        for chain in [ChainType::Evm, ChainType::Aptos] {
            let blocks = tables(chain).iter().find(|t| t.name == "blocks").unwrap();
            assert!(blocks.has_column("height"));
        }
        assert!(!tables(ChainType::Sui).iter().any(|t| t.name == "blocks"));
    }

    #[test]
    fn env_assert_is_never_importable() {
        for chain in ChainType::ALL {
            assert!(!chain_imports(chain).contains(&"env.assert"));
        }
        assert!(!COMMON_IMPORTS.contains(&"env.assert"));
    }
}
