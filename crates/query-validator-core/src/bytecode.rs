//! AssemblyScript module validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. structure: non-empty, `\0asm` magic, version 1, and a full
//!    `wasmparser` validation pass
//! 2. every import is on the chain's allowlist
//! 3. memory and table declarations stay under the chain's ceilings
//! 4. the exports the AssemblyScript loader needs are present

use crate::errors::{LimitBound, ValidateError};
use crate::registry::ChainRules;
use query_validator_types::ChainType;
use tracing::trace;
use wasmparser::{ExternalKind, Parser, Payload, TypeRef, Validator};

const WASM_MAGIC: [u8; 4] = *b"\0asm";
const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Exports the AssemblyScript loader resolves when instantiating a daemon.
const REQUIRED_EXPORTS: &[(&str, ExternalKind)] = &[
    ("main", ExternalKind::Func),
    ("memory", ExternalKind::Memory),
    ("__new", ExternalKind::Func),
    ("__pin", ExternalKind::Func),
    ("__unpin", ExternalKind::Func),
    ("__collect", ExternalKind::Func),
];

fn kind_name(kind: ExternalKind) -> &'static str {
    match kind {
        ExternalKind::Func => "function",
        ExternalKind::Memory => "memory",
        ExternalKind::Table => "table",
        ExternalKind::Global => "global",
        ExternalKind::Tag => "tag",
        #[allow(unreachable_patterns)]
        _ => "export",
    }
}

/// Declared size of a memory or table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub initial: u64,
    pub maximum: Option<u64>,
}

/// What the checks need to know about a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSummary {
    /// `(module, field)` in section order.
    pub imports: Vec<(String, String)>,
    /// Imported memories first, then defined ones.
    pub memories: Vec<Limits>,
    /// Imported tables first, then defined ones.
    pub tables: Vec<Limits>,
    pub exports: Vec<(String, ExternalKind)>,
}

fn malformed(err: wasmparser::BinaryReaderError) -> ValidateError {
    ValidateError::MalformedModule {
        offset: err.offset(),
        message: err.message().to_string(),
    }
}

impl ModuleSummary {
    /// Validate the binary and collect imports, memories, tables and exports.
    pub fn read(bytes: &[u8]) -> Result<Self, ValidateError> {
        if bytes.is_empty() {
            return Err(ValidateError::EmptyBytecode);
        }
        let header = &bytes[..bytes.len().min(8)];
        if bytes.len() < 8 || header[..4] != WASM_MAGIC {
            return Err(ValidateError::BadMagic {
                header: hex::encode(header),
            });
        }
        if header[4..8] != WASM_VERSION {
            return Err(ValidateError::UnsupportedVersion {
                version: hex::encode(&header[4..8]),
            });
        }

        Validator::new().validate_all(bytes).map_err(malformed)?;

        let mut summary = ModuleSummary::default();
        for payload in Parser::new(0).parse_all(bytes) {
            match payload.map_err(malformed)? {
                Payload::ImportSection(reader) => {
                    for import in reader {
                        let import = import.map_err(malformed)?;
                        summary
                            .imports
                            .push((import.module.to_string(), import.name.to_string()));
                        match import.ty {
                            TypeRef::Memory(memory) => summary.memories.push(Limits {
                                initial: u64::from(memory.initial),
                                maximum: memory.maximum.map(u64::from),
                            }),
                            TypeRef::Table(table) => summary.tables.push(Limits {
                                initial: u64::from(table.initial),
                                maximum: table.maximum.map(u64::from),
                            }),
                            _ => {}
                        }
                    }
                }
                Payload::MemorySection(reader) => {
                    for memory in reader {
                        let memory = memory.map_err(malformed)?;
                        summary.memories.push(Limits {
                            initial: u64::from(memory.initial),
                            maximum: memory.maximum.map(u64::from),
                        });
                    }
                }
                Payload::TableSection(reader) => {
                    for table in reader {
                        let table = table.map_err(malformed)?;
                        summary.tables.push(Limits {
                            initial: u64::from(table.ty.initial),
                            maximum: table.ty.maximum.map(u64::from),
                        });
                    }
                }
                Payload::ExportSection(reader) => {
                    for export in reader {
                        let export = export.map_err(malformed)?;
                        summary.exports.push((export.name.to_string(), export.kind));
                    }
                }
                _ => {}
            }
        }
        Ok(summary)
    }

    fn exports(&self, name: &str, kind: ExternalKind) -> bool {
        self.exports
            .iter()
            .any(|(export, export_kind)| export == name && *export_kind == kind)
    }
}

/// Checks modules against one chain's bytecode policy.
#[derive(Debug, Clone, Copy)]
pub struct BytecodeValidator<'r> {
    rules: &'r ChainRules,
}

impl<'r> BytecodeValidator<'r> {
    pub fn new(rules: &'r ChainRules) -> Self {
        Self { rules }
    }

    pub fn validate(&self, bytes: &[u8]) -> Result<(), ValidateError> {
        let module = ModuleSummary::read(bytes)?;
        trace!(
            imports = module.imports.len(),
            memories = module.memories.len(),
            tables = module.tables.len(),
            exports = module.exports.len(),
            "module structure valid"
        );
        self.check_imports(&module)?;
        self.check_limits(&module)?;
        check_entry_contract(&module)
    }

    fn check_imports(&self, module: &ModuleSummary) -> Result<(), ValidateError> {
        let policy = &self.rules.bytecode;
        match module
            .imports
            .iter()
            .find(|(module, field)| !policy.allows_import(module, field))
        {
            Some((module, field)) => Err(ValidateError::ImportNotAllowed {
                import: format!("{}.{}", module, field),
                chain: self.rules.chain,
            }),
            None => Ok(()),
        }
    }

    fn check_limits(&self, module: &ModuleSummary) -> Result<(), ValidateError> {
        let policy = &self.rules.bytecode;
        let chain = self.rules.chain;

        for (index, memory) in module.memories.iter().enumerate() {
            if let Some((bound, declared)) = exceeded(memory, policy.max_memory_pages) {
                return Err(ValidateError::MemoryLimitExceeded {
                    index,
                    bound,
                    limit: policy.max_memory_pages,
                    declared,
                    chain,
                });
            }
        }
        for (index, table) in module.tables.iter().enumerate() {
            if let Some((bound, declared)) = exceeded(table, policy.max_table_elements) {
                return Err(ValidateError::TableLimitExceeded {
                    index,
                    bound,
                    limit: policy.max_table_elements,
                    declared,
                    chain,
                });
            }
        }
        Ok(())
    }
}

fn exceeded(limits: &Limits, ceiling: u64) -> Option<(LimitBound, u64)> {
    if limits.initial > ceiling {
        return Some((LimitBound::Initial, limits.initial));
    }
    match limits.maximum {
        Some(maximum) if maximum > ceiling => Some((LimitBound::Maximum, maximum)),
        _ => None,
    }
}

fn check_entry_contract(module: &ModuleSummary) -> Result<(), ValidateError> {
    for (name, kind) in REQUIRED_EXPORTS {
        if !module.exports(name, *kind) {
            return Err(ValidateError::MissingExport {
                name: *name,
                expected: kind_name(*kind),
            });
        }
    }
    Ok(())
}

/// Convenience wrapper over [`BytecodeValidator`] for a chain of `registry`.
pub fn validate_module(
    registry: &crate::Registry,
    chain: ChainType,
    bytes: &[u8],
) -> Result<(), ValidateError> {
    BytecodeValidator::new(registry.rules_for(chain)).validate(bytes)
}
