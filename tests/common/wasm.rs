//! Minimal WebAssembly encoder for bytecode tests.
//!
//! Every defined function has type `() -> ()` and an empty body. Imports are
//! function imports unless added through [`ModuleBuilder::import_memory`].

const HEADER: &[u8] = b"\0asm\x01\0\0\0";

const SECTION_TYPE: u8 = 1;
const SECTION_IMPORT: u8 = 2;
const SECTION_FUNCTION: u8 = 3;
const SECTION_TABLE: u8 = 4;
const SECTION_MEMORY: u8 = 5;
const SECTION_EXPORT: u8 = 7;
const SECTION_CODE: u8 = 10;

const EXPORT_FUNC: u8 = 0x00;
const EXPORT_MEMORY: u8 = 0x02;

/// Exports an AssemblyScript daemon needs besides `memory`.
pub const RUNTIME_FUNCTIONS: &[&str] = &["main", "__new", "__pin", "__unpin", "__collect"];

pub fn leb128(mut value: u32, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn name(text: &str, out: &mut Vec<u8>) {
    leb128(text.len() as u32, out);
    out.extend_from_slice(text.as_bytes());
}

fn limits(initial: u32, maximum: Option<u32>, out: &mut Vec<u8>) {
    match maximum {
        Some(maximum) => {
            out.push(0x01);
            leb128(initial, out);
            leb128(maximum, out);
        }
        None => {
            out.push(0x00);
            leb128(initial, out);
        }
    }
}

fn section(id: u8, count: usize, body: Vec<u8>, out: &mut Vec<u8>) {
    let mut content = Vec::new();
    leb128(count as u32, &mut content);
    content.extend(body);
    out.push(id);
    leb128(content.len() as u32, out);
    out.extend(content);
}

enum Import {
    Func(String, String),
    Memory(String, String, u32, Option<u32>),
}

#[derive(Default)]
pub struct ModuleBuilder {
    imports: Vec<Import>,
    functions: Vec<String>,
    memory: Option<(u32, Option<u32>)>,
    table: Option<(u32, Option<u32>)>,
    export_memory: bool,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One page of memory plus every export the runtime resolves.
    pub fn assembly_script() -> Self {
        let mut builder = Self::new().memory(1, None).export_memory();
        for function in RUNTIME_FUNCTIONS {
            builder = builder.export_function(function);
        }
        builder
    }

    pub fn import_function(mut self, module: &str, field: &str) -> Self {
        self.imports
            .push(Import::Func(module.to_string(), field.to_string()));
        self
    }

    /// Replaces the defined memory with an imported one.
    pub fn import_memory(mut self, module: &str, field: &str, initial: u32, maximum: Option<u32>) -> Self {
        self.memory = None;
        self.imports.push(Import::Memory(
            module.to_string(),
            field.to_string(),
            initial,
            maximum,
        ));
        self
    }

    pub fn memory(mut self, initial: u32, maximum: Option<u32>) -> Self {
        self.memory = Some((initial, maximum));
        self
    }

    pub fn table(mut self, initial: u32, maximum: Option<u32>) -> Self {
        self.table = Some((initial, maximum));
        self
    }

    pub fn export_function(mut self, export: &str) -> Self {
        self.functions.push(export.to_string());
        self
    }

    pub fn without_function(mut self, export: &str) -> Self {
        self.functions.retain(|function| function != export);
        self
    }

    pub fn export_memory(mut self) -> Self {
        self.export_memory = true;
        self
    }

    pub fn without_memory_export(mut self) -> Self {
        self.export_memory = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = HEADER.to_vec();

        // type 0: () -> ()
        section(SECTION_TYPE, 1, vec![0x60, 0x00, 0x00], &mut out);

        let mut imported_functions = 0u32;
        if !self.imports.is_empty() {
            let mut body = Vec::new();
            for import in &self.imports {
                match import {
                    Import::Func(module, field) => {
                        name(module, &mut body);
                        name(field, &mut body);
                        body.extend_from_slice(&[0x00, 0x00]);
                        imported_functions += 1;
                    }
                    Import::Memory(module, field, initial, maximum) => {
                        name(module, &mut body);
                        name(field, &mut body);
                        body.push(0x02);
                        limits(*initial, *maximum, &mut body);
                    }
                }
            }
            section(SECTION_IMPORT, self.imports.len(), body, &mut out);
        }

        if !self.functions.is_empty() {
            section(
                SECTION_FUNCTION,
                self.functions.len(),
                vec![0x00; self.functions.len()],
                &mut out,
            );
        }

        if let Some((initial, maximum)) = self.table {
            let mut body = vec![0x70];
            limits(initial, maximum, &mut body);
            section(SECTION_TABLE, 1, body, &mut out);
        }

        if let Some((initial, maximum)) = self.memory {
            let mut body = Vec::new();
            limits(initial, maximum, &mut body);
            section(SECTION_MEMORY, 1, body, &mut out);
        }

        let has_memory = self.memory.is_some()
            || self
                .imports
                .iter()
                .any(|import| matches!(import, Import::Memory(..)));
        let export_memory = self.export_memory && has_memory;
        let export_count = self.functions.len() + usize::from(export_memory);
        if export_count > 0 {
            let mut body = Vec::new();
            for (index, function) in self.functions.iter().enumerate() {
                name(function, &mut body);
                body.push(EXPORT_FUNC);
                leb128(imported_functions + index as u32, &mut body);
            }
            if export_memory {
                name("memory", &mut body);
                body.push(EXPORT_MEMORY);
                leb128(0, &mut body);
            }
            section(SECTION_EXPORT, export_count, body, &mut out);
        }

        if !self.functions.is_empty() {
            let mut body = Vec::new();
            for _ in &self.functions {
                // size 2: no locals, end
                body.extend_from_slice(&[0x02, 0x00, 0x0b]);
            }
            section(SECTION_CODE, self.functions.len(), body, &mut out);
        }

        out
    }
}

