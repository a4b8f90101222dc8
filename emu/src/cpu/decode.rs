//! # A64 decode tree
//!
//! Decoding is table driven. Each [`DispatchTable`] gathers a handful of
//! instruction bits into a key and jumps to the executor stored at that
//! index. Tables are exhaustive over their key width, so a decode gap shows
//! up as a failing test instead of a silently ignored instruction.
//!
//! The top level looks at bits `[28:25]`:
//!
//! ```text
//! ┌──────────┬────────────────────────────────────────┐
//! │ [28:25]  │ Group                                  │
//! ├──────────┼────────────────────────────────────────┤
//! │ 0000     │ simulator pseudo instructions          │
//! │ 0001     │ unallocated                            │
//! │ 0010     │ unallocated                            │
//! │ 0011     │ unallocated                            │
//! │ 100x     │ data processing, immediate             │
//! │ 101x     │ branches, exceptions, system           │
//! │ x1x0     │ loads and stores                       │
//! │ x101     │ data processing, register              │
//! │ x111     │ SIMD and floating point                │
//! └──────────┴────────────────────────────────────────┘
//! ```
//!
//! Every group has its own second-level key. Anything below that is
//! decoded with a `match` inside the executor, always ending in an explicit
//! unallocated arm.

use crate::cpu::interpreter::Interpreter;
use crate::cpu::status::{ErrorKind, ExecResult};

/// Executes one decoded instruction word.
pub type Executor = fn(&mut Interpreter, u32) -> ExecResult;

pub struct DispatchTable {
    pub name: &'static str,

    /// Instruction bits forming the key. The first one is the most
    /// significant bit of the key, whatever its position in the word.
    pub key_bits: &'static [u32],

    /// One executor per key value.
    pub entries: &'static [Executor],
}

impl DispatchTable {
    #[must_use]
    pub fn key(&self, word: u32) -> usize {
        self.key_bits
            .iter()
            .fold(0, |key, &bit| (key << 1) | ((word >> bit) & 1) as usize)
    }

    /// Runs the executor selected by `word`.
    ///
    /// # Errors
    ///
    /// Whatever the executor reports.
    pub fn dispatch(&self, cpu: &mut Interpreter, word: u32) -> ExecResult {
        match self.entries.get(self.key(word)) {
            Some(executor) => executor(cpu, word),
            None => Err(unallocated(word, self.name)),
        }
    }
}

/// Reports a reserved encoding.
pub(crate) fn unallocated(word: u32, what: &str) -> ErrorKind {
    tracing::debug!("unallocated {what}: {word:#010X}");
    ErrorKind::UnallocatedInstruction
}

/// Reports a real encoding the simulator does not model.
pub(crate) fn not_yet_implemented(word: u32, what: &str) -> ErrorKind {
    tracing::debug!("not yet implemented {what}: {word:#010X}");
    ErrorKind::NotYetImplemented
}

fn unallocated_group(_: &mut Interpreter, word: u32) -> ExecResult {
    Err(unallocated(word, "top level group"))
}

fn load_store(cpu: &mut Interpreter, word: u32) -> ExecResult {
    LOAD_STORE.dispatch(cpu, word)
}

fn data_processing_immediate(cpu: &mut Interpreter, word: u32) -> ExecResult {
    DATA_PROCESSING_IMMEDIATE.dispatch(cpu, word)
}

fn data_processing_register(cpu: &mut Interpreter, word: u32) -> ExecResult {
    DATA_PROCESSING_REGISTER.dispatch(cpu, word)
}

fn data_processing_register_misc(cpu: &mut Interpreter, word: u32) -> ExecResult {
    DATA_PROCESSING_REGISTER_MISC.dispatch(cpu, word)
}

fn branch_exception_system(cpu: &mut Interpreter, word: u32) -> ExecResult {
    BRANCH_EXCEPTION_SYSTEM.dispatch(cpu, word)
}

fn simd_and_fp(cpu: &mut Interpreter, word: u32) -> ExecResult {
    SIMD_AND_FP.dispatch(cpu, word)
}

fn unallocated_in_data_processing_register(_: &mut Interpreter, word: u32) -> ExecResult {
    Err(unallocated(word, "data processing (register)"))
}

fn unallocated_in_branch(_: &mut Interpreter, word: u32) -> ExecResult {
    Err(unallocated(word, "branch, exception, system"))
}

static TOP_LEVEL_ENTRIES: [Executor; 16] = [
    Interpreter::pseudo,            // 0000
    unallocated_group,              // 0001
    unallocated_group,              // 0010
    unallocated_group,              // 0011
    load_store,                     // 0100
    data_processing_register,       // 0101
    load_store,                     // 0110
    simd_and_fp,                    // 0111
    data_processing_immediate,      // 1000
    data_processing_immediate,      // 1001
    branch_exception_system,        // 1010
    branch_exception_system,        // 1011
    load_store,                     // 1100
    data_processing_register,       // 1101
    load_store,                     // 1110
    simd_and_fp,                    // 1111
];

pub static TOP_LEVEL: DispatchTable = DispatchTable {
    name: "top level",
    key_bits: &[28, 27, 26, 25],
    entries: &TOP_LEVEL_ENTRIES,
};

static LOAD_STORE_ENTRIES: [Executor; 8] = [
    Interpreter::load_store_exclusive,        // 00 0
    Interpreter::simd_load_store_structure,   // 00 1
    Interpreter::load_literal,                // 01 0
    Interpreter::load_literal,                // 01 1
    Interpreter::load_store_pair,             // 10 0
    Interpreter::load_store_pair,             // 10 1
    Interpreter::load_store_register,         // 11 0
    Interpreter::load_store_register,         // 11 1
];

/// Loads and stores, keyed on `[29:28]` and the vector bit `[26]`.
pub static LOAD_STORE: DispatchTable = DispatchTable {
    name: "loads and stores",
    key_bits: &[29, 28, 26],
    entries: &LOAD_STORE_ENTRIES,
};

static DATA_PROCESSING_IMMEDIATE_ENTRIES: [Executor; 8] = [
    Interpreter::pc_relative,                 // 000
    Interpreter::pc_relative,                 // 001
    Interpreter::add_sub_immediate,           // 010
    Interpreter::add_sub_immediate_tags,      // 011
    Interpreter::logical_immediate,           // 100
    Interpreter::move_wide,                   // 101
    Interpreter::bitfield,                    // 110
    Interpreter::extract,                     // 111
];

/// Data processing (immediate), keyed on `[25:23]`.
pub static DATA_PROCESSING_IMMEDIATE: DispatchTable = DispatchTable {
    name: "data processing (immediate)",
    key_bits: &[25, 24, 23],
    entries: &DATA_PROCESSING_IMMEDIATE_ENTRIES,
};

static DATA_PROCESSING_REGISTER_ENTRIES: [Executor; 8] = [
    Interpreter::logical_shifted_register,    // 0 0 0
    Interpreter::logical_shifted_register,    // 0 0 1
    Interpreter::add_sub_shifted_register,    // 0 1 0
    Interpreter::add_sub_extended_register,   // 0 1 1
    data_processing_register_misc,            // 1 0 0
    unallocated_in_data_processing_register,  // 1 0 1
    Interpreter::data_processing_3_source,    // 1 1 0
    Interpreter::data_processing_3_source,    // 1 1 1
];

/// Data processing (register), keyed on `[28]`, `[24]` and `[21]`.
pub static DATA_PROCESSING_REGISTER: DispatchTable = DispatchTable {
    name: "data processing (register)",
    key_bits: &[28, 24, 21],
    entries: &DATA_PROCESSING_REGISTER_ENTRIES,
};

static DATA_PROCESSING_REGISTER_MISC_ENTRIES: [Executor; 4] = [
    Interpreter::add_sub_carry,               // 00
    Interpreter::conditional_compare,         // 01
    Interpreter::conditional_select,          // 10
    Interpreter::data_processing_source,      // 11
];

/// The `[28]=1, [24]=0, [21]=0` corner of data processing (register), keyed
/// on `[23:22]`.
pub static DATA_PROCESSING_REGISTER_MISC: DispatchTable = DispatchTable {
    name: "data processing (register, misc)",
    key_bits: &[23, 22],
    entries: &DATA_PROCESSING_REGISTER_MISC_ENTRIES,
};

static BRANCH_EXCEPTION_SYSTEM_ENTRIES: [Executor; 8] = [
    Interpreter::branch_immediate,            // 000 B
    Interpreter::compare_and_test_branch,     // 001
    Interpreter::conditional_branch,          // 010
    unallocated_in_branch,                    // 011
    Interpreter::branch_immediate,            // 100 BL
    Interpreter::compare_and_test_branch,     // 101
    Interpreter::exception_system_register_branch, // 110
    unallocated_in_branch,                    // 111
];

/// Branches, exception generation and system instructions, keyed on
/// `[31:29]`.
pub static BRANCH_EXCEPTION_SYSTEM: DispatchTable = DispatchTable {
    name: "branch, exception, system",
    key_bits: &[31, 30, 29],
    entries: &BRANCH_EXCEPTION_SYSTEM_ENTRIES,
};

static SIMD_AND_FP_ENTRIES: [Executor; 8] = [
    Interpreter::simd_vector,                 // 0 0 0
    Interpreter::simd_vector_immediate,       // 0 0 1
    Interpreter::simd_vector,                 // 0 1 0
    Interpreter::simd_vector_immediate,       // 0 1 1
    Interpreter::float_data_processing,       // 1 0 0
    Interpreter::float_data_processing_3,     // 1 0 1
    Interpreter::simd_scalar,                 // 1 1 0
    Interpreter::simd_scalar_immediate,       // 1 1 1
];

/// SIMD and floating point, keyed on `[28]`, `[30]` and `[24]`.
///
/// With `[28]` clear the instruction is a vector operation and `[30]` is the
/// `Q` bit; with `[28]` set, `[30]` separates scalar SIMD from plain
/// floating point.
pub static SIMD_AND_FP: DispatchTable = DispatchTable {
    name: "SIMD and floating point",
    key_bits: &[28, 30, 24],
    entries: &SIMD_AND_FP_ENTRIES,
};

/// Every dispatch table of the decode tree.
pub static TABLES: [&DispatchTable; 7] = [
    &TOP_LEVEL,
    &LOAD_STORE,
    &DATA_PROCESSING_IMMEDIATE,
    &DATA_PROCESSING_REGISTER,
    &DATA_PROCESSING_REGISTER_MISC,
    &BRANCH_EXCEPTION_SYSTEM,
    &SIMD_AND_FP,
];

/// Decodes and executes one instruction word.
///
/// # Errors
///
/// The decode or execution failure of the instruction.
pub fn execute(cpu: &mut Interpreter, word: u32) -> ExecResult {
    TOP_LEVEL.dispatch(cpu, word)
}
