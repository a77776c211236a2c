//! Lambda-Chase assembly loader.
//!
//! Translates line-oriented text listings into [`lmc_ir::Program`] values:
//! - one instruction per non-blank line, mnemonics case-insensitive;
//! - up to two base-10 integer operands, whitespace-separated;
//! - `;` starts a comment running to end of line;
//! - blank and comment-only lines are skipped and consume no address, so an
//!   instruction's address is the 0-based ordinal of its non-blank line.
//!
//! Loading is all-or-nothing: the first malformed line fails the whole
//! listing with an [`AsmError`] naming the line. Branch targets are *not*
//! validated here — an address operand may point anywhere, and the machine
//! faults only if such an address is actually reached.

mod disasm;
mod error;
mod loader;

pub use disasm::disassemble;
pub use error::{AsmError, AsmErrorKind};
pub use loader::load;
