//! Lambda-Chase IR - Instruction Set Types
//!
//! This crate contains the core data structures shared by the loader, the
//! machine, and the tooling:
//! - `Addr` for code addresses (instruction ordinals)
//! - `Insn` for decoded instructions with operands inline
//! - `Program` for an immutable instruction sequence
//!
//! # Design Philosophy
//!
//! - **Decode once**: text listings are decoded by `lmc_asm` into `Insn`
//!   values; the machine never re-parses operands on the hot path.
//! - **Flat addressing**: an address is the 0-based ordinal of a decoded
//!   instruction. There are no labels and no relocation at this level.
//! - **Round-trippable**: `Insn`'s `Display` output is accepted verbatim by
//!   the loader, so disassembly and reassembly agree.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod addr;
mod insn;
mod program;

pub use addr::Addr;
pub use insn::Insn;
pub use program::Program;
