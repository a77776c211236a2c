//! Immutable instruction sequence.

use crate::{Addr, Insn};

/// A loaded program: instructions in address order.
///
/// Immutable after construction. Addresses index directly into the sequence;
/// nothing here validates that branch targets land inside it — the machine
/// faults at execution time if one does not.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Program {
    insns: Vec<Insn>,
}

impl Program {
    /// Wrap a decoded instruction vector.
    pub fn from_insns(insns: Vec<Insn>) -> Self {
        Program { insns }
    }

    /// Instruction at `addr`, if the address is in range.
    #[inline]
    pub fn get(&self, addr: Addr) -> Option<Insn> {
        self.insns.get(addr.index()).copied()
    }

    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.insns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    /// All instructions in address order.
    #[inline]
    pub fn as_slice(&self) -> &[Insn] {
        &self.insns
    }
}
