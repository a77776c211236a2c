//! Machine faults.
//!
//! Every fault is fatal: agent scripts are untrusted, so nothing here is
//! catchable in-language. The machine attaches the faulting instruction's
//! address on the way out of the dispatch loop.

use std::error::Error;
use std::fmt;

use lmc_ir::Addr;

/// Why a run was aborted.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FaultKind {
    /// An operand had the wrong type for the instruction.
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    /// An environment walk ran past the root frame.
    ScopeExhausted { frames: u32, depth: u32 },
    /// A slot index fell outside its frame.
    SlotOutOfBounds { slot: u32, len: usize },
    /// A recursive call's closure did not match the binding frame.
    FrameMismatch { detail: String },
    /// DIV with a zero divisor.
    DivisionByZero,
    /// The instruction budget was spent with work remaining.
    BudgetExhausted { budget: u64 },
    /// CONS would take the live-cell count past the cap.
    CellLimitExceeded { limit: usize },
    /// The run finished but left something other than a pair on top.
    ResultNotPair { got: &'static str },
    /// A pop found its stack empty.
    StackUnderflow {
        op: &'static str,
        stack: &'static str,
    },
    /// The program counter left the program.
    InvalidAddress { addr: Addr },
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { op, expected, got } => {
                write!(f, "{op} expects {expected}, got {got}")
            }
            Self::ScopeExhausted { frames, depth } => {
                write!(f, "environment walk of {frames} frames ran past the root (depth {depth})")
            }
            Self::SlotOutOfBounds { slot, len } => {
                write!(f, "slot {slot} out of bounds for a frame of {len}")
            }
            Self::FrameMismatch { detail } => {
                write!(f, "recursive frame mismatch: {detail}")
            }
            Self::DivisionByZero => f.write_str("division by zero"),
            Self::BudgetExhausted { budget } => {
                write!(f, "instruction budget of {budget} exhausted")
            }
            Self::CellLimitExceeded { limit } => {
                write!(f, "live pair limit of {limit} exceeded")
            }
            Self::ResultNotPair { got } => {
                write!(f, "run result must be a pair, got {got}")
            }
            Self::StackUnderflow { op, stack } => {
                write!(f, "{op} popped an empty {stack} stack")
            }
            Self::InvalidAddress { addr } => {
                write!(f, "program counter left the program at address {addr}")
            }
        }
    }
}

/// A fatal machine fault, with the faulting address once known.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Fault {
    pub kind: FaultKind,
    pub pc: Option<Addr>,
}

impl Fault {
    #[cold]
    fn new(kind: FaultKind) -> Self {
        Fault { kind, pc: None }
    }

    /// Attach the address of the faulting instruction.
    ///
    /// The first attachment wins: a fault crossing several dispatch layers
    /// keeps the innermost location.
    #[must_use]
    pub fn at(mut self, pc: Addr) -> Self {
        self.pc.get_or_insert(pc);
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pc {
            Some(pc) => write!(f, "{} (at address {pc})", self.kind),
            None => self.kind.fmt(f),
        }
    }
}

impl Error for Fault {}

#[cold]
pub fn type_mismatch(op: &'static str, expected: &'static str, got: &'static str) -> Fault {
    Fault::new(FaultKind::TypeMismatch { op, expected, got })
}

#[cold]
pub fn scope_exhausted(frames: u32, depth: u32) -> Fault {
    Fault::new(FaultKind::ScopeExhausted { frames, depth })
}

#[cold]
pub fn slot_out_of_bounds(slot: u32, len: usize) -> Fault {
    Fault::new(FaultKind::SlotOutOfBounds { slot, len })
}

#[cold]
pub fn frame_mismatch(detail: impl Into<String>) -> Fault {
    Fault::new(FaultKind::FrameMismatch { detail: detail.into() })
}

#[cold]
pub fn division_by_zero() -> Fault {
    Fault::new(FaultKind::DivisionByZero)
}

#[cold]
pub fn budget_exhausted(budget: u64) -> Fault {
    Fault::new(FaultKind::BudgetExhausted { budget })
}

#[cold]
pub fn cell_limit_exceeded(limit: usize) -> Fault {
    Fault::new(FaultKind::CellLimitExceeded { limit })
}

#[cold]
pub fn result_not_pair(got: &'static str) -> Fault {
    Fault::new(FaultKind::ResultNotPair { got })
}

#[cold]
pub fn stack_underflow(op: &'static str, stack: &'static str) -> Fault {
    Fault::new(FaultKind::StackUnderflow { op, stack })
}

#[cold]
pub fn invalid_address(addr: Addr) -> Fault {
    Fault::new(FaultKind::InvalidAddress { addr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_instruction_and_address() {
        let fault = type_mismatch("CAR", "pair", "integer").at(Addr::new(3));
        assert_eq!(fault.to_string(), "CAR expects pair, got integer (at address 3)");
    }

    #[test]
    fn first_attached_address_wins() {
        let fault = division_by_zero().at(Addr::new(2)).at(Addr::new(9));
        assert_eq!(fault.pc, Some(Addr::new(2)));
    }
}
