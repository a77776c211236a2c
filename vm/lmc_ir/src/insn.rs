//! Decoded instructions.

use std::fmt;

use crate::Addr;

/// One decoded machine instruction, operands inline.
///
/// Environment accessors count `frames` parent hops before indexing `slot`.
/// Call instructions carry the argument count the callee frame receives.
/// Branch instructions carry both target addresses; the taken branch is
/// decided by the condition popped at run time.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Insn {
    // Constants and environment
    Ldc(i32),
    Ld { frames: u32, slot: u32 },
    St { frames: u32, slot: u32 },

    // Integer arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Integer comparison
    Ceq,
    Cgt,
    Cgte,

    // Type test
    Atom,

    // Pairs
    Cons,
    Car,
    Cdr,

    // Closures and calls
    Ldf(Addr),
    Ap(u32),
    Rtn,

    // Recursive binding
    Dum(u32),
    Rap(u32),

    // Branching
    Sel { true_branch: Addr, false_branch: Addr },
    Join,

    // Tail forms
    Tsel { true_branch: Addr, false_branch: Addr },
    Tap(u32),
    Trap(u32),

    // Trace output
    Debug,
}

crate::static_assert_size!(Insn, 12);

impl Insn {
    /// Returns the upper-case mnemonic for this instruction.
    ///
    /// Used in fault messages and by the disassembler.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ldc(_) => "LDC",
            Self::Ld { .. } => "LD",
            Self::St { .. } => "ST",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Ceq => "CEQ",
            Self::Cgt => "CGT",
            Self::Cgte => "CGTE",
            Self::Atom => "ATOM",
            Self::Cons => "CONS",
            Self::Car => "CAR",
            Self::Cdr => "CDR",
            Self::Ldf(_) => "LDF",
            Self::Ap(_) => "AP",
            Self::Rtn => "RTN",
            Self::Dum(_) => "DUM",
            Self::Rap(_) => "RAP",
            Self::Sel { .. } => "SEL",
            Self::Join => "JOIN",
            Self::Tsel { .. } => "TSEL",
            Self::Tap(_) => "TAP",
            Self::Trap(_) => "TRAP",
            Self::Debug => "DEBUG",
        }
    }
}

/// Renders `MNEMONIC [operand [operand]]`, the exact form the loader accepts.
impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match *self {
            Self::Ldc(n) => write!(f, "{name} {n}"),
            Self::Ld { frames, slot } | Self::St { frames, slot } => {
                write!(f, "{name} {frames} {slot}")
            }
            Self::Ldf(addr) => write!(f, "{name} {addr}"),
            Self::Ap(n) | Self::Dum(n) | Self::Rap(n) | Self::Tap(n) | Self::Trap(n) => {
                write!(f, "{name} {n}")
            }
            Self::Sel { true_branch, false_branch }
            | Self::Tsel { true_branch, false_branch } => {
                write!(f, "{name} {true_branch} {false_branch}")
            }
            _ => f.write_str(name),
        }
    }
}
