//! Loader errors.

use std::error::Error;
use std::fmt;

/// Why a line failed to decode.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum AsmErrorKind {
    /// Mnemonic is not in the instruction set.
    UnknownMnemonic { mnemonic: String },
    /// Wrong number of operands for the mnemonic.
    OperandCount {
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },
    /// Operand is not a base-10 integer.
    MalformedOperand { operand: String },
    /// Operand is an integer but outside the range the position accepts.
    OperandRange {
        operand: String,
        expected: &'static str,
    },
    /// Listing exceeds the addressable instruction count.
    ProgramTooLarge { limit: u32 },
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic { mnemonic } => {
                write!(f, "unknown mnemonic `{mnemonic}`")
            }
            Self::OperandCount { mnemonic, expected, found } => {
                write!(f, "{mnemonic} takes {expected} operand(s), found {found}")
            }
            Self::MalformedOperand { operand } => {
                write!(f, "malformed operand `{operand}`")
            }
            Self::OperandRange { operand, expected } => {
                write!(f, "operand `{operand}` must be {expected}")
            }
            Self::ProgramTooLarge { limit } => {
                write!(f, "listing exceeds {limit} instructions")
            }
        }
    }
}

/// A fatal load failure, positioned at its source line.
///
/// `line` is 1-based (editor convention); `text` is the offending line with
/// surrounding whitespace trimmed.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AsmError {
    kind: AsmErrorKind,
    line: usize,
    text: String,
}

impl AsmError {
    #[cold]
    pub(crate) fn new(kind: AsmErrorKind, line: usize, text: &str) -> Self {
        AsmError { kind, line, text: text.trim().to_owned() }
    }

    pub fn kind(&self) -> &AsmErrorKind {
        &self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}: {}", self.kind, self.line, self.text)
    }
}

impl Error for AsmError {}
