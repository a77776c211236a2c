//! Game-level failures.
//!
//! Everything that can stop a game before its natural ending lands here:
//! bad maps, agent programs that do not load, and machine faults raised
//! while an agent runs. Faults carry the name of the offending agent so
//! a driver can report which script misbehaved.

use std::fmt;

use lmc_asm::AsmError;
use lmc_vm::Fault;

use crate::map::MapError;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WorldError {
    /// The maze text did not parse.
    Map(MapError),
    /// An agent program did not assemble.
    Load { agent: String, error: AsmError },
    /// An agent's machine faulted mid-game.
    Fault { agent: String, fault: Fault },
    /// The startup call returned something other than
    /// `(state . step-closure)`.
    BadStartup { agent: String, got: &'static str },
    /// A step call returned a verdict that is neither an integer nor a
    /// closure.
    BadVerdict { agent: String, got: &'static str },
    /// The maze has ghost starts but no ghost program was supplied.
    NoGhostProgram { ghosts: usize },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Map(error) => write!(f, "{error}"),
            WorldError::Load { agent, error } => {
                write!(f, "{agent}: program failed to load: {error}")
            }
            WorldError::Fault { agent, fault } => write!(f, "{agent}: {fault}"),
            WorldError::BadStartup { agent, got } => {
                write!(f, "{agent}: startup must return (state . step closure), cdr was {got}")
            }
            WorldError::BadVerdict { agent, got } => {
                write!(f, "{agent}: step verdict must be an integer or a closure, got {got}")
            }
            WorldError::NoGhostProgram { ghosts } => {
                write!(f, "maze places {ghosts} ghost(s) but no ghost program was supplied")
            }
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Map(error) => Some(error),
            WorldError::Load { error, .. } => Some(error),
            WorldError::Fault { fault, .. } => Some(fault),
            WorldError::BadStartup { .. }
            | WorldError::BadVerdict { .. }
            | WorldError::NoGhostProgram { .. } => None,
        }
    }
}

impl From<MapError> for WorldError {
    fn from(error: MapError) -> Self {
        WorldError::Map(error)
    }
}

#[cold]
pub(crate) fn load_failed(agent: &str, error: AsmError) -> WorldError {
    WorldError::Load { agent: agent.to_owned(), error }
}

#[cold]
pub(crate) fn agent_fault(agent: &str, fault: Fault) -> WorldError {
    WorldError::Fault { agent: agent.to_owned(), fault }
}

#[cold]
pub(crate) fn bad_startup(agent: &str, got: &'static str) -> WorldError {
    WorldError::BadStartup { agent: agent.to_owned(), got }
}

#[cold]
pub(crate) fn bad_verdict(agent: &str, got: &'static str) -> WorldError {
    WorldError::BadVerdict { agent: agent.to_owned(), got }
}
