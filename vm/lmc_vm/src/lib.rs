//! Lambda-Chase virtual machine.
//!
//! A stack machine with lexical closures that runs untrusted agent scripts
//! under hard resource bounds. Each agent owns one [`Machine`]; machines
//! share nothing, run single-threaded, and behave deterministically, so a
//! game is reproducible from its inputs alone.
//!
//! # Resource bounds
//!
//! - An instruction budget per run call ([`TICK_BUDGET`], sixty-fold for the
//!   startup call entered at address 0).
//! - A live pair cap ([`MAX_LIVE_CELLS`]) charged at CONS and released by
//!   reference counting.
//!
//! Exceeding either is a fatal [`Fault`], like every other failure an
//! untrusted listing can produce: there is no catching mechanism in-language.
//!
//! # Memory model
//!
//! Pairs are immutable and shared; environments form a tree of mutable
//! frames. The single reference cycle the design permits — a recursive
//! binding frame whose closures capture that frame — is tracked by the
//! machine and broken at teardown, so dropping a machine reclaims
//! everything it allocated.

mod env;
mod fault;
mod limits;
mod machine;
mod trace;
mod value;

pub use env::EnvRef;
pub use fault::{Fault, FaultKind};
pub use limits::{Limits, MAX_LIVE_CELLS, STARTUP_BUDGET_FACTOR, TICK_BUDGET};
pub use machine::Machine;
pub use trace::TraceSink;
pub use value::{CellLedger, Closure, PairRef, Value};
