//! Maze-chase harness around the Lambda-Chase machine.
//!
//! Wires scripted agents into the classic chase: parse a maze, spawn one
//! isolated machine per agent, encode the world into machine values each
//! move, and apply the movement, eating and collision rules until the game
//! ends.
//!
//! Agents never share anything: each gets its own machine, its own cell
//! ledger, and a fresh encoding of the world per move. Any machine fault
//! aborts the whole game — scripts are untrusted, and a faulting agent has
//! no defined next state.

mod agent;
mod encode;
mod error;
mod game;
mod map;

pub use agent::Agent;
pub use error::WorldError;
pub use game::{Ending, Game, GameConfig, Outcome};
pub use map::{Cell, Direction, MapError, Maze, Pos};
