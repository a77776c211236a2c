//! One scripted agent and its calling convention.
//!
//! Every agent owns a whole machine. The game calls its program twice over:
//! once at startup and once per move.
//!
//! ```text
//! startup   entry 0       (world, aux)    -> (state . step-closure)
//! each move step-closure  (state, world)  -> (state' . verdict)
//! ```
//!
//! `aux` is `0` for lambda-man and the ghost index for ghosts. `state` is
//! opaque to the game: it is stored between moves and handed back verbatim,
//! alive on the agent's own ledger. The verdict is an integer heading, or a
//! replacement step closure to call from the next move on.

use lmc_ir::Addr;
use lmc_vm::{CellLedger, Closure, Machine, Value};

use crate::error::{self, WorldError};
use crate::map::Direction;

pub struct Agent {
    name: String,
    machine: Machine,
    state: Value,
    step: Closure,
}

impl Agent {
    /// Runs the startup call and captures the agent's state and step
    /// closure. `world` must already be encoded on this machine's ledger.
    pub fn spawn(
        name: String,
        mut machine: Machine,
        world: Value,
        aux: i32,
    ) -> Result<Self, WorldError> {
        let entry = Closure::toplevel(Addr::ZERO);
        let result = machine
            .run(&entry, vec![world, Value::int(aux)])
            .map_err(|fault| error::agent_fault(&name, fault))?;
        let state = result.car();
        let step = match result.cdr() {
            Value::Closure(step) => step,
            other => return Err(error::bad_startup(&name, other.type_name())),
        };
        Ok(Agent { name, machine, state, step })
    }

    /// Runs one step call. Returns the requested heading, or `None` when
    /// the agent keeps its current one (out-of-range integer, or a closure
    /// verdict that swapped the step function instead of moving).
    pub fn decide(&mut self, world: Value) -> Result<Option<Direction>, WorldError> {
        let args = vec![self.state.clone(), world];
        let result = self
            .machine
            .run(&self.step, args)
            .map_err(|fault| error::agent_fault(&self.name, fault))?;
        self.state = result.car();
        match result.cdr() {
            Value::Int(code) => Ok(Direction::from_code(code)),
            Value::Closure(next) => {
                self.step = next;
                Ok(None)
            }
            Value::Pair(_) => Err(error::bad_verdict(&self.name, "pair")),
        }
    }

    /// Ledger world encodings for this agent must charge.
    #[must_use]
    pub fn ledger(&self) -> &CellLedger {
        self.machine.ledger()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
