//! The dispatch loop.
//!
//! One `Machine` runs one agent's program, single-threaded and deterministic:
//! identical program, entry and arguments always produce the identical result
//! and instruction count.
//!
//! # Architecture
//!
//! ```text
//! run(entry, args)
//!   ├─ data stack      values under construction
//!   ├─ control stack   tagged continuations (join points / returns)
//!   ├─ env register    current frame of the environment tree
//!   └─ pc register     address of the instruction being executed
//! ```
//!
//! The loop snapshots the pc, executes one instruction, and advances the pc
//! only if the instruction left it untouched — branch and call instructions
//! set it themselves. The run ends when the control stack empties; each
//! instruction executed past that point would exceed the budget instead.
//!
//! # Invariant
//!
//! A run leaves the machine reusable: the next `run` clears both stacks and
//! installs a fresh argument frame before touching anything else.

use lmc_ir::{Addr, Insn, Program};

use crate::env::{EnvRef, WeakEnv};
use crate::fault::{self, Fault};
use crate::limits::{Limits, STARTUP_BUDGET_FACTOR};
use crate::trace::TraceSink;
use crate::value::{CellLedger, Closure, PairRef, Value};

/// One saved continuation.
///
/// Entries are tagged: SEL saves a join point, AP and RAP save a full return
/// continuation. RTN and JOIN check the tag they pop, so a listing cannot
/// JOIN out of a call or RTN out of a branch.
#[derive(Debug)]
enum ControlEntry {
    Join(Addr),
    Return { env: Option<EnvRef>, pc: Addr },
}

/// A program plus the mutable state to run it.
pub struct Machine {
    program: Program,
    data: Vec<Value>,
    control: Vec<ControlEntry>,
    env: EnvRef,
    pc: Addr,
    ledger: CellLedger,
    limits: Limits,
    /// Recursive-binding frames created by DUM; their closure cycles are
    /// broken when the machine drops.
    dummies: Vec<WeakEnv>,
    trace: TraceSink,
}

impl Machine {
    pub fn new(program: Program) -> Self {
        Self::with_limits(program, Limits::default())
    }

    pub fn with_limits(program: Program, limits: Limits) -> Self {
        Machine {
            program,
            data: Vec::new(),
            control: Vec::new(),
            env: EnvRef::root(),
            pc: Addr::ZERO,
            ledger: CellLedger::new(limits.cells),
            limits,
            dummies: Vec::new(),
            trace: TraceSink::default(),
        }
    }

    /// Route DEBUG output somewhere else.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceSink) -> Self {
        self.trace = trace;
        self
    }

    /// The machine's cell ledger. Hosts building argument values allocate
    /// against this so the cells count toward the machine that holds them.
    pub fn ledger(&self) -> &CellLedger {
        &self.ledger
    }

    pub fn trace(&self) -> &TraceSink {
        &self.trace
    }

    /// Invoke `entry` with `args` and run to completion.
    ///
    /// The result must be a pair. Entering at address 0 grants the startup
    /// budget (sixty times the per-call one).
    #[tracing::instrument(level = "debug", skip_all, fields(entry = %entry.addr()))]
    pub fn run(&mut self, entry: &Closure, args: Vec<Value>) -> Result<PairRef, Fault> {
        self.data.clear();
        self.control.clear();
        self.dummies.retain(WeakEnv::is_live);

        self.control.push(ControlEntry::Return { env: None, pc: Addr::MAX });
        self.env = EnvRef::frame(args, Some(entry.env().clone()));
        self.pc = entry.addr();

        let budget = if entry.addr() == Addr::ZERO {
            self.limits.instructions.saturating_mul(STARTUP_BUDGET_FACTOR)
        } else {
            self.limits.instructions
        };
        let mut executed: u64 = 0;

        loop {
            let before = self.pc;
            let insn = self
                .program
                .get(before)
                .ok_or_else(|| fault::invalid_address(before).at(before))?;
            self.step(insn).map_err(|fault| fault.at(before))?;
            if self.pc == before {
                self.pc = self.pc.next();
            }
            if self.control.is_empty() {
                break;
            }
            executed += 1;
            if executed >= budget {
                return Err(fault::budget_exhausted(budget).at(self.pc));
            }
        }
        tracing::debug!(executed, live_cells = self.ledger.live(), "run complete");

        match self.data.pop() {
            Some(Value::Pair(pair)) => Ok(pair),
            Some(other) => Err(fault::result_not_pair(other.type_name())),
            None => Err(fault::result_not_pair("nothing")),
        }
    }

    fn step(&mut self, insn: Insn) -> Result<(), Fault> {
        match insn {
            Insn::Ldc(n) => self.data.push(Value::int(n)),
            Insn::Ld { frames, slot } => {
                let value = self.env.get(frames, slot)?;
                self.data.push(value);
            }
            Insn::St { frames, slot } => {
                let value = self.pop("ST")?;
                self.env.set(frames, slot, value)?;
            }
            Insn::Add => self.int_binop("ADD", |x, y| Ok(x.wrapping_add(y)))?,
            Insn::Sub => self.int_binop("SUB", |x, y| Ok(x.wrapping_sub(y)))?,
            Insn::Mul => self.int_binop("MUL", |x, y| Ok(x.wrapping_mul(y)))?,
            Insn::Div => self.int_binop("DIV", |x, y| {
                if y == 0 {
                    Err(fault::division_by_zero())
                } else {
                    // i32::MIN / -1 wraps like the other operators.
                    Ok(x.wrapping_div(y))
                }
            })?,
            Insn::Ceq => self.int_compare("CEQ", |x, y| x == y)?,
            Insn::Cgt => self.int_compare("CGT", |x, y| x > y)?,
            Insn::Cgte => self.int_compare("CGTE", |x, y| x >= y)?,
            Insn::Atom => {
                let value = self.pop("ATOM")?;
                self.data.push(Value::int(i32::from(value.is_int())));
            }
            Insn::Cons => {
                let cdr = self.pop("CONS")?;
                let car = self.pop("CONS")?;
                let pair = Value::pair(&self.ledger, car, cdr)?;
                self.data.push(pair);
            }
            Insn::Car => {
                let pair = self.pop_pair("CAR")?;
                self.data.push(pair.car());
            }
            Insn::Cdr => {
                let pair = self.pop_pair("CDR")?;
                self.data.push(pair.cdr());
            }
            Insn::Ldf(addr) => {
                self.data.push(Value::closure(self.env.clone(), addr));
            }
            Insn::Ap(n) => {
                let closure = self.pop_closure("AP")?;
                let args = self.pop_args("AP", n)?;
                self.control.push(ControlEntry::Return {
                    env: Some(self.env.clone()),
                    pc: self.pc.next(),
                });
                self.env = EnvRef::frame(args, Some(closure.env().clone()));
                self.pc = closure.addr();
            }
            Insn::Rtn => match self.pop_control("RTN")? {
                ControlEntry::Return { env, pc } => {
                    // The sentinel's absent environment means the run is
                    // over; the register keeps its final frame.
                    if let Some(env) = env {
                        self.env = env;
                    }
                    self.pc = pc;
                }
                ControlEntry::Join(_) => {
                    return Err(fault::type_mismatch(
                        "RTN",
                        "return continuation",
                        "join point",
                    ));
                }
            },
            Insn::Dum(n) => {
                let frame = EnvRef::placeholders(n, self.env.clone());
                self.dummies.push(frame.downgrade());
                self.env = frame;
            }
            Insn::Rap(n) => {
                let closure = self.pop_closure("RAP")?;
                let args = self.pop_args("RAP", n)?;
                self.check_recursive_frame(&closure, n)?;
                self.control.push(ControlEntry::Return {
                    env: self.env.parent(),
                    pc: self.pc.next(),
                });
                // Filling the slots lets the closures inside see each other:
                // the designed cycle.
                self.env.replace_slots(args);
                self.pc = closure.addr();
            }
            Insn::Sel { true_branch, false_branch } => {
                let cond = self.pop_int("SEL")?;
                self.control.push(ControlEntry::Join(self.pc.next()));
                self.pc = if cond == 0 { false_branch } else { true_branch };
            }
            Insn::Join => match self.pop_control("JOIN")? {
                ControlEntry::Join(pc) => self.pc = pc,
                ControlEntry::Return { .. } => {
                    return Err(fault::type_mismatch(
                        "JOIN",
                        "join point",
                        "return continuation",
                    ));
                }
            },
            Insn::Tsel { true_branch, false_branch } => {
                let cond = self.pop_int("TSEL")?;
                self.pc = if cond == 0 { false_branch } else { true_branch };
            }
            Insn::Tap(n) => {
                let closure = self.pop_closure("TAP")?;
                let args = self.pop_args("TAP", n)?;
                if self.env.has_ancestor(closure.env()) {
                    self.env = EnvRef::frame(args, Some(closure.env().clone()));
                } else {
                    // The closure escaped its chain: reuse the current frame
                    // wholesale. Its length becomes the argument count.
                    self.env.replace_slots(args);
                }
                self.pc = closure.addr();
            }
            Insn::Trap(n) => {
                let closure = self.pop_closure("TRAP")?;
                let args = self.pop_args("TRAP", n)?;
                self.check_recursive_frame(&closure, n)?;
                self.env.replace_slots(args);
                self.pc = closure.addr();
            }
            Insn::Debug => {
                let value = self.pop_int("DEBUG")?;
                self.trace.emit(self.pc, value);
            }
        }
        Ok(())
    }

    /// RAP and TRAP demand that the closure was made for the frame being
    /// filled: same frame by identity, slot count equal to the arity.
    fn check_recursive_frame(&self, closure: &Closure, n: u32) -> Result<(), Fault> {
        if !closure.env().ptr_eq(&self.env) {
            return Err(fault::frame_mismatch(
                "closure does not capture the binding frame",
            ));
        }
        let len = self.env.len();
        if len != n as usize {
            return Err(fault::frame_mismatch(format!(
                "binding frame holds {len} slots, expected {n}"
            )));
        }
        Ok(())
    }

    fn pop(&mut self, op: &'static str) -> Result<Value, Fault> {
        self.data.pop().ok_or_else(|| fault::stack_underflow(op, "data"))
    }

    fn pop_int(&mut self, op: &'static str) -> Result<i32, Fault> {
        let value = self.pop(op)?;
        value
            .as_int()
            .ok_or_else(|| fault::type_mismatch(op, "integer", value.type_name()))
    }

    fn pop_pair(&mut self, op: &'static str) -> Result<PairRef, Fault> {
        match self.pop(op)? {
            Value::Pair(pair) => Ok(pair),
            other => Err(fault::type_mismatch(op, "pair", other.type_name())),
        }
    }

    fn pop_closure(&mut self, op: &'static str) -> Result<Closure, Fault> {
        match self.pop(op)? {
            Value::Closure(closure) => Ok(closure),
            other => Err(fault::type_mismatch(op, "closure", other.type_name())),
        }
    }

    /// Pop `n` arguments, preserving their push order.
    fn pop_args(&mut self, op: &'static str, n: u32) -> Result<Vec<Value>, Fault> {
        let n = n as usize;
        if self.data.len() < n {
            return Err(fault::stack_underflow(op, "data"));
        }
        Ok(self.data.split_off(self.data.len() - n))
    }

    fn pop_control(&mut self, op: &'static str) -> Result<ControlEntry, Fault> {
        self.control.pop().ok_or_else(|| fault::stack_underflow(op, "control"))
    }

    fn int_binop(
        &mut self,
        op: &'static str,
        apply: impl FnOnce(i32, i32) -> Result<i32, Fault>,
    ) -> Result<(), Fault> {
        let y = self.pop_int(op)?;
        let x = self.pop_int(op)?;
        self.data.push(Value::int(apply(x, y)?));
        Ok(())
    }

    fn int_compare(
        &mut self,
        op: &'static str,
        holds: impl FnOnce(i32, i32) -> bool,
    ) -> Result<(), Fault> {
        let y = self.pop_int(op)?;
        let x = self.pop_int(op)?;
        self.data.push(Value::int(i32::from(holds(x, y))));
        Ok(())
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        // Recursive-binding frames cycle through their own closures; break
        // the cycles so the machine's memory is reclaimed with it.
        for dummy in &self.dummies {
            dummy.clear_slots();
        }
    }
}

#[cfg(test)]
mod tests;
