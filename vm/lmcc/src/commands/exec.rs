//! The `exec` command: one call on a fresh machine.

use lmc_asm::load;
use lmc_ir::Addr;
use lmc_vm::{Closure, Limits, Machine, TraceSink, Value};

use super::read_file;

#[derive(Debug, Default)]
pub struct ExecOptions {
    /// Address of the closure to call.
    pub entry: u32,
    /// Instruction budget override for the call.
    pub budget: Option<u64>,
    /// Buffer DEBUG output and print it with addresses after the run.
    pub trace: bool,
}

/// Load `path`, call the closure at `options.entry` with `args` as its
/// argument frame, and print the resulting pair. Faults exit with 1.
pub fn exec_file(path: &str, args: &[i32], options: &ExecOptions) {
    let source = read_file(path);
    let program = match load(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("error: {path}: {err}");
            std::process::exit(1);
        }
    };

    let mut limits = Limits::default();
    if let Some(budget) = options.budget {
        limits.instructions = budget;
    }
    let mut machine = Machine::with_limits(program, limits);
    if options.trace {
        machine = machine.with_trace(TraceSink::buffer());
    }

    let entry = Closure::toplevel(Addr::new(options.entry));
    let call_args = args.iter().copied().map(Value::int).collect();
    let outcome = machine.run(&entry, call_args);

    if options.trace {
        for (addr, value) in machine.trace().take_buffered() {
            println!("debug at {addr}: {value}");
        }
    }
    match outcome {
        Ok(result) => println!("{}", Value::Pair(result)),
        Err(fault) => {
            eprintln!("fault: {fault}");
            std::process::exit(1);
        }
    }
}
