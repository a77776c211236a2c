//! Dispatch-loop throughput on a tail-recursive countdown.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lmc_asm::load;
use lmc_ir::{Addr, Program};
use lmc_vm::{Closure, Machine, TraceSink};

const COUNTDOWN: &str = "\
DUM 2
LDF 6
LDC 10000
LDF 6
RAP 2
RTN
LD 0 1
LDC 0
CEQ
TSEL 10 14
LDC 0
LDC 0
CONS
RTN
LD 0 0
LD 0 1
LDC 1
SUB
LD 0 0
TRAP 2
";

fn countdown_program() -> Program {
    match load(COUNTDOWN) {
        Ok(program) => program,
        Err(err) => panic!("countdown listing failed to load: {err}"),
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let program = countdown_program();
    c.bench_function("countdown_10k", |b| {
        b.iter(|| {
            let mut machine =
                Machine::new(program.clone()).with_trace(TraceSink::Silent);
            let result = machine.run(&Closure::toplevel(Addr::ZERO), Vec::new());
            black_box(result.is_ok())
        });
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
