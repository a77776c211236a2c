//! Behavior tests for the dispatch loop, driven through assembled listings.

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use lmc_asm::load;
use pretty_assertions::assert_eq;

use super::*;
use crate::fault::FaultKind;

fn machine(src: &str) -> Machine {
    Machine::new(load(src).unwrap())
}

fn run_from(machine: &mut Machine, addr: u32, args: Vec<Value>) -> Result<PairRef, Fault> {
    machine.run(&Closure::toplevel(Addr::new(addr)), args)
}

#[test]
fn builds_lists_from_nested_cons() {
    let mut m = machine("LDC 1\nLDC 2\nLDC 3\nLDC 0\nCONS\nCONS\nCONS\nRTN");
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(1));
    let second = result.cdr();
    let second = second.as_pair().unwrap();
    assert_eq!(second.car(), Value::int(2));
    let third = second.cdr();
    let third = third.as_pair().unwrap();
    assert_eq!(third.car(), Value::int(3));
    assert_eq!(third.cdr(), Value::int(0));
}

#[test]
fn atom_distinguishes_integers_from_pairs_and_closures() {
    let mut m = machine("LDC 5\nATOM\nLDC 0\nCONS\nRTN");
    assert_eq!(run_from(&mut m, 0, vec![]).unwrap().car(), Value::int(1));

    let mut m = machine("LDC 1\nLDC 2\nCONS\nATOM\nLDC 0\nCONS\nRTN");
    assert_eq!(run_from(&mut m, 0, vec![]).unwrap().car(), Value::int(0));

    let mut m = machine("LDF 0\nATOM\nLDC 0\nCONS\nRTN");
    assert_eq!(run_from(&mut m, 0, vec![]).unwrap().car(), Value::int(0));
}

#[test]
fn division_by_zero_faults() {
    let mut m = machine("LDC 10\nLDC 0\nDIV\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::DivisionByZero);
    assert_eq!(err.pc, Some(Addr::new(2)));
}

#[test]
fn division_wraps_at_the_boundary() {
    let mut m = machine("LDC -2147483648\nLDC -1\nDIV\nLDC 0\nCONS\nRTN");
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(i32::MIN));
}

// Five instructions run before the RTN below; the RTN itself is never
// counted because the control stack empties first.
const FIVE_THEN_RETURN: &str = "RTN\nLDC 9\nATOM\nLDC 1\nLDC 0\nCONS\nRTN";

#[test]
fn budget_allows_work_up_to_the_limit() {
    let limits = Limits { instructions: 6, ..Limits::default() };
    let mut m = Machine::with_limits(load(FIVE_THEN_RETURN).unwrap(), limits);
    let result = run_from(&mut m, 1, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(1));
}

#[test]
fn budget_faults_when_spent() {
    let limits = Limits { instructions: 5, ..Limits::default() };
    let mut m = Machine::with_limits(load(FIVE_THEN_RETURN).unwrap(), limits);
    let err = run_from(&mut m, 1, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { budget: 5 });
}

#[test]
fn zero_budget_faults_on_the_first_instruction() {
    // A spin loop granted no budget must fault instead of running forever.
    let limits = Limits { instructions: 0, ..Limits::default() };
    let mut m = Machine::with_limits(load("LDC 0\nTSEL 0 0").unwrap(), limits);
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { budget: 0 });
}

#[test]
fn budget_is_exact_at_the_default() {
    // Entry away from 0 gets the per-call budget, not the startup one.
    let mut m = machine("RTN\nLDC 0\nTSEL 1 1");
    let err = run_from(&mut m, 1, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { budget: 3_072_000 });
}

#[test]
fn startup_entry_gets_sixty_fold_budget() {
    let limits = Limits { instructions: 100, ..Limits::default() };
    let mut m = Machine::with_limits(load("LDC 0\nTSEL 0 0").unwrap(), limits);
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { budget: 6_000 });

    let mut m = Machine::with_limits(load("RTN\nLDC 0\nTSEL 1 1").unwrap(), limits);
    let err = run_from(&mut m, 1, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { budget: 100 });
}

#[test]
fn cons_past_the_cell_cap_faults() {
    let limits = Limits { cells: 4, ..Limits::default() };
    let src = "LDC 0\nLDC 1\nCONS\nLDC 1\nTSEL 1 1";
    let mut m = Machine::with_limits(load(src).unwrap(), limits);
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::CellLimitExceeded { limit: 4 });
    assert_eq!(err.pc, Some(Addr::new(2)));
}

#[test]
fn result_cells_release_when_dropped() {
    let mut m = machine("LDC 1\nLDC 2\nLDC 3\nLDC 0\nCONS\nCONS\nCONS\nRTN");
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(m.ledger().live(), 3);
    drop(result);
    assert_eq!(m.ledger().live(), 0);
}

#[test]
fn returning_a_closure_and_invoking_it_later() {
    let src = "LDC 0\nLDF 4\nCONS\nRTN\nLDC 0\nLDC 1\nCONS\nRTN";
    let mut m = machine(src);
    let first = run_from(&mut m, 0, vec![Value::int(0), Value::int(0)]).unwrap();
    assert_eq!(first.car(), Value::int(0));

    let step = first.cdr();
    let step = step.as_closure().unwrap();
    assert_eq!(step.addr(), Addr::new(4));

    let second = m.run(&step.clone(), vec![]).unwrap();
    assert_eq!(second.car(), Value::int(0));
    assert_eq!(second.cdr(), Value::int(1));
}

#[test]
fn recursive_factorial_through_binding_frames() {
    let src = "\
DUM 1
LDF 11
LDF 5
RAP 1
RTN
LDC 5
LD 0 0
AP 1
LDC 0
CONS
RTN
LD 0 0
LDC 0
CEQ
SEL 16 18
RTN
LDC 1
JOIN
LD 0 0
LD 0 0
LDC 1
SUB
LD 1 0
AP 1
MUL
JOIN
";
    let mut m = machine(src);
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(120));
    assert_eq!(result.cdr(), Value::int(0));
}

#[test]
fn rap_checks_frame_arity() {
    let mut m = machine("DUM 2\nLDC 7\nLDF 5\nRAP 1\nRTN\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert!(matches!(err.kind, FaultKind::FrameMismatch { .. }));
    assert_eq!(err.pc, Some(Addr::new(3)));
}

#[test]
fn rap_checks_frame_identity() {
    // The closure captures the argument frame, not the binding frame built
    // by DUM, so RAP must refuse it.
    let mut m = machine("LDF 7\nDUM 1\nST 0 0\nLDC 7\nLD 0 0\nRAP 1\nRTN\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert!(matches!(err.kind, FaultKind::FrameMismatch { .. }));
}

#[test]
fn tail_select_pushes_no_join() {
    // If TSEL saved a join point, the final RTN would pop it and fault.
    let mut m = machine("LDC 1\nTSEL 2 2\nLDC 5\nLDC 6\nCONS\nRTN");
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(5));
    assert_eq!(result.cdr(), Value::int(6));
}

#[test]
fn trap_iterates_without_control_growth() {
    let src = "\
DUM 2
LDF 6
LDC 50000
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
    let mut m = machine(src);
    let result = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(result.car(), Value::int(0));
}

#[test]
fn tap_enters_fresh_frame_over_captured_ancestor() {
    // LD 1 0 still sees the caller's argument frame, proving the tail call
    // entered a fresh frame instead of reusing the current one.
    let src = "LDC 5\nLDF 4\nTAP 1\nRTN\nLD 0 0\nLD 1 0\nCONS\nRTN";
    let mut m = machine(src);
    let result = run_from(&mut m, 0, vec![Value::int(9)]).unwrap();
    assert_eq!(result.car(), Value::int(5));
    assert_eq!(result.cdr(), Value::int(9));
}

#[test]
fn tap_replaces_slots_when_closure_escaped() {
    // The helper at 8 returns a closure over its own (dead) frame. Tail
    // calling it from the argument frame falls back to slot replacement, so
    // LD 0 0 reads the tail-call argument.
    let src = "LDC 42\nLDF 8\nAP 0\nTAP 1\nLD 0 0\nLDC 0\nCONS\nRTN\nLDF 4\nRTN";
    let mut m = machine(src);
    let result = run_from(&mut m, 0, vec![Value::int(0)]).unwrap();
    assert_eq!(result.car(), Value::int(42));
}

#[test]
fn st_overwrites_environment_slot() {
    let mut m = machine("LDC 42\nST 0 0\nLD 0 0\nLDC 0\nCONS\nRTN");
    let result = run_from(&mut m, 0, vec![Value::int(7)]).unwrap();
    assert_eq!(result.car(), Value::int(42));
}

#[test]
fn environment_walk_faults_carry_positions() {
    let mut m = machine("LD 5 0\nRTN");
    let err = run_from(&mut m, 0, vec![Value::int(1)]).unwrap_err();
    assert_eq!(err.kind, FaultKind::ScopeExhausted { frames: 5, depth: 1 });

    let mut m = machine("LD 0 3\nRTN");
    let err = run_from(&mut m, 0, vec![Value::int(1)]).unwrap_err();
    assert_eq!(err.kind, FaultKind::SlotOutOfBounds { slot: 3, len: 1 });
}

#[test]
fn control_tags_are_checked() {
    // JOIN meeting the bottom return continuation.
    let mut m = machine("JOIN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::TypeMismatch { op: "JOIN", expected: "join point", got: "return continuation" }
    );

    // RTN meeting a join point saved by SEL.
    let mut m = machine("LDC 1\nSEL 2 2\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::TypeMismatch { op: "RTN", expected: "return continuation", got: "join point" }
    );
}

#[test]
fn empty_pop_faults_underflow() {
    let mut m = machine("ADD\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::StackUnderflow { op: "ADD", stack: "data" });
}

#[test]
fn car_requires_a_pair() {
    let mut m = machine("LDC 1\nCAR\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::TypeMismatch { op: "CAR", expected: "pair", got: "integer" }
    );
    assert_eq!(err.pc, Some(Addr::new(1)));
}

#[test]
fn falling_off_the_program_faults() {
    let mut m = machine("LDC 1");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::InvalidAddress { addr: Addr::new(1) });
    assert_eq!(err.pc, Some(Addr::new(1)));
}

#[test]
fn wild_branch_faults() {
    let mut m = machine("LDC 1\nTSEL 9 9");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::InvalidAddress { addr: Addr::new(9) });
    assert_eq!(err.pc, Some(Addr::new(9)));
}

#[test]
fn result_must_be_a_pair() {
    let mut m = machine("LDC 4\nRTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::ResultNotPair { got: "integer" });

    let mut m = machine("RTN");
    let err = run_from(&mut m, 0, vec![]).unwrap_err();
    assert_eq!(err.kind, FaultKind::ResultNotPair { got: "nothing" });
}

#[test]
fn machine_is_reusable_across_runs() {
    let mut m = machine("LDC 1\nLDC 2\nCONS\nRTN");
    let first = run_from(&mut m, 0, vec![]).unwrap();
    let second = run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(Value::Pair(first), Value::Pair(second));
}

#[test]
fn debug_routes_to_the_buffer() {
    let src = "LDC 42\nDEBUG\nLDC 1\nLDC 2\nCONS\nRTN";
    let mut m = machine(src).with_trace(TraceSink::buffer());
    run_from(&mut m, 0, vec![]).unwrap();
    assert_eq!(m.trace().take_buffered(), vec![(Addr::new(1), 42)]);
}

#[test]
fn identical_runs_are_deterministic() {
    let src = "LDC 7\nDEBUG\nLDC 3\nLDC 4\nMUL\nDEBUG\nLDC 1\nLDC 2\nCONS\nRTN";
    let mut first = machine(src).with_trace(TraceSink::buffer());
    let mut second = machine(src).with_trace(TraceSink::buffer());
    let a = run_from(&mut first, 0, vec![]).unwrap();
    let b = run_from(&mut second, 0, vec![]).unwrap();
    assert_eq!(Value::Pair(a), Value::Pair(b));
    assert_eq!(first.trace().take_buffered(), second.trace().take_buffered());
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn arithmetic_matches_wrapping_semantics(a in any::<i32>(), b in any::<i32>()) {
            let cases = [
                ("ADD", a.wrapping_add(b)),
                ("SUB", a.wrapping_sub(b)),
                ("MUL", a.wrapping_mul(b)),
            ];
            for (op, expected) in cases {
                let src = format!("LDC {a}\nLDC {b}\n{op}\nLDC 0\nCONS\nRTN");
                let mut m = machine(&src);
                let result = run_from(&mut m, 0, vec![]).unwrap();
                prop_assert_eq!(result.car(), Value::int(expected));
            }
        }

        #[test]
        fn division_matches_wrapping_semantics(
            a in any::<i32>(),
            b in any::<i32>().prop_filter("nonzero divisor", |b| *b != 0),
        ) {
            let src = format!("LDC {a}\nLDC {b}\nDIV\nLDC 0\nCONS\nRTN");
            let mut m = machine(&src);
            let result = run_from(&mut m, 0, vec![]).unwrap();
            prop_assert_eq!(result.car(), Value::int(a.wrapping_div(b)));
        }

        #[test]
        fn comparisons_agree_with_the_host(a in any::<i32>(), b in any::<i32>()) {
            let cases = [("CEQ", a == b), ("CGT", a > b), ("CGTE", a >= b)];
            for (op, expected) in cases {
                let src = format!("LDC {a}\nLDC {b}\n{op}\nLDC 0\nCONS\nRTN");
                let mut m = machine(&src);
                let result = run_from(&mut m, 0, vec![]).unwrap();
                prop_assert_eq!(result.car(), Value::int(i32::from(expected)));
            }
        }

        #[test]
        fn cons_car_cdr_round_trip(a in any::<i32>(), b in any::<i32>()) {
            let src = format!("LDC {a}\nLDC {b}\nCONS\nRTN");
            let mut m = machine(&src);
            let result = run_from(&mut m, 0, vec![]).unwrap();
            prop_assert_eq!(result.car(), Value::int(a));
            prop_assert_eq!(result.cdr(), Value::int(b));
        }
    }
}
