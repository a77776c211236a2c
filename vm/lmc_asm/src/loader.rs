//! Text listing → `Program`.

use std::num::IntErrorKind;

use lmc_ir::{Addr, Insn, Program};

use crate::error::{AsmError, AsmErrorKind};

/// Load a text listing into a program.
///
/// Fails on the first malformed line. See the crate docs for the accepted
/// syntax.
pub fn load(source: &str) -> Result<Program, AsmError> {
    let mut insns = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let text = match raw.find(';') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let mut words = text.split_whitespace();
        let Some(mnemonic) = words.next() else {
            continue;
        };
        let operands: Vec<&str> = words.collect();
        let insn =
            decode(mnemonic, &operands).map_err(|kind| AsmError::new(kind, idx + 1, raw))?;
        if insns.len() >= Addr::MAX.index() {
            let kind = AsmErrorKind::ProgramTooLarge { limit: Addr::MAX.raw() };
            return Err(AsmError::new(kind, idx + 1, raw));
        }
        insns.push(insn);
    }
    Ok(Program::from_insns(insns))
}

fn decode(mnemonic: &str, ops: &[&str]) -> Result<Insn, AsmErrorKind> {
    let upper = mnemonic.to_ascii_uppercase();
    let insn = match upper.as_str() {
        "LDC" => Insn::Ldc(int_operand(one(ops, "LDC")?)?),
        "LD" => {
            let (frames, slot) = two(ops, "LD")?;
            Insn::Ld { frames: count_operand(frames)?, slot: count_operand(slot)? }
        }
        "ST" => {
            let (frames, slot) = two(ops, "ST")?;
            Insn::St { frames: count_operand(frames)?, slot: count_operand(slot)? }
        }
        "ADD" => nullary(ops, "ADD", Insn::Add)?,
        "SUB" => nullary(ops, "SUB", Insn::Sub)?,
        "MUL" => nullary(ops, "MUL", Insn::Mul)?,
        "DIV" => nullary(ops, "DIV", Insn::Div)?,
        "CEQ" => nullary(ops, "CEQ", Insn::Ceq)?,
        "CGT" => nullary(ops, "CGT", Insn::Cgt)?,
        "CGTE" => nullary(ops, "CGTE", Insn::Cgte)?,
        "ATOM" => nullary(ops, "ATOM", Insn::Atom)?,
        "CONS" => nullary(ops, "CONS", Insn::Cons)?,
        "CAR" => nullary(ops, "CAR", Insn::Car)?,
        "CDR" => nullary(ops, "CDR", Insn::Cdr)?,
        "LDF" => Insn::Ldf(addr_operand(one(ops, "LDF")?)?),
        "AP" => Insn::Ap(count_operand(one(ops, "AP")?)?),
        "RTN" => nullary(ops, "RTN", Insn::Rtn)?,
        "DUM" => Insn::Dum(count_operand(one(ops, "DUM")?)?),
        "RAP" => Insn::Rap(count_operand(one(ops, "RAP")?)?),
        "SEL" => {
            let (t, f) = two(ops, "SEL")?;
            Insn::Sel { true_branch: addr_operand(t)?, false_branch: addr_operand(f)? }
        }
        "JOIN" => nullary(ops, "JOIN", Insn::Join)?,
        "TSEL" => {
            let (t, f) = two(ops, "TSEL")?;
            Insn::Tsel { true_branch: addr_operand(t)?, false_branch: addr_operand(f)? }
        }
        "TAP" => Insn::Tap(count_operand(one(ops, "TAP")?)?),
        "TRAP" => Insn::Trap(count_operand(one(ops, "TRAP")?)?),
        "DEBUG" => nullary(ops, "DEBUG", Insn::Debug)?,
        _ => {
            return Err(AsmErrorKind::UnknownMnemonic { mnemonic: mnemonic.to_owned() });
        }
    };
    Ok(insn)
}

fn nullary(ops: &[&str], mnemonic: &'static str, insn: Insn) -> Result<Insn, AsmErrorKind> {
    if ops.is_empty() {
        Ok(insn)
    } else {
        Err(AsmErrorKind::OperandCount { mnemonic, expected: 0, found: ops.len() })
    }
}

fn one<'a>(ops: &[&'a str], mnemonic: &'static str) -> Result<&'a str, AsmErrorKind> {
    match ops {
        [op] => Ok(op),
        _ => Err(AsmErrorKind::OperandCount { mnemonic, expected: 1, found: ops.len() }),
    }
}

fn two<'a>(ops: &[&'a str], mnemonic: &'static str) -> Result<(&'a str, &'a str), AsmErrorKind> {
    match ops {
        [a, b] => Ok((a, b)),
        _ => Err(AsmErrorKind::OperandCount { mnemonic, expected: 2, found: ops.len() }),
    }
}

/// Any 32-bit signed integer (the LDC operand).
fn int_operand(op: &str) -> Result<i32, AsmErrorKind> {
    let wide = parse_wide(op, "a 32-bit integer")?;
    i32::try_from(wide).map_err(|_| AsmErrorKind::OperandRange {
        operand: op.to_owned(),
        expected: "a 32-bit integer",
    })
}

/// Non-negative count or index (frame hops, slots, arities).
fn count_operand(op: &str) -> Result<u32, AsmErrorKind> {
    let wide = parse_wide(op, "a non-negative count")?;
    u32::try_from(wide).map_err(|_| AsmErrorKind::OperandRange {
        operand: op.to_owned(),
        expected: "a non-negative count",
    })
}

/// Code address (branch and closure targets).
fn addr_operand(op: &str) -> Result<Addr, AsmErrorKind> {
    let wide = parse_wide(op, "a code address")?;
    let raw = u32::try_from(wide).map_err(|_| AsmErrorKind::OperandRange {
        operand: op.to_owned(),
        expected: "a code address",
    })?;
    Ok(Addr::new(raw))
}

/// First stage: is it an integer at all? Range checks report against the
/// caller's expectation, whether the literal overflows the field or the
/// staging parse itself, so `-1` where a count is required is range, not
/// syntax.
fn parse_wide(op: &str, expected: &'static str) -> Result<i64, AsmErrorKind> {
    op.parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            AsmErrorKind::OperandRange { operand: op.to_owned(), expected }
        }
        _ => AsmErrorKind::MalformedOperand { operand: op.to_owned() },
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::AsmErrorKind;

    #[test]
    fn addresses_are_nonblank_ordinals() {
        let prog = load("LDC 1\n\n   \nLDC 2\n; only a comment\nRTN\n").unwrap();
        assert_eq!(prog.len(), 3);
        assert_eq!(prog.get(Addr::new(0)), Some(Insn::Ldc(1)));
        assert_eq!(prog.get(Addr::new(1)), Some(Insn::Ldc(2)));
        assert_eq!(prog.get(Addr::new(2)), Some(Insn::Rtn));
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        let prog = load("ldc 5\nLdF 4\ncOnS\nRTN").unwrap();
        assert_eq!(
            prog.as_slice(),
            &[Insn::Ldc(5), Insn::Ldf(Addr::new(4)), Insn::Cons, Insn::Rtn]
        );
    }

    #[test]
    fn trailing_comments_are_stripped() {
        let prog = load("LDC 3 ; push the seed\nRTN;done").unwrap();
        assert_eq!(prog.as_slice(), &[Insn::Ldc(3), Insn::Rtn]);
    }

    #[test]
    fn unknown_mnemonic_names_the_line() {
        let err = load("LDC 1\nLDX 2\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(
            err.kind(),
            &AsmErrorKind::UnknownMnemonic { mnemonic: "LDX".to_owned() }
        );
        assert_eq!(err.to_string(), "unknown mnemonic `LDX` at line 2: LDX 2");
    }

    #[test]
    fn operand_count_is_checked_per_mnemonic() {
        let err = load("ADD 1").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandCount { mnemonic: "ADD", expected: 0, found: 1 }
        );
        let err = load("LD 0").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandCount { mnemonic: "LD", expected: 2, found: 1 }
        );
        let err = load("LDC").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandCount { mnemonic: "LDC", expected: 1, found: 0 }
        );
    }

    #[test]
    fn malformed_operand_is_rejected() {
        let err = load("LDC five").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::MalformedOperand { operand: "five".to_owned() }
        );
    }

    #[test]
    fn counts_must_be_non_negative() {
        let err = load("AP -1").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandRange {
                operand: "-1".to_owned(),
                expected: "a non-negative count",
            }
        );
    }

    #[test]
    fn ldc_spans_the_full_i32_range() {
        let prog = load("LDC -2147483648\nLDC 2147483647").unwrap();
        assert_eq!(prog.as_slice(), &[Insn::Ldc(i32::MIN), Insn::Ldc(i32::MAX)]);
        let err = load("LDC 2147483648").unwrap_err();
        assert!(matches!(err.kind(), AsmErrorKind::OperandRange { .. }));
    }

    #[test]
    fn oversized_literals_report_range_not_syntax() {
        // Too wide even for the staging parse; still a range diagnostic.
        let err = load("LDC 99999999999999999999").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandRange {
                operand: "99999999999999999999".to_owned(),
                expected: "a 32-bit integer",
            }
        );
        let err = load("AP -99999999999999999999").unwrap_err();
        assert_eq!(
            err.kind(),
            &AsmErrorKind::OperandRange {
                operand: "-99999999999999999999".to_owned(),
                expected: "a non-negative count",
            }
        );
    }

    #[test]
    fn dangling_branch_targets_load_fine() {
        // Verification is out of scope; the machine faults if one is reached.
        let prog = load("TSEL 900 901").unwrap();
        assert_eq!(prog.len(), 1);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn arb_insn() -> impl Strategy<Value = Insn> {
            let addr = (0..10_000u32).prop_map(Addr::new);
            prop_oneof![
                any::<i32>().prop_map(Insn::Ldc),
                (0..64u32, 0..256u32).prop_map(|(frames, slot)| Insn::Ld { frames, slot }),
                (0..64u32, 0..256u32).prop_map(|(frames, slot)| Insn::St { frames, slot }),
                Just(Insn::Add),
                Just(Insn::Sub),
                Just(Insn::Mul),
                Just(Insn::Div),
                Just(Insn::Ceq),
                Just(Insn::Cgt),
                Just(Insn::Cgte),
                Just(Insn::Atom),
                Just(Insn::Cons),
                Just(Insn::Car),
                Just(Insn::Cdr),
                addr.clone().prop_map(Insn::Ldf),
                (0..16u32).prop_map(Insn::Ap),
                Just(Insn::Rtn),
                (0..16u32).prop_map(Insn::Dum),
                (0..16u32).prop_map(Insn::Rap),
                (addr.clone(), addr.clone())
                    .prop_map(|(t, f)| Insn::Sel { true_branch: t, false_branch: f }),
                Just(Insn::Join),
                (addr.clone(), addr)
                    .prop_map(|(t, f)| Insn::Tsel { true_branch: t, false_branch: f }),
                (0..16u32).prop_map(Insn::Tap),
                (0..16u32).prop_map(Insn::Trap),
                Just(Insn::Debug),
            ]
        }

        proptest! {
            #[test]
            fn load_never_panics(source in ".{0,200}") {
                let _ = load(&source);
            }

            #[test]
            fn display_reloads_to_the_same_listing(insns in prop::collection::vec(arb_insn(), 0..40)) {
                let text: String = insns.iter().map(|i| format!("{i}\n")).collect();
                let reloaded = load(&text).unwrap();
                prop_assert_eq!(reloaded.as_slice(), insns.as_slice());
            }
        }
    }
}
