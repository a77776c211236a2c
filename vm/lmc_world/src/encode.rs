//! Builders for the value shapes agents receive.
//!
//! Lists are right-nested pairs ending in the integer `0`; tuples are
//! right-nested pairs whose last element sits directly in the final cdr.
//! Every cell is charged against the ledger of the machine that will
//! receive the value, so a large world counts toward that agent's cap.

use lmc_vm::{CellLedger, Fault, Value};

use crate::map::Pos;

/// `[a, b, c]` encoded as `(a . (b . (c . 0)))`. The empty list is `0`.
pub(crate) fn list(ledger: &CellLedger, items: Vec<Value>) -> Result<Value, Fault> {
    let mut tail = Value::int(0);
    for item in items.into_iter().rev() {
        tail = Value::pair(ledger, item, tail)?;
    }
    Ok(tail)
}

/// `(a, b, c)` encoded as `(a . (b . c))`. Callers pass at least two
/// elements; a single element encodes as itself.
pub(crate) fn tuple(ledger: &CellLedger, items: Vec<Value>) -> Result<Value, Fault> {
    let mut rev = items.into_iter().rev();
    let mut acc = match rev.next() {
        Some(last) => last,
        None => Value::int(0),
    };
    for item in rev {
        acc = Value::pair(ledger, item, acc)?;
    }
    Ok(acc)
}

/// A coordinate as the pair `(x . y)`.
pub(crate) fn position(ledger: &CellLedger, pos: Pos) -> Result<Value, Fault> {
    Value::pair(ledger, Value::int(pos.x as i32), Value::int(pos.y as i32))
}
