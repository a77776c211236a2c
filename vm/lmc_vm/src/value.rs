//! Machine values: integers, closures, shared immutable pairs.
//!
//! Pairs are reference counted against a per-machine [`CellLedger`]; the
//! allocation that would take the live count past the cap fails instead of
//! allocating. Every teardown path here is iterative — agent scripts build
//! million-element lists, and freeing one must not consume the host's call
//! stack.

use std::cell::Cell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use lmc_ir::Addr;

use crate::env::EnvRef;
use crate::fault::{self, Fault};

/// Shared live-cell counter for one machine.
///
/// Cloning yields another handle to the same counter, so hosts can build
/// argument values charged against the machine that will hold them.
#[derive(Clone, Debug)]
pub struct CellLedger {
    inner: Rc<LedgerInner>,
}

#[derive(Debug)]
struct LedgerInner {
    live: Cell<usize>,
    limit: usize,
}

impl CellLedger {
    pub fn new(limit: usize) -> Self {
        CellLedger { inner: Rc::new(LedgerInner { live: Cell::new(0), limit }) }
    }

    /// Pairs currently alive on this ledger.
    pub fn live(&self) -> usize {
        self.inner.live.get()
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    fn charge(&self) -> Result<(), Fault> {
        let live = self.inner.live.get();
        if live >= self.inner.limit {
            return Err(fault::cell_limit_exceeded(self.inner.limit));
        }
        self.inner.live.set(live + 1);
        Ok(())
    }

    fn release(&self) {
        let live = self.inner.live.get();
        self.inner.live.set(live.saturating_sub(1));
    }
}

/// A code pointer plus its captured environment.
#[derive(Clone)]
pub struct Closure {
    env: EnvRef,
    addr: Addr,
}

impl Closure {
    pub fn new(env: EnvRef, addr: Addr) -> Self {
        Closure { env, addr }
    }

    /// Closure over an empty root environment; hosts use this to enter a
    /// program at a chosen address.
    pub fn toplevel(addr: Addr) -> Self {
        Closure::new(EnvRef::root(), addr)
    }

    pub fn addr(&self) -> Addr {
        self.addr
    }

    pub fn env(&self) -> &EnvRef {
        &self.env
    }
}

/// Environments can be cyclic through recursive bindings; print the address
/// only.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure(addr={})", self.addr)
    }
}

/// Identity semantics: same entry address and same captured frame.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr && self.env.ptr_eq(&other.env)
    }
}

/// A shared handle to an immutable pair cell.
#[derive(Clone)]
pub struct PairRef {
    cell: Rc<PairCell>,
}

struct PairCell {
    car: Value,
    cdr: Value,
    ledger: CellLedger,
}

impl PairRef {
    /// Allocate a pair, charging the ledger. Refuses at the cap.
    pub fn alloc(ledger: &CellLedger, car: Value, cdr: Value) -> Result<Self, Fault> {
        ledger.charge()?;
        Ok(PairRef { cell: Rc::new(PairCell { car, cdr, ledger: ledger.clone() }) })
    }

    pub fn car(&self) -> Value {
        self.cell.car.clone()
    }

    pub fn cdr(&self) -> Value {
        self.cell.cdr.clone()
    }

    /// Take the fields out of a uniquely-held cell, leaving it trivial to
    /// drop. `None` when other handles keep the cell alive.
    fn into_fields(self) -> Option<(Value, Value)> {
        Rc::into_inner(self.cell).map(|mut cell| {
            let car = mem::replace(&mut cell.car, Value::Int(0));
            let cdr = mem::replace(&mut cell.cdr, Value::Int(0));
            (car, cdr)
        })
    }
}

impl Drop for PairCell {
    fn drop(&mut self) {
        self.ledger.release();
        // Fields are already trivial for cells dismantled by drain_values.
        if matches!(self.car, Value::Int(_)) && matches!(self.cdr, Value::Int(_)) {
            return;
        }
        let car = mem::replace(&mut self.car, Value::Int(0));
        let cdr = mem::replace(&mut self.cdr, Value::Int(0));
        drain_values(vec![car, cdr]);
    }
}

impl fmt::Debug for PairRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pair").field(&self.cell.car).field(&self.cell.cdr).finish()
    }
}

/// Iteratively release a batch of values, dismantling uniquely-owned pairs
/// and closure environments instead of letting their drops nest.
pub(crate) fn drain_values(mut work: Vec<Value>) {
    while let Some(value) = work.pop() {
        match value {
            Value::Int(_) => {}
            Value::Pair(pair) => {
                if let Some((car, cdr)) = pair.into_fields() {
                    work.push(car);
                    work.push(cdr);
                }
            }
            Value::Closure(closure) => {
                closure.env.reclaim_into(&mut work);
            }
        }
    }
}

/// One machine value.
///
/// The type is closed: agent scripts can observe and construct exactly these
/// three shapes and nothing else.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i32),
    Closure(Closure),
    Pair(PairRef),
}

impl Value {
    #[inline]
    pub fn int(n: i32) -> Value {
        Value::Int(n)
    }

    #[inline]
    pub fn closure(env: EnvRef, addr: Addr) -> Value {
        Value::Closure(Closure::new(env, addr))
    }

    /// Allocate a pair value, charging the ledger.
    pub fn pair(ledger: &CellLedger, car: Value, cdr: Value) -> Result<Value, Fault> {
        Ok(Value::Pair(PairRef::alloc(ledger, car, cdr)?))
    }

    #[inline]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_pair(&self) -> Option<&PairRef> {
        match self {
            Value::Pair(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_closure(&self) -> Option<&Closure> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// The ATOM predicate: integers are atoms, closures and pairs are not.
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Closure(_) => "closure",
            Value::Pair(_) => "pair",
        }
    }
}

/// Structural equality on pairs, identity on closures.
///
/// Pair comparison recurses; it is meant for hosts and tests working with
/// modest values, not for the dispatch loop (CEQ is integer-only).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                Rc::ptr_eq(&a.cell, &b.cell)
                    || (a.car() == b.car() && a.cdr() == b.cdr())
            }
            _ => false,
        }
    }
}

/// Integers bare, closures as `closure@ADDR`, pairs as `(car . cdr)`.
///
/// The cdr spine is walked iteratively so printing a long list does not
/// recurse; nesting through car positions does.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Closure(c) => write!(f, "closure@{}", c.addr()),
            Value::Pair(p) => {
                let mut depth = 0usize;
                let mut cursor = p.clone();
                loop {
                    write!(f, "({} . ", cursor.car())?;
                    depth += 1;
                    match cursor.cdr() {
                        Value::Pair(next) => cursor = next,
                        other => {
                            write!(f, "{other}")?;
                            break;
                        }
                    }
                }
                for _ in 0..depth {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn list(ledger: &CellLedger, items: &[i32]) -> Value {
        let mut tail = Value::int(0);
        for item in items.iter().rev() {
            tail = Value::pair(ledger, Value::int(*item), tail).unwrap();
        }
        tail
    }

    #[test]
    fn ledger_charges_and_releases() {
        let ledger = CellLedger::new(100);
        let value = list(&ledger, &[1, 2, 3]);
        assert_eq!(ledger.live(), 3);
        drop(value);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn allocation_at_the_cap_is_refused() {
        let ledger = CellLedger::new(2);
        let a = Value::pair(&ledger, Value::int(1), Value::int(0)).unwrap();
        let _b = Value::pair(&ledger, Value::int(2), a).unwrap();
        let err = Value::pair(&ledger, Value::int(3), Value::int(0)).unwrap_err();
        assert_eq!(err.kind, crate::fault::FaultKind::CellLimitExceeded { limit: 2 });
        assert_eq!(ledger.live(), 2);
    }

    #[test]
    fn shared_tails_release_once_per_cell() {
        let ledger = CellLedger::new(100);
        let tail = list(&ledger, &[9]);
        let left = Value::pair(&ledger, Value::int(1), tail.clone()).unwrap();
        let right = Value::pair(&ledger, Value::int(2), tail.clone()).unwrap();
        assert_eq!(ledger.live(), 3);
        drop((left, tail));
        assert_eq!(ledger.live(), 2);
        drop(right);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn long_list_teardown_is_iterative() {
        let ledger = CellLedger::new(200_000);
        let items = vec![7; 150_000];
        let value = list(&ledger, &items);
        assert_eq!(ledger.live(), 150_000);
        drop(value);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn nested_closure_chain_teardown_is_iterative() {
        let mut value = Value::int(0);
        for _ in 0..100_000 {
            let frame = EnvRef::frame(vec![value], None);
            value = Value::closure(frame, Addr::ZERO);
        }
        drop(value);
    }

    #[test]
    fn display_renders_list_shapes() {
        let ledger = CellLedger::new(100);
        assert_eq!(list(&ledger, &[1, 2, 3]).to_string(), "(1 . (2 . (3 . 0)))");
        assert_eq!(Value::int(-4).to_string(), "-4");
        assert_eq!(
            Value::closure(EnvRef::root(), Addr::new(4)).to_string(),
            "closure@4"
        );
    }

    #[test]
    fn pairs_compare_structurally_closures_by_identity() {
        let ledger = CellLedger::new(100);
        assert_eq!(list(&ledger, &[1, 2]), list(&ledger, &[1, 2]));
        assert_ne!(list(&ledger, &[1, 2]), list(&ledger, &[1, 3]));

        let env = EnvRef::root();
        let a = Value::closure(env.clone(), Addr::new(4));
        let b = Value::closure(env, Addr::new(4));
        let c = Value::closure(EnvRef::root(), Addr::new(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn atom_predicate_is_integer_only() {
        let ledger = CellLedger::new(100);
        assert!(Value::int(5).is_int());
        assert!(!Value::closure(EnvRef::root(), Addr::ZERO).is_int());
        assert!(!list(&ledger, &[1]).is_int());
    }
}
