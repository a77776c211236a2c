//! Environment frames.
//!
//! Frames form a tree: each holds a slot vector fixed at creation plus a
//! handle to its enclosing frame. Closures keep their captured frame alive,
//! so a frame's lifetime is the lifetime of the last closure (or machine
//! register) that can still see it.
//!
//! # The one sanctioned cycle
//!
//! Recursive binding (DUM/RAP) fills a frame's slots with closures that
//! capture that same frame. Reference counting alone never frees such a
//! group; the machine tracks those frames weakly and breaks the cycles at
//! teardown via [`WeakEnv::clear_slots`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::fault::{self, Fault};
use crate::value::{drain_values, Value};

/// Real listings bind a handful of values per frame.
type Slots = SmallVec<[Value; 4]>;

struct Frame {
    slots: Slots,
    parent: Option<EnvRef>,
}

/// Shared handle to an environment frame.
///
/// Construction goes through the factory methods only; the interior cell is
/// never exposed, so all aliasing stays behind this handle.
#[derive(Clone)]
#[repr(transparent)]
pub struct EnvRef(Rc<RefCell<Frame>>);

impl EnvRef {
    /// New frame over `parent`.
    pub fn frame(values: Vec<Value>, parent: Option<EnvRef>) -> EnvRef {
        EnvRef(Rc::new(RefCell::new(Frame {
            slots: SmallVec::from_vec(values),
            parent,
        })))
    }

    /// Empty frame with no parent.
    pub fn root() -> EnvRef {
        EnvRef::frame(Vec::new(), None)
    }

    /// Frame of `n` placeholder slots for a recursive binding.
    ///
    /// Placeholders are plain zeros: the value type is closed, and a read
    /// before RAP fills the frame simply sees an integer.
    pub(crate) fn placeholders(n: u32, parent: EnvRef) -> EnvRef {
        let slots = vec![Value::int(0); n as usize];
        EnvRef::frame(slots, Some(parent))
    }

    /// Read the slot `frames` parents up.
    pub fn get(&self, frames: u32, slot: u32) -> Result<Value, Fault> {
        let target = self.walk(frames)?;
        let frame = target.0.borrow();
        frame
            .slots
            .get(slot as usize)
            .cloned()
            .ok_or_else(|| fault::slot_out_of_bounds(slot, frame.slots.len()))
    }

    /// Overwrite the slot `frames` parents up.
    pub fn set(&self, frames: u32, slot: u32, value: Value) -> Result<(), Fault> {
        let target = self.walk(frames)?;
        let mut frame = target.0.borrow_mut();
        let len = frame.slots.len();
        match frame.slots.get_mut(slot as usize) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(fault::slot_out_of_bounds(slot, len)),
        }
    }

    fn walk(&self, frames: u32) -> Result<EnvRef, Fault> {
        let mut cursor = self.clone();
        for hop in 0..frames {
            let parent = cursor.0.borrow().parent.clone();
            match parent {
                Some(parent) => cursor = parent,
                None => return Err(fault::scope_exhausted(frames, hop)),
            }
        }
        Ok(cursor)
    }

    pub fn parent(&self) -> Option<EnvRef> {
        self.0.borrow().parent.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle identity.
    pub fn ptr_eq(&self, other: &EnvRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Is `other` this frame or one of its ancestors?
    pub fn has_ancestor(&self, other: &EnvRef) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(env) = cursor {
            if env.ptr_eq(other) {
                return true;
            }
            cursor = env.parent();
        }
        false
    }

    /// Swap the slot vector wholesale. The frame's length changes with it.
    pub fn replace_slots(&self, values: Vec<Value>) {
        let old: Vec<Value> = {
            let mut frame = self.0.borrow_mut();
            let replaced = std::mem::replace(&mut frame.slots, SmallVec::from_vec(values));
            replaced.into_vec()
        };
        drain_values(old);
    }

    pub(crate) fn downgrade(&self) -> WeakEnv {
        WeakEnv(Rc::downgrade(&self.0))
    }

    /// If this handle is the last one, dismantle the frame into `work` so
    /// the caller frees slots and ancestors iteratively.
    pub(crate) fn reclaim_into(self, work: &mut Vec<Value>) {
        let mut cursor = Some(self);
        while let Some(env) = cursor {
            match Rc::try_unwrap(env.0) {
                Ok(cell) => {
                    let mut frame = cell.into_inner();
                    work.extend(frame.slots.drain(..));
                    cursor = frame.parent.take();
                }
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for EnvRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Frames can be cyclic through recursive bindings; stay shallow.
        write!(f, "EnvRef(len={})", self.len())
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        // A shared (or absent) parent drops in O(1); integer slots are free.
        // Everything else goes through the iterative path so deep frame
        // chains and closure nests cannot overflow the host stack.
        let parent_shared = match &self.parent {
            None => true,
            Some(parent) => Rc::strong_count(&parent.0) > 1,
        };
        if parent_shared && self.slots.iter().all(Value::is_int) {
            return;
        }
        let mut work: Vec<Value> = self.slots.drain(..).collect();
        if let Some(parent) = self.parent.take() {
            parent.reclaim_into(&mut work);
        }
        drain_values(work);
    }
}

/// Weak handle for the machine's recursive-frame registry.
pub(crate) struct WeakEnv(Weak<RefCell<Frame>>);

impl WeakEnv {
    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Drop the frame's slot values, breaking any closure cycle through it.
    pub(crate) fn clear_slots(&self) {
        if let Some(cell) = self.0.upgrade() {
            let values: Vec<Value> = cell.borrow_mut().slots.drain(..).collect();
            drop(cell);
            drain_values(values);
        }
    }
}
