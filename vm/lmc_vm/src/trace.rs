//! DEBUG output routing.

use std::cell::RefCell;
use std::mem;

use lmc_ir::Addr;

/// Where DEBUG trace values go.
///
/// The machine is single-threaded; the buffering variant uses interior
/// mutability so emitting takes `&self`.
#[derive(Debug, Default)]
pub enum TraceSink {
    /// Print each value to stdout.
    #[default]
    Stdout,
    /// Collect `(pc, value)` records for later inspection.
    Buffer(RefCell<Vec<(Addr, i32)>>),
    /// Drop the output.
    Silent,
}

impl TraceSink {
    /// A fresh buffering sink.
    pub fn buffer() -> TraceSink {
        TraceSink::Buffer(RefCell::new(Vec::new()))
    }

    pub(crate) fn emit(&self, pc: Addr, value: i32) {
        tracing::debug!(%pc, value, "trace output");
        match self {
            TraceSink::Stdout => println!("debug: {value}"),
            TraceSink::Buffer(buf) => buf.borrow_mut().push((pc, value)),
            TraceSink::Silent => {}
        }
    }

    /// Drain buffered records; empty for the non-buffering sinks.
    pub fn take_buffered(&self) -> Vec<(Addr, i32)> {
        match self {
            TraceSink::Buffer(buf) => mem::take(&mut *buf.borrow_mut()),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn buffer_records_and_drains() {
        let sink = TraceSink::buffer();
        sink.emit(Addr::new(3), 42);
        sink.emit(Addr::new(5), -1);
        assert_eq!(sink.take_buffered(), vec![(Addr::new(3), 42), (Addr::new(5), -1)]);
        assert_eq!(sink.take_buffered(), vec![]);
    }

    #[test]
    fn silent_sink_keeps_nothing() {
        let sink = TraceSink::Silent;
        sink.emit(Addr::ZERO, 7);
        assert_eq!(sink.take_buffered(), vec![]);
    }
}
