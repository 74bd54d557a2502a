//! Optional instrumentation around index operations.
//!
//! A [`RoomIndex`](crate::RoomIndex) with no observer installed does no timing at all. An
//! installed [`Observer`] is told when each public operation starts and finishes, along with
//! how long it took and how large the node arena is afterwards.

use core::fmt;
use std::time::Duration;

use tracing::{debug, trace};

/// The public index operations an [`Observer`] is told about.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    Insert,
    Remove,
    Search,
    Size,
    MaxKey,
    MissingCount,
    MissingRooms,
    Export,
}

impl Operation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Remove => "remove",
            Operation::Search => "search",
            Operation::Size => "size",
            Operation::MaxKey => "max_key",
            Operation::MissingCount => "missing_count",
            Operation::MissingRooms => "missing_rooms",
            Operation::Export => "export",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What was measured around one operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Measurement {
    /// Wall-clock time spent in the operation.
    pub elapsed: Duration,
    /// Occupied rooms after the operation.
    pub rooms: usize,
    /// Approximate heap bytes reserved for nodes after the operation.
    pub arena_bytes: usize,
}

/// Callbacks invoked around each public [`RoomIndex`](crate::RoomIndex) operation.
///
/// Both methods default to doing nothing.
pub trait Observer {
    fn on_start(&self, _operation: Operation) {}

    fn on_finish(&self, _operation: Operation, _measurement: &Measurement) {}
}

/// Reports every operation as a `tracing` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_start(&self, operation: Operation) {
        trace!(%operation, "room index operation started");
    }

    fn on_finish(&self, operation: Operation, measurement: &Measurement) {
        debug!(
            %operation,
            elapsed = ?measurement.elapsed,
            rooms = measurement.rooms,
            arena_bytes = measurement.arena_bytes,
            "room index operation finished"
        );
    }
}

impl<F> Observer for F
where
    F: Fn(Operation, &Measurement),
{
    fn on_finish(&self, operation: Operation, measurement: &Measurement) {
        self(operation, measurement);
    }
}
