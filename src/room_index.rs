//! The ordered room index.

use core::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, trace};

use crate::config::IndexConfig;
use crate::error::Result;
use crate::export::{self, FlatFileWriter};
use crate::observer::{Measurement, Observer, Operation};
use crate::queue::OrderedQueue;
use crate::raw::{InOrder, RawAvlTree};
use crate::record::{DescriptorMode, Group, RoomNumber, RoomRecord};

/// Occupied rooms of the hotel, ordered by room number.
///
/// Backed by an AVL tree whose nodes live in an arena, so every lookup, insertion and
/// removal takes O(log n) however sparse the room numbers are. Gap enumeration and export
/// walk the rooms in ascending order in O(n).
///
/// # Examples
///
/// ```
/// use hilbert_hotel::RoomIndex;
/// use hilbert_hotel::record::Group;
///
/// let mut rooms = RoomIndex::new();
/// for room in [0, 1, 2, 5, 7] {
///     rooms.insert(room, Group::PreExisting);
/// }
///
/// assert_eq!(rooms.max_key(), Some(7));
/// assert_eq!(rooms.missing_rooms(), vec![3, 4, 6]);
/// assert_eq!(rooms.missing_count(), 3);
/// ```
pub struct RoomIndex {
    tree: RawAvlTree,
    // Exact: re-read from the right spine whenever the maximum is removed.
    max_key: Option<RoomNumber>,
    // Occupied rooms numbered below zero; they never count towards `0..=max_key`.
    below_zero: usize,
    config: IndexConfig,
    observer: Option<Box<dyn Observer>>,
}

impl RoomIndex {
    /// Creates an empty index with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    #[must_use]
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            tree: RawAvlTree::with_capacity(config.capacity()),
            max_key: None,
            below_zero: 0,
            config,
            observer: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Installs `observer`, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl Observer + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Removes the installed observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn start(&self, operation: Operation) -> Option<Instant> {
        self.observer.as_ref().map(|observer| {
            observer.on_start(operation);
            Instant::now()
        })
    }

    fn finish(&self, operation: Operation, started: Option<Instant>) {
        if let (Some(observer), Some(started)) = (&self.observer, started) {
            observer.on_finish(
                operation,
                &Measurement {
                    elapsed: started.elapsed(),
                    rooms: self.tree.len(),
                    arena_bytes: self.tree.allocated_bytes(),
                },
            );
        }
    }

    /// Places a guest of `group` in `room`.
    ///
    /// Returns `false`, leaving the existing occupant in place, if the room is taken.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, room: RoomNumber, group: Group) -> bool {
        self.insert_record(RoomRecord::new(room, group))
    }

    /// Like [`insert`](Self::insert), for an already-built record.
    pub fn insert_record(&mut self, record: RoomRecord) -> bool {
        let started = self.start(Operation::Insert);
        let room = record.room_number();

        // Tracked on entry, ahead of the duplicate check.
        self.max_key = Some(self.max_key.map_or(room, |max| max.max(room)));

        let inserted = self.tree.insert(record);
        if inserted {
            if room < 0 {
                self.below_zero += 1;
            }
            debug!(room, "room occupied");
        } else {
            trace!(room, "room already occupied");
        }

        self.finish(Operation::Insert, started);
        inserted
    }

    /// Vacates `room`, returning its former occupant.
    ///
    /// When the index has a backing file and
    /// [`export_on_remove`](IndexConfig::export_on_remove) is set, a successful removal
    /// rewrites the file.
    ///
    /// # Errors
    ///
    /// [`Error::ExportFailed`](crate::Error::ExportFailed) if that rewrite fails. The room
    /// has been vacated regardless.
    ///
    /// # Complexity
    ///
    /// O(log n), plus O(n) for the rewrite.
    pub fn remove(&mut self, room: RoomNumber) -> Result<Option<RoomRecord>> {
        let started = self.start(Operation::Remove);

        let removed = self.tree.remove(room);
        let outcome = match removed {
            Some(record) => {
                debug!(room, "room vacated");
                if room < 0 {
                    self.below_zero -= 1;
                }
                if self.max_key.is_some_and(|max| room >= max) {
                    self.max_key = self.tree.last_key();
                }
                if self.config.export_on_remove() {
                    self.export_configured().map(|()| Some(record))
                } else {
                    Ok(Some(record))
                }
            }
            None => {
                trace!(room, "room was not occupied");
                Ok(None)
            }
        };

        self.finish(Operation::Remove, started);
        outcome
    }

    /// The occupant of `room`, if any.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn search(&self, room: RoomNumber) -> Option<&RoomRecord> {
        let started = self.start(Operation::Search);
        let found = self.tree.get(room);
        self.finish(Operation::Search, started);
        found
    }

    #[must_use]
    pub fn contains(&self, room: RoomNumber) -> bool {
        self.tree.get(room).is_some()
    }

    /// Counts occupied rooms with a breadth-first walk of the tree.
    ///
    /// # Complexity
    ///
    /// O(n). [`len`](Self::len) returns the same number in O(1).
    #[must_use]
    pub fn size(&self) -> usize {
        let started = self.start(Operation::Size);

        let mut count = 0;
        let mut pending: OrderedQueue<_> = self.tree.root().into_iter().collect();
        while let Some(handle) = pending.dequeue() {
            count += 1;
            let node = self.tree.node(handle);
            pending.extend(node.left());
            pending.extend(node.right());
        }

        self.finish(Operation::Size, started);
        count
    }

    /// Occupied rooms, as tracked by the node arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Node slots reserved without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Height of the tree: `None` when empty, `Some(0)` for a single room.
    #[must_use]
    pub fn height(&self) -> Option<usize> {
        usize::try_from(self.tree.height()).ok()
    }

    /// Highest occupied room.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn max_key(&self) -> Option<RoomNumber> {
        let started = self.start(Operation::MaxKey);
        let max = self.max_key;
        self.finish(Operation::MaxKey, started);
        max
    }

    /// Lowest occupied room.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn min_key(&self) -> Option<RoomNumber> {
        self.tree.first_key()
    }

    /// Number of vacant rooms in `0..=max_key()`.
    ///
    /// Always equals `missing_rooms().len()`. Rooms numbered below zero are occupied but lie
    /// outside the range, so they are left out of the count.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn missing_count(&self) -> u64 {
        let started = self.start(Operation::MissingCount);

        let count = self.max_key.filter(|&max| max >= 0).map_or(0, |max| {
            let in_range = self.tree.len() - self.below_zero;
            let in_range = i64::try_from(in_range).unwrap_or(i64::MAX);
            u64::try_from(max.saturating_add(1).saturating_sub(in_range)).unwrap_or(0)
        });

        self.finish(Operation::MissingCount, started);
        count
    }

    /// Every vacant room in `0..=max_key()`, ascending.
    ///
    /// # Complexity
    ///
    /// O(n + gaps)
    #[must_use]
    pub fn missing_rooms(&self) -> Vec<RoomNumber> {
        let started = self.start(Operation::MissingRooms);

        let mut gaps = Vec::new();
        let mut expected: RoomNumber = 0;
        for record in self.tree.iter() {
            let room = record.room_number();
            if room > expected {
                gaps.extend(expected..room);
            }
            expected = expected.max(room.saturating_add(1));
        }
        if let Some(max) = self.max_key {
            gaps.extend(expected..max);
        }

        self.finish(Operation::MissingRooms, started);
        gaps
    }

    /// Occupied rooms in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.tree.iter(),
            remaining: self.tree.len(),
        }
    }

    /// One formatted line per occupied room, ascending, in the configured descriptor mode.
    #[must_use]
    pub fn export_lines(&self) -> Vec<String> {
        self.lines(self.config.descriptor()).collect()
    }

    fn lines(&self, mode: DescriptorMode) -> impl Iterator<Item = String> + '_ {
        self.iter().map(move |record| record.format(mode))
    }

    /// Rewrites the configured backing file. Does nothing when no file is configured.
    ///
    /// # Errors
    ///
    /// [`Error::ExportFailed`](crate::Error::ExportFailed) if the file cannot be written.
    /// The index is unaffected.
    pub fn export(&self) -> Result<()> {
        let started = self.start(Operation::Export);
        let outcome = self.export_configured();
        self.finish(Operation::Export, started);
        outcome
    }

    /// Rewrites `path` with the current rooms, ignoring the configured backing file.
    ///
    /// # Errors
    ///
    /// [`Error::ExportFailed`](crate::Error::ExportFailed) if the file cannot be written.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let started = self.start(Operation::Export);
        let outcome = FlatFileWriter::new(path.as_ref())
            .write_lines(self.lines(self.config.descriptor()))
            .map(|_| ());
        self.finish(Operation::Export, started);
        outcome
    }

    /// Writes the export lines to `out`.
    ///
    /// # Errors
    ///
    /// Any error from `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<usize> {
        export::write_lines(out, self.lines(self.config.descriptor()))
    }

    fn export_configured(&self) -> Result<()> {
        match self.config.export_path() {
            Some(path) => FlatFileWriter::new(path)
                .write_lines(self.lines(self.config.descriptor()))
                .map(|_| ()),
            None => {
                trace!("no export path configured");
                Ok(())
            }
        }
    }

    /// Vacates every room.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.max_key = None;
        self.below_zero = 0;
    }

    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        self.tree.validate_invariants();
        assert_eq!(self.max_key, self.tree.last_key(), "tracked maximum drifted");
        assert_eq!(
            self.below_zero,
            self.tree.iter().filter(|record| record.room_number() < 0).count(),
            "negative room count drifted"
        );
    }
}

impl Default for RoomIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RoomIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomIndex")
            .field("rooms", &self.tree.len())
            .field("max_key", &self.max_key)
            .field("below_zero", &self.below_zero)
            .field("config", &self.config)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Extend<RoomRecord> for RoomIndex {
    fn extend<I: IntoIterator<Item = RoomRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert_record(record);
        }
    }
}

impl FromIterator<RoomRecord> for RoomIndex {
    fn from_iter<I: IntoIterator<Item = RoomRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

impl<'a> IntoIterator for &'a RoomIndex {
    type Item = &'a RoomRecord;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An ascending iterator over the occupied rooms of a [`RoomIndex`].
///
/// This `struct` is created by the [`iter`](RoomIndex::iter) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a> {
    inner: InOrder<'a>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RoomRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.inner.next()?;
        self.remaining -= 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
