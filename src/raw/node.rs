use super::handle::Handle;
use crate::record::{RoomNumber, RoomRecord};

/// Height reported for an absent child; a leaf has height 0.
pub(crate) const EMPTY_HEIGHT: i32 = -1;

/// One occupied room in the index.
///
/// Each node is owned by exactly one parent link (or the root slot), so the arena holds a
/// strict ownership tree even though links are plain handles.
#[derive(Clone, Debug)]
pub(crate) struct AvlNode {
    record: RoomRecord,
    left: Option<Handle>,
    right: Option<Handle>,
    // Always `1 + max(height(left), height(right))`.
    height: i32,
}

impl AvlNode {
    /// Creates a detached leaf.
    pub(crate) fn leaf(record: RoomRecord) -> Self {
        Self {
            record,
            left: None,
            right: None,
            height: 0,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> RoomNumber {
        self.record.room_number()
    }

    pub(crate) fn record(&self) -> &RoomRecord {
        &self.record
    }

    /// Swaps in a promoted record, returning the one previously held.
    pub(crate) fn replace_record(&mut self, record: RoomRecord) -> RoomRecord {
        core::mem::replace(&mut self.record, record)
    }

    pub(crate) fn into_record(self) -> RoomRecord {
        self.record
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    #[inline]
    pub(crate) fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: i32) {
        self.height = height;
    }

    #[cfg(test)]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}
