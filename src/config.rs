//! Construction-time settings for a [`RoomIndex`](crate::RoomIndex).

use std::path::{Path, PathBuf};

use crate::record::DescriptorMode;

/// Settings for a [`RoomIndex`](crate::RoomIndex).
///
/// # Examples
///
/// ```
/// use hilbert_hotel::{DescriptorMode, IndexConfig};
///
/// let config = IndexConfig::default()
///     .with_export_path("rooms.txt")
///     .with_descriptor(DescriptorMode::Described)
///     .with_capacity(1024);
/// assert!(config.export_on_remove());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexConfig {
    export_path: Option<PathBuf>,
    descriptor: DescriptorMode,
    export_on_remove: bool,
    capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            export_path: None,
            descriptor: DescriptorMode::Compact,
            export_on_remove: true,
            capacity: 0,
        }
    }
}

impl IndexConfig {
    /// Backing flat file written by [`RoomIndex::export`](crate::RoomIndex::export).
    #[must_use]
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    /// Line format used for export.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: DescriptorMode) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Whether every removal rewrites the backing file.
    #[must_use]
    pub fn with_export_on_remove(mut self, enabled: bool) -> Self {
        self.export_on_remove = enabled;
        self
    }

    /// Node slots to reserve up front.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn export_path(&self) -> Option<&Path> {
        self.export_path.as_deref()
    }

    #[must_use]
    pub fn descriptor(&self) -> DescriptorMode {
        self.descriptor
    }

    #[must_use]
    pub fn export_on_remove(&self) -> bool {
        self.export_on_remove
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
