//! Room allocation for Hilbert's Hotel.
//!
//! The hotel has infinitely many rooms. Guests arrive in nested convoys (people on buses on
//! ships on spaceships) and each is given a unique room number, so the set of occupied rooms
//! grows without bound and can become arbitrarily sparse. This crate keeps that set in a
//! [`RoomIndex`]: an AVL tree keyed by room number.
//!
//! - [`insert`](RoomIndex::insert), [`remove`](RoomIndex::remove) and
//!   [`search`](RoomIndex::search) in O(log n)
//! - [`max_key`](RoomIndex::max_key) and [`missing_count`](RoomIndex::missing_count) in O(1)
//! - [`missing_rooms`](RoomIndex::missing_rooms) and [`export`](RoomIndex::export) in one
//!   ascending pass
//!
//! # Example
//!
//! ```
//! use hilbert_hotel::{Hotel, RoomIndex};
//! use hilbert_hotel::record::Group;
//!
//! // Three guests are already staying; one spaceship brings two ships of one bus with
//! // two people each.
//! let mut hotel = Hotel::new();
//! hotel.check_in(&"3/1/2/1/2".parse()?);
//! assert_eq!(hotel.occupied(), vec![1, 2, 3, 4, 5, 6, 7]);
//!
//! hotel.manual_remove(5)?;
//! assert_eq!(hotel.missing_rooms(), vec![5]);
//!
//! // The index can also be used directly.
//! let mut rooms = RoomIndex::new();
//! rooms.insert(10, Group::nested(&[1, 1, 1, 1]));
//! rooms.insert(3, Group::PreExisting);
//! assert_eq!(rooms.export_lines(), vec!["0 3", "1_1_1_1 10"]);
//! # Ok::<(), hilbert_hotel::Error>(())
//! ```
//!
//! # Implementation
//!
//! Tree nodes are stored in an arena and refer to their children by handle, so rotations
//! relink handles rather than moving boxed nodes. Node counting walks the tree breadth-first
//! through [`OrderedQueue`], a doubly linked FIFO built on the same arena.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod error;
mod raw;

pub mod export;
pub mod hotel;
pub mod observer;
pub mod queue;
pub mod record;
pub mod room_index;

pub use config::IndexConfig;
pub use error::{Error, Result};
pub use hotel::{ArrivalPlan, Hotel};
pub use observer::{Observer, Operation};
pub use queue::OrderedQueue;
pub use record::{DescriptorMode, Group, RoomNumber, RoomRecord};
pub use room_index::RoomIndex;
