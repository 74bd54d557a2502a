//! The hotel front desk: validated check-ins on top of a [`RoomIndex`].
//!
//! Arriving convoys are placed in sequential rooms. Every guest of every bus of every ship of
//! every spaceship gets the next vacant room, tagged with its 1-based position in the convoy.

use core::fmt;
use core::num::{NonZeroU64, ParseIntError};
use core::str::FromStr;

use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::record::{Group, RoomNumber, RoomRecord};
use crate::room_index::RoomIndex;

/// Parses a room number typed by a user, rejecting anything but a non-negative integer.
///
/// # Errors
///
/// [`Error::InvalidKey`] for non-integer or negative input.
///
/// ```
/// use hilbert_hotel::hotel::parse_room_number;
///
/// assert_eq!(parse_room_number(" 42 ").unwrap(), 42);
/// assert!(parse_room_number("-1").is_err());
/// assert!(parse_room_number("forty-two").is_err());
/// ```
pub fn parse_room_number(input: &str) -> Result<RoomNumber> {
    let room: RoomNumber = input
        .trim()
        .parse()
        .map_err(|e: ParseIntError| Error::invalid_key(input, e.to_string()))?;
    validate_room(room)
}

fn validate_room(room: RoomNumber) -> Result<RoomNumber> {
    if room < 0 {
        return Err(Error::invalid_key(room.to_string(), "room numbers are non-negative"));
    }
    Ok(room)
}

/// The guests to check in: those already staying, then a convoy of nested batches.
///
/// Parsed from `"a/b/c/d/e"`: `a` existing guests, then `b` spaceships each carrying `c`
/// ships each carrying `d` buses each carrying `e` people.
///
/// ```
/// use hilbert_hotel::hotel::ArrivalPlan;
///
/// let plan: ArrivalPlan = "3/1/2/2/2".parse().unwrap();
/// assert_eq!(plan.existing, 3);
/// assert_eq!(plan.arrivals(), 8);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ArrivalPlan {
    pub existing: u32,
    pub spaceships: u32,
    pub ships: u32,
    pub buses: u32,
    pub persons: u32,
}

impl ArrivalPlan {
    /// Number of arriving guests, not counting existing ones.
    #[must_use]
    pub fn arrivals(&self) -> u64 {
        [self.ships, self.buses, self.persons]
            .iter()
            .fold(u64::from(self.spaceships), |total, &n| total.saturating_mul(u64::from(n)))
    }
}

impl FromStr for ArrivalPlan {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let fields: Vec<&str> = input.trim().split('/').collect();
        let [existing, spaceships, ships, buses, persons] = fields[..] else {
            return Err(Error::invalid_arrivals(
                input,
                format!("expected 5 `/`-separated counts, found {}", fields.len()),
            ));
        };

        let count = |field: &str| -> Result<u32> {
            let field = field.trim();
            match field.parse::<i64>() {
                Ok(n) if n < 0 => Err(Error::invalid_key(field, "counts are non-negative")),
                _ => field
                    .parse()
                    .map_err(|e: ParseIntError| Error::invalid_arrivals(input, format!("{field:?}: {e}"))),
            }
        };

        Ok(Self {
            existing: count(existing)?,
            spaceships: count(spaceships)?,
            ships: count(ships)?,
            buses: count(buses)?,
            persons: count(persons)?,
        })
    }
}

impl fmt::Display for ArrivalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.existing, self.spaceships, self.ships, self.buses, self.persons
        )
    }
}

/// A hotel with infinitely many rooms.
///
/// # Examples
///
/// ```
/// use hilbert_hotel::Hotel;
///
/// let mut hotel = Hotel::new();
/// hotel.check_in(&"2/1/1/1/2".parse().unwrap());
///
/// assert_eq!(hotel.occupied(), vec![1, 2, 3, 4]);
/// assert!(hotel.search(3).unwrap().is_newcomer());
/// assert!(!hotel.search(1).unwrap().is_newcomer());
/// ```
#[derive(Debug)]
pub struct Hotel {
    rooms: RoomIndex,
    // Rooms are handed out from here upwards, skipping occupied ones.
    next_room: RoomNumber,
}

impl Hotel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    #[must_use]
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            rooms: RoomIndex::with_config(config),
            next_room: 1,
        }
    }

    /// The underlying room index.
    #[must_use]
    pub fn index(&self) -> &RoomIndex {
        &self.rooms
    }

    /// Mutable access to the underlying room index, e.g. to install an observer.
    pub fn index_mut(&mut self) -> &mut RoomIndex {
        &mut self.rooms
    }

    /// Checks in the existing guests and then the arriving convoy described by `plan`.
    ///
    /// Returns the number of guests placed.
    pub fn check_in(&mut self, plan: &ArrivalPlan) -> u64 {
        let placed = self.check_in_existing(plan.existing) + self.check_in_arrivals(plan);
        info!(%plan, placed, "check-in complete");
        placed
    }

    /// Puts pre-existing guests in rooms `1..=count`, then continues numbering after them.
    ///
    /// Returns the number of rooms newly occupied.
    pub fn check_in_existing(&mut self, count: u32) -> u64 {
        let mut placed = 0;
        for room in 1..=RoomNumber::from(count) {
            if self.rooms.insert(room, Group::PreExisting) {
                placed += 1;
            }
        }
        self.next_room = self.next_room.max(RoomNumber::from(count) + 1);
        placed
    }

    /// Gives every guest of the convoy in `plan` the next vacant room.
    ///
    /// `plan.existing` is ignored. Returns the number of guests placed.
    pub fn check_in_arrivals(&mut self, plan: &ArrivalPlan) -> u64 {
        let mut placed = 0;
        for spaceship in 1..=plan.spaceships {
            for ship in 1..=plan.ships {
                for bus in 1..=plan.buses {
                    for person in 1..=plan.persons {
                        let room = self.next_vacant_room();
                        self.rooms.insert(room, Group::nested(&[spaceship, ship, bus, person]));
                        placed += 1;
                    }
                }
            }
        }
        debug!(placed, next_room = self.next_room, "arrivals placed");
        placed
    }

    fn next_vacant_room(&mut self) -> RoomNumber {
        while self.rooms.contains(self.next_room) {
            self.next_room += 1;
        }
        let room = self.next_room;
        self.next_room += 1;
        room
    }

    /// Places a guest in a specific room.
    ///
    /// Returns `false` if the room is already occupied.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if `room` is negative.
    pub fn manual_add(&mut self, room: RoomNumber, group: Group) -> Result<bool> {
        let room = validate_room(room)?;
        Ok(self.rooms.insert(room, group))
    }

    /// Vacates a specific room, returning its former occupant.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`] if `room` is negative, or
    /// [`Error::ExportFailed`] if rewriting the backing file fails.
    pub fn manual_remove(&mut self, room: RoomNumber) -> Result<Option<RoomRecord>> {
        let room = validate_room(room)?;
        self.rooms.remove(room)
    }

    #[must_use]
    pub fn search(&self, room: RoomNumber) -> Option<&RoomRecord> {
        self.rooms.search(room)
    }

    /// Occupied room numbers in ascending order.
    #[must_use]
    pub fn occupied(&self) -> Vec<RoomNumber> {
        self.rooms.iter().map(RoomRecord::room_number).collect()
    }

    /// Lowest room the gap methods look at: the lowest occupied one, never below zero.
    fn first_room(&self) -> RoomNumber {
        self.rooms.min_key().map_or(0, |min| min.max(0))
    }

    /// Vacant rooms between the lowest and the highest occupied room, ascending.
    ///
    /// Rooms below the first guest are not gaps, so a hotel filled from room 1 upwards
    /// reports nothing.
    #[must_use]
    pub fn missing_rooms(&self) -> Vec<RoomNumber> {
        let first = self.first_room();
        let mut gaps = self.rooms.missing_rooms();
        gaps.drain(..gaps.partition_point(|&room| room < first));
        gaps
    }

    /// Number of rooms [`missing_rooms`](Self::missing_rooms) would list, in O(log n).
    #[must_use]
    pub fn missing_count(&self) -> u64 {
        // Every room in `0..first` is vacant, and the index counts from zero.
        let first = u64::try_from(self.first_room()).unwrap_or(0);
        self.rooms.missing_count().saturating_sub(first)
    }

    /// Guests per channel, where channel `c` holds rooms `c * width .. (c + 1) * width`.
    ///
    /// Returns `(channel, guests)` for every channel with at least one guest, ascending by
    /// channel. Empty channels are left out, so a single far-away room costs one entry.
    ///
    /// ```
    /// use core::num::NonZeroU64;
    /// use hilbert_hotel::{ArrivalPlan, Group, Hotel};
    ///
    /// let mut hotel = Hotel::new();
    /// hotel.check_in(&"3/1/1/1/2".parse::<ArrivalPlan>().unwrap());
    /// hotel.manual_add(40, Group::PreExisting).unwrap();
    ///
    /// let width = NonZeroU64::new(6).unwrap();
    /// assert_eq!(hotel.guests_per_channel(width), vec![(0, 5), (6, 1)]);
    /// ```
    #[must_use]
    pub fn guests_per_channel(&self, width: NonZeroU64) -> Vec<(u64, u64)> {
        let mut channels: Vec<(u64, u64)> = Vec::new();
        for record in &self.rooms {
            let Ok(room) = u64::try_from(record.room_number()) else {
                continue;
            };
            let channel = room / width;
            match channels.last_mut() {
                Some((last, guests)) if *last == channel => *guests += 1,
                _ => channels.push((channel, 1)),
            }
        }
        channels
    }

    /// Rewrites the configured backing file.
    ///
    /// # Errors
    ///
    /// [`Error::ExportFailed`] if the file cannot be written.
    pub fn export(&self) -> Result<()> {
        self.rooms.export()
    }
}

impl Default for Hotel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn plan_parsing() {
        let plan: ArrivalPlan = " 1/2/3/4/5 ".parse().unwrap();
        assert_eq!(
            plan,
            ArrivalPlan {
                existing: 1,
                spaceships: 2,
                ships: 3,
                buses: 4,
                persons: 5,
            }
        );
        assert_eq!(plan.to_string(), "1/2/3/4/5");
        assert_eq!(plan.arrivals(), 120);
    }

    #[test]
    fn plan_with_wrong_arity() {
        let error = "1/2/3".parse::<ArrivalPlan>().unwrap_err();
        assert!(matches!(error, Error::InvalidArrivals { .. }));
    }

    #[test]
    fn plan_with_garbage_field() {
        let error = "1/2/x/4/5".parse::<ArrivalPlan>().unwrap_err();
        assert!(matches!(error, Error::InvalidArrivals { .. }));
    }

    #[test]
    fn plan_with_negative_field() {
        let error = "1/2/-3/4/5".parse::<ArrivalPlan>().unwrap_err();
        assert!(matches!(error, Error::InvalidKey { .. }));
    }

    #[test]
    fn arrivals_follow_existing_guests() {
        let mut hotel = Hotel::new();
        let placed = hotel.check_in(&"3/1/2/1/2".parse().unwrap());
        assert_eq!(placed, 7);
        assert_eq!(hotel.occupied(), (1..=7).collect::<Vec<_>>());
        assert_eq!(hotel.search(4).unwrap().group().components(), &[1, 1, 1, 1]);
        assert_eq!(hotel.search(7).unwrap().group().components(), &[1, 2, 1, 2]);
        assert!(hotel.missing_rooms().is_empty());
        assert_eq!(hotel.missing_count(), 0);
    }

    #[test]
    fn packed_hotel_has_no_gaps() {
        let mut hotel = Hotel::new();
        hotel.check_in(&"3/1/1/1/2".parse().unwrap());
        assert_eq!(hotel.occupied(), vec![1, 2, 3, 4, 5]);
        assert!(hotel.missing_rooms().is_empty());
        assert_eq!(hotel.missing_count(), 0);

        // The index itself still counts from room zero.
        assert_eq!(hotel.index().missing_rooms(), vec![0]);
    }

    #[test]
    fn gaps_start_at_the_lowest_guest() {
        let mut hotel = Hotel::new();
        hotel.manual_add(10, Group::PreExisting).unwrap();
        hotel.manual_add(13, Group::PreExisting).unwrap();
        assert_eq!(hotel.missing_rooms(), vec![11, 12]);
        assert_eq!(hotel.missing_count(), 2);

        hotel.manual_remove(13).unwrap();
        assert!(hotel.missing_rooms().is_empty());
        assert_eq!(hotel.missing_count(), 0);

        hotel.manual_remove(10).unwrap();
        assert!(hotel.missing_rooms().is_empty());
        assert_eq!(hotel.missing_count(), 0);
    }

    #[test]
    fn channels_grow_with_the_rooms() {
        let mut hotel = Hotel::new();
        hotel.check_in_existing(30);
        let width = NonZeroU64::new(6).unwrap();
        // Rooms 1..=30: five in channel 0, six in each of 1..=4, one in channel 5.
        assert_eq!(
            hotel.guests_per_channel(width),
            vec![(0, 5), (1, 6), (2, 6), (3, 6), (4, 6), (5, 1)]
        );

        hotel.manual_add(1_000_000, Group::PreExisting).unwrap();
        assert_eq!(hotel.guests_per_channel(width).last(), Some(&(166_666, 1)));
        assert_eq!(hotel.guests_per_channel(NonZeroU64::MIN).len(), 31);
    }

    #[test]
    fn empty_hotel_has_no_channels() {
        let hotel = Hotel::new();
        assert!(hotel.guests_per_channel(NonZeroU64::MIN).is_empty());
    }

    #[test]
    fn arrivals_skip_manually_occupied_rooms() {
        let mut hotel = Hotel::new();
        assert!(hotel.manual_add(2, Group::PreExisting).unwrap());
        hotel.check_in_arrivals(&"0/1/1/1/3".parse().unwrap());
        assert_eq!(hotel.occupied(), vec![1, 2, 3, 4]);
        assert!(!hotel.search(2).unwrap().is_newcomer());
        assert_eq!(hotel.search(4).unwrap().group().components(), &[1, 1, 1, 3]);
    }

    #[test]
    fn manual_add_and_remove() {
        let mut hotel = Hotel::new();
        assert!(hotel.manual_add(100, Group::PreExisting).unwrap());
        assert!(!hotel.manual_add(100, Group::nested(&[1])).unwrap());
        assert!(matches!(hotel.manual_add(-1, Group::PreExisting), Err(Error::InvalidKey { .. })));
        assert_eq!(hotel.manual_remove(100).unwrap().map(|r| r.room_number()), Some(100));
        assert!(hotel.manual_remove(100).unwrap().is_none());
        assert!(matches!(hotel.manual_remove(-5), Err(Error::InvalidKey { .. })));
    }

    #[test]
    fn room_number_parsing() {
        assert_eq!(parse_room_number("0").unwrap(), 0);
        assert!(matches!(parse_room_number("-3"), Err(Error::InvalidKey { .. })));
        assert!(matches!(parse_room_number("3.5"), Err(Error::InvalidKey { .. })));
    }
}
