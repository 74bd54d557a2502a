//! Room records: a room number plus the group its occupant arrived with.

use core::fmt;

use smallvec::SmallVec;

/// A room number. Signed so that callers can hand the index any integer key; the
/// [`Hotel`](crate::hotel::Hotel) boundary rejects negative rooms before they get here.
pub type RoomNumber = i64;

/// Where a room's occupant came from.
///
/// Generated guests carry their position inside the arriving convoy (spaceship, ship, bus,
/// person). Guests that were already in the hotel, or that were placed by hand, carry the
/// [`Group::PreExisting`] sentinel.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Group {
    /// The guest was in the hotel before any arrivals were processed.
    #[default]
    PreExisting,
    /// Nesting position of an arriving guest, outermost batch first.
    Nested(SmallVec<[u32; 4]>),
}

impl Group {
    /// Builds a group from its nesting components.
    ///
    /// An empty or all-zero tuple is the pre-existing sentinel.
    ///
    /// ```
    /// use hilbert_hotel::record::Group;
    ///
    /// assert_eq!(Group::nested(&[0, 0, 0, 0]), Group::PreExisting);
    /// assert_eq!(Group::nested(&[1, 2, 1, 3]).to_string(), "1_2_1_3");
    /// ```
    #[must_use]
    pub fn nested(components: &[u32]) -> Self {
        if components.iter().all(|&c| c == 0) {
            Group::PreExisting
        } else {
            Group::Nested(SmallVec::from_slice(components))
        }
    }

    /// Nesting components; empty for the pre-existing sentinel.
    #[must_use]
    pub fn components(&self) -> &[u32] {
        match self {
            Group::PreExisting => &[],
            Group::Nested(components) => components,
        }
    }

    /// `true` unless this is the pre-existing sentinel.
    #[must_use]
    pub fn is_newcomer(&self) -> bool {
        matches!(self, Group::Nested(_))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::PreExisting => f.write_str("0"),
            Group::Nested(components) => {
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str("_")?;
                    }
                    write!(f, "{component}")?;
                }
                Ok(())
            }
        }
    }
}

/// How a [`RoomRecord`] is rendered into an export line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DescriptorMode {
    /// `"<group> <room>"`, e.g. `"1_1_2_3 42"`.
    #[default]
    Compact,
    /// `"room number: <room>, group: <group>, description: newcomer|pre_existed"`.
    Described,
}

/// An occupied room.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RoomRecord {
    room_number: RoomNumber,
    group: Group,
}

impl RoomRecord {
    #[must_use]
    pub fn new(room_number: RoomNumber, group: Group) -> Self {
        Self { room_number, group }
    }

    #[must_use]
    pub fn room_number(&self) -> RoomNumber {
        self.room_number
    }

    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// `true` if the occupant arrived with a convoy rather than being pre-existing.
    #[must_use]
    pub fn is_newcomer(&self) -> bool {
        self.group.is_newcomer()
    }

    /// Renders the record as one export line.
    ///
    /// ```
    /// use hilbert_hotel::record::{DescriptorMode, Group, RoomRecord};
    ///
    /// let record = RoomRecord::new(17, Group::nested(&[1, 2, 1, 1]));
    /// assert_eq!(record.format(DescriptorMode::Compact), "1_2_1_1 17");
    /// assert_eq!(
    ///     record.format(DescriptorMode::Described),
    ///     "room number: 17, group: 1_2_1_1, description: newcomer"
    /// );
    /// ```
    #[must_use]
    pub fn format(&self, mode: DescriptorMode) -> String {
        match mode {
            DescriptorMode::Compact => format!("{} {}", self.group, self.room_number),
            DescriptorMode::Described => format!(
                "room number: {}, group: {}, description: {}",
                self.room_number,
                self.group,
                if self.is_newcomer() { "newcomer" } else { "pre_existed" }
            ),
        }
    }
}

impl fmt::Display for RoomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.group, self.room_number)
    }
}
