//! MU Online map geometry shared by the protocol and server crates.
//!
//! Maps are 256x256 grids addressed by byte coordinates. Movement happens in
//! one of eight directions; the discriminant of each [`Direction`] matches the
//! 4-bit value the game client writes into walk packets.

/// One of the eight movement directions on the map grid.
///
/// Discriminants increase clockwise, starting at north-west. `Undefined` is
/// the sentinel the client sends for "no direction"; any nibble above 7 maps
/// onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Direction {
    NorthWest = 0,
    North = 1,
    NorthEast = 2,
    East = 3,
    SouthEast = 4,
    South = 5,
    SouthWest = 6,
    West = 7,
    /// Sentinel value, canonically encoded as `0x0F`.
    #[default]
    Undefined = 0x0F,
}

impl Direction {
    /// All defined directions in clockwise order.
    pub const ALL: [Direction; 8] = [
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
    ];

    /// Decodes the low 4 bits of `value`.
    #[must_use]
    pub const fn from_nibble(value: u8) -> Self {
        match value & 0x0F {
            0 => Self::NorthWest,
            1 => Self::North,
            2 => Self::NorthEast,
            3 => Self::East,
            4 => Self::SouthEast,
            5 => Self::South,
            6 => Self::SouthWest,
            7 => Self::West,
            _ => Self::Undefined,
        }
    }

    #[must_use]
    pub const fn to_nibble(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Rotates one step counter-clockwise. `Undefined` stays undefined.
    #[must_use]
    pub const fn rotate_left(self) -> Self {
        match self {
            Self::Undefined => Self::Undefined,
            other => Self::from_nibble((other as u8 + 7) % 8),
        }
    }

    /// Rotates one step clockwise. `Undefined` stays undefined.
    #[must_use]
    pub const fn rotate_right(self) -> Self {
        match self {
            Self::Undefined => Self::Undefined,
            other => Self::from_nibble((other as u8 + 1) % 8),
        }
    }

    /// Grid displacement `(dx, dy)` of a single step; y grows southwards.
    #[must_use]
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::Undefined => (0, 0),
        }
    }
}

/// A cell on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    #[must_use]
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell in `direction`, or `None` if the step
    /// would leave the grid or the direction is undefined.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        if !direction.is_defined() {
            return None;
        }
        let (dx, dy) = direction.offset();
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Chebyshev distance, which is the number of steps between two cells.
    #[must_use]
    pub fn distance(self, other: Self) -> u8 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl core::fmt::Display for Point {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_left_wraps_around() {
        assert_eq!(Direction::NorthWest.rotate_left(), Direction::West);
        assert_eq!(Direction::South.rotate_left(), Direction::SouthEast);
        assert_eq!(Direction::Undefined.rotate_left(), Direction::Undefined);
    }

    #[test]
    fn rotations_are_inverse() {
        for direction in Direction::ALL {
            assert_eq!(direction.rotate_left().rotate_right(), direction);
        }
    }

    #[test]
    fn nibbles_above_seven_are_undefined() {
        for value in 8..=15 {
            assert_eq!(Direction::from_nibble(value), Direction::Undefined);
        }
        assert_eq!(Direction::from_nibble(0x53), Direction::East);
    }

    #[test]
    fn step_stays_on_grid() {
        assert_eq!(Point::new(0, 10).step(Direction::West), None);
        assert_eq!(Point::new(255, 255).step(Direction::SouthEast), None);
        assert_eq!(
            Point::new(10, 10).step(Direction::NorthEast),
            Some(Point::new(11, 9))
        );
        assert_eq!(Point::new(10, 10).step(Direction::Undefined), None);
    }

    #[test]
    fn distance_counts_diagonal_steps() {
        assert_eq!(Point::new(10, 10).distance(Point::new(13, 11)), 3);
    }
}
