use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a unit tracked in the world.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UnitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for UnitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Unit step (each axis in `-1..=1`) pointing from `self` towards `other`.
    pub fn step_towards(self, other: Coord) -> (i32, i32) {
        ((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

impl Default for Coord {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Distance metric used for range checks and selector filters.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DistanceMetric {
    /// Sum of axis deltas (4-way movement).
    #[default]
    Manhattan,
    /// Largest axis delta (8-way movement).
    Chebyshev,
    /// Straight-line distance.
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two coordinates under this metric.
    ///
    /// Euclidean distance is returned unrounded; integer callers compare
    /// against it as a float so `range 2` admits `(1, 1)` offsets.
    pub fn distance(self, a: Coord, b: Coord) -> f64 {
        let dx = f64::from((a.x - b.x).abs());
        let dy = f64::from((a.y - b.y).abs());
        match self {
            Self::Manhattan => dx + dy,
            Self::Chebyshev => dx.max(dy),
            Self::Euclidean => (dx * dx + dy * dy).sqrt(),
        }
    }

    /// Returns true if `b` lies within `range` of `a`.
    pub fn within(self, a: Coord, b: Coord, range: i64) -> bool {
        range >= 0 && self.distance(a, b) <= range as f64
    }
}

/// Compass direction used by line and cone shapes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    /// Returns the offset (dx, dy) for this direction.
    ///
    /// Coordinate system: Y-axis increases upward (north), X-axis increases rightward (east).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }

    /// Inverse of [`Direction::offset`]; `None` for the zero step.
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(Direction::North),
            (0, -1) => Some(Direction::South),
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            (1, 1) => Some(Direction::NorthEast),
            (-1, 1) => Some(Direction::NorthWest),
            (1, -1) => Some(Direction::SouthEast),
            (-1, -1) => Some(Direction::SouthWest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_disagree_on_diagonals() {
        let a = Coord::new(0, 0);
        let b = Coord::new(2, 2);
        assert_eq!(DistanceMetric::Manhattan.distance(a, b), 4.0);
        assert_eq!(DistanceMetric::Chebyshev.distance(a, b), 2.0);
        assert!(DistanceMetric::Euclidean.within(a, b, 3));
        assert!(!DistanceMetric::Euclidean.within(a, b, 2));
    }

    #[test]
    fn direction_round_trips_offsets() {
        for dir in [Direction::North, Direction::SouthWest, Direction::East] {
            let (dx, dy) = dir.offset();
            assert_eq!(Direction::from_offset(dx * 3, dy * 3), Some(dir));
        }
        assert_eq!(Direction::from_offset(0, 0), None);
    }

    #[test]
    fn metric_parses_case_insensitively() {
        assert_eq!(
            "Chebyshev".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Chebyshev
        );
        assert_eq!(Direction::NorthEast.to_string(), "north_east");
    }
}
