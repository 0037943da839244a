//! Targeting modes and area shapes.
//!
//! A skill's targeting mode decides which explicit targets a cast accepts.
//! Shapes select every tile covered by a line or cone projected from an
//! origin; line damage and `for each ... in line/cone` selectors share them.

use crate::state::{Coord, Direction};

// ============================================================================
// Targeting Mode
// ============================================================================

/// Which explicit target a skill accepts.
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
pub enum TargetingMode {
    /// Any living unit.
    #[default]
    Any,
    /// Units on a different team than the caster.
    Enemies,
    /// Units on the caster's team, excluding the caster.
    Allies,
    /// The caster only; range is ignored.
    #[strum(serialize = "self")]
    SelfOnly,
    /// A tile, occupied or not.
    Tile,
    /// A bare point (coordinate) on the grid.
    Point,
}

impl TargetingMode {
    /// Modes whose target is a coordinate rather than a unit.
    pub fn targets_ground(self) -> bool {
        matches!(self, TargetingMode::Tile | TargetingMode::Point)
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// Default cone aperture in degrees.
pub const DEFAULT_CONE_ANGLE: f64 = 90.0;

/// Area projected from an origin tile.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// Tiles `1..=length` steps along `direction`, widened by `radius`
    /// (Chebyshev) on every side. Radius 0 is a one-tile-wide line.
    Line {
        direction: Direction,
        length: i64,
        radius: i64,
    },

    /// Tiles within Euclidean `radius` whose bearing lies within `angle / 2`
    /// degrees of `direction`.
    Cone {
        direction: Direction,
        radius: i64,
        angle: f64,
    },
}

impl Shape {
    pub fn line(direction: Direction, length: i64, radius: i64) -> Self {
        Shape::Line {
            direction,
            length,
            radius,
        }
    }

    pub fn cone(direction: Direction, radius: i64, angle: f64) -> Self {
        Shape::Cone {
            direction,
            radius,
            angle,
        }
    }

    /// Returns true if `p` is covered when the shape is cast from `origin`.
    /// The origin itself is never covered.
    pub fn contains(&self, origin: Coord, p: Coord) -> bool {
        if p == origin {
            return false;
        }
        match *self {
            Shape::Line {
                direction,
                length,
                radius,
            } => {
                // Solve for the step range `t` whose cell lies within
                // `radius` of `p` on both axes, then intersect with
                // `1..=length`.
                let (dx, dy) = direction.offset();
                let rel = [
                    (dx, i64::from(p.x) - i64::from(origin.x)),
                    (dy, i64::from(p.y) - i64::from(origin.y)),
                ];
                let radius = radius.max(0);
                let (mut lo, mut hi) = (1_i64, length);
                for (d, v) in rel {
                    if d == 0 {
                        if v.abs() > radius {
                            return false;
                        }
                    } else {
                        let along = i64::from(d) * v;
                        lo = lo.max(along.saturating_sub(radius));
                        hi = hi.min(along.saturating_add(radius));
                    }
                }
                lo <= hi
            }
            Shape::Cone {
                direction,
                radius,
                angle,
            } => {
                let vx = f64::from(p.x - origin.x);
                let vy = f64::from(p.y - origin.y);
                let dist = (vx * vx + vy * vy).sqrt();
                if dist > radius as f64 {
                    return false;
                }
                let (dx, dy) = direction.offset();
                let (dx, dy) = (f64::from(dx), f64::from(dy));
                let cos = (vx * dx + vy * dy) / (dist * (dx * dx + dy * dy).sqrt());
                let half = (angle.clamp(0.0, 360.0) / 2.0).to_radians();
                cos >= half.cos() - 1e-9
            }
        }
    }
}

/// Direction from `from` towards `to`, snapped to the nearest of the eight
/// compass points. `None` when the two coincide.
pub fn bearing(from: Coord, to: Coord) -> Option<Direction> {
    let dx = f64::from(to.x - from.x);
    let dy = f64::from(to.y - from.y);
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    let octant = (dy.atan2(dx) / std::f64::consts::FRAC_PI_4).round() as i32;
    let (sx, sy) = match octant.rem_euclid(8) {
        0 => (1, 0),
        1 => (1, 1),
        2 => (0, 1),
        3 => (-1, 1),
        4 => (-1, 0),
        5 => (-1, -1),
        6 => (0, -1),
        _ => (1, -1),
    };
    Direction::from_offset(sx, sy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_mode_parses_from_keyword() {
        assert_eq!("self".parse::<TargetingMode>().unwrap(), TargetingMode::SelfOnly);
        assert_eq!("Enemies".parse::<TargetingMode>().unwrap(), TargetingMode::Enemies);
        assert!(TargetingMode::Point.targets_ground());
    }

    #[test]
    fn line_covers_length_and_radius() {
        let east = Shape::line(Direction::East, 3, 0);
        let o = Coord::ORIGIN;
        assert!(east.contains(o, Coord::new(1, 0)));
        assert!(east.contains(o, Coord::new(3, 0)));
        assert!(!east.contains(o, Coord::new(4, 0)));
        assert!(!east.contains(o, Coord::new(1, 1)));
        assert!(!east.contains(o, o));

        let wide = Shape::line(Direction::East, 3, 1);
        assert!(wide.contains(o, Coord::new(2, -1)));
        assert!(wide.contains(o, Coord::new(4, 1)));
        assert!(!wide.contains(o, Coord::new(5, 0)));
        assert!(!wide.contains(o, Coord::new(-1, 0)));
    }

    #[test]
    fn diagonal_line_matches_stepped_cells() {
        let ne = Shape::line(Direction::NorthEast, 2, 0);
        let o = Coord::new(1, 1);
        assert!(ne.contains(o, Coord::new(2, 2)));
        assert!(ne.contains(o, Coord::new(3, 3)));
        assert!(!ne.contains(o, Coord::new(4, 4)));
        assert!(!ne.contains(o, Coord::new(2, 1)));
    }

    #[test]
    fn extreme_line_extent_is_constant_time() {
        let o = Coord::new(1, 1);
        let huge = Shape::line(Direction::East, i64::MAX, 0);
        assert!(huge.contains(o, Coord::new(i32::MAX, 1)));
        assert!(!huge.contains(o, Coord::new(3, 2)));
        assert!(!huge.contains(o, Coord::new(i32::MIN, 1)));

        let wide = Shape::line(Direction::West, i64::MAX, i64::MAX);
        assert!(wide.contains(o, Coord::new(i32::MIN, i32::MAX)));
        assert!(!Shape::line(Direction::East, i64::MIN, 0).contains(o, Coord::new(2, 1)));
    }

    #[test]
    fn cone_respects_aperture() {
        let north = Shape::cone(Direction::North, 3, DEFAULT_CONE_ANGLE);
        let o = Coord::ORIGIN;
        assert!(north.contains(o, Coord::new(0, 2)));
        assert!(north.contains(o, Coord::new(1, 1)));
        assert!(!north.contains(o, Coord::new(2, 1)));
        assert!(!north.contains(o, Coord::new(0, -1)));
        assert!(!north.contains(o, Coord::new(0, 4)));
    }

    #[test]
    fn bearing_snaps_to_compass() {
        let o = Coord::ORIGIN;
        assert_eq!(bearing(o, Coord::new(5, 0)), Some(Direction::East));
        assert_eq!(bearing(o, Coord::new(3, 3)), Some(Direction::NorthEast));
        assert_eq!(bearing(o, Coord::new(1, -4)), Some(Direction::South));
        assert_eq!(bearing(o, o), None);
    }
}
