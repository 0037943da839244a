//! Position changes.

use crate::action::{AtomicAction, EffectContext, Footprint, TraceEvent, VarKey};
use crate::state::{Coord, UnitId, WorldState, keys};

/// Places a unit on `to`. Rooted units, unknown units and out-of-bounds
/// destinations leave the world unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    pub unit: UnitId,
    pub to: Coord,
}

impl Move {
    pub fn new(unit: impl Into<UnitId>, to: Coord) -> Self {
        Self {
            unit: unit.into(),
            to,
        }
    }
}

impl AtomicAction for Move {
    fn reads(&self) -> Footprint {
        Footprint::new()
            .with(VarKey::unit_var(&self.unit, keys::POS))
            .with(VarKey::unit_var(&self.unit, keys::ROOTED_TURNS))
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, keys::POS))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        let Some(unit) = world.unit(self.unit.as_str()) else {
            return world.clone();
        };
        if unit.is_rooted() || !world.in_bounds(self.to) {
            return world.clone();
        }
        let from = unit.position();
        ctx.record(TraceEvent::Moved {
            unit: self.unit.clone(),
            from,
            to: self.to,
        });
        world.update_unit(self.unit.as_str(), |u| u.with_position(self.to))
    }
}

/// Steps a unit towards another unit, one tile at a time, for at most
/// `max_steps` tiles.
///
/// Stops early at the grid edge or in front of any occupied tile, so the
/// dash ends adjacent to the target rather than on it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashTowards {
    pub unit: UnitId,
    pub target: UnitId,
    pub max_steps: i64,
}

impl DashTowards {
    pub fn new(unit: impl Into<UnitId>, target: impl Into<UnitId>, max_steps: i64) -> Self {
        Self {
            unit: unit.into(),
            target: target.into(),
            max_steps,
        }
    }

    fn destination(&self, world: &WorldState) -> Option<(Coord, Coord)> {
        let unit = world.unit(self.unit.as_str())?;
        let goal = world.unit(self.target.as_str())?.position();
        if unit.is_rooted() {
            return None;
        }
        let from = unit.position();
        let mut at = from;
        for _ in 0..self.max_steps.max(0) {
            let (dx, dy) = at.step_towards(goal);
            if (dx, dy) == (0, 0) {
                break;
            }
            let next = at.offset(dx, dy);
            let blocked = world
                .units()
                .any(|other| other.id != self.unit && other.position() == next);
            if !world.in_bounds(next) || blocked {
                break;
            }
            at = next;
        }
        (at != from).then_some((from, at))
    }
}

impl AtomicAction for DashTowards {
    fn reads(&self) -> Footprint {
        // Occupancy checks read every unit's position.
        Footprint::new()
            .with(VarKey::any_unit_var(keys::POS))
            .with(VarKey::unit_var(&self.unit, keys::ROOTED_TURNS))
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, keys::POS))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        let Some((from, to)) = self.destination(world) else {
            return world.clone();
        };
        ctx.record(TraceEvent::Moved {
            unit: self.unit.clone(),
            from,
            to,
        });
        world.update_unit(self.unit.as_str(), |u| u.with_position(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UnitState;

    fn world() -> WorldState {
        WorldState::new(8, 3)
            .unwrap()
            .with_unit(UnitState::new("runner", Coord::new(0, 1), 10))
            .with_unit(UnitState::new("goal", Coord::new(6, 1), 10))
    }

    fn pos(world: &WorldState, id: &str) -> Coord {
        world.unit(id).unwrap().position()
    }

    #[test]
    fn dash_is_capped_by_steps() {
        let next = DashTowards::new("runner", "goal", 3).compile().apply(&world());
        assert_eq!(pos(&next, "runner"), Coord::new(3, 1));
    }

    #[test]
    fn dash_stops_next_to_target() {
        let next = DashTowards::new("runner", "goal", 20).compile().apply(&world());
        assert_eq!(pos(&next, "runner"), Coord::new(5, 1));
    }

    #[test]
    fn rooted_units_stay_put() {
        let w = world().update_unit("runner", |u| u.with_var(keys::ROOTED_TURNS, 1));
        assert_eq!(Move::new("runner", Coord::new(2, 2)).compile().apply(&w), w);
        assert_eq!(DashTowards::new("runner", "goal", 2).compile().apply(&w), w);
    }

    #[test]
    fn move_rejects_out_of_bounds() {
        let w = world();
        assert_eq!(Move::new("runner", Coord::new(9, 9)).compile().apply(&w), w);
        let moved = Move::new("runner", Coord::new(2, 2)).compile().apply(&w);
        assert_eq!(pos(&moved, "runner"), Coord::new(2, 2));
    }
}
