//! Area damage.

use crate::action::kinds::combat::{Subject, attack_reads, attack_writes};
use crate::action::targeting::{Shape, bearing};
use crate::action::{AtomicAction, EffectContext, Footprint, VarKey};
use crate::combat::{self, AttackSpec, DamageKind};
use crate::state::{UnitId, WorldState, keys};

/// Damage along a line cast from the attacker towards `target`.
///
/// Every unit covered by the line (other than the attacker and its
/// teammates) takes a separate hit through the pipeline, in id order. The
/// hit set is only known at apply time, so the footprint uses wildcard keys.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineAoeDamage {
    pub attacker: UnitId,
    pub target: UnitId,
    pub kind: DamageKind,
    pub power: i64,
    pub length: i64,
    pub radius: i64,
}

impl LineAoeDamage {
    pub fn new(
        attacker: impl Into<UnitId>,
        target: impl Into<UnitId>,
        kind: DamageKind,
        power: i64,
    ) -> Self {
        Self {
            attacker: attacker.into(),
            target: target.into(),
            kind,
            power,
            length: 1,
            radius: 0,
        }
    }

    #[must_use]
    pub fn with_extent(mut self, length: i64, radius: i64) -> Self {
        self.length = length;
        self.radius = radius;
        self
    }

    /// Units the line covers in `world`, in id order.
    pub fn victims(&self, world: &WorldState) -> Vec<UnitId> {
        let (Some(attacker), Some(target)) = (
            world.unit(self.attacker.as_str()),
            world.unit(self.target.as_str()),
        ) else {
            return Vec::new();
        };
        let origin = attacker.position();
        let Some(direction) = bearing(origin, target.position()) else {
            return Vec::new();
        };
        let shape = Shape::line(direction, self.length, self.radius);
        let team = attacker.team();

        world
            .units()
            .filter(|u| u.id != self.attacker)
            .filter(|u| team.is_empty() || u.team() != team)
            .filter(|u| shape.contains(origin, u.position()))
            .map(|u| u.id.clone())
            .collect()
    }
}

impl AtomicAction for LineAoeDamage {
    fn reads(&self) -> Footprint {
        let mut fp = attack_reads(Subject::Unit(&self.attacker), Subject::Any);
        fp.insert(VarKey::any_unit_var(keys::POS));
        fp.insert(VarKey::any_unit_var(keys::TEAM));
        fp
    }

    fn writes(&self) -> Footprint {
        attack_writes(Subject::Unit(&self.attacker), Subject::Any)
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        let spec = AttackSpec::new(self.kind, self.power);
        self.victims(world).iter().fold(world.clone(), |acc, victim| {
            combat::resolve_attack(&acc, &self.attacker, victim, &spec, ctx).0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Coord, UnitState};

    fn world() -> WorldState {
        WorldState::new(8, 3)
            .unwrap()
            .with_unit(UnitState::new("mage", Coord::new(0, 1), 20).with_var(keys::TEAM, "red"))
            .with_unit(UnitState::new("ally", Coord::new(1, 1), 20).with_var(keys::TEAM, "red"))
            .with_unit(UnitState::new("e1", Coord::new(2, 1), 20).with_var(keys::TEAM, "blue"))
            .with_unit(UnitState::new("e2", Coord::new(3, 2), 20).with_var(keys::TEAM, "blue"))
            .with_unit(UnitState::new("far", Coord::new(6, 1), 20).with_var(keys::TEAM, "blue"))
    }

    #[test]
    fn line_hits_enemies_within_extent() {
        let line = LineAoeDamage::new("mage", "e1", DamageKind::True, 5).with_extent(3, 1);
        assert_eq!(line.victims(&world()), vec![UnitId::from("e1"), UnitId::from("e2")]);

        let next = line.compile().apply(&world());
        assert_eq!(next.unit("e1").unwrap().hp(), 15);
        assert_eq!(next.unit("e2").unwrap().hp(), 15);
        assert_eq!(next.unit("ally").unwrap().hp(), 20);
        assert_eq!(next.unit("far").unwrap().hp(), 20);
    }

    #[test]
    fn unbounded_extent_stays_on_the_grid() {
        let line = LineAoeDamage::new("mage", "e1", DamageKind::True, 5).with_extent(i64::MAX, 0);
        assert_eq!(line.victims(&world()), vec![UnitId::from("e1"), UnitId::from("far")]);
    }

    #[test]
    fn wildcard_writes_conflict_with_any_hp_write() {
        let line = LineAoeDamage::new("mage", "e1", DamageKind::Physical, 5);
        let heal = crate::action::Heal::new("far", 1);
        assert!(!line.is_commutative_with(&heal));
    }
}
