//! Compiled skills.

use std::fmt;

use battle_core::state::keys;
use battle_core::{
    CastError, Coord, DistanceMetric, Effect, TargetingMode, TraceEvent, UnitId, WorldState, round,
};

use crate::dsl::analysis::analyze;
use crate::dsl::ast::{Meta, Script, Stmt};
use crate::dsl::diagnostics::Diagnostic;
use crate::dsl::lower::{Bindings, Step, lower_block};

/// What a cast is aimed at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastTarget {
    #[default]
    None,
    Unit(UnitId),
    Point(Coord),
}

impl From<&str> for CastTarget {
    fn from(id: &str) -> Self {
        CastTarget::Unit(UnitId::new(id))
    }
}

impl From<Coord> for CastTarget {
    fn from(at: Coord) -> Self {
        CastTarget::Point(at)
    }
}

/// Skill metadata collected from the script's top-level declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillMeta {
    /// Maximum cast range; `None` means unlimited.
    pub range: Option<i64>,
    pub min_range: i64,
    /// Turns the skill is unavailable after a cast.
    pub cooldown: i64,
    pub targeting: TargetingMode,
    pub distance: DistanceMetric,
    /// First turn the skill may be cast.
    pub sealed_until: i64,
    pub ends_turn: bool,
    /// Sum of constant top-level `consume mp` amounts.
    pub mp_cost: i64,
}

impl Default for SkillMeta {
    fn default() -> Self {
        Self {
            range: None,
            min_range: 0,
            cooldown: 0,
            targeting: TargetingMode::Any,
            distance: DistanceMetric::Manhattan,
            sealed_until: 0,
            ends_turn: false,
            mp_cost: 0,
        }
    }
}

impl SkillMeta {
    fn from_script(script: &Script) -> Self {
        let mut meta = Self::default();
        for item in &script.meta {
            match item.node {
                Meta::Range(n) => meta.range = Some(n),
                Meta::MinRange(n) => meta.min_range = n,
                Meta::Cooldown(n) => meta.cooldown = n,
                Meta::Targeting(mode) => meta.targeting = mode,
                Meta::Distance(metric) => meta.distance = metric,
                Meta::SealedUntil(n) => meta.sealed_until = n,
                Meta::EndsTurn => meta.ends_turn = true,
            }
        }
        meta.mp_cost = script
            .body
            .iter()
            .filter_map(|stmt| match &stmt.node {
                Stmt::ConsumeMp(amount) => amount.constant().map(|v| v.as_int().max(0)),
                _ => None,
            })
            .fold(0i64, i64::saturating_add);
        meta
    }
}

/// A named skill: metadata, compiled body and analysis warnings.
#[derive(Clone)]
pub struct Skill {
    name: String,
    meta: SkillMeta,
    body: Step,
    warnings: Vec<Diagnostic>,
}

impl Skill {
    /// Compiles an already-parsed script.
    pub fn compile(name: impl Into<String>, script: &Script) -> Self {
        let name = name.into();
        let warnings = analyze(script);
        for warning in &warnings {
            tracing::debug!(skill = %name, %warning, "script warning");
        }
        Self {
            meta: SkillMeta::from_script(script),
            body: lower_block(&script.body),
            warnings,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &SkillMeta {
        &self.meta
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Checks whether `caster` may cast this skill at `target` right now.
    pub fn validate_cast(
        &self,
        world: &WorldState,
        caster: &str,
        target: &CastTarget,
    ) -> Result<(), CastError> {
        let unit = world
            .unit(caster)
            .ok_or_else(|| CastError::CasterNotFound(UnitId::new(caster)))?;
        if !unit.is_alive() || !unit.can_act() || unit.is_silenced() {
            return Err(CastError::CannotAct(unit.id.clone()));
        }

        let turn = world.turn();
        let sealed = u64::try_from(self.meta.sealed_until).unwrap_or(0);
        if turn < sealed {
            return Err(CastError::Sealed {
                until: sealed,
                turn,
            });
        }
        let ready = u64::try_from(unit.int(&keys::cooldown_until(&self.name))).unwrap_or(0);
        if turn < ready {
            return Err(CastError::OnCooldown { until: ready, turn });
        }

        let have = unit.int(keys::MP);
        if have < self.meta.mp_cost {
            return Err(CastError::InsufficientMp {
                need: self.meta.mp_cost,
                have,
            });
        }

        let Some(at) = self.target_position(world, unit.id.as_str(), &unit.team(), target)? else {
            return Ok(());
        };
        let distance = self.meta.distance.distance(unit.position(), at);
        let max = self.meta.range.unwrap_or(i64::MAX);
        if distance > max as f64 || distance < self.meta.min_range as f64 {
            return Err(CastError::OutOfRange {
                distance: round::to_int(distance),
                min: self.meta.min_range,
                max,
            });
        }
        Ok(())
    }

    /// Resolves the target against the targeting mode. `None` means no
    /// range check applies.
    fn target_position(
        &self,
        world: &WorldState,
        caster: &str,
        team: &str,
        target: &CastTarget,
    ) -> Result<Option<Coord>, CastError> {
        let mode = self.meta.targeting;
        match (mode, target) {
            (TargetingMode::SelfOnly, CastTarget::None) => Ok(None),
            (TargetingMode::SelfOnly, CastTarget::Unit(id)) if id.as_str() == caster => Ok(None),
            (TargetingMode::SelfOnly, _) => {
                Err(CastError::InvalidTarget("self-targeted skill takes no other target"))
            }
            (TargetingMode::Tile | TargetingMode::Point, CastTarget::Point(at)) => {
                if world.in_bounds(*at) {
                    Ok(Some(*at))
                } else {
                    Err(CastError::InvalidTarget("point lies outside the grid"))
                }
            }
            (TargetingMode::Point, CastTarget::Unit(id)) => {
                let unit = world
                    .unit(id.as_str())
                    .ok_or_else(|| CastError::TargetNotFound(id.clone()))?;
                Ok(Some(unit.position()))
            }
            (TargetingMode::Tile | TargetingMode::Point, _) => {
                Err(CastError::InvalidTarget("skill needs a point target"))
            }
            (TargetingMode::Any, CastTarget::None) => Ok(None),
            (_, CastTarget::Unit(id)) => {
                let unit = world
                    .unit(id.as_str())
                    .filter(|u| u.is_alive() && !u.is_untargetable())
                    .ok_or_else(|| CastError::TargetNotFound(id.clone()))?;
                match mode {
                    TargetingMode::Enemies if unit.team() == team => {
                        Err(CastError::InvalidTarget("target is not an enemy"))
                    }
                    TargetingMode::Allies if unit.team() != team || unit.id.as_str() == caster => {
                        Err(CastError::InvalidTarget("target is not an ally"))
                    }
                    _ => Ok(Some(unit.position())),
                }
            }
            (TargetingMode::Any, CastTarget::Point(at)) => Ok(Some(*at)),
            (_, _) => Err(CastError::InvalidTarget("skill needs a unit target")),
        }
    }

    /// The cast bound to `caster` and `target`.
    ///
    /// The effect does not re-validate; call [`Skill::validate_cast`]
    /// first. A skill with a cooldown records `cooldown_until:<name>` on the
    /// caster before its body runs.
    pub fn effect(&self, caster: impl Into<UnitId>, target: CastTarget) -> Effect {
        let bindings = Bindings::new(caster.into(), target, self.meta.distance);
        let body = self.body.clone();
        let name = self.name.clone();
        let cooldown = self.meta.cooldown;
        Effect::new(move |world, ctx| {
            ctx.record(TraceEvent::Note(format!("{} casts {name}", bindings.caster)));
            let world = if cooldown > 0 {
                let ready = i64::try_from(world.turn())
                    .unwrap_or(i64::MAX)
                    .saturating_add(cooldown);
                world.update_unit(bindings.caster.as_str(), |u| {
                    u.with_var(keys::cooldown_until(&name), ready)
                })
            } else {
                world.clone()
            };
            body.run(&world, ctx, &bindings)
        })
    }
}

impl fmt::Debug for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skill")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parser::parse_script;
    use battle_core::{BattleConfig, EffectContext, UnitState};

    fn skill(src: &str) -> Skill {
        Skill::compile("Test", &parse_script(src).unwrap())
    }

    fn world() -> WorldState {
        WorldState::new(10, 10)
            .unwrap()
            .with_unit(
                UnitState::new("mage", Coord::new(0, 0), 20)
                    .with_var(keys::TEAM, "blue")
                    .with_var(keys::MP, 4),
            )
            .with_unit(UnitState::new("squire", Coord::new(1, 0), 20).with_var(keys::TEAM, "blue"))
            .with_unit(UnitState::new("wolf", Coord::new(3, 0), 20).with_var(keys::TEAM, "red"))
    }

    #[test]
    fn metadata_is_collected() {
        let s = skill("range 4\nmin_range 1\ncooldown 2\ntargeting enemies\ndistance chebyshev\n\
             sealed_until 3\nends_turn\nconsume mp = 2\nconsume mp = 1");
        let meta = s.meta();
        assert_eq!(meta.range, Some(4));
        assert_eq!(meta.min_range, 1);
        assert_eq!(meta.targeting, TargetingMode::Enemies);
        assert_eq!(meta.distance, DistanceMetric::Chebyshev);
        assert_eq!(meta.sealed_until, 3);
        assert!(meta.ends_turn);
        assert_eq!(meta.mp_cost, 3);
    }

    #[test]
    fn range_and_team_checks() {
        let s = skill("range 2\ntargeting enemies\ndeal 1 damage to target");
        let w = world();
        assert!(matches!(
            s.validate_cast(&w, "mage", &"wolf".into()),
            Err(CastError::OutOfRange { distance: 3, min: 0, max: 2 })
        ));
        assert!(matches!(
            s.validate_cast(&w, "mage", &"squire".into()),
            Err(CastError::InvalidTarget(_))
        ));
        assert!(matches!(
            s.validate_cast(&w, "mage", &"ghost".into()),
            Err(CastError::TargetNotFound(_))
        ));
        let moved = w.update_unit("wolf", |u| u.with_position(Coord::new(2, 0)));
        assert!(s.validate_cast(&moved, "mage", &"wolf".into()).is_ok());
    }

    #[test]
    fn status_seal_and_mp_checks() {
        let w = world();
        let sealed = skill("sealed_until 2\nheal 1 to self");
        assert_eq!(
            sealed.validate_cast(&w, "mage", &CastTarget::None),
            Err(CastError::Sealed { until: 2, turn: 0 })
        );
        let costly = skill("consume mp = 5\nheal 1 to self");
        assert_eq!(
            costly.validate_cast(&w, "mage", &CastTarget::None),
            Err(CastError::InsufficientMp { need: 5, have: 4 })
        );
        let stunned = w.update_unit("mage", |u| u.with_var(keys::STUNNED_TURNS, 1));
        assert!(matches!(
            skill("heal 1 to self").validate_cast(&stunned, "mage", &CastTarget::None),
            Err(CastError::CannotAct(_))
        ));
    }

    #[test]
    fn self_and_point_targeting() {
        let w = world();
        let own = skill("targeting self\nheal 1 to self");
        assert!(own.validate_cast(&w, "mage", &CastTarget::None).is_ok());
        assert!(own.validate_cast(&w, "mage", &"wolf".into()).is_err());

        let blast = skill("targeting tile\nrange 3\nadd tile at target tag \"scorched\"");
        assert!(blast.validate_cast(&w, "mage", &Coord::new(2, 1).into()).is_ok());
        assert!(blast.validate_cast(&w, "mage", &"wolf".into()).is_err());
        assert!(blast.validate_cast(&w, "mage", &Coord::new(20, 0).into()).is_err());
    }

    #[test]
    fn cast_sets_cooldown_and_runs_body() {
        let s = skill("cooldown 2\ndeal true 5 damage to target");
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let out = s.effect("mage", "wolf".into()).run(&world(), &mut ctx);

        assert_eq!(out.unit("wolf").unwrap().hp(), 15);
        assert_eq!(out.unit("mage").unwrap().int(&keys::cooldown_until("Test")), 2);
        assert_eq!(ctx.trace.lines()[0], "mage casts Test");
        assert_eq!(
            s.validate_cast(&out, "mage", &"wolf".into()),
            Err(CastError::OnCooldown { until: 2, turn: 0 })
        );
    }
}
