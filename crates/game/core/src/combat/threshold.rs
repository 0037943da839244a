//! Step 8b: one-shot HP-threshold triggers.

use crate::action::{EffectContext, TraceEvent};
use crate::state::{UnitId, WorldState, keys};

/// Returns true when Hp moved from above `fraction * max_hp` to at or below it.
pub fn crossed_threshold(before: i64, after: i64, max_hp: i64, fraction: f64) -> bool {
    if fraction <= 0.0 || max_hp <= 0 {
        return false;
    }
    let line = max_hp as f64 * fraction;
    before as f64 > line && after as f64 <= line
}

/// Marks and records the unit's threshold trigger if this hit crossed it.
///
/// Each `(unit, skill)` pair fires at most once; the fired marker is a tag so
/// it survives every later Hp change.
pub(crate) fn fire_threshold(
    world: &WorldState,
    target: &UnitId,
    before: i64,
    after: i64,
    ctx: &mut EffectContext<'_>,
) -> Option<WorldState> {
    let unit = world.unit(target.as_str())?;
    let skill = unit.text(keys::THRESHOLD_SKILL_ID);
    if skill.is_empty() {
        return None;
    }
    let marker = keys::threshold_fired(&skill);
    if unit.has_tag(&marker)
        || !crossed_threshold(before, after, unit.max_hp(), unit.float(keys::HP_THRESHOLD))
    {
        return None;
    }

    tracing::debug!(unit = %target, %skill, before, after, "hp threshold crossed");
    ctx.record(TraceEvent::ThresholdTriggered {
        unit: target.clone(),
        skill,
    });
    Some(world.update_unit(target.as_str(), |u| u.with_tag(marker)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_downward_crossings_count() {
        assert!(crossed_threshold(60, 40, 100, 0.5));
        assert!(crossed_threshold(51, 50, 100, 0.5));
        assert!(!crossed_threshold(50, 40, 100, 0.5));
        assert!(!crossed_threshold(40, 60, 100, 0.5));
        assert!(!crossed_threshold(60, 40, 100, 0.0));
        assert!(!crossed_threshold(60, 40, 0, 0.5));
    }
}
