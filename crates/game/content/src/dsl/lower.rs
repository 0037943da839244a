//! Lowering of script statements into executable steps.
//!
//! Every statement becomes a [`Step`]: a closure over the world, the effect
//! context and the cast's [`Bindings`]. Action statements build the
//! matching core action and apply it, so skills and hosts share one
//! mutation vocabulary. Constant `chance` and `repeat` counts are folded
//! here; everything else is evaluated against the world the step receives.

use std::cmp::Ordering;
use std::sync::Arc;

use battle_core::action::targeting::{DEFAULT_CONE_ANGLE, bearing};
use battle_core::rng::{PcgRng, RollContext, compute_seed};
use battle_core::state::keys;
use battle_core::{
    AddGlobalTag, AddTileTag, AddUnitTag, AtomicAction, Coord, Damage, DamageKind, DashTowards,
    DistanceMetric, EffectContext, Heal, LineAoeDamage, MagicDamage, ModifyGlobalVar,
    ModifyUnitVar, Move, PhysicalDamage, RemoveGlobalTag, RemoveGlobalVar, RemoveTileTag,
    RemoveTileVar, RemoveUnitTag, RemoveUnitVar, SetGlobalVar, SetTileVar, SetUnitVar, Shape,
    UnitId, Value, WorldState,
};

use crate::dsl::ast::{
    BinOp, CmpOp, Cond, Destination, Expr, Order, Pool, Ref, Scope, Selector, ShapeSpec, Spanned,
    Stmt,
};
use crate::dsl::skill::CastTarget;

/// Upper bound on iterations of any `repeat`; larger counts are clamped.
pub const MAX_REPEAT: i64 = 1_000;

// ============================================================================
// Bindings
// ============================================================================

/// Names a running script can refer to.
#[derive(Clone, Debug)]
pub(crate) struct Bindings {
    pub caster: UnitId,
    pub target: CastTarget,
    /// Current element of the innermost `for each`.
    pub it: Option<UnitId>,
    pub metric: DistanceMetric,
}

impl Bindings {
    pub fn new(caster: UnitId, target: CastTarget, metric: DistanceMetric) -> Self {
        Self {
            caster,
            target,
            it: None,
            metric,
        }
    }

    fn with_it(&self, it: UnitId) -> Self {
        Self {
            it: Some(it),
            ..self.clone()
        }
    }

    fn unit(&self, reference: &Ref) -> Option<UnitId> {
        match reference {
            Ref::Caster => Some(self.caster.clone()),
            Ref::Target => match &self.target {
                CastTarget::Unit(id) => Some(id.clone()),
                _ => None,
            },
            Ref::It => self.it.clone(),
            Ref::Unit(id) => Some(UnitId::new(id.as_str())),
        }
    }

    fn position(&self, world: &WorldState, reference: &Ref) -> Option<Coord> {
        if let (Ref::Target, CastTarget::Point(at)) = (reference, &self.target) {
            return Some(*at);
        }
        let id = self.unit(reference)?;
        world.unit(id.as_str()).map(|u| u.position())
    }
}

// ============================================================================
// Steps
// ============================================================================

type StepFn = dyn Fn(&WorldState, &mut EffectContext<'_>, &Bindings) -> WorldState + Send + Sync;

/// One lowered statement (or block of statements).
#[derive(Clone)]
pub(crate) struct Step(Arc<StepFn>);

impl Step {
    fn new<F>(f: F) -> Self
    where
        F: Fn(&WorldState, &mut EffectContext<'_>, &Bindings) -> WorldState + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn identity() -> Self {
        Self::new(|world, _, _| world.clone())
    }

    pub fn run(
        &self,
        world: &WorldState,
        ctx: &mut EffectContext<'_>,
        bindings: &Bindings,
    ) -> WorldState {
        (self.0)(world, ctx, bindings)
    }
}

/// Lowers a statement list into one step that runs them left to right.
pub(crate) fn lower_block(stmts: &[Spanned<Stmt>]) -> Step {
    let mut steps: Vec<Step> = stmts.iter().filter_map(|s| lower_stmt(&s.node)).collect();
    match steps.len() {
        0 => Step::identity(),
        1 => steps.remove(0),
        _ => Step::new(move |world, ctx, b| {
            steps
                .iter()
                .fold(world.clone(), |acc, step| step.run(&acc, ctx, b))
        }),
    }
}

/// `None` when the statement folds away entirely.
fn lower_stmt(stmt: &Stmt) -> Option<Step> {
    let step = match stmt.clone() {
        Stmt::Deal {
            kind,
            amount,
            target,
        } => Step::new(move |world, ctx, b| {
            let Some(id) = b.unit(&target) else {
                return world.clone();
            };
            let power = eval(&amount, world, b).as_int();
            match kind {
                DamageKind::Physical => {
                    PhysicalDamage::new(b.caster.clone(), id, power).apply(world, ctx)
                }
                DamageKind::Magic => MagicDamage::new(b.caster.clone(), id, power).apply(world, ctx),
                DamageKind::True => Damage::new(id, power).apply(world, ctx),
            }
        }),
        Stmt::Heal { amount, target } => Step::new(move |world, ctx, b| {
            let Some(id) = b.unit(&target) else {
                return world.clone();
            };
            let amount = eval(&amount, world, b).as_int();
            Heal::new(id, amount).apply(world, ctx)
        }),
        Stmt::Move { unit, to } => Step::new(move |world, ctx, b| {
            let Some(id) = b.unit(&unit) else {
                return world.clone();
            };
            let destination = match &to {
                Destination::Coord(x, y) => Some(coord(world, b, x, y)),
                Destination::At(reference) => b.position(world, reference),
            };
            match destination {
                Some(at) => Move::new(id, at).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::Dash { target, steps } => Step::new(move |world, ctx, b| {
            let Some(id) = b.unit(&target) else {
                return world.clone();
            };
            let steps = eval(&steps, world, b).as_int();
            DashTowards::new(b.caster.clone(), id, steps).apply(world, ctx)
        }),
        Stmt::Line {
            kind,
            amount,
            target,
            length,
            radius,
        } => Step::new(move |world, ctx, b| {
            let Some(id) = b.unit(&target) else {
                return world.clone();
            };
            let power = eval(&amount, world, b).as_int();
            let length = eval(&length, world, b).as_int();
            let radius = eval(&radius, world, b).as_int();
            LineAoeDamage::new(b.caster.clone(), id, kind, power)
                .with_extent(length, radius)
                .apply(world, ctx)
        }),
        Stmt::SetVar { scope, name, value } => Step::new(move |world, ctx, b| {
            let value = eval(&value, world, b);
            match place(&scope, world, b) {
                Some(Place::Unit(id)) => SetUnitVar::new(id, name.as_str(), value).apply(world, ctx),
                Some(Place::Tile(at)) => SetTileVar::new(at, name.as_str(), value).apply(world, ctx),
                Some(Place::Global) => SetGlobalVar::new(name.as_str(), value).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::AddVar { scope, name, delta } => Step::new(move |world, ctx, b| {
            let delta = eval(&delta, world, b);
            match place(&scope, world, b) {
                Some(Place::Unit(id)) => {
                    ModifyUnitVar::new(id, name.as_str(), delta).apply(world, ctx)
                }
                Some(Place::Tile(at)) => {
                    let current = world
                        .tile(at)
                        .and_then(|t| t.get(&name).cloned())
                        .unwrap_or_default();
                    SetTileVar::new(at, name.as_str(), current.add(&delta)).apply(world, ctx)
                }
                Some(Place::Global) => ModifyGlobalVar::new(name.as_str(), delta).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::RemoveVar { scope, name } => Step::new(move |world, ctx, b| {
            match place(&scope, world, b) {
                Some(Place::Unit(id)) => RemoveUnitVar::new(id, name.as_str()).apply(world, ctx),
                Some(Place::Tile(at)) => RemoveTileVar::new(at, name.as_str()).apply(world, ctx),
                Some(Place::Global) => RemoveGlobalVar::new(name.as_str()).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::AddTag { scope, tag } => Step::new(move |world, ctx, b| {
            match place(&scope, world, b) {
                Some(Place::Unit(id)) => AddUnitTag::new(id, tag.as_str()).apply(world, ctx),
                Some(Place::Tile(at)) => AddTileTag::new(at, tag.as_str()).apply(world, ctx),
                Some(Place::Global) => AddGlobalTag::new(tag.as_str()).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::RemoveTag { scope, tag } => Step::new(move |world, ctx, b| {
            match place(&scope, world, b) {
                Some(Place::Unit(id)) => RemoveUnitTag::new(id, tag.as_str()).apply(world, ctx),
                Some(Place::Tile(at)) => RemoveTileTag::new(at, tag.as_str()).apply(world, ctx),
                Some(Place::Global) => RemoveGlobalTag::new(tag.as_str()).apply(world, ctx),
                None => world.clone(),
            }
        }),
        Stmt::ConsumeMp(amount) => Step::new(move |world, ctx, b| {
            let Some(caster) = world.unit(b.caster.as_str()) else {
                return world.clone();
            };
            let cost = eval(&amount, world, b).as_int().max(0);
            let left = caster.int(keys::MP).saturating_sub(cost).max(0);
            SetUnitVar::new(b.caster.clone(), keys::MP, left).apply(world, ctx)
        }),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            let then = lower_block(&then.stmts);
            let otherwise = otherwise.map(|block| lower_block(&block.stmts));
            Step::new(move |world, ctx, b| {
                let (world, hit) = test(&cond, world, b);
                branch(hit, &then, otherwise.as_ref(), &world, ctx, b)
            })
        }
        Stmt::Chance {
            percent,
            then,
            otherwise,
        } => {
            let then = lower_block(&then.stmts);
            let otherwise = otherwise.map(|block| lower_block(&block.stmts));
            match percent.constant().map(|v| v.as_float()) {
                Some(p) if p <= 0.0 => return otherwise,
                Some(p) if p >= 100.0 => then,
                _ => Step::new(move |world, ctx, b| {
                    let p = eval(&percent, world, b).as_float();
                    let (world, hit) = roll_chance(world, p);
                    branch(hit, &then, otherwise.as_ref(), &world, ctx, b)
                }),
            }
        }
        Stmt::Repeat { times, body } => {
            if times.constant().is_some_and(|v| v.as_int() <= 0) {
                return None;
            }
            let body = lower_block(&body.stmts);
            Step::new(move |world, ctx, b| {
                let n = eval(&times, world, b).as_int().clamp(0, MAX_REPEAT);
                (0..n).fold(world.clone(), |acc, _| body.run(&acc, ctx, b))
            })
        }
        Stmt::Parallel(block) => {
            if block.stmts.is_empty() {
                return None;
            }
            lower_block(&block.stmts)
        }
        Stmt::ForEach { selector, body } => {
            let body = lower_block(&body.stmts);
            let selector = selector.node;
            Step::new(move |world, ctx, b| {
                // The selection is fixed against the world at loop entry.
                select(&selector, world, b)
                    .into_iter()
                    .fold(world.clone(), |acc, id| body.run(&acc, ctx, &b.with_it(id)))
            })
        }
    };
    Some(step)
}

fn branch(
    hit: bool,
    then: &Step,
    otherwise: Option<&Step>,
    world: &WorldState,
    ctx: &mut EffectContext<'_>,
    b: &Bindings,
) -> WorldState {
    match (hit, otherwise) {
        (true, _) => then.run(world, ctx, b),
        (false, Some(step)) => step.run(world, ctx, b),
        (false, None) => world.clone(),
    }
}

enum Place {
    Unit(UnitId),
    Tile(Coord),
    Global,
}

fn place(scope: &Scope, world: &WorldState, b: &Bindings) -> Option<Place> {
    match scope {
        Scope::Unit(reference) => b.unit(reference).map(Place::Unit),
        Scope::Tile(x, y) => Some(Place::Tile(coord(world, b, x, y))),
        Scope::TileAt(reference) => b.position(world, reference).map(Place::Tile),
        Scope::Global => Some(Place::Global),
    }
}

fn coord(world: &WorldState, b: &Bindings, x: &Expr, y: &Expr) -> Coord {
    let axis = |e: &Expr| {
        let n = eval(e, world, b).as_int();
        i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
    };
    Coord::new(axis(x), axis(y))
}

// ============================================================================
// Randomness
// ============================================================================

/// Rolls `p` percent on the global stream.
///
/// Degenerate chances (≤ 0 or ≥ 100) decide without drawing; otherwise one
/// d100 roll is consumed and succeeds when `roll <= p`.
pub(crate) fn roll_chance(world: &WorldState, p: f64) -> (WorldState, bool) {
    if p <= 0.0 {
        return (world.clone(), false);
    }
    if p >= 100.0 {
        return (world.clone(), true);
    }
    let global = world.global();
    let seed = compute_seed(
        global.seed,
        global.turn,
        0,
        global.rolls,
        RollContext::Chance,
    );
    let roll = PcgRng::roll_d100(seed);
    let next = world.update_global(|g| {
        let rolls = g.rolls.saturating_add(1);
        g.with_rolls(rolls)
    });
    (next, f64::from(roll) <= p)
}

// ============================================================================
// Expressions and conditions
// ============================================================================

pub(crate) fn eval(expr: &Expr, world: &WorldState, b: &Bindings) -> Value {
    match expr {
        Expr::Lit(value) => value.clone(),
        Expr::UnitVar(reference, name) => b
            .unit(reference)
            .and_then(|id| world.unit(id.as_str()))
            .and_then(|u| u.get(name))
            .cloned()
            .unwrap_or_default(),
        Expr::GlobalVar(name) => world.global().get(name).cloned().unwrap_or_default(),
        Expr::Turn => Value::Int(i64::try_from(world.turn()).unwrap_or(i64::MAX)),
        Expr::Neg(inner) => match eval(inner, world, b) {
            Value::Float(f) => Value::Float(-f),
            other => Value::Int(other.as_int().saturating_neg()),
        },
        Expr::Bin(op, lhs, rhs) => arith(*op, &eval(lhs, world, b), &eval(rhs, world, b)),
    }
}

/// Integer arithmetic unless either side is a float. Division by zero is
/// zero; inexact integer division yields a float.
fn arith(op: BinOp, a: &Value, b: &Value) -> Value {
    let float = matches!(a, Value::Float(_)) || matches!(b, Value::Float(_));
    match op {
        BinOp::Add => a.add(b),
        BinOp::Sub if float => Value::Float(a.as_float() - b.as_float()),
        BinOp::Sub => Value::Int(a.as_int().saturating_sub(b.as_int())),
        BinOp::Mul if float => Value::Float(a.as_float() * b.as_float()),
        BinOp::Mul => Value::Int(a.as_int().saturating_mul(b.as_int())),
        BinOp::Div => {
            let divisor = b.as_float();
            if divisor == 0.0 {
                return Value::Int(0);
            }
            if !float {
                let (x, y) = (a.as_int(), b.as_int());
                if let (Some(0), Some(q)) = (x.checked_rem(y), x.checked_div(y)) {
                    return Value::Int(q);
                }
            }
            Value::Float(a.as_float() / divisor)
        }
    }
}

fn compare(op: CmpOp, a: &Value, b: &Value) -> bool {
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Coord(x), Value::Coord(y)) => {
            return match op {
                CmpOp::Eq => x == y,
                CmpOp::Ne => x != y,
                _ => false,
            };
        }
        _ => a.as_float().partial_cmp(&b.as_float()),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::Ge => ordering.is_ge(),
        CmpOp::Eq => ordering.is_eq(),
        CmpOp::Ne => ordering.is_ne(),
    }
}

/// Evaluates a condition. `chance` may consume a roll, so the (possibly
/// advanced) world is returned with the result.
fn test(cond: &Cond, world: &WorldState, b: &Bindings) -> (WorldState, bool) {
    match cond {
        Cond::Cmp(op, lhs, rhs) => {
            let hit = compare(*op, &eval(lhs, world, b), &eval(rhs, world, b));
            (world.clone(), hit)
        }
        Cond::Truthy(expr) => (world.clone(), eval(expr, world, b).as_bool()),
        Cond::HasTag(reference, tag) => {
            let hit = b
                .unit(reference)
                .and_then(|id| world.unit(id.as_str()).map(|u| u.has_tag(tag)))
                .unwrap_or(false);
            (world.clone(), hit)
        }
        Cond::GlobalHasTag(tag) => (world.clone(), world.global().has_tag(tag)),
        Cond::Chance(percent) => {
            let p = eval(&percent.node, world, b).as_float();
            roll_chance(world, p)
        }
        Cond::Not(inner) => {
            let (world, hit) = test(inner, world, b);
            (world, !hit)
        }
        Cond::And(lhs, rhs) => {
            let (world, hit) = test(lhs, world, b);
            if !hit {
                return (world, false);
            }
            test(rhs, &world, b)
        }
        Cond::Or(lhs, rhs) => {
            let (world, hit) = test(lhs, world, b);
            if hit {
                return (world, true);
            }
            test(rhs, &world, b)
        }
    }
}

// ============================================================================
// Selectors
// ============================================================================

/// Units matched by `selector`, in id order unless an ordering is given.
///
/// Dead and untargetable units are never selected. `enemies` are units on a
/// different team than the caster; `allies` share its team, caster excluded.
pub(crate) fn select(selector: &Selector, world: &WorldState, b: &Bindings) -> Vec<UnitId> {
    let caster = world.unit(b.caster.as_str());
    let team = caster.map(|c| c.team()).unwrap_or_default();
    let origin = caster.map(|c| c.position());
    let anchor = match &selector.anchor {
        Some(reference) => b.position(world, reference),
        None => origin,
    };

    let range = selector
        .range
        .as_ref()
        .map(|r| eval(&r.node, world, b).as_int());
    let shape = match &selector.shape {
        Some(spec) => match resolve_shape(&spec.node, world, b, origin) {
            Some(shape) => Some(shape),
            None => return Vec::new(),
        },
        None => None,
    };

    let mut picked: Vec<(UnitId, Coord)> = world
        .units()
        .filter(|u| u.is_alive() && !u.is_untargetable())
        .filter(|u| match selector.pool {
            Pool::Units => true,
            Pool::Enemies => u.team() != team,
            Pool::Allies => u.team() == team && u.id != b.caster,
        })
        .filter(|u| selector.with_tags.iter().all(|t| u.has_tag(t)))
        .filter(|u| match (range, anchor) {
            (Some(r), Some(at)) => b.metric.within(at, u.position(), r),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .filter(|u| match (&shape, origin) {
            (Some(shape), Some(from)) => shape.contains(from, u.position()),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .map(|u| (u.id.clone(), u.position()))
        .collect();

    if let (Some(order), Some(at)) = (selector.order, anchor) {
        let distance = |p: Coord| b.metric.distance(at, p);
        picked.sort_by(|(_, p), (_, q)| {
            let ord = distance(*p)
                .partial_cmp(&distance(*q))
                .unwrap_or(Ordering::Equal);
            match order {
                Order::Nearest => ord,
                Order::Farthest => ord.reverse(),
            }
        });
    }

    if let Some(limit) = &selector.limit {
        let n = eval(&limit.node, world, b).as_int().max(0);
        picked.truncate(usize::try_from(n).unwrap_or(usize::MAX));
    }
    picked.into_iter().map(|(id, _)| id).collect()
}

/// A shape with its direction resolved; `None` when no direction can be
/// derived (no explicit dir and the target sits on the caster).
fn resolve_shape(
    spec: &ShapeSpec,
    world: &WorldState,
    b: &Bindings,
    origin: Option<Coord>,
) -> Option<Shape> {
    let facing = |dir: &Option<battle_core::Direction>| match dir {
        Some(dir) => Some(*dir),
        None => bearing(origin?, b.position(world, &Ref::Target)?),
    };
    match spec {
        ShapeSpec::Line { length, dir, width } => {
            let length = eval(length, world, b).as_int();
            let width = width
                .as_ref()
                .map_or(1, |w| eval(w, world, b).as_int())
                .max(1);
            Some(Shape::line(facing(dir)?, length, (width - 1) / 2))
        }
        ShapeSpec::Cone { radius, angle, dir } => {
            let radius = eval(radius, world, b).as_int();
            let angle = angle
                .as_ref()
                .map_or(DEFAULT_CONE_ANGLE, |a| eval(a, world, b).as_float());
            Some(Shape::cone(facing(dir)?, radius, angle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parser::parse_script;
    use battle_core::{BattleConfig, UnitState};

    fn world() -> WorldState {
        WorldState::with_seed(8, 8, 42)
            .unwrap()
            .with_unit(
                UnitState::new("hero", Coord::new(0, 0), 30)
                    .with_var(keys::TEAM, "blue")
                    .with_var(keys::ATK, 10)
                    .with_var(keys::MP, 5),
            )
            .with_unit(
                UnitState::new("ally", Coord::new(0, 1), 20).with_var(keys::TEAM, "blue"),
            )
            .with_unit(
                UnitState::new("orc", Coord::new(2, 0), 40)
                    .with_var(keys::TEAM, "red")
                    .with_var(keys::DEF, 2),
            )
            .with_unit(
                UnitState::new("goblin", Coord::new(5, 0), 12)
                    .with_var(keys::TEAM, "red")
                    .with_tag("small"),
            )
    }

    fn run(src: &str, target: CastTarget) -> WorldState {
        let script = parse_script(src).unwrap();
        let step = lower_block(&script.body);
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let b = Bindings::new("hero".into(), target, DistanceMetric::Manhattan);
        step.run(&world(), &mut ctx, &b)
    }

    fn hp(world: &WorldState, id: &str) -> i64 {
        world.unit(id).unwrap().hp()
    }

    #[test]
    fn deal_uses_physical_pipeline() {
        let out = run("deal 7 damage to target", CastTarget::Unit("orc".into()));
        assert_eq!(hp(&out, "orc"), 40 - 15);
    }

    #[test]
    fn expressions_read_unit_and_global_vars() {
        let out = run(
            "set global var \"x\" = 3\nheal global.x * 2 to self\nadd self var \"Atk\" by 7 / 2",
            CastTarget::None,
        );
        assert_eq!(out.global().int("x"), 3);
        assert_eq!(out.unit("hero").unwrap().int(keys::ATK), 14);
        assert_eq!(out.unit("hero").unwrap().float(keys::ATK), 13.5);
    }

    #[test]
    fn constant_chance_folds_to_else() {
        let out = run(
            "chance 0% then { heal 5 to target } else { deal true 1 damage to target }",
            CastTarget::Unit("orc".into()),
        );
        assert_eq!(hp(&out, "orc"), 39);
        assert_eq!(out.global().rolls, 0);
    }

    #[test]
    fn runtime_chance_consumes_one_roll() {
        let once = run("chance 50% then heal 1 to self", CastTarget::None);
        assert_eq!(once.global().rolls, 1);
        let again = run("chance 50% then heal 1 to self", CastTarget::None);
        assert_eq!(once, again);
    }

    #[test]
    fn for_each_enemies_nearest_limit() {
        let out = run(
            "for each enemies nearest limit 1 do { deal true 5 damage to it }",
            CastTarget::None,
        );
        assert_eq!(hp(&out, "orc"), 35);
        assert_eq!(hp(&out, "goblin"), 12);

        let out = run(
            "for each enemies farthest do { deal true 1 damage to it }\n\
             for each allies do { heal 1 to it }\n\
             for each units with tag \"small\" do { add it tag \"marked\" }",
            CastTarget::None,
        );
        assert_eq!(hp(&out, "orc"), 39);
        assert_eq!(hp(&out, "goblin"), 11);
        assert!(out.unit("goblin").unwrap().has_tag("marked"));
        assert!(!out.unit("orc").unwrap().has_tag("marked"));
    }

    #[test]
    fn range_selector_uses_anchor() {
        let out = run(
            "for each units in range 1 of target do { add it tag \"near\" }",
            CastTarget::Point(Coord::new(5, 1)),
        );
        assert!(out.unit("goblin").unwrap().has_tag("near"));
        assert!(!out.unit("orc").unwrap().has_tag("near"));
    }

    #[test]
    fn line_shape_defaults_to_target_bearing() {
        let out = run(
            "for each enemies in line length 5 do { deal true 2 damage to it }",
            CastTarget::Unit("orc".into()),
        );
        assert_eq!(hp(&out, "orc"), 38);
        assert_eq!(hp(&out, "goblin"), 10);

        let out = run(
            "for each units in line length 5 dir north do { add it tag \"hit\" }",
            CastTarget::None,
        );
        assert!(out.unit("ally").unwrap().has_tag("hit"));
        assert!(!out.unit("orc").unwrap().has_tag("hit"));
    }

    #[test]
    fn repeat_and_consume_mp() {
        let out = run(
            "repeat 3 times deal true 2 damage to target\nconsume mp = 9",
            CastTarget::Unit("goblin".into()),
        );
        assert_eq!(hp(&out, "goblin"), 6);
        assert_eq!(out.unit("hero").unwrap().int(keys::MP), 0);
    }

    #[test]
    fn tile_and_move_statements() {
        let out = run(
            "set tile (1, 1) var \"hazard\" = \"fire\"\nadd tile at self tag \"start\"\n\
             move self to (3, 3)\nadd tile (1, 1) var \"heat\" by 2",
            CastTarget::None,
        );
        assert_eq!(out.tile(Coord::new(1, 1)).unwrap().text("hazard"), "fire");
        assert_eq!(out.tile(Coord::new(1, 1)).unwrap().int("heat"), 2);
        assert!(out.tile(Coord::ORIGIN).unwrap().has_tag("start"));
        assert_eq!(out.unit("hero").unwrap().position(), Coord::new(3, 3));
    }

    #[test]
    fn conditions_short_circuit() {
        let out = run(
            "if target.Team == \"red\" and not target has tag \"small\" then heal 1 to self \
             else deal true 1 damage to self",
            CastTarget::Unit("orc".into()),
        );
        assert_eq!(hp(&out, "hero"), 30);
        let out = run(
            "if target.Team == \"red\" and not target has tag \"small\" then heal 1 to self \
             else deal true 1 damage to self",
            CastTarget::Unit("goblin".into()),
        );
        assert_eq!(hp(&out, "hero"), 29);
    }
}
