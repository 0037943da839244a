//! Static checks over a parsed script.
//!
//! Analysis never fails and never changes what a script does; it only
//! reports constructs that are well-formed but almost certainly mistakes.

use battle_core::TargetingMode;

use crate::dsl::ast::{Block, Cond, Meta, Script, Selector, ShapeSpec, Spanned, Stmt};
use crate::dsl::diagnostics::Diagnostic;
use crate::dsl::error::Pos;
use crate::dsl::MAX_REPEAT;

/// Collects warnings for `script` in source order.
pub fn analyze(script: &Script) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    check_meta(&script.meta, &mut out);
    for stmt in &script.body {
        check_stmt(stmt, &mut out);
    }
    out.sort_by_key(Diagnostic::pos);
    out
}

fn check_meta(meta: &[Spanned<Meta>], out: &mut Vec<Diagnostic>) {
    let mut range = None;
    let mut min_range = None;
    let mut self_targeted = false;
    for item in meta {
        match item.node {
            Meta::Range(n) => range = Some((n, item.pos)),
            Meta::MinRange(n) => min_range = Some((n, item.pos)),
            Meta::Targeting(mode) => self_targeted = mode == TargetingMode::SelfOnly,
            _ => {}
        }
    }

    if let (Some((max, _)), Some((min, at))) = (range, min_range) {
        if min > max {
            out.push(Diagnostic::warning(
                at,
                format!("min_range {min} exceeds range {max}; no target is reachable"),
            ));
        }
    }
    if let Some((n, at)) = range {
        if self_targeted && n != 0 {
            out.push(Diagnostic::warning(
                at,
                format!("range {n} is ignored by a self-targeted skill"),
            ));
        }
    }
}

fn check_block(block: &Block, out: &mut Vec<Diagnostic>) {
    if block.braced && block.stmts.is_empty() {
        out.push(Diagnostic::warning(block.pos, "empty block"));
    }
    for stmt in &block.stmts {
        check_stmt(stmt, out);
    }
}

fn check_stmt(stmt: &Spanned<Stmt>, out: &mut Vec<Diagnostic>) {
    let at = stmt.pos;
    match &stmt.node {
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            check_cond(cond, out);
            check_block(then, out);
            if let Some(block) = otherwise {
                check_block(block, out);
            }
        }
        Stmt::Chance {
            percent,
            then,
            otherwise,
        } => {
            if let Some(p) = percent.constant().map(|v| v.as_float()) {
                if p <= 0.0 {
                    out.push(Diagnostic::warning(
                        at,
                        format!("chance {p}%: then branch is unreachable"),
                    ));
                } else if p >= 100.0 && otherwise.is_some() {
                    out.push(Diagnostic::warning(
                        at,
                        format!("chance {p}%: else branch is unreachable"),
                    ));
                } else if p >= 100.0 {
                    out.push(Diagnostic::warning(
                        at,
                        format!("chance {p}% always succeeds"),
                    ));
                }
            }
            check_block(then, out);
            if let Some(block) = otherwise {
                check_block(block, out);
            }
        }
        Stmt::Repeat { times, body } => {
            if let Some(n) = times.constant().map(|v| v.as_int()) {
                if n <= 0 {
                    out.push(Diagnostic::warning(
                        at,
                        format!("repeat {n} times is a no-op"),
                    ));
                } else if n > MAX_REPEAT {
                    out.push(Diagnostic::warning(
                        at,
                        format!("repeat {n} times runs only {MAX_REPEAT} times"),
                    ));
                }
            }
            check_block(body, out);
        }
        Stmt::Parallel(block) => {
            if block.stmts.is_empty() {
                out.push(Diagnostic::warning(at, "empty parallel block"));
            }
            for stmt in &block.stmts {
                check_stmt(stmt, out);
            }
        }
        Stmt::ForEach { selector, body } => {
            check_selector(selector, out);
            check_block(body, out);
        }
        _ => {}
    }
}

fn check_cond(cond: &Cond, out: &mut Vec<Diagnostic>) {
    match cond {
        Cond::Chance(percent) => {
            if let Some(p) = percent.node.constant().map(|v| v.as_float()) {
                if p <= 0.0 {
                    out.push(Diagnostic::warning(
                        percent.pos,
                        format!("chance {p}% is always false"),
                    ));
                } else if p >= 100.0 {
                    out.push(Diagnostic::warning(
                        percent.pos,
                        format!("chance {p}% is always true"),
                    ));
                }
            }
        }
        Cond::Not(inner) => check_cond(inner, out),
        Cond::And(lhs, rhs) | Cond::Or(lhs, rhs) => {
            check_cond(lhs, out);
            check_cond(rhs, out);
        }
        _ => {}
    }
}

fn check_selector(selector: &Spanned<Selector>, out: &mut Vec<Diagnostic>) {
    let sel = &selector.node;
    if let Some(range) = &sel.range {
        if let Some(n) = range.node.constant().map(|v| v.as_int()) {
            if n < 0 {
                out.push(Diagnostic::warning(
                    range.pos,
                    format!("negative selector range {n} matches nothing"),
                ));
            }
        }
    }
    if let Some(limit) = &sel.limit {
        if let Some(n) = limit.node.constant().map(|v| v.as_int()) {
            if n < 0 {
                out.push(Diagnostic::warning(
                    limit.pos,
                    format!("negative selector limit {n} matches nothing"),
                ));
            }
        }
    }
    if let Some(shape) = &sel.shape {
        check_shape(&shape.node, shape.pos, out);
    }
}

fn check_shape(shape: &ShapeSpec, at: Pos, out: &mut Vec<Diagnostic>) {
    match shape {
        ShapeSpec::Line { dir: None, .. } => out.push(Diagnostic::warning(
            at,
            "line shape has no dir; defaults to the caster-to-target direction",
        )),
        ShapeSpec::Cone { angle, dir, .. } => {
            if dir.is_none() {
                out.push(Diagnostic::warning(
                    at,
                    "cone shape has no dir; defaults to the caster-to-target direction",
                ));
            }
            if angle.is_none() {
                out.push(Diagnostic::warning(
                    at,
                    "cone shape has no angle; defaults to 90 degrees",
                ));
            }
        }
        ShapeSpec::Line { .. } => {}
    }
}
