//! Role definitions, skill scripts and content loaders.
//!
//! This crate compiles the two text formats battles are authored in:
//! - role files (`role "..." id "..." { vars ... tags ... skills ... }`)
//! - skill scripts (metadata plus imperative statements)
//!
//! Compiled skills lower to [`battle_core::Effect`]s built from the core
//! action vocabulary, so nothing here mutates a world directly. With the
//! `loaders` feature, TOML battle configuration and RON scenarios can be
//! read from disk as well.

pub mod dsl;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use dsl::{
    CastTarget, Diagnostic, DiagnosticSeverity, ParseError, ParseErrorKind, ParseResult, Pos,
    RoleDefinition, Skill, SkillMeta,
};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, Scenario, ScenarioLoader};

/// Compiles a role definition. Any parse error aborts the whole role.
pub fn load_role(text: &str) -> ParseResult<RoleDefinition> {
    let ast = dsl::parser::parse_role(text)?;
    let role = RoleDefinition::compile(ast);
    tracing::debug!(
        role = %role.id,
        skills = role.skills().len(),
        warnings = role.skills().iter().map(|s| s.warnings().len()).sum::<usize>(),
        "role compiled"
    );
    Ok(role)
}

/// Compiles a standalone skill script.
pub fn compile_skill(name: &str, text: &str) -> ParseResult<Skill> {
    let script = dsl::parser::parse_script(text)?;
    let skill = Skill::compile(name, &script);
    tracing::debug!(skill = name, warnings = skill.warnings().len(), "skill compiled");
    Ok(skill)
}

/// Static analysis of a script. Never fails: unparsable text yields a
/// single error-severity diagnostic.
pub fn analyze_script(text: &str) -> Vec<Diagnostic> {
    match dsl::parser::parse_script(text) {
        Ok(script) => dsl::analysis::analyze(&script),
        Err(err) => vec![Diagnostic::from(&err)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::state::keys;
    use battle_core::{BattleConfig, Coord, EffectContext, ErrorSeverity, GameError, WorldState};

    const ROLE: &str = r#"
        # front-line role
        role "Warden" id "warden" {
            description "Holds the line"
            vars { "MaxHp" = 50; "MaxMp" = 6; "Atk" = 9; "Team" = "blue" }
            tags { "melee" }
            skills {
                skill "Bash" {
                    range 1
                    cooldown 1
                    targeting enemies
                    deal 4 damage to target
                }
                skill "Brace" {
                    targeting self
                    consume mp = 2
                    set self var "damage_reduction" = 0.5
                    set self var "damage_reduction_turns" = 2
                }
            }
        }
    "#;

    #[test]
    fn role_compiles_and_spawns() {
        let role = load_role(ROLE).unwrap();
        assert_eq!(role.name, "Warden");
        assert_eq!(role.description, "Holds the line");
        assert_eq!(role.skills().len(), 2);
        assert_eq!(role.skill("Brace").unwrap().meta().mp_cost, 2);

        let unit = role.spawn("w1", Coord::new(2, 3));
        assert_eq!(unit.hp(), 50);
        assert_eq!(unit.int(keys::MP), 6);
        assert_eq!(unit.text(keys::ROLE), "warden");
        assert_eq!(unit.position(), Coord::new(2, 3));
        assert!(unit.has_tag("melee"));
    }

    #[test]
    fn role_skill_runs_against_world() {
        let role = load_role(ROLE).unwrap();
        let world = WorldState::new(5, 5)
            .unwrap()
            .with_unit(role.spawn("w1", Coord::new(0, 0)))
            .with_unit(
                role.spawn("w2", Coord::new(1, 0))
                    .with_var(keys::TEAM, "red")
                    .with_var(keys::DEF, 3),
            );
        let bash = role.skill("Bash").unwrap();
        assert!(bash.validate_cast(&world, "w1", &"w2".into()).is_ok());

        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let out = bash.effect("w1", "w2".into()).run(&world, &mut ctx);
        assert_eq!(out.unit("w2").unwrap().hp(), 50 - (4 + 9 - 3));
    }

    #[test]
    fn parse_errors_carry_positions() {
        let err = compile_skill("Broken", "heal 2 to self\n  deal 3 damage too target").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!((err.line, err.column), (2, 17));
        assert_eq!(err.severity(), ErrorSeverity::Validation);
        assert_eq!(err.error_code(), "PARSE_UNEXPECTED_TOKEN");
        assert!(err.to_string().starts_with("line 2, col 17:"));

        let err = load_role(r#"role "A" id "a" { colour "red" }"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownKeyword);
    }

    #[test]
    fn analyze_script_never_fails() {
        let diags = analyze_script("chance 0% then { heal 5 to target } else { heal 1 to target }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_warning());
        assert!(diags[0].message.contains("then branch is unreachable"));

        let diags = analyze_script("deal 5 damage to");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Error);

        let deep = format!("heal {}1 to self", "-".repeat(200_000));
        let diags = analyze_script(&deep);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Error);
        assert!(diags[0].message.contains("nesting"));

        let err = compile_skill("Spiral", &deep).unwrap_err();
        assert_eq!(err.error_code(), "PARSE_TOO_DEEP");
    }
}
