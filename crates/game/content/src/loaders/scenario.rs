//! Scenario loader.
//!
//! A scenario names the grid, the RNG seed, the role files to compile and
//! where each unit starts. Role paths are resolved relative to the
//! scenario file.

use std::collections::BTreeMap;
use std::path::Path;

use battle_core::{Coord, UnitId, Value, WorldError, WorldState};
use serde::Deserialize;

use crate::dsl::RoleDefinition;
use crate::load_role;
use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Deserialize)]
struct ScenarioRon {
    width: u32,
    height: u32,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    units: Vec<PlacementRon>,
    #[serde(default)]
    global_vars: BTreeMap<String, Value>,
    #[serde(default)]
    global_tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlacementRon {
    id: String,
    role: String,
    at: (i32, i32),
    /// Overrides applied on top of the role's initial vars.
    #[serde(default)]
    vars: BTreeMap<String, Value>,
    #[serde(default)]
    tags: Vec<String>,
}

/// A ready-to-run battle: the initial world and the roles it uses.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub world: WorldState,
    pub roles: Vec<RoleDefinition>,
}

impl Scenario {
    pub fn role(&self, id: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.id == id)
    }
}

/// Loader for scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario file and every role file it lists.
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        let data = Self::parse(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut roles = Vec::with_capacity(data.roles.len());
        for file in &data.roles {
            let role_path = base.join(file);
            let text = read_file(&role_path)?;
            let role = load_role(&text)
                .map_err(|e| anyhow::anyhow!("{}: {}", role_path.display(), e))?;
            roles.push(role);
        }
        Self::build(data, roles)
    }

    /// Parse scenario text against already-compiled roles. The `roles`
    /// list inside the text is ignored.
    pub fn from_str(content: &str, roles: Vec<RoleDefinition>) -> LoadResult<Scenario> {
        Self::build(Self::parse(content)?, roles)
    }

    fn parse(content: &str) -> LoadResult<ScenarioRon> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))
    }

    fn build(data: ScenarioRon, roles: Vec<RoleDefinition>) -> LoadResult<Scenario> {
        let mut world = WorldState::with_seed(data.width, data.height, data.seed)?;
        world = world.update_global(|global| {
            let global = data
                .global_vars
                .into_iter()
                .fold(global, |g, (key, value)| g.with_var(key, value));
            data.global_tags
                .into_iter()
                .fold(global, |g, tag| g.with_tag(tag))
        });

        for placement in data.units {
            let at = Coord::new(placement.at.0, placement.at.1);
            let id = UnitId::new(placement.id);
            if !world.in_bounds(at) {
                return Err(WorldError::OutOfBounds {
                    id,
                    x: at.x,
                    y: at.y,
                }
                .into());
            }
            if world.contains_unit(id.as_str()) {
                return Err(WorldError::DuplicateUnit(id).into());
            }
            let role = roles
                .iter()
                .find(|r| r.id == placement.role)
                .ok_or_else(|| anyhow::anyhow!("Unit {} uses unknown role {}", id, placement.role))?;

            let unit = placement
                .vars
                .into_iter()
                .fold(role.spawn(id, at), |u, (key, value)| u.with_var(key, value));
            let unit = placement.tags.into_iter().fold(unit, |u, tag| u.with_tag(tag));
            world = world.with_unit(unit);
        }

        tracing::info!(
            width = world.width(),
            height = world.height(),
            units = world.unit_count(),
            "scenario loaded"
        );
        Ok(Scenario { world, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::state::keys;

    const KNIGHT: &str = r#"
        role "Knight" id "knight" {
            vars { "MaxHp" = 30; "Atk" = 8; "Team" = "blue" }
            tags { "melee" }
            skills { skill "Slash" { range 1; deal 2 damage to target } }
        }
    "#;

    #[test]
    fn loads_roles_relative_to_scenario() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("knight.role"), KNIGHT).unwrap();
        let path = dir.path().join("duel.ron");
        std::fs::write(
            &path,
            r#"(
                width: 6,
                height: 4,
                seed: 9,
                roles: ["knight.role"],
                units: [
                    (id: "k1", role: "knight", at: (1, 1)),
                    (id: "k2", role: "knight", at: (4, 1), vars: {"Team": Str("red")}, tags: ["elite"]),
                ],
                global_tags: ["night"],
            )"#,
        )
        .unwrap();

        let scenario = ScenarioLoader::load(&path).unwrap();
        let world = &scenario.world;
        assert_eq!(world.global().seed, 9);
        assert!(world.global().has_tag("night"));

        let k1 = world.unit("k1").unwrap();
        assert_eq!(k1.hp(), 30);
        assert_eq!(k1.text(keys::ROLE), "knight");
        assert_eq!(k1.team(), "blue");
        assert!(k1.has_tag("melee"));

        let k2 = world.unit("k2").unwrap();
        assert_eq!(k2.team(), "red");
        assert_eq!(k2.position(), Coord::new(4, 1));
        assert!(k2.has_tag("elite"));
        assert!(scenario.role("knight").unwrap().skill("Slash").is_some());
    }

    #[test]
    fn rejects_bad_placements() {
        let roles = vec![load_role(KNIGHT).unwrap()];
        let out_of_bounds = r#"(width: 2, height: 2, units: [(id: "a", role: "knight", at: (5, 0))])"#;
        let err = ScenarioLoader::from_str(out_of_bounds, roles.clone()).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));

        let duplicate = r#"(width: 2, height: 2, units: [
            (id: "a", role: "knight", at: (0, 0)),
            (id: "a", role: "knight", at: (1, 0)),
        ])"#;
        let err = ScenarioLoader::from_str(duplicate, roles.clone()).unwrap_err();
        assert!(err.to_string().contains("duplicate unit id a"));

        let unknown = r#"(width: 2, height: 2, units: [(id: "a", role: "mage", at: (0, 0))])"#;
        let err = ScenarioLoader::from_str(unknown, roles).unwrap_err();
        assert!(err.to_string().contains("unknown role mage"));
    }
}
