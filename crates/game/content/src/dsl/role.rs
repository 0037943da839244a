use battle_core::state::keys;
use battle_core::{Coord, UnitId, UnitState, VarBag};

use crate::dsl::ast::RoleAst;
use crate::dsl::skill::Skill;

/// A compiled role: identity, initial unit data and its skills in
/// declaration order.
#[derive(Clone, Debug)]
pub struct RoleDefinition {
    pub name: String,
    pub id: String,
    pub description: String,
    /// Initial vars and tags given to every unit spawned from this role.
    pub initial: VarBag,
    skills: Vec<Skill>,
}

impl RoleDefinition {
    pub(crate) fn compile(ast: RoleAst) -> Self {
        let initial = ast
            .vars
            .into_iter()
            .fold(VarBag::new(), |bag, (key, value)| bag.with_var(key, value));
        let initial = ast.tags.into_iter().fold(initial, |bag, tag| bag.with_tag(tag));
        let skills = ast
            .skills
            .iter()
            .map(|s| Skill::compile(s.name.node.as_str(), &s.script))
            .collect();
        Self {
            name: ast.name,
            id: ast.id,
            description: ast.description,
            initial,
            skills,
        }
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name() == name)
    }

    /// Instantiates a unit of this role at `position`.
    ///
    /// `Role` records the role id; `Hp` and `Mp` start at `MaxHp` and
    /// `MaxMp` unless the role sets them explicitly.
    pub fn spawn(&self, id: impl Into<UnitId>, position: Coord) -> UnitState {
        let mut bag = self
            .initial
            .clone()
            .with_var(keys::ROLE, self.id.as_str())
            .with_var(keys::POS, position);
        if !bag.contains(keys::MP) && bag.contains(keys::MAX_MP) {
            let mp = bag.int(keys::MAX_MP);
            bag = bag.with_var(keys::MP, mp);
        }
        UnitState::from_bag(id, bag)
    }
}
