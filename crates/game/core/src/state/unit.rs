use crate::state::vars::impl_var_scope;
use crate::state::{Coord, UnitId, VarBag, keys};

/// A unit on the battlefield: identity plus a var/tag bag.
///
/// Position lives in the `Pos` variable so movement has an ordinary
/// unit-variable footprint like every other write.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitState {
    pub id: UnitId,
    bag: VarBag,
}

impl_var_scope!(UnitState);

impl UnitState {
    /// Creates a unit at `position` with `Hp = MaxHp = hp`.
    pub fn new(id: impl Into<UnitId>, position: Coord, hp: i64) -> Self {
        Self {
            id: id.into(),
            bag: VarBag::new()
                .with_var(keys::POS, position)
                .with_var(keys::HP, hp)
                .with_var(keys::MAX_HP, hp),
        }
    }

    /// Creates a unit from a pre-populated bag, filling in `Hp` if missing.
    pub fn from_bag(id: impl Into<UnitId>, bag: VarBag) -> Self {
        let bag = if bag.contains(keys::HP) {
            bag
        } else {
            let hp = bag.int(keys::MAX_HP);
            bag.with_var(keys::HP, hp)
        };
        Self { id: id.into(), bag }
    }

    pub fn position(&self) -> Coord {
        self.bag.coord(keys::POS).unwrap_or_default()
    }

    #[must_use]
    pub fn with_position(self, position: Coord) -> Self {
        self.with_var(keys::POS, position)
    }

    pub fn hp(&self) -> i64 {
        self.int(keys::HP)
    }

    pub fn max_hp(&self) -> i64 {
        self.int(keys::MAX_HP)
    }

    pub fn is_alive(&self) -> bool {
        self.hp() > 0
    }

    pub fn team(&self) -> String {
        self.text(keys::TEAM)
    }

    /// Untargetable units are skipped by selectors and ignore direct attacks.
    pub fn is_untargetable(&self) -> bool {
        self.int(keys::UNTARGETABLE_TURNS) > 0
    }

    /// Stunned or otherwise prevented from acting this turn.
    pub fn can_act(&self) -> bool {
        self.int(keys::STUNNED_TURNS) <= 0 && self.int(keys::CANNOT_ACT_TURNS) <= 0
    }

    pub fn is_silenced(&self) -> bool {
        self.int(keys::SILENCED_TURNS) > 0
    }

    pub fn is_rooted(&self) -> bool {
        self.int(keys::ROOTED_TURNS) > 0
    }
}
