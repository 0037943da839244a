//! Canonical SHA-256 commitment over a [`WorldState`].
//!
//! Two structurally equal worlds always hash to the same digest; hosts use it
//! to compare replays without diffing whole snapshots.

use sha2::{Digest, Sha256};

use crate::state::{Coord, GlobalState, Value, VarBag, WorldState};

impl WorldState {
    /// Computes a 32-byte digest over global, tile and unit data in key order.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        hash_global(&mut hasher, self.global());

        hasher.update(self.width().to_le_bytes());
        hasher.update(self.height().to_le_bytes());
        for (coord, tile) in self.tiles().iter() {
            if tile.bag() == &VarBag::default() {
                continue;
            }
            hash_coord(&mut hasher, coord);
            hash_bag(&mut hasher, tile.bag());
        }

        hasher.update((self.unit_count() as u64).to_le_bytes());
        for unit in self.units() {
            hash_str(&mut hasher, unit.id.as_str());
            hash_bag(&mut hasher, unit.bag());
        }

        hasher.finalize().into()
    }
}

fn hash_global(hasher: &mut Sha256, global: &GlobalState) {
    hasher.update(global.turn.to_le_bytes());
    hasher.update(global.seed.to_le_bytes());
    hasher.update(global.rolls.to_le_bytes());
    hash_bag(hasher, global.bag());
}

fn hash_bag(hasher: &mut Sha256, bag: &VarBag) {
    for (key, value) in bag.vars() {
        hash_str(hasher, key);
        hash_value(hasher, value);
    }
    // Separator so a tag can never be confused with a var key.
    hasher.update([0xff]);
    for tag in bag.tags() {
        hash_str(hasher, tag);
    }
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Int(v) => {
            hasher.update([0]);
            hasher.update(v.to_le_bytes());
        }
        Value::Float(v) => {
            hasher.update([1]);
            hasher.update(v.to_bits().to_le_bytes());
        }
        Value::Bool(v) => hasher.update([2, u8::from(*v)]),
        Value::Str(s) => {
            hasher.update([3]);
            hash_str(hasher, s);
        }
        Value::Coord(c) => {
            hasher.update([4]);
            hash_coord(hasher, *c);
        }
    }
}

fn hash_coord(hasher: &mut Sha256, coord: Coord) {
    hasher.update(coord.x.to_le_bytes());
    hasher.update(coord.y.to_le_bytes());
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use crate::state::{Coord, TileState, UnitState, WorldState};

    #[test]
    fn equal_worlds_share_a_digest() {
        let build = || {
            WorldState::new(3, 3)
                .unwrap()
                .with_unit(UnitState::new("a", Coord::new(0, 1), 12))
                .with_tile(Coord::new(2, 2), TileState::new().with_tag("lava"))
        };
        assert_eq!(hex::encode(build().digest()), hex::encode(build().digest()));
    }

    #[test]
    fn any_change_moves_the_digest() {
        let base = WorldState::new(3, 3)
            .unwrap()
            .with_unit(UnitState::new("a", Coord::new(0, 1), 12));
        let hurt = base.update_unit("a", |u| u.with_var("Hp", 11));
        let tagged = base.update_tile(Coord::new(1, 1), |t| t.with_tag("lava"));

        assert_ne!(base.digest(), hurt.digest());
        assert_ne!(base.digest(), tagged.digest());
    }
}
