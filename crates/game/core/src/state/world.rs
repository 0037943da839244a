use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::WorldError;
use crate::state::{Coord, GlobalState, TileGrid, TileState, UnitId, UnitState, keys};

/// Immutable snapshot of the whole battle.
///
/// Every "change" returns a new value; a snapshot handed out is never edited
/// afterwards. Units sit behind `Arc` so a copy clones the map of pointers and
/// only the units that actually change.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldState {
    global: GlobalState,
    tiles: TileGrid,
    units: BTreeMap<UnitId, Arc<UnitState>>,
}

impl WorldState {
    /// Creates an empty world with a `width × height` grid.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        Self::with_seed(width, height, 0)
    }

    /// Creates an empty world with an explicit RNG seed.
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid { width, height });
        }
        Ok(Self {
            global: GlobalState::new(seed),
            tiles: TileGrid::filled(width, height),
            units: BTreeMap::new(),
        })
    }

    // ------------------------------------------------------------------
    // Global
    // ------------------------------------------------------------------

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn turn(&self) -> u64 {
        self.global.turn
    }

    #[must_use]
    pub fn with_global(&self, global: GlobalState) -> Self {
        let mut next = self.clone();
        next.global = global;
        next
    }

    /// Applies `f` to a copy of the global state.
    #[must_use]
    pub fn update_global(&self, f: impl FnOnce(GlobalState) -> GlobalState) -> Self {
        self.with_global(f(self.global.clone()))
    }

    // ------------------------------------------------------------------
    // Tiles
    // ------------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.tiles.width()
    }

    pub fn height(&self) -> u32 {
        self.tiles.height()
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn in_bounds(&self, at: Coord) -> bool {
        self.tiles.contains(at)
    }

    pub fn tile(&self, at: Coord) -> Option<&TileState> {
        self.tiles.get(at)
    }

    /// Returns a world with the tile at `at` replaced; out-of-bounds is a no-op.
    #[must_use]
    pub fn with_tile(&self, at: Coord, tile: TileState) -> Self {
        if !self.in_bounds(at) {
            return self.clone();
        }
        let mut next = self.clone();
        next.tiles = self.tiles.with_tile(at, tile);
        next
    }

    /// Applies `f` to a copy of the tile at `at`; out-of-bounds is a no-op.
    #[must_use]
    pub fn update_tile(&self, at: Coord, f: impl FnOnce(TileState) -> TileState) -> Self {
        match self.tile(at) {
            Some(tile) => self.with_tile(at, f(tile.clone())),
            None => self.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    pub fn unit(&self, id: &str) -> Option<&UnitState> {
        self.units.get(id).map(Arc::as_ref)
    }

    pub fn contains_unit(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Units in id order, including units at `Hp <= 0` awaiting cleanup.
    pub fn units(&self) -> impl Iterator<Item = &UnitState> {
        self.units.values().map(Arc::as_ref)
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = &UnitId> {
        self.units.keys()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// First unit (in id order) standing on `at`.
    pub fn unit_at(&self, at: Coord) -> Option<&UnitState> {
        self.units().find(|unit| unit.position() == at)
    }

    /// Inserts or replaces a unit, keyed by its id.
    ///
    /// A unit without `Hp` gets `Hp = 0` so every stored unit has one.
    #[must_use]
    pub fn with_unit(&self, unit: UnitState) -> Self {
        let unit = if unit.get(keys::HP).is_some() {
            unit
        } else {
            unit.with_var(keys::HP, 0)
        };
        let mut next = self.clone();
        next.units.insert(unit.id.clone(), Arc::new(unit));
        next
    }

    /// Applies `f` to a copy of the unit `id`; unknown ids are a no-op.
    #[must_use]
    pub fn update_unit(&self, id: &str, f: impl FnOnce(UnitState) -> UnitState) -> Self {
        match self.unit(id) {
            Some(unit) => self.with_unit(f(unit.clone())),
            None => self.clone(),
        }
    }

    /// Removes a unit. Only the maintenance pass should call this for deaths.
    #[must_use]
    pub fn without_unit(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.units.remove(id);
        next
    }
}
