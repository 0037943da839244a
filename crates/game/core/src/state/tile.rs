use std::sync::Arc;

use crate::state::vars::impl_var_scope;
use crate::state::{Coord, VarBag};

/// Per-tile variables and tags (terrain flags, hazards, zones).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileState {
    bag: VarBag,
}

impl_var_scope!(TileState);

impl TileState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fixed-size row-major tile grid.
///
/// Tiles sit behind an `Arc` so copying a world only clones the grid when a
/// tile actually changes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Arc<Vec<TileState>>,
}

impl TileGrid {
    pub(crate) fn filled(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            tiles: Arc::new(vec![TileState::default(); len]),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.x >= 0 && at.y >= 0 && (at.x as u32) < self.width && (at.y as u32) < self.height
    }

    fn index(&self, at: Coord) -> Option<usize> {
        self.contains(at)
            .then(|| at.y as usize * self.width as usize + at.x as usize)
    }

    pub fn get(&self, at: Coord) -> Option<&TileState> {
        self.index(at).map(|i| &self.tiles[i])
    }

    /// Returns a grid with the tile at `at` replaced; out-of-bounds is a no-op.
    #[must_use]
    pub fn with_tile(&self, at: Coord, tile: TileState) -> Self {
        let mut next = self.clone();
        if let Some(i) = self.index(at) {
            Arc::make_mut(&mut next.tiles)[i] = tile;
        }
        next
    }

    /// Iterates tiles in row-major order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &TileState)> {
        let width = self.width.max(1) as usize;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            let coord = Coord::new((i % width) as i32, (i / width) as i32);
            (coord, tile)
        })
    }
}
