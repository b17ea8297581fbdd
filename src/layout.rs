//! Tile layout model.
//!
//! [`GridLayout`] owns the ordered tile sequence and derives every tile's
//! *canonical* pixel position from its index:
//!
//! ```text
//! column = index % columns_per_row      x = column * (width  + gap)
//! row    = index / columns_per_row      y = row    * (height + gap)
//! ```
//!
//! The one exception is the *active* tile (the one being dragged), whose
//! position is free-form until the drag ends.  Every recompute skips it.
//!
//! The model is purely geometric.  Visual handles live in
//! [`RenderSync`](crate::render::RenderSync), keyed by [`TileId`].

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TILE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a tile, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

impl TileId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        TileId(NEXT_TILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile-{}", self.0)
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned box in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict AABB overlap.  Boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Whether `(x, y)` lies inside the box (right/bottom edges exclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Geometry shared by every tile.
///
/// Owned by the [`GridLayout`]; changed only through
/// [`GridLayout::reset_layout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub tile_size: Size,
    pub gap: f64,
    pub columns_per_row: usize,
    pub transition_duration_ms: u64,
}

impl LayoutConfig {
    /// Columns per row, never less than one.
    pub fn columns(&self) -> usize {
        self.columns_per_row.max(1)
    }

    /// Horizontal distance between neighbouring cell origins.
    pub fn pitch_x(&self) -> f64 {
        self.tile_size.width + self.gap
    }

    /// Vertical distance between neighbouring cell origins.
    pub fn pitch_y(&self) -> f64 {
        self.tile_size.height + self.gap
    }

    /// Overwrite the fields set in `update`.
    pub fn apply(&mut self, update: LayoutUpdate) {
        if let Some(size) = update.tile_size {
            self.tile_size = size;
        }
        if let Some(gap) = update.gap {
            self.gap = gap;
        }
        if let Some(columns) = update.columns_per_row {
            self.columns_per_row = columns;
        }
        if let Some(ms) = update.transition_duration_ms {
            self.transition_duration_ms = ms;
        }
    }

    /// `(column, row)` of sequence index `index`.
    pub fn cell_of(&self, index: usize) -> (usize, usize) {
        (index % self.columns(), index / self.columns())
    }

    /// Canonical pixel origin of sequence index `index`.
    pub fn position_of(&self, index: usize) -> (f64, f64) {
        let (col, row) = self.cell_of(index);
        (col as f64 * self.pitch_x(), row as f64 * self.pitch_y())
    }
}

/// Partial configuration for [`GridLayout::reset_layout`].  `None` keeps the
/// current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutUpdate {
    pub tile_size: Option<Size>,
    pub gap: Option<f64>,
    pub columns_per_row: Option<usize>,
    pub transition_duration_ms: Option<u64>,
}

/// A single tile: identity plus its current box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Tile {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// The ordered tile sequence and its layout configuration.
///
/// The number of tiles is fixed at construction; [`reorder`](Self::reorder)
/// only permutes them.
#[derive(Debug, Clone)]
pub struct GridLayout {
    tiles: Vec<Tile>,
    config: LayoutConfig,
    /// Tile whose position is free-form (being dragged), if any.
    active: Option<TileId>,
}

impl GridLayout {
    /// Build a layout of `count` tiles in canonical positions, each with a
    /// freshly allocated [`TileId`].
    pub fn new(count: usize, config: LayoutConfig) -> Self {
        let tiles = (0..count)
            .map(|index| {
                let (x, y) = config.position_of(index);
                Tile {
                    id: TileId::next(),
                    x,
                    y,
                    width: config.tile_size.width,
                    height: config.tile_size.height,
                }
            })
            .collect();
        Self {
            tiles,
            config,
            active: None,
        }
    }

    //  Accessors

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Tiles in sequence order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile ids in sequence order.
    pub fn order(&self) -> Vec<TileId> {
        self.tiles.iter().map(|t| t.id).collect()
    }

    pub fn index_of(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<TileId> {
        self.active
    }

    /// Canonical box of sequence index `index` under the current config.
    pub fn canonical_rect(&self, index: usize) -> Rect {
        let (x, y) = self.config.position_of(index);
        Rect::new(x, y, self.config.tile_size.width, self.config.tile_size.height)
    }

    //  Drag support

    /// Mark `id` as the free-form tile (or clear it with `None`).
    pub fn set_active(&mut self, id: Option<TileId>) {
        self.active = id;
    }

    /// Move the active tile by `(dx, dy)`.  No-op when nothing is active.
    pub fn translate_active(&mut self, dx: f64, dy: f64) {
        let Some(id) = self.active else {
            return;
        };
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == id) {
            tile.x += dx;
            tile.y += dy;
        }
    }

    /// Put tile `id` at `(x, y)` regardless of its index.
    pub fn place(&mut self, id: TileId, x: f64, y: f64) {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.id == id) {
            tile.x = x;
            tile.y = y;
        }
    }

    //  Mutation

    /// Apply a partial configuration and recompute every tile's canonical
    /// position and size.  The sequence order is untouched.
    pub fn reset_layout(&mut self, update: LayoutUpdate) {
        self.config.apply(update);
        let config = self.config;
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            let (x, y) = config.position_of(index);
            tile.x = x;
            tile.y = y;
            tile.width = config.tile_size.width;
            tile.height = config.tile_size.height;
        }
        debug!(
            "layout reset: {}x{} gap {} cols {}",
            config.tile_size.width,
            config.tile_size.height,
            config.gap,
            config.columns()
        );
    }

    /// Move the tile at `from` so it ends up at `to` (array move, not swap),
    /// then recompute positions of every tile except the active one.
    ///
    /// Out-of-range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.tiles.len() || to >= self.tiles.len() {
            return;
        }
        if from != to {
            let tile = self.tiles.remove(from);
            self.tiles.insert(to, tile);
            debug!("reorder {} -> {}", from, to);
        }
        self.recompute();
    }

    /// Move the tile at `from` to the end of the sequence.
    pub fn move_to_end(&mut self, from: usize) {
        if self.tiles.is_empty() {
            return;
        }
        self.reorder(from, self.tiles.len() - 1);
    }

    /// Restore a previous order.  `order` must be a permutation of the
    /// current ids; anything else is ignored and `false` returned.
    pub fn restore_order(&mut self, order: &[TileId]) -> bool {
        if order.len() != self.tiles.len() {
            return false;
        }
        let mut restored = Vec::with_capacity(order.len());
        for id in order {
            match self.tile(*id) {
                Some(tile) if !restored.iter().any(|t: &Tile| t.id == *id) => restored.push(*tile),
                _ => return false,
            }
        }
        self.tiles = restored;
        self.recompute();
        true
    }

    /// Recompute canonical positions for every tile except the active one.
    pub fn recompute(&mut self) {
        let config = self.config;
        let active = self.active;
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            if Some(tile.id) == active {
                continue;
            }
            let (x, y) = config.position_of(index);
            tile.x = x;
            tile.y = y;
        }
    }
}

//  Tests
