//! Snap & collision resolution for the dragged tile.
//!
//! On every pointer move the active tile sits at some free-form position.
//! [`resolve`] turns that into a grid cell for the [`Placeholder`] and keeps
//! the tile sequence consistent with it:
//!
//! 1. **Snap** the free position to the nearest cell origin.
//! 2. **Clamp** the cell so it stays inside the columns and never goes
//!    above or left of the origin.
//! 3. **Hit-test** the placeholder against every other tile's box.
//! 4. On a hit, **move** the active tile to the hit tile's index.  Tiles in
//!    between shift by one; the direction does not matter.
//! 5. If the placeholder lies past the last occupied cell (same row, later
//!    column, or any later row), **append** the active tile and pin the
//!    placeholder to the last cell.
//!
//! Steps 4 and 5 are evaluated independently on every move.

use crate::layout::{GridLayout, LayoutConfig, Rect, Tile, TileId};
use log::debug;

/// The slot the dragged tile will land in.
///
/// Exists only while a drag is active; otherwise it is cleared to a zero
/// box at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placeholder {
    rect: Rect,
    owner: Option<TileId>,
}

impl Placeholder {
    /// Start tracking `tile`, taking over its current box.
    pub fn attach(&mut self, tile: &Tile) {
        self.rect = tile.rect();
        self.owner = Some(tile.id);
    }

    /// Back to the zero box with no owner.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The tile this placeholder stands in for, while a drag is active.
    pub fn owner(&self) -> Option<TileId> {
        self.owner
    }

    pub fn is_active(&self) -> bool {
        self.owner.is_some()
    }
}

/// A list move performed by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// What a single [`resolve`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution {
    /// Move caused by a collision with another tile.
    pub collision: Option<Move>,
    /// Move to the end of the sequence because the placeholder went past
    /// the last occupied cell.
    pub appended: Option<Move>,
}

impl Resolution {
    /// Whether the sequence order changed.
    pub fn reordered(&self) -> bool {
        self.collision.is_some_and(|m| !m.is_noop()) || self.appended.is_some_and(|m| !m.is_noop())
    }
}

/// Round `value` to the nearest multiple of `pitch`.
pub(crate) fn snap(value: f64, pitch: f64) -> f64 {
    if pitch <= 0.0 {
        return 0.0;
    }
    (value / pitch).round() * pitch
}

/// Snap the free-form box `free` to a cell and clamp it into the grid.
pub(crate) fn snapped_cell(free: &Rect, config: &LayoutConfig) -> Rect {
    let pitch_x = config.pitch_x();
    let pitch_y = config.pitch_y();
    let mut x = snap(free.x, pitch_x);
    let mut y = snap(free.y, pitch_y);

    if x < 0.0 {
        x = 0.0;
    }
    if y < 0.0 || free.y < 0.0 {
        y = 0.0;
    }
    let columns = config.columns();
    if free.x + free.width > columns as f64 * pitch_x {
        x = (columns - 1) as f64 * pitch_x;
    }
    Rect::new(x, y, free.width, free.height)
}

/// Whether `(x, y)` of `rect` lies beyond the last occupied cell of a grid
/// holding `len` tiles.
fn past_last_cell(rect: &Rect, len: usize, config: &LayoutConfig) -> bool {
    if len == 0 {
        return false;
    }
    let (last_col, last_row) = config.cell_of(len - 1);
    let col = (rect.x / config.pitch_x()).round();
    let row = (rect.y / config.pitch_y()).round();
    (col > last_col as f64 && row == last_row as f64) || row > last_row as f64
}

/// Run one snap/clamp/collide/append pass for the active tile.
///
/// Does nothing and returns an empty [`Resolution`] if the layout has no
/// active tile.
pub fn resolve(layout: &mut GridLayout, placeholder: &mut Placeholder) -> Resolution {
    let mut resolution = Resolution::default();
    let Some(active) = layout.active() else {
        return resolution;
    };
    let Some(free) = layout.tile(active).map(Tile::rect) else {
        return resolution;
    };
    let config = *layout.config();

    // 1 + 2.
    placeholder.rect = snapped_cell(&free, &config);

    // 3. Equal tile sizes mean at most one hit, but stay general.
    let hits: Vec<TileId> = layout
        .tiles()
        .iter()
        .filter(|t| t.id != active && placeholder.rect.overlaps(&t.rect()))
        .map(|t| t.id)
        .collect();

    // 4.
    for hit in hits {
        let (Some(from), Some(to)) = (layout.index_of(active), layout.index_of(hit)) else {
            continue;
        };
        debug!("{} collides with {} ({} -> {})", active, hit, from, to);
        layout.reorder(from, to);
        resolution.collision = Some(Move { from, to });
    }

    // 5.
    if past_last_cell(&placeholder.rect, layout.len(), &config) {
        let last = layout.len() - 1;
        let (x, y) = config.position_of(last);
        placeholder.rect.x = x;
        placeholder.rect.y = y;
        if let Some(from) = layout.index_of(active) {
            debug!("{} past the last cell ({} -> end)", active, from);
            layout.move_to_end(from);
            resolution.appended = Some(Move { from, to: last });
        }
    }

    resolution
}

//  Tests
