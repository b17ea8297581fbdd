//! The drag engine: ties the layout model, the resolver and render sync to
//! a [`Host`] and turns pointer events into drag sessions.
//!
//! [`DragController`] is a small state machine:
//!
//! ```text
//!            pointerdown on a tile
//!   Idle ─────────────────────────────▶ Dragging
//!    ▲                                      │ pointermove: move tile, resolve
//!    └──────────────────────────────────────┘
//!            pointerup / pointercancel
//! ```
//!
//! Every mutation of the model is followed by an explicit
//! [`RenderSync`] pass; observers can additionally subscribe to
//! [`EngineEvent`]s over an [`mpsc`] channel.

use crate::config::GridOptions;
use crate::easing::Transition;
use crate::event::{Point, PointerEvent, PointerKind};
use crate::layout::{GridLayout, LayoutConfig, LayoutUpdate, TileId};
use crate::render::RenderSync;
use crate::resolver::{self, Placeholder};
use crate::traits::{Host, Z_ACTIVE, Z_PLACEHOLDER, Z_TILE};
use log::{debug, info, warn};
use std::sync::mpsc;

/// Transition of the placeholder while it follows the pointer.
const PLACEHOLDER_GLIDE_MS: u64 = 500;

/// Possible errors from the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The host returned an error.
    #[error("host error: {0}")]
    Host(String),
}

fn host_err<E: std::error::Error>(e: E) -> EngineError {
    EngineError::Host(e.to_string())
}

/// Notifications sent to an optional observer.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The grid was laid out for the first time.
    Initialized { tiles: usize },
    /// A tile was picked up.
    DragStarted { id: TileId, index: usize },
    /// The "has the user dragged during this session" flag changed.
    DraggedChanged(bool),
    /// The tile sequence changed order.
    Reordered { order: Vec<TileId> },
    /// A tile was dropped at `index`.
    DragEnded { id: TileId, index: usize },
    /// A drag was cancelled and the previous order restored.
    DragCancelled { id: TileId },
    /// `reset_layout` recomputed every position.
    LayoutReset,
}

/// State of an in-flight drag.
#[derive(Debug)]
struct DragSession {
    tile: TileId,
    last_pointer: Point,
    moved: bool,
    /// Order at pointer-down, restored on cancel.
    origin_order: Vec<TileId>,
}

/// Layout plus the visual state that only exists once initialization found
/// a container and tiles.
struct Mounted<K> {
    layout: GridLayout,
    render: RenderSync<K>,
}

/// Drives one drag grid on a [`Host`].
///
/// # Typical usage
///
/// ```ignore
/// let mut engine = DragController::new(host, GridOptions::default());
/// engine.initialize()?;
/// engine.handle(PointerEvent::Down(Point::new(50.0, 50.0)))?;
/// ```
pub struct DragController<H: Host> {
    host: H,
    container_selector: String,
    item_selector: String,
    /// Geometry used by `initialize`; afterwards the layout owns it.
    pending: LayoutConfig,
    mounted: Option<Mounted<H::Handle>>,
    placeholder: Placeholder,
    session: Option<DragSession>,
    has_dragged: bool,
    bound: bool,
    events: Option<mpsc::Sender<EngineEvent>>,
}

impl<H: Host> DragController<H> {
    /// Create an engine for the grid described by `options`.  Nothing
    /// touches the host until [`initialize`](Self::initialize).
    pub fn new(host: H, options: GridOptions) -> Self {
        Self {
            host,
            pending: options.layout_config(),
            container_selector: options.container_selector,
            item_selector: options.item_selector,
            mounted: None,
            placeholder: Placeholder::default(),
            session: None,
            has_dragged: false,
            bound: false,
            events: None,
        }
    }

    /// Attach an observer channel.
    pub fn set_event_sink(&mut self, tx: mpsc::Sender<EngineEvent>) {
        self.events = Some(tx);
    }

    //  Accessors

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The layout, once initialized.
    pub fn layout(&self) -> Option<&GridLayout> {
        self.mounted.as_ref().map(|m| &m.layout)
    }

    /// Current layout configuration (pending until initialization).
    pub fn layout_config(&self) -> LayoutConfig {
        self.layout().map_or(self.pending, |l| *l.config())
    }

    /// Tile ids in sequence order; empty before initialization.
    pub fn order(&self) -> Vec<TileId> {
        self.layout().map(GridLayout::order).unwrap_or_default()
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    /// Visual element of tile `id`.
    pub fn tile_handle(&self, id: TileId) -> Option<&H::Handle> {
        self.mounted.as_ref().and_then(|m| m.render.handle(id))
    }

    /// Visual element of the placeholder.
    pub fn placeholder_handle(&self) -> Option<&H::Handle> {
        self.mounted
            .as_ref()
            .and_then(|m| m.render.placeholder_handle())
    }

    pub fn is_initialized(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The tile being dragged, if any.
    pub fn active_tile(&self) -> Option<TileId> {
        self.session.as_ref().map(|s| s.tile)
    }

    /// Whether the pointer has moved during the current drag session.
    pub fn has_dragged(&self) -> bool {
        self.has_dragged
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    //  Lifecycle

    /// Lay out the grid and bind the pointer listeners.
    ///
    /// A missing container or an empty tile list means the surface is not
    /// ready yet: no layout happens and the call may be repeated later.
    /// Listeners are bound either way; events are ignored until a layout
    /// exists.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        self.mount()?;
        self.bind_event_listener()
    }

    /// Find the container and tiles, lay them out and create the
    /// placeholder.
    fn mount(&mut self) -> Result<(), EngineError> {
        if self.mounted.is_some() {
            debug!("already initialized");
            return Ok(());
        }
        let Some(container) = self.host.query(&self.container_selector).map_err(host_err)? else {
            debug!("no .{} yet, skipping layout", self.container_selector);
            return Ok(());
        };
        let items = self.host.query_all(&self.item_selector).map_err(host_err)?;
        if items.is_empty() {
            debug!("no .{} yet, skipping layout", self.item_selector);
            return Ok(());
        }

        self.host.prepare_container(&container).map_err(host_err)?;

        let layout = GridLayout::new(items.len(), self.pending);
        let size = layout.config().tile_size;
        let mut render = RenderSync::new();
        for (tile, handle) in layout.tiles().iter().zip(&items) {
            self.host.prepare_tile(handle, size).map_err(host_err)?;
            self.host.set_z_index(handle, Z_TILE).map_err(host_err)?;
            render.register(tile.id, handle.clone());
        }

        let placeholder = self
            .host
            .create_placeholder(&container, &items[0])
            .map_err(host_err)?;
        self.host
            .set_z_index(&placeholder, Z_PLACEHOLDER)
            .map_err(host_err)?;
        render.set_placeholder(placeholder);

        // First paint without animation, then enable transitions.
        render
            .sync(&mut self.host, &layout, &self.placeholder)
            .map_err(host_err)?;
        let transition = Transition::ease_ms(layout.config().transition_duration_ms);
        for handle in &items {
            self.host
                .set_transition(handle, Some(transition))
                .map_err(host_err)?;
        }

        info!(
            "laid out {} tiles in {} columns",
            layout.len(),
            layout.config().columns()
        );
        let tiles = layout.len();
        self.mounted = Some(Mounted { layout, render });
        self.emit(EngineEvent::Initialized { tiles });
        Ok(())
    }

    /// Change the geometry and recompute every tile's canonical position.
    /// The tile order is kept.  Fields left `None` keep their value.
    pub fn reset_layout(&mut self, update: LayoutUpdate) -> Result<(), EngineError> {
        let Some(mounted) = self.mounted.as_mut() else {
            self.pending.apply(update);
            return Ok(());
        };
        mounted.layout.reset_layout(update);
        let config = *mounted.layout.config();
        let transition = Transition::ease_ms(config.transition_duration_ms);
        let active = self.session.as_ref().map(|s| s.tile);
        for tile in mounted.layout.tiles() {
            let Some(handle) = mounted.render.handle(tile.id) else {
                continue;
            };
            self.host
                .prepare_tile(handle, config.tile_size)
                .map_err(host_err)?;
            if Some(tile.id) != active {
                self.host
                    .set_transition(handle, Some(transition))
                    .map_err(host_err)?;
            }
        }
        mounted
            .render
            .sync(&mut self.host, &mounted.layout, &self.placeholder)
            .map_err(host_err)?;
        self.emit(EngineEvent::LayoutReset);
        Ok(())
    }

    /// Attach the pointer listeners on the host's global event target.
    pub fn bind_event_listener(&mut self) -> Result<(), EngineError> {
        self.set_listeners(true)
    }

    /// Detach the pointer listeners.  Events passed to
    /// [`handle`](Self::handle) are ignored while unbound.
    pub fn unbind_event_listener(&mut self) -> Result<(), EngineError> {
        self.set_listeners(false)
    }

    fn set_listeners(&mut self, enabled: bool) -> Result<(), EngineError> {
        if self.bound == enabled {
            return Ok(());
        }
        for kind in PointerKind::ALL {
            self.host.set_listener(kind, enabled).map_err(host_err)?;
        }
        self.bound = enabled;
        debug!("pointer listeners {}", if enabled { "bound" } else { "unbound" });
        Ok(())
    }

    //  Events

    /// Dispatch a pointer event delivered to the bound listeners.
    pub fn handle(&mut self, event: PointerEvent) -> Result<(), EngineError> {
        if !self.bound {
            debug!("listeners unbound, ignoring {}", event.kind());
            return Ok(());
        }
        if let Some(p) = event.point() {
            if !p.is_finite() {
                debug!("ignoring {} at non-finite point {}", event.kind(), p);
                return Ok(());
            }
        }
        match event {
            PointerEvent::Down(p) => self.pointer_down(p),
            PointerEvent::Move(p) => self.pointer_move(p),
            PointerEvent::Up(p) => self.pointer_up(p),
            PointerEvent::Cancel => self.cancel(),
        }
    }

    /// Pick up the tile under `point`, if any.
    pub fn pointer_down(&mut self, point: Point) -> Result<(), EngineError> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        let Some(target) = self.host.element_at(point).map_err(host_err)? else {
            return Ok(());
        };
        let Some(handle) = self
            .host
            .closest(&target, &self.item_selector)
            .map_err(host_err)?
        else {
            debug!("pointerdown at {} is not on a tile", point);
            return Ok(());
        };
        if self.session.is_some() {
            debug!("already dragging, ignoring pointerdown");
            return Ok(());
        }
        let Some(id) = mounted.render.tile_for(&handle) else {
            return Ok(());
        };
        let (Some(index), Some(tile)) = (mounted.layout.index_of(id), mounted.layout.tile(id).copied())
        else {
            return Ok(());
        };

        self.host.set_z_index(&handle, Z_ACTIVE).map_err(host_err)?;
        self.host.set_transition(&handle, None).map_err(host_err)?;
        mounted.layout.set_active(Some(id));
        self.placeholder.attach(&tile);
        mounted
            .render
            .sync_placeholder(&mut self.host, &self.placeholder)
            .map_err(host_err)?;

        info!("drag {} from index {}", id, index);
        self.session = Some(DragSession {
            tile: id,
            last_pointer: point,
            moved: false,
            origin_order: mounted.layout.order(),
        });
        self.emit(EngineEvent::DragStarted { id, index });
        Ok(())
    }

    /// Move the dragged tile by the pointer delta and resolve collisions.
    pub fn pointer_move(&mut self, point: Point) -> Result<(), EngineError> {
        let (Some(session), Some(mounted)) = (self.session.as_mut(), self.mounted.as_mut()) else {
            return Ok(());
        };
        let (dx, dy) = point.delta_from(session.last_pointer);
        mounted.layout.translate_active(dx, dy);

        if !session.moved {
            session.moved = true;
            if let Some(handle) = mounted.render.placeholder_handle() {
                self.host
                    .set_transition(handle, Some(Transition::ease_ms(PLACEHOLDER_GLIDE_MS)))
                    .map_err(host_err)?;
            }
        }

        let resolution = resolver::resolve(&mut mounted.layout, &mut self.placeholder);
        session.last_pointer = point;

        mounted
            .render
            .sync(&mut self.host, &mounted.layout, &self.placeholder)
            .map_err(host_err)?;

        let order = resolution.reordered().then(|| mounted.layout.order());
        if !self.has_dragged {
            self.has_dragged = true;
            self.emit(EngineEvent::DraggedChanged(true));
        }
        if let Some(order) = order {
            self.emit(EngineEvent::Reordered { order });
        }
        Ok(())
    }

    /// Drop the dragged tile into the placeholder's cell.
    pub fn pointer_up(&mut self, _point: Point) -> Result<(), EngineError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let id = session.tile;
        let index = self.end_session(&session, false)?;
        info!("dropped {} at index {}", id, index);
        self.emit(EngineEvent::DragEnded { id, index });
        Ok(())
    }

    /// Abort the current drag and restore the order it started from.
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let id = session.tile;
        self.end_session(&session, true)?;
        info!("drag of {} cancelled", id);
        self.emit(EngineEvent::DragCancelled { id });
        Ok(())
    }

    /// Shared tail of pointer-up and cancel.  Returns the tile's final index.
    fn end_session(&mut self, session: &DragSession, restore: bool) -> Result<usize, EngineError> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(0);
        };
        let id = session.tile;
        let config = *mounted.layout.config();

        if let Some(handle) = mounted.render.handle(id) {
            self.host
                .set_transition(handle, Some(Transition::ease_ms(config.transition_duration_ms)))
                .map_err(host_err)?;
            self.host.set_z_index(handle, Z_TILE).map_err(host_err)?;
        }

        mounted.layout.set_active(None);
        if restore {
            if !mounted.layout.restore_order(&session.origin_order) {
                warn!("could not restore tile order after cancel");
            }
        } else {
            let target = self.placeholder.rect();
            mounted.layout.place(id, target.x, target.y);
        }

        self.placeholder.clear();
        if let Some(handle) = mounted.render.placeholder_handle() {
            self.host.set_transition(handle, None).map_err(host_err)?;
        }

        mounted
            .render
            .sync(&mut self.host, &mounted.layout, &self.placeholder)
            .map_err(host_err)?;

        let index = mounted.layout.index_of(id).unwrap_or_default();
        if self.has_dragged {
            self.has_dragged = false;
            self.emit(EngineEvent::DraggedChanged(false));
        }
        Ok(index)
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

//  Tests
