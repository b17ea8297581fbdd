//! Core traits that decouple the drag engine from any rendering surface or
//! event transport.
//!
//! Every concrete backend (the GTK demo window, the in-memory host, a Unix
//! socket, a test harness, …) implements one of these traits.  The
//! [`DragController`](crate::controller::DragController) only depends on
//! these abstractions.

use crate::easing::Transition;
use crate::event::{Point, PointerEvent, PointerKind};
use crate::layout::{Rect, Size};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::mpsc;

/// Stacking order of resting tiles.
pub const Z_TILE: i32 = 998;
/// Stacking order of the placeholder, just below resting tiles.
pub const Z_PLACEHOLDER: i32 = 997;
/// Stacking order of the tile being dragged, above everything else.
pub const Z_ACTIVE: i32 = 999;

/// Abstraction over the surface tiles are drawn on.
///
/// A host owns visual elements and hands out opaque [`Handle`](Host::Handle)s
/// for them.  It also owns the global pointer event target: the engine asks
/// it to attach or detach listeners but never receives events from it
/// directly; whoever drives the host feeds events into
/// [`DragController::handle`](crate::controller::DragController::handle).
pub trait Host {
    /// Opaque reference to a visual element.
    type Handle: Clone + Eq + Hash + Debug;
    /// The error type produced by this host.
    type Error: std::error::Error + Send + 'static;

    /// First element carrying CSS class `class`, if any.
    fn query(&self, class: &str) -> Result<Option<Self::Handle>, Self::Error>;

    /// Every element carrying CSS class `class`, in document order.
    fn query_all(&self, class: &str) -> Result<Vec<Self::Handle>, Self::Error>;

    /// Topmost interactive element under `point` (client coordinates).
    fn element_at(&self, point: Point) -> Result<Option<Self::Handle>, Self::Error>;

    /// `element` itself or its closest ancestor carrying `class`.
    fn closest(
        &self,
        element: &Self::Handle,
        class: &str,
    ) -> Result<Option<Self::Handle>, Self::Error>;

    /// Make `container` the positioning parent of its tiles.
    fn prepare_container(&mut self, container: &Self::Handle) -> Result<(), Self::Error>;

    /// Make `tile` absolutely positioned, non-selectable and `size` big.
    fn prepare_tile(&mut self, tile: &Self::Handle, size: Size) -> Result<(), Self::Error>;

    /// Create the placeholder element inside `container`: a childless,
    /// transparent, non-interactive copy of `template`.
    fn create_placeholder(
        &mut self,
        container: &Self::Handle,
        template: &Self::Handle,
    ) -> Result<Self::Handle, Self::Error>;

    /// Translate `element` to `rect.x, rect.y` (relative to the container)
    /// and resize it to `rect.width × rect.height`.
    fn apply_box(&mut self, element: &Self::Handle, rect: Rect) -> Result<(), Self::Error>;

    fn set_z_index(&mut self, element: &Self::Handle, z: i32) -> Result<(), Self::Error>;

    /// Set the transform transition; `None` makes moves immediate.
    fn set_transition(
        &mut self,
        element: &Self::Handle,
        transition: Option<Transition>,
    ) -> Result<(), Self::Error>;

    /// Attach (`enabled = true`) or detach the listener for `kind` on the
    /// global event target.
    fn set_listener(&mut self, kind: PointerKind, enabled: bool) -> Result<(), Self::Error>;
}

//  Pointer Source

/// A source of [`PointerEvent`]s.
///
/// Implementations listen on some transport (a Unix socket, a recorded
/// script, a toolkit's event loop) and forward every event into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](PointerSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once, in the
///   order it was received.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait PointerSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`PointerEvent`] into
    /// `sink`.
    fn run(&mut self, sink: mpsc::Sender<PointerEvent>) -> Result<(), Self::Error>;
}
