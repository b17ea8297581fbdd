//! **dragrid**: a drag-to-reorder tile grid engine.
//!
//! Tiles are laid out row-major in a fixed-pitch grid.  While one tile is
//! dragged, a *placeholder* snaps to the grid cell under it; whenever the
//! placeholder lands on another tile, the dragged tile is moved to that
//! tile's index and the rest of the grid reflows around it.  Dropping the
//! tile settles it into the placeholder's cell.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::Host`] abstracts the surface tiles are drawn on (element
//!   lookup, hit-testing, boxes, stacking, transitions) so the engine is not
//!   coupled to any toolkit.
//! * [`traits::PointerSource`] abstracts the transport that delivers
//!   pointer input (a Unix socket, a recorded script, …).
//!
//! The pure model lives in [`layout`] and [`resolver`]; [`controller`]
//! drives it from pointer events and mirrors it onto a host through
//! [`render`].  [`shake`] is an independent mouse-shake detector fed from
//! the same event stream.
//!
//! Concrete hosts live in [`host`]: an in-memory element tree for headless
//! use and tests, and (with the `host-gtk` feature) a GTK4 window.

pub mod config;
pub mod controller;
pub mod easing;
pub mod event;
pub mod host;
pub mod ipc;
pub mod layout;
pub mod render;
pub mod resolver;
pub mod shake;
pub mod traits;
