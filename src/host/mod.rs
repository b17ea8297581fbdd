//! Concrete [`Host`](crate::traits::Host) implementations.
//!
//! [`memory`] is always available and backs the headless binaries and the
//! tests.  With the `host-gtk` feature, [`gtk`] renders tiles into a GTK4
//! window and drives the engine from real pointer input.

pub mod memory;

#[cfg(feature = "host-gtk")]
pub mod gtk;
