//! Pointer input over a Unix socket.
//!
//! External tools (input recorders, test drivers, a browser bridge) can
//! connect to the socket and stream newline-delimited JSON pointer events
//! into the headless daemon.

pub mod listener;
