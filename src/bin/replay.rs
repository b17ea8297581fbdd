//! Replay a recorded pointer session against a headless grid and print the
//! resulting tile order.
//!
//! The input is a JSON array of pointer events in the socket wire format:
//!
//! ```json
//! [{"Down":"50 50"}, {"Move":"160 160"}, {"Up":"160 160"}]
//! ```
//!
//! Run with:
//!     dragrid-replay [--config PATH] [SESSION.json]
//!
//! Reads standard input when no session file is given.

use dragrid::config::Config;
use dragrid::controller::{DragController, EngineEvent};
use dragrid::event::{Point, PointerEvent};
use dragrid::host::memory::MemoryHost;
use dragrid::layout::TileId;
use dragrid::shake::ShakeDetector;
use log::{debug, error};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

#[derive(Serialize)]
struct Report<'a> {
    /// Tile labels in final sequence order.
    order: Vec<&'a str>,
    drops: usize,
    cancels: usize,
    shaking: bool,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    error!("{}", msg);
    eprintln!("dragrid-replay: {}", msg);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let mut config_path: Option<PathBuf> = None;
    let mut session_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            _ => session_path = Some(PathBuf::from(arg)),
        }
    }

    let config = match config_path {
        Some(path) => Config::load(&path).unwrap_or_else(|e| fail(e)),
        None => Config::default(),
    };

    let input = match &session_path {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("failed to read {}: {}", path.display(), e))),
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                fail(format!("failed to read stdin: {}", e));
            }
            buf
        }
    };
    let events: Vec<PointerEvent> =
        serde_json::from_str(&input).unwrap_or_else(|e| fail(format!("bad session: {}", e)));

    let grid = &config.grid;
    let host = MemoryHost::with_grid(
        &grid.container_selector,
        &grid.item_selector,
        config.demo.tiles.len(),
        Point::default(),
    );
    let mut engine = DragController::new(host, grid.clone());
    let (tx, rx) = mpsc::channel();
    engine.set_event_sink(tx);
    if let Err(e) = engine.initialize() {
        fail(e);
    }
    let names: HashMap<TileId, &str> = engine
        .order()
        .into_iter()
        .zip(config.demo.tiles.iter().map(String::as_str))
        .collect();

    let mut shake = ShakeDetector::new(config.shake.clone());
    let mut shaking = false;
    for event in events {
        shaking |= shake.handle(&event, Instant::now());
        if let Err(e) = engine.handle(event) {
            fail(e);
        }
    }

    let mut drops = 0;
    let mut cancels = 0;
    for note in rx.try_iter() {
        debug!("{:?}", note);
        match note {
            EngineEvent::DragEnded { .. } => drops += 1,
            EngineEvent::DragCancelled { .. } => cancels += 1,
            _ => {}
        }
    }

    let report = Report {
        order: engine
            .order()
            .iter()
            .filter_map(|id| names.get(id).copied())
            .collect(),
        drops,
        cancels,
        shaking,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}
