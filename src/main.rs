//! Entry point for the **dragrid** daemon.
//!
//! Without the `host-gtk` feature (or with `--headless`) the grid lives in
//! an in-memory host and pointer events arrive over a Unix socket; every
//! drop is logged with the resulting tile order.  With the feature, a GTK4
//! window shows the grid and real pointer input drives it.
//!
//! ```text
//! dragrid [--config PATH] [--headless]
//! ```

use dragrid::config::Config;
use dragrid::controller::{DragController, EngineEvent};
use dragrid::event::{Point, PointerEvent};
use dragrid::host::memory::MemoryHost;
use dragrid::ipc::listener::UnixSocketListener;
use dragrid::layout::TileId;
use dragrid::shake::ShakeDetector;
use dragrid::traits::PointerSource;
use log::{debug, error, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

/// Default socket path for the pointer listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/dragrid.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/dragrid`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("dragrid")
}

/// Load the config from `explicit` or `$XDG_CONFIG_HOME/dragrid/config.json`.
///
/// A missing default file falls back to compiled-in defaults; an explicit
/// path that fails to load is fatal.
fn load_config(explicit: Option<PathBuf>) -> Config {
    let is_explicit = explicit.is_some();
    let path = explicit.unwrap_or_else(|| config_dir().join("config.json"));
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) if is_explicit => {
            error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

struct Args {
    config: Option<PathBuf>,
    headless: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: None,
        headless: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = iter.next().map(PathBuf::from),
            "--headless" => args.headless = true,
            "-h" | "--help" => {
                println!("usage: dragrid [--config PATH] [--headless]");
                std::process::exit(0);
            }
            other => {
                error!("unknown argument {:?}", other);
                std::process::exit(2);
            }
        }
    }
    args
}

//  Main

fn main() {
    env_logger::init();

    let args = parse_args();
    let config = load_config(args.config);

    if args.headless {
        run_headless(config);
    } else {
        run_windowed(config);
    }
}

/// GTK4 demo window, or headless when built without a windowing host.
fn run_windowed(config: Config) {
    #[cfg(not(feature = "host-gtk"))]
    {
        info!("built without the `host-gtk` feature, running headless");
        run_headless(config);
    }

    #[cfg(feature = "host-gtk")]
    {
        let css = config_dir().join("style.css");
        if let Err(e) = dragrid::host::gtk::run_demo(config, Some(css)) {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// In-memory grid driven over the Unix socket.
fn run_headless(config: Config) {
    let grid = &config.grid;
    let host = MemoryHost::with_grid(
        &grid.container_selector,
        &grid.item_selector,
        config.demo.tiles.len(),
        Point::default(),
    );
    let mut engine = DragController::new(host, grid.clone());
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
    engine.set_event_sink(event_tx);
    if let Err(e) = engine.initialize() {
        error!("failed to set up grid: {}", e);
        std::process::exit(1);
    }

    let names: HashMap<TileId, &str> = engine
        .order()
        .into_iter()
        .zip(config.demo.tiles.iter().map(String::as_str))
        .collect();

    let (ptr_tx, ptr_rx) = mpsc::channel::<PointerEvent>();
    let path = config
        .demo
        .socket_path
        .clone()
        .unwrap_or_else(default_socket_path);
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(ptr_tx) {
            error!("socket listener error: {}", e);
        }
    });

    let mut shake = ShakeDetector::new(config.shake.clone());
    info!("dragrid running with {} tiles", names.len());
    for event in ptr_rx {
        shake.handle(&event, Instant::now());
        if let Err(e) = engine.handle(event) {
            error!("pointer event error: {}", e);
        }
        for note in event_rx.try_iter() {
            match note {
                EngineEvent::DragEnded { id, index } => {
                    let order: Vec<&str> = engine
                        .order()
                        .iter()
                        .filter_map(|id| names.get(id).copied())
                        .collect();
                    info!("{} settled at {}: {:?}", id, index, order);
                }
                other => debug!("{:?}", other),
            }
        }
    }
    info!("pointer source closed, exiting");
}
