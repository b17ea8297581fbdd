//! Unix-socket [`PointerSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`PointerEvent`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`.  Points are
//! either objects or `"x y"` strings:
//!
//! ```json
//! {"Down":{"x":50,"y":50}}
//! {"Move":"160 50"}
//! {"Up":{"x":160,"y":50}}
//! "Cancel"
//! ```

use crate::event::PointerEvent;
use crate::traits::PointerSource;
use log::{debug, error, info, trace};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`PointerSource`] that listens on a Unix stream socket for
/// JSON-encoded pointer events.
///
/// Each accepted connection can send any number of events.  When the
/// connection closes, the listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnixSocketListener {
    /// Create a listener for `path`.  The socket file is created when
    /// [`run`](PointerSource::run) is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse one line of the wire format.  Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<PointerEvent>, UnixSocketError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line)?))
    }
}

impl PointerSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and forward events until the sink is dropped.
    ///
    /// Blocks.  Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<PointerEvent>) -> Result<(), Self::Error> {
        // Stale socket from a previous run.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                match Self::parse_line(&text) {
                    Ok(Some(event)) => {
                        trace!("received {:?}", event);
                        if sink.send(event).is_err() {
                            info!("sink closed, shutting down");
                            let _ = std::fs::remove_file(&self.path);
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => error!("bad pointer event {:?}: {}", text, e),
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Point;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("dragrid-test-{}-{}.sock", std::process::id(), id))
    }

    fn spawn_listener(path: &Path) -> mpsc::Receiver<PointerEvent> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path);
            let _ = listener.run(tx);
        });
        std::thread::sleep(Duration::from_millis(150));
        rx
    }

    #[test]
    fn events_arrive_in_order() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"Down":{{"x":50,"y":50}}}}"#).unwrap();
            writeln!(stream, r#"{{"Move":"160 50"}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#"{{"Up":{{"x":160,"y":50}}}}"#).unwrap();
            writeln!(stream, r#""Cancel""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events: Vec<PointerEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PointerEvent::Down(Point::new(50.0, 50.0)),
                PointerEvent::Move(Point::new(160.0, 50.0)),
                PointerEvent::Up(Point::new(160.0, 50.0)),
                PointerEvent::Cancel,
            ]
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#"{{"Hover":{{"x":1,"y":1}}}}"#).unwrap();
            writeln!(stream, r#"{{"Move":{{"x":1,"y":2}}}}"#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events: Vec<PointerEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![PointerEvent::Move(Point::new(1.0, 2.0))]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn parse_line_handles_blank_and_bad_input() {
        assert!(UnixSocketListener::parse_line("   ").unwrap().is_none());
        assert!(UnixSocketListener::parse_line("{").is_err());
        assert_eq!(
            UnixSocketListener::parse_line(r#""Cancel""#).unwrap(),
            Some(PointerEvent::Cancel)
        );
    }
}
