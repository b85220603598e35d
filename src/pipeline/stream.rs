//! Translation progress stream.
//!
//! The backend pushes server-sent events: default events carry the whole task
//! list as JSON, and a `close` event ends the job. The stream is read on its
//! own thread and forwarded over a channel; the UI only ever looks at the
//! newest snapshot.

use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::client::PipelineClient;
use super::types::TaskEntry;

/// Event name that terminates the stream.
const CLOSE_EVENT: &str = "close";

#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    Snapshot(Vec<TaskEntry>),
    /// The job finished and the server closed the stream on purpose
    Closed,
    /// Transport or payload failure; the stream is gone
    Failed(String),
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Line-oriented SSE parser.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feed one line without its terminator. Returns an event on a blank line.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

impl SseEvent {
    pub fn into_update(self) -> StreamUpdate {
        if self.event == CLOSE_EVENT {
            return StreamUpdate::Closed;
        }
        match serde_json::from_str::<Vec<TaskEntry>>(&self.data) {
            Ok(tasks) => StreamUpdate::Snapshot(tasks),
            Err(e) => StreamUpdate::Failed(format!("bad task snapshot: {}", e)),
        }
    }
}

/// Read events until the stream closes, fails, or `stop` is raised.
///
/// Always ends by sending exactly one terminal update unless stopped.
fn pump(reader: impl Read, stop: &AtomicBool, tx: &Sender<StreamUpdate>) {
    let mut parser = SseParser::default();
    for line in BufReader::new(reader).lines() {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let _ = tx.send(StreamUpdate::Failed(e.to_string()));
                return;
            }
        };
        let Some(event) = parser.feed_line(&line) else {
            continue;
        };
        let update = event.into_update();
        let terminal = !matches!(update, StreamUpdate::Snapshot(_));
        if tx.send(update).is_err() || terminal {
            return;
        }
    }
    if !stop.load(Ordering::Relaxed) {
        let _ = tx.send(StreamUpdate::Failed(
            "stream ended without a close event".to_string(),
        ));
    }
}

/// A live subscription to a translation job.
pub struct TranslationWatch {
    filename: String,
    stop: Arc<AtomicBool>,
    rx: Receiver<StreamUpdate>,
}

impl TranslationWatch {
    /// Connect on a background thread and start forwarding updates.
    pub fn connect(client: PipelineClient, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let target = filename.clone();
        Self::spawn(filename, move || {
            client.open_stream(&target).map_err(|e| e.to_string())
        })
    }

    fn spawn<R, F>(filename: String, open: F) -> Self
    where
        R: Read,
        F: FnOnce() -> Result<R, String> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = crossbeam_channel::unbounded();
        let thread_stop = Arc::clone(&stop);
        std::thread::spawn(move || match open() {
            Ok(reader) => pump(reader, &thread_stop, &tx),
            Err(e) => {
                let _ = tx.send(StreamUpdate::Failed(e));
            }
        });
        info!("Watching translation of {}", filename);
        Self { filename, stop, rx }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Drain pending updates, keeping the newest snapshot.
    ///
    /// A terminal update wins over any snapshot that arrived with it.
    pub fn latest(&self) -> Option<StreamUpdate> {
        let mut latest = None;
        for update in self.rx.try_iter() {
            let terminal = !matches!(update, StreamUpdate::Snapshot(_));
            latest = Some(update);
            if terminal {
                break;
            }
        }
        latest
    }

    /// Stop reading. The reader thread exits at its next line.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for TranslationWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::TaskStatus;
    use std::io::Cursor;
    use std::time::Duration;

    fn parse_all(input: &str) -> Vec<SseEvent> {
        let mut parser = SseParser::default();
        input.lines().filter_map(|line| parser.feed_line(line)).collect()
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let events = parse_all("data: [\ndata: {\"status\": \"done\"}\ndata: ]\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "[\n{\"status\": \"done\"}\n]");
        match events[0].clone().into_update() {
            StreamUpdate::Snapshot(tasks) => assert_eq!(tasks[0].status, TaskStatus::Done),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_line_dispatches_and_comments_are_skipped() {
        let events = parse_all(": keepalive\n\ndata: []\n\ndata: [{}]\r\n\r\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data, "[{}]");
    }

    #[test]
    fn test_close_event_is_terminal() {
        let events = parse_all("event: close\ndata: done\n\n");
        assert_eq!(events[0].clone().into_update(), StreamUpdate::Closed);
    }

    #[test]
    fn test_pump_stops_after_close() {
        let body = "data: []\n\nevent: close\ndata: \n\ndata: [{}]\n\n";
        let (tx, rx) = crossbeam_channel::unbounded();
        pump(Cursor::new(body), &AtomicBool::new(false), &tx);
        let updates: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            updates,
            vec![StreamUpdate::Snapshot(Vec::new()), StreamUpdate::Closed]
        );
    }

    #[test]
    fn test_pump_reports_truncated_stream() {
        let (tx, rx) = crossbeam_channel::unbounded();
        pump(Cursor::new("data: []\n\n"), &AtomicBool::new(false), &tx);
        let updates: Vec<_> = rx.try_iter().collect();
        assert!(matches!(updates.last(), Some(StreamUpdate::Failed(_))));
    }

    #[test]
    fn test_pump_honours_stop_flag() {
        let (tx, rx) = crossbeam_channel::unbounded();
        pump(Cursor::new("data: []\n\n"), &AtomicBool::new(true), &tx);
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn test_latest_keeps_newest_snapshot() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let watch = TranslationWatch {
            filename: "paper.pdf".to_string(),
            stop: Arc::new(AtomicBool::new(false)),
            rx,
        };
        let running: Vec<TaskEntry> = serde_json::from_str(r#"[{"status": "running"}]"#).unwrap();
        let done: Vec<TaskEntry> = serde_json::from_str(r#"[{"status": "done"}]"#).unwrap();

        tx.send(StreamUpdate::Snapshot(running)).unwrap();
        tx.send(StreamUpdate::Snapshot(done.clone())).unwrap();
        assert_eq!(watch.latest(), Some(StreamUpdate::Snapshot(done.clone())));
        assert_eq!(watch.latest(), None);

        tx.send(StreamUpdate::Snapshot(done)).unwrap();
        tx.send(StreamUpdate::Closed).unwrap();
        assert_eq!(watch.latest(), Some(StreamUpdate::Closed));
    }

    #[test]
    fn test_drop_raises_stop_flag() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let watch = TranslationWatch {
            filename: "paper.pdf".to_string(),
            stop: Arc::clone(&stop),
            rx,
        };
        assert_eq!(watch.filename(), "paper.pdf");
        drop(watch);
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn test_failed_connect_is_reported() {
        let watch = TranslationWatch::spawn("paper.pdf".to_string(), || {
            Err::<Cursor<&'static [u8]>, _>("refused".to_string())
        });
        let mut update = None;
        for _ in 0..100 {
            update = watch.latest();
            if update.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(update, Some(StreamUpdate::Failed("refused".to_string())));
    }
}
