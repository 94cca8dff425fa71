use std::io::Write;
use std::sync::mpsc::Sender;

use serde::Serialize;
use tracing::warn;

use crate::session::Alert;
use crate::tracker::SessionEvent;

/// Fire-and-forget consumer of engine output. Sinks deal with their own
/// failures; the engine never retries a delivery.
pub trait EventSink {
    fn emit(&mut self, event: SessionEvent);

    fn alert(&mut self, _alert: &Alert) {}
}

impl EventSink for Vec<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        if self.send(event).is_err() {
            warn!("event receiver dropped, session event discarded");
        }
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: SessionEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }

    fn alert(&mut self, alert: &Alert) {
        self.0.alert(alert);
        self.1.alert(alert);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: SessionEvent) {
        (**self).emit(event);
    }

    fn alert(&mut self, alert: &Alert) {
        (**self).alert(alert);
    }
}

/// Writes every event and alert as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, value: &T) {
        let result = serde_json::to_writer(&mut self.writer, value)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write engine output");
        }
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: SessionEvent) {
        self.write_line(&event);
    }

    fn alert(&mut self, alert: &Alert) {
        self.write_line(alert);
    }
}
