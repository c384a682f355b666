// SPDX-License-Identifier: MPL-2.0
//! Central collector for diagnostic events.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};

use super::report::{
    default_export_directory, generate_default_filename, write_atomic, DiagnosticReport,
    ExportError, ReportMetadata, SerializableEvent,
};
use super::{
    sanitize_message, AppStateEvent, BufferCapacity, CircularBuffer, DiagnosticEvent,
    DiagnosticEventKind, ErrorEvent, UserAction, WarningEvent,
};

/// Handle for sending diagnostic events to the collector.
///
/// Cheap to clone and safe to move into async tasks or worker threads.
/// Every method is non-blocking and drops the event when the channel is full.
#[derive(Clone, Debug)]
pub struct DiagnosticsHandle {
    event_tx: Sender<DiagnosticEvent>,
}

impl DiagnosticsHandle {
    fn send(&self, kind: DiagnosticEventKind) {
        let _ = self.event_tx.try_send(DiagnosticEvent::new(kind));
    }

    pub fn log_action(&self, action: UserAction) {
        self.log_action_with_details(action, None);
    }

    pub fn log_action_with_details(&self, action: UserAction, details: Option<String>) {
        self.send(DiagnosticEventKind::UserAction {
            action,
            details: details.map(|d| sanitize_message(&d)),
        });
    }

    pub fn log_state(&self, state: AppStateEvent) {
        self.send(DiagnosticEventKind::AppState { state });
    }

    /// The message is sanitized before it is queued.
    pub fn log_warning(&self, event: WarningEvent) {
        let event = WarningEvent {
            message: sanitize_message(&event.message),
            ..event
        };
        self.send(DiagnosticEventKind::Warning { event });
    }

    /// The message is sanitized before it is queued.
    pub fn log_error(&self, event: ErrorEvent) {
        let event = ErrorEvent {
            message: sanitize_message(&event.message),
            ..event
        };
        self.send(DiagnosticEventKind::Error { event });
    }
}

/// Receives events through a channel and keeps the latest ones in a
/// bounded ring buffer.
pub struct DiagnosticsCollector {
    buffer: CircularBuffer<DiagnosticEvent>,
    event_rx: Receiver<DiagnosticEvent>,
    event_tx: Sender<DiagnosticEvent>,
    collection_started_at: Instant,
    collection_started_at_utc: DateTime<Utc>,
}

const DEFAULT_CHANNEL_CAPACITY: usize = 100;

impl DiagnosticsCollector {
    #[must_use]
    pub fn new(capacity: BufferCapacity) -> Self {
        let (event_tx, event_rx) = bounded(DEFAULT_CHANNEL_CAPACITY);

        Self {
            buffer: CircularBuffer::new(capacity),
            event_rx,
            event_tx,
            collection_started_at: Instant::now(),
            collection_started_at_utc: Utc::now(),
        }
    }

    #[must_use]
    pub fn handle(&self) -> DiagnosticsHandle {
        DiagnosticsHandle {
            event_tx: self.event_tx.clone(),
        }
    }

    /// Drains the channel into the buffer. Called on every UI tick.
    pub fn process_pending(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.buffer.push(event);
        }
    }

    /// Logs an action directly, bypassing the channel.
    pub fn log_action(&mut self, action: UserAction) {
        self.buffer
            .push(DiagnosticEvent::new(DiagnosticEventKind::UserAction {
                action,
                details: None,
            }));
    }

    /// Logs a state change directly, bypassing the channel.
    pub fn log_state(&mut self, state: AppStateEvent) {
        self.buffer
            .push(DiagnosticEvent::new(DiagnosticEventKind::AppState { state }));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEvent> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Exports all collected events as pretty-printed JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.build_report())
    }

    #[allow(clippy::cast_possible_truncation)] // Duration in ms fits comfortably in u64
    fn build_report(&self) -> DiagnosticReport {
        let collection_duration_ms = self.collection_started_at.elapsed().as_millis() as u64;

        let events: Vec<SerializableEvent> = self
            .buffer
            .iter()
            .map(|event| {
                SerializableEvent::new(
                    event.timestamp,
                    self.collection_started_at,
                    event.kind.clone(),
                )
            })
            .collect();

        let metadata = ReportMetadata::new(
            self.collection_started_at_utc,
            collection_duration_ms,
            events.len(),
        );

        DiagnosticReport { metadata, events }
    }

    /// Writes the report to `path` atomically.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path = path.as_ref();
        let json = self.export_json()?;
        write_atomic(path, &json)?;
        Ok(path.to_path_buf())
    }

    /// Asks for a destination with a native save dialog, then exports.
    pub fn export_with_dialog(&self) -> Result<PathBuf, ExportError> {
        let path = rfd::FileDialog::new()
            .set_directory(default_export_directory())
            .set_file_name(generate_default_filename())
            .add_filter("JSON", &["json"])
            .save_file()
            .ok_or(ExportError::Cancelled)?;

        self.export_to_file(&path)
    }
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        Self::new(BufferCapacity::default())
    }
}
