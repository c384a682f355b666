// SPDX-License-Identifier: MPL-2.0
//! Diagnostics for test sessions.
//!
//! Events flow through a cloneable [`DiagnosticsHandle`] into a
//! [`DiagnosticsCollector`], which keeps the most recent ones in a
//! [`CircularBuffer`] and exports them as a JSON report. Messages are
//! sanitized on the way in so signed URLs, tokens and local paths never
//! reach the buffer.

mod buffer;
mod collector;
mod events;
mod report;
mod sanitizer;

pub use buffer::{buffer_capacity_bounds, BufferCapacity, CircularBuffer};
pub use collector::{DiagnosticsCollector, DiagnosticsHandle};
pub use events::{
    AppStateEvent, DiagnosticEvent, DiagnosticEventKind, ErrorEvent, UserAction, WarningEvent,
};
pub use report::{DiagnosticReport, ExportError, ReportMetadata, SerializableEvent};
pub use sanitizer::{sanitize_message, ErrorType, WarningType};
