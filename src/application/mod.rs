// SPDX-License-Identifier: MPL-2.0
//! Application layer - Use cases and orchestration.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//! - [`calibration`]: Calibration run state and its backend calls
//! - [`upload`]: The pre-signed upload protocol
//! - [`analysis`]: Analysis job start and polling
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - Presentation layer drives application services through Iced tasks
//!
//! # Example
//!
//! ```ignore
//! use iced_gaze::application::upload::{upload_recording, UploadGuard};
//!
//! let mut guard = UploadGuard::new();
//! if guard.try_begin() {
//!     let outcome = upload_recording(&backend, &media, 1024, |_| {}).await?;
//!     println!("stored as {}", outcome.test_id);
//! }
//! ```

pub mod analysis;
pub mod calibration;
pub mod port;
pub mod upload;
