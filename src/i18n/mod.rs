// SPDX-License-Identifier: MPL-2.0
//! Internationalization (i18n) support for the application.
//!
//! Fluent bundles are embedded from `assets/i18n/` at build time. The locale
//! is picked from the CLI, then the config file, then the OS.

pub mod fluent;
