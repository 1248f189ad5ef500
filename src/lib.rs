//! Library crate for clinic-tui.
//!
//! This crate exposes the building blocks of the TUI:
//! - REST client and per-resource endpoints (`api`)
//! - Login, session persistence and token checks (`auth`, `session`)
//! - Entity records and their forms (`model`, `validation`, `form`)
//! - List/search/paginate controller (`list`, `search`, `debounce`)
//! - Role navigation and notifications (`nav`, `notify`)
//! - Application state, update loop and UI rendering (`app`, `ui`)
//!
//! It is used by the `clinic-tui` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod debounce;
pub mod error;
pub mod form;
pub mod list;
pub mod model;
pub mod nav;
pub mod notify;
pub mod search;
pub mod session;
pub mod ui;
pub mod validation;

/// Error types shared across the crate.
pub use error::{ApiError, AuthError, FieldErrors};
