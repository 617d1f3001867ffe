// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling glob patterns (shared with pipeline sources).
//! - Binding watch patterns to the tasks they trigger.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It never runs tasks itself; every match becomes a
//! `RuntimeEvent::RunRequested` for the runtime to start.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{bindings_from_config, process_event, WatchBinding};
pub use patterns::PatternSet;
pub use watcher::{Subscription, WatchDispatcher};
