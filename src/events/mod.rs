//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the admission scheduler.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `AdmissionScheduler`, the per-submission attempt runner,
//!   the restart path.
//! - **Consumers**: anything the embedder subscribes — dashboards, metrics
//!   exporters, test harnesses.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
