//! Change-event and counters boundary.
//!
//! Core mutation logic MUST NOT touch global observability state directly.
//! Everything flows through [`sink::SinkEvent`] and [`sink::EventSink`];
//! this module is the only bridge between execution logic and the global
//! counters, and the hook point where UI layers subscribe to change
//! batches.

pub mod event;
pub mod metrics;
pub mod sink;
