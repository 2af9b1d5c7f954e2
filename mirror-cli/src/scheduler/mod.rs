//! Scheduler layer
//!
//! Periodically refreshes a mirror for the `watch` command.

pub mod poller;

pub use poller::MirrorPoller;
