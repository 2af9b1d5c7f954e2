//! Core domain types
//!
//! These types describe what is being mirrored and what happened to it.
//! They are shared between the sync library (which produces them) and the
//! host application (which configures and reports them).

pub mod command;
pub mod repo;
pub mod sync;
