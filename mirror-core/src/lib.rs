//! Mirror Core
//!
//! Core types shared by the mirror sync library and the `mirror` binary.
//!
//! This crate contains:
//! - Domain types: repository locations, sync outcomes, reset policy
//! - Command types: the description and captured result of an external command

pub mod domain;
