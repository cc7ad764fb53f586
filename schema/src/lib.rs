//! Schema definitions for pgroup
//!
//! This crate contains the data structures shared between the core library
//! and the command-line front end. All types here implement JSON Schema
//! generation for external consumption.

pub mod group;


pub use group::*;
