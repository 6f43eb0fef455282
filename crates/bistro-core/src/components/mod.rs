//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod customers;
mod tables;

pub use common::*;
pub use customers::*;
pub use tables::*;
