//! Bistro Core - Restaurant Floor Simulation Engine
//!
//! An ECS-based simulation of a restaurant floor: customer groups arrive on a
//! timer, wait in line, get matched to tables under capacity and preference
//! constraints, eat, pay, and leave. The player purchases table listings to
//! grow seating capacity and complete the level.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: customer groups, individual party members, tables, listings
//! - **Components**: Pure data attached to entities (Position, Group, Table, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! # Example
//!
//! ```rust,no_run
//! use bistro_core::prelude::*;
//! use bistro_core::config::SimConfig;
//! use bistro_core::generation::FloorConfig;
//! use bistro_core::persistence::MemoryStore;
//!
//! let mut sim = Simulation::new(
//!     SimConfig::default(),
//!     FloorConfig::default(),
//!     Box::new(MemoryStore::new()),
//! ).expect("default configs validate");
//!
//! // Run simulation
//! loop {
//!     sim.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{SceneTransition, Simulation};
}
