//! Generation - floor plans and arriving customer groups

mod floor;
mod groups;

pub use floor::*;
pub use groups::*;
