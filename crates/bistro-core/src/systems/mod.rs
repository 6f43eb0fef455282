//! Systems - logic that operates on components

mod assignment;
mod economy;
mod lifecycle;
mod movement;

pub use assignment::*;
pub use economy::*;
pub use lifecycle::*;
pub use movement::*;
