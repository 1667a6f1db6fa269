//! Team rosters and the visibility they grant.

mod roster;
mod visibility;

pub use roster::*;
pub use visibility::*;
