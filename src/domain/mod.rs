pub mod claim;
pub mod coerce;
pub mod position;

pub use claim::*;
pub use position::*;
