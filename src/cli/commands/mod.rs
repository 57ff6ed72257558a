pub mod drift;
pub mod health;
pub mod predict;
pub mod schedule;

pub use drift::drift;
pub use health::health;
pub use predict::predict;
pub use schedule::schedule;
