pub mod reference;
pub mod transform;

pub use reference::read_reference_dataset;
pub use transform::{transform, CleanBatch};
