pub mod errors;
pub mod executor;
pub mod merger;
pub mod pipeline;
pub mod sort;
pub mod stage;
pub mod types;

pub use errors::*;
