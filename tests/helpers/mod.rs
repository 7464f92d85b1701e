pub mod factories;
pub mod factory;
pub mod scripted_executor;
pub mod scripted_source;

pub use factory::Factory;
pub use scripted_executor::{ReleaseGate, ScriptedExecutor};
pub use scripted_source::ScriptedSource;
