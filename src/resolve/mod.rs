//! Resolution of engine and weather inputs against session state

pub mod engine;
pub mod weather;

pub use engine::{EngineSelection, ExecutableResolver};
pub use weather::WeatherResolver;
