//! Search engine module
//!
//! Defines the EngineAdapter trait and provides an ordered registry of the
//! configured engines.

mod loader;
mod registry;
mod traits;

// Engine implementations
pub mod baidu;
pub mod bing;
pub mod google;
pub mod searx;
pub mod yandex;

pub use loader::EngineLoader;
pub use registry::{EngineRegistry, RegisteredEngine};
pub use traits::*;
