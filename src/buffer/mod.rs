pub mod cache;
pub mod engine;
pub mod error;
pub mod ticker;

pub use cache::ShipCache;
pub use engine::BatchEngine;
pub use error::EngineError;
pub use ticker::FlushTicker;
