pub mod config;
pub mod engine;


pub use config::*;
pub use engine::*;
