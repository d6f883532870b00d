pub mod conditions;
pub mod engine;

#[cfg(test)]
mod engine_tests;

pub use conditions::*;
pub use engine::*;
