pub mod generator;
pub mod probability;


pub use generator::*;
pub use probability::*;
