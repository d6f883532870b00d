pub mod client;
pub mod sentiment;


pub use client::*;
pub use sentiment::*;
