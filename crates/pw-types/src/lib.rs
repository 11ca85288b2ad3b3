pub mod config;
pub mod distribution;
pub mod errors;

pub use config::*;
pub use distribution::*;
pub use errors::*;
