pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod platform;
pub mod validation;
pub mod vault;
