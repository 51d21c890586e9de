pub mod client;
pub mod config;
pub mod error;
pub mod explorer;
pub mod implementations;
pub mod layers;
pub mod types;
