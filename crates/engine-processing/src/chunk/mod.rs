pub mod config;
pub mod guard;
pub mod processor;
pub mod state;
