pub mod chunk;
pub mod error;
pub mod listener;
pub mod partition;
pub mod state_manager;
