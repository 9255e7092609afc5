pub mod connectors;
pub mod context;
pub mod error;
pub mod metrics;
pub mod state;
