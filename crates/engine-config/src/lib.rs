pub mod error;
pub mod registry;
pub mod settings;
pub mod substitution;
pub mod validation;
