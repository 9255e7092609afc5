pub mod encoding;
pub mod error;
pub mod mapping;
pub mod source;
