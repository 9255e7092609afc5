pub mod file;
pub mod resource;
pub mod sink;
pub mod source;
