pub mod chunk;
pub mod record;
