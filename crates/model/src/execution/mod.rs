pub mod checkpoint;
pub mod errors;
pub mod job;
pub mod parameters;
pub mod partition;
pub mod status;
pub mod step;
