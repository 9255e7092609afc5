pub mod job_validator;
