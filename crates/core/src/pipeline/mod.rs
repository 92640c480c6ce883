pub mod infrastructure;
pub mod job_stage;
pub mod morph_settings;
pub mod pipeline_logger;
pub mod transcode_job;
