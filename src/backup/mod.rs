pub mod backup_config;
pub mod encode;
pub mod finish;
pub mod manifest;
pub mod result_error;
pub mod run_log;
pub mod schedule;
pub mod service;
pub mod task;
pub mod validate;
