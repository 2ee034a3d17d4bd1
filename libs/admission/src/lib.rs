pub mod config;
pub mod cronjob;
pub mod error;
pub mod mutate;
pub mod policy;
pub mod resource;
pub mod review;
pub mod telemetry;
