pub mod analyzer;
pub mod calibration;
pub mod config;
pub mod metrics;
pub mod phase;
pub mod pose;
pub mod protocol;
pub mod scoring;
pub mod tracker;
