//! Stagekit - kinematic assembly client, world-pose engine and reference server

pub mod commands;
pub mod config;

pub use config::{LogConfig, SourceConfig, StagekitConfig, DEFAULT_CONFIG_FILE};
