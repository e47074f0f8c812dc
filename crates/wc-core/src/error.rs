use crate::types::TimeOfDayError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlarmError {
    #[error(transparent)]
    InvalidTime(#[from] TimeOfDayError),
    #[error("alarm not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no challenges available")]
    Empty,
    #[error("challenge not found: {name}")]
    NotFound { name: String },
    #[error("cannot read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("invalid challenge {name}: {message}")]
    InvalidDefinition { name: String, message: String },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("invalid config: {message}")]
    Parse { message: String },
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum WakeError {
    #[error(transparent)]
    Alarm(#[from] AlarmError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}
