//! Error types for the Almanac server.

use thiserror::Error;

/// Main error type for Almanac operations.
#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Storage-related errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Authentication and credential errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("No JWT secret configured (set auth.jwt_secret or ALMANAC_JWT_SECRET)")]
    MissingSecret,
}

/// Wall-clock time normalization errors.
#[derive(Error, Debug)]
pub enum TimeError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Local time does not exist in timezone: {0}")]
    NonexistentLocalTime(String),
}

/// Event lifecycle and conflict errors.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Time conflict")]
    TimeConflict,

    #[error("Forbidden")]
    Forbidden,

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("No calendar for user: {0}")]
    CalendarMissing(String),

    #[error("Event title must not be empty")]
    EmptyTitle,

    #[error("Event end must be after start")]
    InvalidRange,

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias for Almanac operations.
pub type Result<T, E = AlmanacError> = std::result::Result<T, E>;
