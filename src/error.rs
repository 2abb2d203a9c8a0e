// Error Types - Failures surfaced by construction, loading and configuration
// Per-frame propagation never returns these; see PropagationOutcome instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("Eccentricity {0} is not elliptical (expected 0 <= e < 1)")]
    NonEllipticalOrbit(f64),
    #[error("Two-line record for '{name}' is missing line {line}")]
    MissingRecordLine { name: String, line: u8 },
    #[error("Failed to parse two-line record for '{name}': {reason}")]
    RecordParse { name: String, reason: String },
    #[error("Unknown body: {0}")]
    UnknownBody(String),
    #[error("Body '{child}' references unknown parent '{parent}'")]
    UnknownParent { child: String, parent: String },
    #[error("Body '{child}' has parent '{parent}' which itself orbits another body")]
    NestedParent { child: String, parent: String },
    #[error("Duplicate body id: {0}")]
    DuplicateBody(String),
    #[error("Catalog parse error: {0}")]
    Catalog(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Feed error: {0}")]
    Feed(String),
}
