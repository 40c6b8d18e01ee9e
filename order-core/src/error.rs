use thiserror::Error;

use crate::model::PartId;

/// Export or submission attempted on an order that is not finished.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The session holds no parts.
    #[error("order has no parts")]
    EmptySession,

    /// Rows (1-based) missing a color or a name.
    #[error("color and name are required for rows {rows:?}")]
    Incomplete { rows: Vec<usize> },

    /// Submission without a customer identifier.
    #[error("customer name is required")]
    MissingCustomer,

    /// Submission without the original drawing.
    #[error("the uploaded drawing is required")]
    MissingFile,
}

/// A merge that could not be carried out. The session is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Compositing needs at least two parts.
    #[error("merge needs at least two parts")]
    TooFewParts,

    /// A part to merge carries no global preview.
    #[error("part {id} has no global preview")]
    MissingPreview { id: PartId },

    /// A global preview could not be decoded.
    #[error("preview of part {id} failed to decode: {reason}")]
    Decode { id: PartId, reason: String },

    /// The composite canvas could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// The composite could not be encoded.
    #[error("composite encoding failed: {0}")]
    Encode(String),
}

/// The pricing authority failed or answered with something unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The request never produced an answer.
    #[error("price lookup failed: {0}")]
    Transport(String),

    /// The answer was not a usable price.
    #[error("malformed price response: {0}")]
    Malformed(String),

    /// Width or height could not be determined.
    #[error("width and height are required (got {width}x{height})")]
    MissingDimensions { width: u32, height: u32 },
}

/// The analyzer answered with something other than a list of parts.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The top-level value is not an array.
    #[error("analysis result is not a list")]
    NotAList,

    /// The body is not valid JSON or an element has the wrong shape.
    #[error("analysis result is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// An element has unusable geometry.
    #[error("part {index} has invalid geometry: {reason}")]
    InvalidGeometry { index: usize, reason: String },
}

/// Any failure surfaced by an order session.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("unknown part {0}")]
    UnknownPart(PartId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
