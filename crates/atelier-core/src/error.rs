//! Error handling for Atelier
//!
//! Error families follow the layers of the editor core:
//! - Layer errors (element model and layer stack mutations)
//! - Decode errors (image payloads feeding the compositor)
//! - Mesh load errors (product models in the 3D viewport)
//! - Viewport errors (viewport lifecycle misuse)
//! - Persistence errors (external design store)
//! - Upload errors (user supplied image files)
//!
//! All error types use `thiserror` and carry owned, cloneable context so they can
//! travel through the event bus unchanged.

use thiserror::Error;

/// Layer stack error type
///
/// Raised by element mutations. None of these are fatal to an editor session;
/// the stack is left exactly as it was before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// No element with this identifier exists in the stack
    #[error("Element not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// An element with this identifier is already present
    #[error("Duplicate element identifier: {id}")]
    DuplicateIdentifier {
        /// The colliding identifier.
        id: String,
    },

    /// The patch touches a field the element's variant does not have
    #[error("Field '{field}' does not apply to {kind} elements")]
    TypeMismatch {
        /// The offending attribute name.
        field: String,
        /// The element variant that rejected it.
        kind: String,
    },

    /// Pointer manipulation attempted on a locked element
    #[error("Element {id} is locked")]
    ElementLocked {
        /// The locked element's identifier.
        id: String,
    },

    /// An attribute value is outside its valid domain
    #[error("Invalid value for '{field}': {reason}")]
    InvalidAttribute {
        /// The attribute name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Image decode error type
///
/// A decode failure only removes the affected element from the raster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is neither a data URI nor a local reference
    #[error("Unsupported image payload: {reason}")]
    UnsupportedPayload {
        /// Description of the payload shape.
        reason: String,
    },

    /// The data URI header is malformed
    #[error("Malformed data URI: {reason}")]
    InvalidDataUri {
        /// What was wrong with the header.
        reason: String,
    },

    /// The base64 body could not be decoded
    #[error("Invalid base64 payload: {reason}")]
    Base64 {
        /// Decoder message.
        reason: String,
    },

    /// The bytes are not an image format we can rasterize
    #[error("Image decode failed: {reason}")]
    Image {
        /// Decoder message.
        reason: String,
    },

    /// A local reference could not be read
    #[error("Failed to read {path}: {reason}")]
    Io {
        /// The path that was read.
        path: String,
        /// The I/O error message.
        reason: String,
    },

    /// Network references are never fetched by the core
    #[error("Remote image references are not fetched: {url}")]
    RemoteReference {
        /// The rejected URL.
        url: String,
    },
}

/// Mesh loading error type
///
/// Always recovered by the viewport through a placeholder primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshLoadError {
    /// The model file could not be opened
    #[error("Failed to open model {path}: {reason}")]
    Io {
        /// The model path.
        path: String,
        /// The I/O error message.
        reason: String,
    },

    /// The model file is not valid for its format
    #[error("Failed to parse model {path}: {reason}")]
    Parse {
        /// The model path.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The model parsed but contains no triangles
    #[error("Model {path} contains no geometry")]
    EmptyMesh {
        /// The model path.
        path: String,
    },

    /// The model format is not supported
    #[error("Unsupported model format: {path}")]
    UnsupportedFormat {
        /// The model path.
        path: String,
    },
}

/// Viewport lifecycle error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewportError {
    /// Invalid state transition
    #[error("Invalid viewport transition from {current} to {requested}")]
    InvalidStateTransition {
        /// The current state name.
        current: String,
        /// The requested state name.
        requested: String,
    },

    /// The viewport has been disposed and holds no resources
    #[error("Viewport has been disposed")]
    Disposed,

    /// The render backend reported a failure
    #[error("Render backend error: {reason}")]
    Backend {
        /// Backend message.
        reason: String,
    },
}

/// Persistence error type
///
/// The in-memory design is never touched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Storage I/O failed
    #[error("Storage I/O error: {reason}")]
    Io {
        /// The I/O error message.
        reason: String,
    },

    /// The document could not be serialized or deserialized
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Serializer message.
        reason: String,
    },

    /// No stored design with this identifier
    #[error("Design not found: {id}")]
    NotFound {
        /// The design identifier.
        id: String,
    },

    /// The user session is not valid for saving
    #[error("User session is not authenticated")]
    Unauthenticated,

    /// The store refused the document
    #[error("Store rejected the design: {reason}")]
    Rejected {
        /// Store message.
        reason: String,
    },
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Image upload validation error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The file is not an image
    #[error("Not an image file: {mime}")]
    NotAnImage {
        /// The rejected MIME type.
        mime: String,
    },

    /// The file exceeds the upload limit
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge {
        /// Size of the upload in bytes.
        size: usize,
        /// Configured limit in bytes.
        max: usize,
    },
}

/// Main error type for Atelier
///
/// Unifies every error family of the editor core.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Layer stack error
    #[error(transparent)]
    Layer(#[from] LayerError),

    /// Image decode error
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Mesh load error
    #[error(transparent)]
    MeshLoad(#[from] MeshLoadError),

    /// Viewport error
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    /// Persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Upload error
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error refers to a missing element or design
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Layer(LayerError::NotFound { .. })
                | Error::Persistence(PersistenceError::NotFound { .. })
        )
    }

    /// Check if this is a layer stack error
    pub fn is_layer_error(&self) -> bool {
        matches!(self, Error::Layer(_))
    }

    /// Check if this is a persistence error
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }

    /// Check if this error is recovered locally rather than surfaced to the user
    pub fn is_recoverable_locally(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::MeshLoad(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
