//! Error types for asset loading and game setup.
//!
//! Loading meshes, materials and textures is fatal when it fails: the board
//! cannot be drawn without them, so these errors bubble up to whoever builds
//! the [`MeshRegistry`](crate::data_structures::registry::MeshRegistry).
//! Placement failures are recoverable and have their own type.

use std::path::PathBuf;

/// Errors raised while reading mesh, material or texture resources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A record in a mesh or material file could not be understood.
    #[error("Parse error in {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A referenced file does not exist.
    #[error("Resource not found: {}", .path.display())]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure while reading a resource.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The texture file exists but could not be decoded.
    #[error("Failed to decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The texture decoded but the device rejected it.
    #[error("Failed to upload texture {}: {message}", .path.display())]
    Upload { path: PathBuf, message: String },
}

impl LoadError {
    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Maps an I/O error to `ResourceNotFound` when the file is missing.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::ResourceNotFound { path, source },
            _ => LoadError::Io { path, source },
        }
    }
}

/// Result type alias for resource loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Random worker placement gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("No free cell found after {attempts} random attempts")]
    Exhausted { attempts: usize },
}
