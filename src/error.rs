//! Error types for map loading, rendering and frame setup.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for map and tileset loading.
#[derive(Debug)]
pub enum MapError {
    /// A map, tileset or image file could not be read.
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A map or tileset file is not valid JSON or misses a required field.
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The map is structurally invalid (bad layer or chunk shape).
    InvalidMap(String),
    /// A tileset has unusable geometry.
    InvalidTileset {
        /// Tileset file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
    /// A cell references a GID that no tileset covers.
    InvalidTileGid {
        /// Name of the offending layer.
        layer: String,
        /// GID with flip flags stripped.
        gid: u32,
    },
    /// The tileset image could not be decoded.
    Image {
        /// Image file.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },
    /// Unsupported file format (non-JSON).
    UnsupportedFormat(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "Failed to parse JSON {}: {}", path.display(), source)
            }
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {}", msg),
            MapError::InvalidTileset { path, reason } => {
                write!(f, "Invalid tileset {}: {}", path.display(), reason)
            }
            MapError::InvalidTileGid { layer, gid } => write!(
                f,
                "Layer '{}' references GID {} which no tileset covers",
                layer, gid
            ),
            MapError::Image { path, reason } => {
                write!(f, "Failed to decode image {}: {}", path.display(), reason)
            }
            MapError::UnsupportedFormat(path) => write!(f, "Unsupported file format: {}", path),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error reported by a [`Renderer`](crate::render::Renderer) backend.
#[derive(Debug)]
pub enum RenderError {
    /// Shader compilation or program linkage failed.
    Shader {
        /// Program name as given in the program description.
        program: String,
        /// Compiler or linker log.
        log: String,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Shader { program, log } => {
                write!(f, "Shader program '{}' failed to build:\n{}", program, log)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Error raised while bringing the frame driver up.
#[derive(Debug)]
pub enum FrameError {
    /// Shader source could not be read.
    ShaderSource {
        /// Shader file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Map loading failed.
    Map(MapError),
    /// The renderer rejected a resource.
    Render(RenderError),
}

impl From<MapError> for FrameError {
    fn from(err: MapError) -> Self {
        FrameError::Map(err)
    }
}

impl From<RenderError> for FrameError {
    fn from(err: RenderError) -> Self {
        FrameError::Render(err)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ShaderSource { path, source } => {
                write!(f, "Reading shader {}: {}", path.display(), source)
            }
            FrameError::Map(err) => write!(f, "{}", err),
            FrameError::Render(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::ShaderSource { source, .. } => Some(source),
            FrameError::Map(err) => Some(err),
            FrameError::Render(err) => Some(err),
        }
    }
}
