use thiserror::Error;

/// Errors surfaced at the helper's boundaries.
///
/// The uniform parser itself is deliberately permissive and never fails;
/// everything here comes from construction, geometry selection, shader
/// validation, or the audio/config edges.
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("invalid canvas binding: {0}")]
    Canvas(String),

    #[error("unsupported geometry '{requested}', the options are {options}")]
    Geometry { requested: String, options: String },

    #[error("shader validation failed: {0}")]
    Validation(String),

    #[error("no shader slot at index {0}")]
    Slot(usize),

    #[error("audio engine error: {0}")]
    Audio(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
