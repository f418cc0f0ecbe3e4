use thiserror::Error;

/// Errors raised while turning font bytes into a usable [`FontHandle`](crate::font::FontHandle).
#[derive(Debug, Error)]
pub enum FontError {
    /// The bytes are not a font `ttf-parser` understands.
    #[error("font parse error: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
    /// The font database accepted the data but reported no face in it.
    #[error("no font face found in data for `{0}`")]
    NoFace(String),
}

/// Errors raised while fetching font bytes for a URL.
///
/// A fetch failure only affects the URL it was raised for; the frame that
/// asked for it keeps going with whatever fonts did resolve.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid font url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("failed to read `{url}`: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while decoding host messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}
