use thiserror::Error;

/// Terminal outcomes that abort a comparison.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("image not loaded: {0}")]
    ImageNotLoaded(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to diff: {0}")]
    FailedToDiff(String),

    #[error("out of memory: cannot allocate {bytes} bytes for the diff image")]
    OutOfMemory { bytes: usize },

    #[error("invalid hex color: {0:?}")]
    InvalidHexColor(String),
}

impl DiffError {
    /// Stable numeric code shared with the C binding layer (0 is success).
    pub fn code(&self) -> i32 {
        match self {
            Self::ImageNotLoaded(_) => 1,
            Self::UnsupportedFormat(_) => 2,
            Self::FailedToDiff(_) => 3,
            Self::OutOfMemory { .. } => 4,
            Self::InvalidHexColor(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_binding_contract() {
        assert_eq!(DiffError::ImageNotLoaded("a".into()).code(), 1);
        assert_eq!(DiffError::UnsupportedFormat("a".into()).code(), 2);
        assert_eq!(DiffError::FailedToDiff("a".into()).code(), 3);
        assert_eq!(DiffError::OutOfMemory { bytes: 4 }.code(), 4);
        assert_eq!(DiffError::InvalidHexColor("a".into()).code(), 5);
    }

    #[test]
    fn display_includes_detail() {
        let e = DiffError::InvalidHexColor("#zz0000".into());
        assert_eq!(e.to_string(), "invalid hex color: \"#zz0000\"");
    }
}
