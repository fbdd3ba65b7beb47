//! Error taxonomy for decoding and scanning

use std::path::PathBuf;

/// Errors produced while decoding gameval tables or loading settings.
///
/// "No match" conditions (unknown prefix, unknown key) are deliberately not
/// errors anywhere in this crate; they are expected outcomes and surface as
/// `None` or empty collections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `.dat` length or count field implies a read past the end of the
    /// stream, or a field holds a value the format cannot represent.
    #[error("malformed binary table at offset {offset}: {context}")]
    MalformedBinaryTable { offset: usize, context: String },

    /// A configured mapping directory does not exist or is not a directory.
    /// Reload logs and skips these; the variant exists for callers that probe
    /// a single directory explicitly.
    #[error("missing mapping directory: {0}")]
    MissingDirectory(PathBuf),

    /// The external settings file could not be read or parsed. Effective
    /// settings fall back to host-persisted state when this occurs.
    #[error("unparseable settings file {path}: {reason}")]
    SettingsParse { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(offset: usize, context: impl Into<String>) -> Self {
        Error::MalformedBinaryTable {
            offset,
            context: context.into(),
        }
    }
}
