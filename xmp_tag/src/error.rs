//! Errors that stop a tag from rendering.
//!
//! Only template-authoring mistakes end up here. Anything wrong with the
//! image itself (an unknown container, truncated data, unreadable XMP, a
//! missing property) renders as an empty string instead.

use std::{path::PathBuf, sync::Arc};

use crate::markup::MarkupError;

/// An error that's fatal to rendering an `xmp` tag.
#[derive(Clone, Debug)]
pub enum TagError {
    /// The markup was malformed or missing required parameters.
    Markup(MarkupError),

    /// `file_path` didn't lead to a readable regular file.
    FileAccess {
        /// The path, after being resolved against the source directory.
        path: PathBuf,

        /// The I/O error behind this, if there was one.
        ///
        /// Paths that exist but aren't regular files have no I/O error.
        source: Option<Arc<std::io::Error>>,
    },
}

impl core::fmt::Display for TagError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TagError::Markup(e) => write!(f, "{e}"),
            TagError::FileAccess { path, source } => {
                write!(f, "Could not locate file {}", path.display())?;
                if let Some(e) = source {
                    write!(f, " (err: {e})")?;
                }
                Ok(())
            }
        }
    }
}

impl core::error::Error for TagError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TagError::Markup(e) => Some(e),
            TagError::FileAccess { source, .. } => source
                .as_deref()
                .map(|e| e as &(dyn core::error::Error + 'static)),
        }
    }
}

impl From<MarkupError> for TagError {
    fn from(value: MarkupError) -> Self {
        TagError::Markup(value)
    }
}
