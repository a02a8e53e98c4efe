//! Photo artifact reference.

use serde::{Deserialize, Serialize};

/// Where the photo bytes for a record live.
///
/// File-backed stores keep the artifact as a uniquely named file under a
/// managed uploads directory and record only the filename. Inline stores
/// encode the bytes as base64 directly in the record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoRef {
    /// Filename (not a full path) within the managed uploads directory.
    File { filename: String },
    /// Base64-encoded photo bytes stored inline with the record.
    Inline { data: String },
}

impl PhotoRef {
    /// The filename for file-backed artifacts, `None` for inline blobs.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::File { filename } => Some(filename),
            Self::Inline { .. } => None,
        }
    }

    /// Whether the reference carries no artifact at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::File { filename } => filename.is_empty(),
            Self::Inline { data } => data.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_only_for_file_refs() {
        let file = PhotoRef::File {
            filename: "photo-1-ABC.jpg".into(),
        };
        assert_eq!(file.filename(), Some("photo-1-ABC.jpg"));

        let inline = PhotoRef::Inline { data: "aGk=".into() };
        assert_eq!(inline.filename(), None);
    }

    #[test]
    fn empty_refs_detected() {
        assert!(PhotoRef::File { filename: String::new() }.is_empty());
        assert!(PhotoRef::Inline { data: String::new() }.is_empty());
        assert!(!PhotoRef::Inline { data: "aGk=".into() }.is_empty());
    }
}
