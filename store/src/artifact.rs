//! Photo artifact naming.
//!
//! Artifact filenames are generated server-side as
//! `photo-{epoch_millis}-{9-char token}.{ext}` so that concurrent writers
//! never collide and orphaned files remain findable by the `photo-` prefix.
//! Caller-supplied filenames are never used as path components; only the
//! extension survives, and only from a fixed allowlist.

use geoproof_types::TimestampMillis;
use rand::Rng;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate an uppercased base-36 token of the given length.
pub fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Extensions accepted for uploaded photos.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Prefix shared by all generated artifact filenames.
pub const ARTIFACT_PREFIX: &str = "photo-";

/// Build a unique artifact filename from a pre-generated random token and a
/// sanitized extension.
pub fn artifact_filename(token: &str, extension: &str) -> String {
    format!(
        "{}{}-{}.{}",
        ARTIFACT_PREFIX,
        TimestampMillis::now().as_millis(),
        token,
        extension
    )
}

/// Extract the lowercase extension from a caller-supplied filename, if it is
/// on the allowlist. Everything else about the name is discarded.
pub fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext = original_name.rsplit('.').next()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Whether a requested artifact name is safe to resolve within the managed
/// storage area. Rejects empty names, path separators, and parent-directory
/// components.
pub fn is_safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allowlist() {
        assert_eq!(sanitized_extension("me.JPG"), Some("jpg".into()));
        assert_eq!(sanitized_extension("a.b.png"), Some("png".into()));
        assert_eq!(sanitized_extension("evil.exe"), None);
        assert_eq!(sanitized_extension("noext"), None);
    }

    #[test]
    fn traversal_names_rejected() {
        assert!(!is_safe_artifact_name("../secrets.txt"));
        assert!(!is_safe_artifact_name("a/../../b.jpg"));
        assert!(!is_safe_artifact_name("dir/photo.jpg"));
        assert!(!is_safe_artifact_name("c:\\windows\\x.png"));
        assert!(!is_safe_artifact_name(".hidden"));
        assert!(!is_safe_artifact_name(""));
        assert!(is_safe_artifact_name("photo-1700000000000-ABC123XYZ.jpg"));
    }

    #[test]
    fn random_token_shape() {
        let token = random_token(9);
        assert_eq!(token.len(), 9);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_names_carry_prefix_and_extension() {
        let name = artifact_filename("ABC123XYZ", "png");
        assert!(name.starts_with(ARTIFACT_PREFIX));
        assert!(name.ends_with("-ABC123XYZ.png"));
        assert!(is_safe_artifact_name(&name));
    }
}
