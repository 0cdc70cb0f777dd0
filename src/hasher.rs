use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io;
use std::path::Path;

/// Hex-encoded MD5 of a file's contents.
///
/// The file is streamed through the hasher, so large files are never held in memory.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(hex::encode(hasher.finalize()))
}

/// Hex-encoded MD5 of an in-memory buffer.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        assert_eq!(fingerprint_bytes(b"hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fingerprint_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_file_matches_buffer() {
        let mut file = NamedTempFile::new().unwrap();
        let content = vec![b'x'; 200_000];
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        assert_eq!(
            fingerprint_file(file.path()).unwrap(),
            fingerprint_bytes(&content)
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = fingerprint_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
