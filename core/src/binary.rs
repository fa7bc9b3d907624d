//! Binary detection: a three-stage cascade that errs on the side of
//! excluding content the dump cannot represent.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BINARY_CHECK_CHUNK_SIZE: u64 = 8 * 1024;
const PRINTABLE_RATIO_THRESHOLD: f64 = 0.85;

/// Application MIME types that carry text. `mime_guess` reports these for
/// extensions like `.json` or `.sh` that must stay in the dump.
static APPLICATION_TEXT_MIMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "application/json",
        "application/xml",
        "application/xhtml+xml",
        "application/rtf",
        "application/atom+xml",
        "application/rss+xml",
        "application/x-yaml",
        "application/x-www-form-urlencoded",
        "application/javascript",
        "application/ecmascript",
        "application/sql",
        "application/graphql",
        "application/ld+json",
        "application/csv",
    ])
});

/// Classify a file as binary (excluded from output) or text.
///
/// 1. MIME guess from the filename: `text/*` or a known text-shaped
///    application type is text; any other guessed type is binary.
/// 2. Otherwise read the first 8 KiB; a NUL byte means binary.
/// 3. Otherwise require at least 85% printable-ASCII-or-whitespace bytes in
///    that chunk.
///
/// Read errors classify as binary so unreadable files never reach the
/// processor.
pub fn is_binary(path: &Path) -> bool {
    if let Some(mime) = mime_guess::from_path(path).first() {
        if mime.type_() == mime_guess::mime::TEXT {
            return false;
        }
        if APPLICATION_TEXT_MIMES.contains(mime.essence_str()) {
            return false;
        }
        log::trace!(
            "{}: guessed MIME {} is not text",
            path.display(),
            mime.essence_str()
        );
        return true;
    }

    let chunk = match read_chunk(path) {
        Ok(chunk) => chunk,
        Err(err) => {
            log::debug!(
                "{}: read failed during binary check ({}), treating as binary",
                path.display(),
                err
            );
            return true;
        }
    };

    if chunk.contains(&0) {
        return true;
    }

    printable_ratio(&chunk) < PRINTABLE_RATIO_THRESHOLD
}

fn read_chunk(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(BINARY_CHECK_CHUNK_SIZE as usize);
    File::open(path)?
        .take(BINARY_CHECK_CHUNK_SIZE)
        .read_to_end(&mut chunk)?;
    Ok(chunk)
}

/// Fraction of bytes that are printable ASCII or standard whitespace. An
/// empty chunk scores zero: empty files carry no context.
fn printable_ratio(chunk: &[u8]) -> f64 {
    if chunk.is_empty() {
        return 0.0;
    }
    let printable = chunk
        .iter()
        .filter(|&&b| matches!(b, 0x20..=0x7e | b'\t' | b'\n' | b'\r'))
        .count();
    printable as f64 / chunk.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn text_mime_is_decisive_without_reading() {
        let dir = tempdir().unwrap();
        // NUL bytes inside, but the .py extension already answers.
        let path = write_file(dir.path(), "a.py", b"print(1)\x00\x00");
        assert!(!is_binary(&path));
    }

    #[test]
    fn known_application_text_types_stay_text() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "data.json", b"{\"k\": 1}");
        assert!(!is_binary(&path));
    }

    #[test]
    fn non_text_mime_is_binary() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "img.png", b"not really a png");
        assert!(is_binary(&path));
    }

    #[test]
    fn nul_byte_means_binary() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "blob", b"hello\x00world");
        assert!(is_binary(&path));
    }

    #[test]
    fn mostly_printable_unknown_extension_is_text() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "LICENSE-ish", b"permission is hereby granted\n");
        assert!(!is_binary(&path));
    }

    #[test]
    fn low_printable_ratio_is_binary() {
        let dir = tempdir().unwrap();
        let mut bytes = vec![0x01u8; 600];
        bytes.extend_from_slice(&[b'a'; 400]);
        let path = write_file(dir.path(), "noise", &bytes);
        assert!(is_binary(&path));
    }

    #[test]
    fn empty_file_with_unknown_extension_is_binary() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "empty", b"");
        assert!(is_binary(&path));
    }

    #[test]
    fn unreadable_file_is_binary() {
        let dir = tempdir().unwrap();
        assert!(is_binary(&dir.path().join("missing-with-no-extension")));
    }

    #[test]
    fn ratio_threshold_is_inclusive_of_text() {
        assert!(printable_ratio(b"plain ascii text") > PRINTABLE_RATIO_THRESHOLD);
        assert_eq!(printable_ratio(b""), 0.0);
    }
}
