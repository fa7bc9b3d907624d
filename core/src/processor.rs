//! Rendering of individual included files: decoding, fenced content blocks,
//! list-mode lines.

use std::fs;
use std::path::{Path, PathBuf};

/// An included item, ready for rendering. `rel_path` is relative to the
/// project root and uses forward slashes.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub size: u64,
}

impl EntryRecord {
    pub fn new(abs_path: PathBuf, project_root: &Path, size: u64) -> Self {
        let rel_path = root_relative(&abs_path, project_root);
        EntryRecord {
            abs_path,
            rel_path,
            size,
        }
    }
}

/// Result of processing one entry. `content_bytes` is what the entry adds to
/// the aggregate budget: the raw file size in content mode, zero in list
/// mode.
#[derive(Debug)]
pub enum ProcessOutcome {
    Rendered { text: String, content_bytes: u64 },
    Skipped { note: Option<String> },
}

/// Render one entry. Unreadable files are skipped, never fatal; the note is
/// only produced in debug mode and stands in for the file in the stream.
pub fn process_entry(
    record: &EntryRecord,
    list_only: bool,
    include_sizes: bool,
    debug_explain: bool,
) -> ProcessOutcome {
    if list_only {
        let text = if include_sizes {
            format!("{}\t{}", record.size, record.rel_path)
        } else {
            record.rel_path.clone()
        };
        return ProcessOutcome::Rendered {
            text,
            content_bytes: 0,
        };
    }

    let bytes = match fs::read(&record.abs_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Could not read {}: {}", record.abs_path.display(), err);
            let note = debug_explain
                .then(|| format!("[skipped unreadable file: {} ({})]", record.rel_path, err));
            return ProcessOutcome::Skipped { note };
        }
    };

    let content_bytes = bytes.len() as u64;
    let content = decode_text(bytes);
    ProcessOutcome::Rendered {
        text: render_block(&record.rel_path, &content),
        content_bytes,
    }
}

/// Decode UTF-8 first, falling back to Latin-1. Latin-1 maps every byte, so
/// the decoding chain cannot fail and the Windows-1252 step never fires.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err
            .into_bytes()
            .iter()
            .map(|&b| char::from(b))
            .collect(),
    }
}

/// One fenced block. The closing fence sits on its own line; a newline is
/// inserted only when the content does not already end with one, so adjacent
/// blocks stay separated by exactly one blank line once joined.
fn render_block(rel_path: &str, content: &str) -> String {
    let newline = if content.is_empty() || content.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    format!("```path={rel_path}\n{content}{newline}```")
}

/// Forward-slash path of `path` relative to `root`. Falls back to the
/// absolute path when the two share no prefix.
pub fn root_relative(path: &Path, root: &Path) -> String {
    let rel = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn block_has_path_header_and_fences() {
        let block = render_block("src/app.py", "print(1)\n");
        assert_eq!(block, "```path=src/app.py\nprint(1)\n```");
    }

    #[test]
    fn block_gains_newline_when_content_lacks_one() {
        let block = render_block("a.txt", "no trailing newline");
        assert_eq!(block, "```path=a.txt\nno trailing newline\n```");
    }

    #[test]
    fn decode_prefers_utf8() {
        assert_eq!(decode_text("héllo".as_bytes().to_vec()), "héllo");
    }

    #[test]
    fn decode_falls_back_to_latin1() {
        // 0xe9 is 'é' in Latin-1 but invalid as a lone UTF-8 byte.
        assert_eq!(decode_text(vec![b'c', b'a', b'f', 0xe9]), "café");
    }

    #[test]
    fn list_mode_emits_path_only() {
        let dir = tempdir().unwrap();
        let record = EntryRecord {
            abs_path: dir.path().join("a.py"),
            rel_path: "a.py".to_string(),
            size: 42,
        };
        match process_entry(&record, true, false, false) {
            ProcessOutcome::Rendered {
                text,
                content_bytes,
            } => {
                assert_eq!(text, "a.py");
                assert_eq!(content_bytes, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn list_mode_with_sizes_prefixes_a_tab_field() {
        let record = EntryRecord {
            abs_path: PathBuf::from("/nowhere/a.py"),
            rel_path: "a.py".to_string(),
            size: 42,
        };
        match process_entry(&record, true, true, false) {
            ProcessOutcome::Rendered { text, .. } => assert_eq!(text, "42\ta.py"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn content_mode_counts_raw_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"hello\n").unwrap();
        let record = EntryRecord::new(path, dir.path(), 6);
        match process_entry(&record, false, false, false) {
            ProcessOutcome::Rendered {
                text,
                content_bytes,
            } => {
                assert_eq!(content_bytes, 6);
                assert_eq!(text, "```path=a.txt\nhello\n```");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_is_skipped_with_note_only_in_debug() {
        let record = EntryRecord {
            abs_path: PathBuf::from("/nonexistent/definitely/missing.txt"),
            rel_path: "missing.txt".to_string(),
            size: 0,
        };
        match process_entry(&record, false, false, false) {
            ProcessOutcome::Skipped { note } => assert!(note.is_none()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match process_entry(&record, false, false, true) {
            ProcessOutcome::Skipped { note } => {
                assert!(note.unwrap().contains("missing.txt"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn root_relative_uses_forward_slashes() {
        let rel = root_relative(
            Path::new("/proj/src/deep/mod.rs"),
            Path::new("/proj"),
        );
        assert_eq!(rel, "src/deep/mod.rs");
    }
}
