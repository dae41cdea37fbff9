//! Splits a multi-file diff into per-file segments on `diff --git` headers.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::DiffSegment;

// Either side may be C-quoted (`"a/caf\303\251.md"`) when git's
// `core.quotePath` kicks in for non-ASCII or control characters.
static DIFF_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^diff --git (?:"a/(?:[^"\\]|\\.)*"|a/.*?) (?:"b/((?:[^"\\]|\\.)*)"|b/(.*))$"#)
        .expect("valid diff header regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct FilePartitioner;

impl FilePartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Partition `diff` into segments. Total over its input: text without any
    /// header comes back as one segment with an empty path.
    pub fn partition(&self, diff: &str) -> Vec<DiffSegment> {
        let mut segments = Vec::new();
        let mut current: Option<DiffSegment> = None;
        let mut preamble = String::new();

        for line in diff.split_inclusive('\n') {
            if let Some(path) = header_path(line) {
                if let Some(done) = current.take() {
                    segments.push(done);
                }
                // Leading preamble is only ever non-empty before the first header.
                let mut content = std::mem::take(&mut preamble);
                content.push_str(line);
                current = Some(DiffSegment::new(path, content));
            } else if let Some(segment) = current.as_mut() {
                segment.content.push_str(line);
            } else {
                preamble.push_str(line);
            }
        }

        match current {
            Some(last) => segments.push(last),
            None => {
                tracing::debug!("No file headers found, treating diff as a single segment");
                segments.push(DiffSegment::new(String::new(), preamble));
            }
        }

        segments
    }
}

/// Path on the `b/` side of a `diff --git` header line. Quoted paths are
/// unescaped.
pub fn header_path(line: &str) -> Option<String> {
    let line = line.trim_end_matches(['\n', '\r']);
    let caps = DIFF_HEADER_RE.captures(line)?;
    match (caps.get(1), caps.get(2)) {
        (Some(quoted), _) => Some(unquote_path(quoted.as_str())),
        (None, Some(plain)) => Some(plain.as_str().to_string()),
        (None, None) => None,
    }
}

/// Undo git's C-style quoting: `\"`, `\\`, the usual letter escapes and
/// three-digit octal bytes, which together spell out UTF-8.
fn unquote_path(escaped: &str) -> String {
    let mut out = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.bytes().peekable();

    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match bytes.peek() {
                        Some(&n @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(n - b'0');
                            bytes.next();
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            Some(b'a') => out.push(0x07),
            Some(b'b') => out.push(0x08),
            Some(b't') => out.push(b'\t'),
            Some(b'n') => out.push(b'\n'),
            Some(b'v') => out.push(0x0b),
            Some(b'f') => out.push(0x0c),
            Some(b'r') => out.push(b'\r'),
            Some(other) => out.push(other),
            None => out.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
