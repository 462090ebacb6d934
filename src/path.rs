//! Path normalization and query escaping.

use std::fmt;

use percent_encoding::percent_decode_str;

/// A normalized absolute drive path.
///
/// Cache keys are built from the segments as written (repeated separators
/// collapsed, single leading and trailing slash); names sent to the API are
/// percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrivePath {
    segments: Vec<String>,
}

impl DrivePath {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Cache key of the whole path.
    pub fn key(&self) -> String {
        self.prefix_key(self.segments.len())
    }

    /// Cache key of the first `depth` segments.
    pub fn prefix_key(&self, depth: usize) -> String {
        let mut key = String::from("/");
        for segment in &self.segments[..depth] {
            key.push_str(segment);
            key.push('/');
        }
        key
    }

    /// Decoded name of the segment at `index`.
    pub fn name(&self, index: usize) -> String {
        percent_decode_str(&self.segments[index])
            .decode_utf8_lossy()
            .into_owned()
    }
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Escape a value for interpolation inside a single-quoted query literal.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
