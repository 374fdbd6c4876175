use std::{fmt, result::Result as StdResult, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{self, Result};

/// Unescape a single JSON-Pointer segment. `~1` must be handled before `~0`
/// so that `~01` decodes to `~1`.
fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escape a single segment for display.
fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// A slash-delimited path into a surface's data model.
///
/// Segments are object keys or array indices. The root path is written `/`.
/// Empty segments are ignored, so `"/a//b/"` and `"a/b"` name the same
/// location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataPath {
    /// Stored, unescaped path segments.
    segments: Vec<String>,
}

impl FromStr for DataPath {
    type Err = error::Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| escape(s)).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

impl DataPath {
    /// The root path, naming the whole data model.
    pub fn root() -> Self {
        Self { segments: vec![] }
    }

    /// Construct a path from unescaped segments.
    pub fn new<I>(v: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            segments: v
                .into_iter()
                .map(|x| x.as_ref().to_string())
                .filter(|x| !x.is_empty())
                .collect(),
        }
    }

    /// True if this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The unescaped segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Return a new path with one more segment appended.
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        if !segment.as_ref().is_empty() {
            segments.push(segment.as_ref().to_string());
        }
        Self { segments }
    }

    /// Split into the parent path and the final segment. Returns None for the
    /// root path.
    pub fn split_last(&self) -> Option<(Self, &str)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            Self {
                segments: parent.to_vec(),
            },
            last.as_str(),
        ))
    }
}

impl From<&str> for DataPath {
    fn from(v: &str) -> Self {
        Self {
            segments: v
                .split('/')
                .filter_map(|x| {
                    if x.is_empty() {
                        None
                    } else {
                        Some(unescape(x))
                    }
                })
                .collect(),
        }
    }
}

impl From<String> for DataPath {
    fn from(v: String) -> Self {
        Self::from(v.as_str())
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> StdResult<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw))
    }
}
