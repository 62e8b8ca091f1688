//! Addresses of locations inside a [`Node`](super::Node) tree

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One step of a path: a record field or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl Segment {
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

/// Ordered list of segments identifying a location in a tree.
///
/// Field names are opaque: they may contain `.` or `[`, which only matters
/// for the textual form. Paths handed out by the detector are owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first `len` segments as a new path.
    pub fn prefix(&self, len: usize) -> Path {
        Path::new(self.segments[..len.min(self.segments.len())].to_vec())
    }

    pub fn child(&self, segment: Segment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }

    pub fn field(&self, name: impl Into<String>) -> Path {
        self.child(Segment::Field(name.into()))
    }

    pub fn index(&self, index: usize) -> Path {
        self.child(Segment::Index(index))
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    /// Textual form with literal dots, brackets and backslashes in field names
    /// escaped, so it can be parsed back with [`FromStr`].
    pub fn to_escaped_string(&self) -> String {
        render(&self.segments, true)
    }
}

fn render(segments: &[Segment], escape: bool) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Field(name) => {
                if i > 0 {
                    out.push('.');
                }
                if escape {
                    for c in name.chars() {
                        if matches!(c, '.' | '[' | ']' | '\\') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                } else {
                    out.push_str(name);
                }
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

impl fmt::Display for Path {
    /// `spec.containers[0].image`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.segments, false))
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path::new(segments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path '{input}': {reason}")]
pub struct PathParseError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for Path {
    type Err = PathParseError;

    /// Parses `a.b[0].c`; `\.`, `\[`, `\]` and `\\` escape literal characters in field names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| PathParseError {
            input: s.to_string(),
            reason,
        };
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut has_field = false;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| fail("dangling escape"))?;
                    current.push(escaped);
                    has_field = true;
                }
                '.' => {
                    if has_field {
                        segments.push(Segment::Field(std::mem::take(&mut current)));
                        has_field = false;
                    } else if !matches!(segments.last(), Some(Segment::Index(_))) {
                        return Err(fail("empty field name"));
                    }
                }
                '[' => {
                    if has_field {
                        segments.push(Segment::Field(std::mem::take(&mut current)));
                        has_field = false;
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(fail("non-numeric index")),
                            None => return Err(fail("unterminated index")),
                        }
                    }
                    let index = digits.parse().map_err(|_| fail("empty index"))?;
                    segments.push(Segment::Index(index));
                }
                ']' => return Err(fail("unbalanced ']'")),
                other => {
                    current.push(other);
                    has_field = true;
                }
            }
        }
        if has_field {
            segments.push(Segment::Field(current));
        } else if s.ends_with('.') && !s.ends_with("\\.") {
            return Err(fail("trailing '.'"));
        }
        Ok(Path::new(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn containers_image() -> Path {
        Path::root()
            .field("spec")
            .field("containers")
            .index(0)
            .field("image")
    }

    #[test]
    fn test_display() {
        assert_eq!(containers_image().to_string(), "spec.containers[0].image");
        assert_eq!(Path::root().index(2).field("image").to_string(), "[2].image");
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn test_parse() {
        let parsed: Path = "spec.containers[0].image".parse().unwrap();
        assert_eq!(parsed, containers_image());

        let nested: Path = "matrix[1][2]".parse().unwrap();
        assert_eq!(
            nested.segments(),
            &[Segment::Field("matrix".into()), Segment::Index(1), Segment::Index(2)]
        );
    }

    #[test]
    fn test_escaped_field_names() {
        let path = Path::root().field("annotations").field("example.com/image");
        assert_eq!(path.to_string(), "annotations.example.com/image");
        assert_eq!(path.to_escaped_string(), "annotations.example\\.com/image");
        assert_eq!(path.to_escaped_string().parse::<Path>().unwrap(), path);
    }

    #[test]
    fn test_parse_errors() {
        assert!("a..b".parse::<Path>().is_err());
        assert!("a[x]".parse::<Path>().is_err());
        assert!("a[1".parse::<Path>().is_err());
        assert!("a]".parse::<Path>().is_err());
        assert!("a.".parse::<Path>().is_err());
    }

    #[test]
    fn test_children_do_not_alias() {
        let base = Path::root().field("a");
        let child = base.field("b");
        assert_eq!(base.len(), 1);
        assert_eq!(child.len(), 2);
        assert_eq!(base.segments(), &[Segment::Field("a".into())]);
        assert_eq!(child.segments()[1], Segment::Field("b".into()));
    }
}
