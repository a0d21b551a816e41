use core::fmt::Display;
use core::str::FromStr;

use thisisplural::Plural;
use treeform_document::FieldName;

/// A dotted attribute path such as `root.services.2.name`.
///
/// The first segment is the root name (see [`Config::root_name`]); field
/// names, sequence indices and the `*` wildcard follow. Paths held by nodes
/// and used as error report keys never contain wildcards; wildcards only
/// appear in paths given to [`Tree::resolve`].
///
/// [`Config::root_name`]: crate::Config::root_name
/// [`Tree::resolve`]: crate::Tree::resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash, Plural)]
#[plural(len, is_empty, iter, into_iter, from_iter)]
pub struct AttrPath(Vec<PathSegment>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field name, or the root name in first position.
    Field(String),
    /// A sequence element.
    Index(usize),
    /// Every element of a sequence.
    Wildcard,
}

impl AttrPath {
    /// Create a path holding only the root segment.
    pub fn root(name: impl Into<String>) -> Self {
        AttrPath(vec![PathSegment::Field(name.into())])
    }

    /// Create a path from raw segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        AttrPath(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// This path extended by a field name.
    pub fn child(&self, field: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Field(field.into()));
        path
    }

    /// This path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(PathSegment::Index(index));
        path
    }

    /// This path without its last segment, or `None` for an empty path.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(AttrPath(rest.to_vec()))
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.iter().any(|s| matches!(s, PathSegment::Wildcard))
    }

    /// Whether `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &AttrPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{name}"),
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Wildcard => write!(f, "*"),
        }
    }
}

impl Display for AttrPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PathSegment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(PathSegment::Wildcard);
        }
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(PathSegment::Index)
                .map_err(|_| PathError::InvalidSegment(s.to_string()));
        }
        let name: FieldName = s
            .parse()
            .map_err(|_| PathError::InvalidSegment(s.to_string()))?;
        Ok(PathSegment::Field(name.into_string()))
    }
}

impl FromStr for AttrPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        s.split('.')
            .enumerate()
            .map(|(position, segment)| {
                if segment.is_empty() {
                    Err(PathError::EmptySegment { position })
                } else {
                    segment.parse()
                }
            })
            .collect()
    }
}

/// Error when parsing or resolving an attribute path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("attribute path is empty")]
    Empty,

    #[error("attribute path contains an empty segment at position {position}")]
    EmptySegment { position: usize },

    #[error("invalid attribute path segment: {0}")]
    InvalidSegment(String),

    #[error("field `{field}` does not exist at {at}")]
    UnknownField { at: AttrPath, field: String },

    #[error("index {index} out of range for sequence of length {len} at {at}")]
    IndexOutOfRange {
        at: AttrPath,
        index: usize,
        len: usize,
    },

    #[error("segment `{segment}` needs a sequence at {at}")]
    NotASequence { at: AttrPath, segment: PathSegment },

    #[error("segment `{segment}` needs a record at {at}")]
    NotARecord { at: AttrPath, segment: PathSegment },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_root() {
        assert_eq!(AttrPath::root("root").to_string(), "root");
    }

    #[test]
    fn test_display_nested() {
        let path = AttrPath::root("root").child("services").index(2).child("name");
        assert_eq!(path.to_string(), "root.services.2.name");
    }

    #[test]
    fn test_parse_segments() {
        let path: AttrPath = "b_obj.c_objs.*.x".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("b_obj".to_string()),
                PathSegment::Field("c_objs".to_string()),
                PathSegment::Wildcard,
                PathSegment::Field("x".to_string()),
            ]
        );
        assert!(path.has_wildcard());
    }

    #[test]
    fn test_parse_round_trips_display() {
        let text = "root.items.10.value";
        let path: AttrPath = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
        assert_eq!(path.last(), Some(&PathSegment::Field("value".to_string())));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<AttrPath>(), Err(PathError::Empty));
        assert_eq!(
            "a..b".parse::<AttrPath>(),
            Err(PathError::EmptySegment { position: 1 })
        );
        assert_eq!(
            "a.b-c".parse::<AttrPath>(),
            Err(PathError::InvalidSegment("b-c".to_string()))
        );
    }

    #[test]
    fn test_parent_and_starts_with() {
        let path = AttrPath::root("root").child("a").child("b");
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "root.a");
        assert!(path.starts_with(&parent));
        assert!(!parent.starts_with(&path));
        assert_eq!(AttrPath::from_segments(Vec::new()).parent(), None);
    }
}
