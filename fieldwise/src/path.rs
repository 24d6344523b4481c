//! Field paths: where in the input a value was found.
//!
//! A [`FieldPath`] is never mutated in place. Every descent produces an
//! extended copy, so sibling branches of the same record never observe each
//! other's segments.

use std::borrow::Cow;
use std::fmt;

/// A single step of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field of a record
    Field(Cow<'static, str>),
    /// An element of a sequence
    Index(usize),
    /// An entry of a key-value mapping, named by its key verbatim
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

/// An ordered, immutable sequence of [`PathSegment`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, pointing at the top-level mapping.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns a copy of this path extended by `segment`.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Returns a copy of this path extended by a record field.
    pub fn field(&self, name: impl Into<Cow<'static, str>>) -> Self {
        self.child(PathSegment::Field(name.into()))
    }

    /// Returns a copy of this path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Returns a copy of this path extended by a mapping key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The segments rendered as strings: field names and keys verbatim,
    /// indices as `"[i]"`.
    pub fn to_strings(&self) -> Vec<String> {
        self.segments.iter().map(ToString::to_string).collect()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(_) => {}
                _ if i > 0 => f.write_str(".")?,
                _ => {}
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl<S: AsRef<str>, const N: usize> PartialEq<[S; N]> for FieldPath {
    fn eq(&self, other: &[S; N]) -> bool {
        self.segments.len() == N
            && self
                .segments
                .iter()
                .zip(other)
                .all(|(segment, expected)| segment.to_string() == expected.as_ref())
    }
}

impl<S: AsRef<str>> PartialEq<Vec<S>> for FieldPath {
    fn eq(&self, other: &Vec<S>) -> bool {
        self.segments.len() == other.len()
            && self
                .segments
                .iter()
                .zip(other)
                .all(|(segment, expected)| segment.to_string() == expected.as_ref())
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
