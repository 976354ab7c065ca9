use std::fmt;
use std::sync::Arc;

/// One segment of an endpoint path.
///
/// `Literal` is a fixed route fragment; `Resource` marks a dynamic resource
/// identifier (an ID slot). Both render the same way, the tag only carries
/// intent so morph hooks and requesters can tell routes from identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPart {
    Literal(String),
    Resource(String),
}

impl PathPart {
    /// Tags any displayable value as a resource identifier segment.
    pub fn resource(value: impl ToString) -> PathPart {
        PathPart::Resource(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            PathPart::Literal(s) | PathPart::Resource(s) => s,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, PathPart::Resource(_))
    }
}

impl From<&str> for PathPart {
    fn from(segment: &str) -> Self { PathPart::Literal(segment.to_owned()) }
}

impl From<String> for PathPart {
    fn from(segment: String) -> Self { PathPart::Literal(segment) }
}

macro_rules! resource_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for PathPart {
            fn from(id: $t) -> Self { PathPart::Resource(id.to_string()) }
        })*
    };
}
resource_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// An immutable endpoint address: an ordered sequence of path segments.
///
/// Extending never mutates; [`EndpointPath::join`] returns a new value. The
/// segment storage is shared, so cloning a path is cheap and paths can be
/// compared and rendered repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointPath {
    parts: Arc<[PathPart]>,
}

impl EndpointPath {
    /// The zero-segment path, i.e. the API root.
    pub fn root() -> EndpointPath {
        EndpointPath { parts: Arc::from(Vec::new()) }
    }

    /// Returns a new path with `part` appended.
    #[must_use]
    pub fn join(&self, part: impl Into<PathPart>) -> EndpointPath {
        let mut parts = self.parts.to_vec();
        parts.push(part.into());
        EndpointPath { parts: Arc::from(parts) }
    }

    pub fn parts(&self) -> &[PathPart] { &self.parts }

    pub fn is_root(&self) -> bool { self.parts.is_empty() }

    pub fn len(&self) -> usize { self.parts.len() }

    pub fn is_empty(&self) -> bool { self.parts.is_empty() }

    /// Joins the segments with `/`. Resource markers render as their wrapped
    /// value; the root renders as the empty string.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            out.push_str(part.as_str());
        }
        out
    }
}

impl Default for EndpointPath {
    fn default() -> Self { EndpointPath::root() }
}

impl fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_empty() {
        assert_eq!(EndpointPath::root().render(), "");
        assert!(EndpointPath::root().is_root());
    }

    #[test]
    fn join_accumulates_segments_in_order() {
        let path = EndpointPath::root().join("foo").join(1u32).join("name");
        assert_eq!(path.render(), "foo/1/name");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn join_leaves_the_original_untouched() {
        let base = EndpointPath::root().join("foo");
        let extended = base.join("bar");
        assert_eq!(base.render(), "foo");
        assert_eq!(extended.render(), "foo/bar");
    }

    #[test]
    fn equality_is_by_segment_sequence() {
        let a = EndpointPath::root().join("foo").join(1u32);
        let b = EndpointPath::root().join("foo").join(PathPart::resource(1));
        assert_eq!(a, b);
        assert_ne!(a, EndpointPath::root().join("foo").join("1"));
    }

    #[test]
    fn integers_become_resource_markers() {
        let path = EndpointPath::root().join("user").join(42u64);
        assert!(!path.parts()[0].is_resource());
        assert!(path.parts()[1].is_resource());
        assert_eq!(path.parts()[1].as_str(), "42");
    }
}
