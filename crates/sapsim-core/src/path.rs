//! Endpoint path templates.
//!
//! A template is a `/`-separated list of segments, each either a literal
//! (`SalesOrders`) or a parameter (`{id}`). Matching is case-sensitive and
//! segment-exact; a trailing slash is ignored on both sides.
//!
//! Specificity is the number of parameter segments: fewer parameters means
//! more specific. Two templates are *ambiguous* when some path could match
//! both with equal specificity, which is exactly when they have the same
//! length, the same parameter count, and every aligned segment pair is
//! either two equal literals or involves a parameter.

use std::collections::BTreeMap;

use crate::error::RegistryError;

/// One segment of a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment.
    Literal(String),
    /// Captures the request segment under this name.
    Param(String),
}

/// A parsed endpoint path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template such as `/SalesOrders/{id}/Items`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPathTemplate`] when the template does
    /// not start with `/`, contains empty segments, malformed braces, or
    /// repeats a parameter name.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidPathTemplate {
            template: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let Some(rest) = raw.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                if part.is_empty() {
                    return Err(invalid("empty segment"));
                }
                let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(name) => {
                        if name.is_empty()
                            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                        {
                            return Err(invalid("parameter names must be alphanumeric"));
                        }
                        let repeated = segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(n) if n == name));
                        if repeated {
                            return Err(invalid("repeated parameter name"));
                        }
                        Segment::Param(name.to_owned())
                    }
                    None => {
                        if part.contains('{') || part.contains('}') {
                            return Err(invalid("braces must enclose a whole segment"));
                        }
                        Segment::Literal(part.to_owned())
                    }
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The template as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of parameter segments (lower is more specific).
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count()
    }

    /// Match a concrete request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_owned());
                }
            }
        }
        Some(params)
    }

    /// Whether some path could match both templates with equal specificity.
    pub fn is_ambiguous_with(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.param_count() == other.param_count()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

impl core::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(raw: &str) -> PathTemplate {
        PathTemplate::parse(raw).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn parses_literals_and_params() {
        let t = template("/SalesOrders/{id}/Items");
        assert_eq!(
            t.segments(),
            &[
                Segment::Literal("SalesOrders".into()),
                Segment::Param("id".into()),
                Segment::Literal("Items".into()),
            ]
        );
        assert_eq!(t.param_count(), 1);
    }

    #[test]
    fn root_template_has_no_segments() {
        let t = template("/");
        assert!(t.segments().is_empty());
        assert!(t.matches("/").is_some());
        assert!(t.matches("").is_some());
        assert!(t.matches("/x").is_none());
    }

    #[test]
    fn rejects_malformed_templates() {
        for raw in ["SalesOrders", "/a//b", "/{}", "/a{id}", "/{id}/{id}", "/{a-b}"] {
            assert!(PathTemplate::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn matching_extracts_parameters() {
        let t = template("/SalesOrders/{id}/Items/{item}");
        let params = t.matches("/SalesOrders/0000500001/Items/10");
        let params = params.unwrap_or_default();
        assert_eq!(params.get("id").map(String::as_str), Some("0000500001"));
        assert_eq!(params.get("item").map(String::as_str), Some("10"));
    }

    #[test]
    fn matching_is_case_sensitive_and_length_exact() {
        let t = template("/SalesOrders/{id}");
        assert!(t.matches("/salesorders/1").is_none());
        assert!(t.matches("/SalesOrders").is_none());
        assert!(t.matches("/SalesOrders/1/Items").is_none());
        assert!(t.matches("/SalesOrders/1/").is_some());
    }

    #[test]
    fn ambiguity_detection() {
        // Same shape with renamed parameter.
        assert!(template("/a/{x}").is_ambiguous_with(&template("/a/{y}")));
        // Crossed parameters of equal count.
        assert!(template("/a/{x}/c").is_ambiguous_with(&template("/{y}/b/c")));
        // Different specificity is resolved at request time.
        assert!(!template("/a/b").is_ambiguous_with(&template("/a/{x}")));
        // Disjoint literals.
        assert!(!template("/a/{x}").is_ambiguous_with(&template("/b/{x}")));
        // Different lengths.
        assert!(!template("/a").is_ambiguous_with(&template("/a/b")));
    }
}
