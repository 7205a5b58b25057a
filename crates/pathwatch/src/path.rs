#![forbid(unsafe_code)]

//! Property paths and navigation along them.
//!
//! A [`PropertyPath`] is the parsed form of an expression such as
//! `"Order.Customer.Name"` (or the closure form `"x => x.Order.Customer.Name"`).
//! It is immutable and cheap to clone; the dotted label is computed once.

use std::fmt;
use std::sync::Arc;

use crate::error::{ObserveError, Result};
use crate::value::Value;

/// Ordered, non-empty list of property names.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Arc<[String]>,
    label: Arc<str>,
}

impl PropertyPath {
    /// Parse a dotted member-access chain.
    ///
    /// Accepts `A.B.C` or `x => x.A.B.C`. Every segment must be a plain
    /// identifier; calls, indexers, and empty segments are rejected.
    pub fn parse(expression: &str) -> Result<Self> {
        let body = strip_parameter(expression.trim(), expression)?;
        if body.is_empty() {
            return Err(ObserveError::invalid_expression(
                expression,
                "expression names no property",
            ));
        }

        let mut segments = Vec::new();
        for raw in body.split('.') {
            let segment = raw.trim();
            if segment.is_empty() {
                return Err(ObserveError::invalid_expression(expression, "empty segment"));
            }
            if !is_identifier(segment) {
                return Err(ObserveError::invalid_expression(
                    expression,
                    format!("`{segment}` is not a member access"),
                ));
            }
            segments.push(segment.to_owned());
        }
        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<String>) -> Self {
        let label: Arc<str> = Arc::from(segments.join("."));
        Self {
            segments: Arc::from(segments),
            label,
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; parsing rejects empty paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The dotted form, e.g. `"A.B.C"`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyPath({})", self.label)
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = ObserveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Strip a leading `x =>` parameter and the matching `x.` prefix.
fn strip_parameter<'a>(trimmed: &'a str, original: &str) -> Result<&'a str> {
    let Some((param, body)) = trimmed.split_once("=>") else {
        return Ok(trimmed);
    };
    let param = param.trim();
    let body = body.trim();
    if !is_identifier(param) {
        return Err(ObserveError::invalid_expression(
            original,
            format!("`{param}` is not a parameter name"),
        ));
    }
    if body == param {
        return Ok("");
    }
    body.strip_prefix(param)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| {
            ObserveError::invalid_expression(original, format!("body must start with `{param}.`"))
        })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Follow `segments` from `start`.
///
/// Returns `None` when an intermediate value is not an object (including
/// `Null`) or a property is missing. A `Null` final value is a success.
#[must_use]
pub fn navigate(start: &Value, segments: &[String]) -> Option<Value> {
    let mut current = start.clone();
    for name in segments {
        current = current.as_object()?.property(name)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_chain() {
        let path = PropertyPath::parse("A.B.C").expect("valid path");
        assert_eq!(path.segments(), ["A", "B", "C"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.label(), "A.B.C");
        assert_eq!(path.to_string(), "A.B.C");
    }

    #[test]
    fn tolerates_whitespace() {
        let path = PropertyPath::parse("  Order . Customer  ").expect("valid path");
        assert_eq!(path.label(), "Order.Customer");
    }

    #[test]
    fn accepts_closure_form() {
        let path: PropertyPath = "x => x.Order.Total".parse().expect("valid path");
        assert_eq!(path.segments(), ["Order", "Total"]);
    }

    #[test]
    fn single_segment() {
        let path = PropertyPath::parse("_name2").expect("valid path");
        assert_eq!(path.len(), 1);
        assert!(!path.is_empty());
    }

    #[test]
    fn rejects_non_member_access() {
        for bad in [
            "",
            "   ",
            "A..B",
            "A.",
            ".A",
            "A.B()",
            "A[0]",
            "1A",
            "A.B-C",
            "x => x",
            "x => y.A",
            "x y => x.A",
        ] {
            let err = PropertyPath::parse(bad).expect_err(bad);
            assert!(
                matches!(err, ObserveError::InvalidExpression { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn equal_expressions_give_equal_paths() {
        let a = PropertyPath::parse("A.B").expect("valid");
        let b = PropertyPath::parse("p => p.A.B").expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn navigate_through_scalar_fails() {
        assert_eq!(navigate(&Value::Int(1), &["A".to_owned()]), None);
        assert_eq!(navigate(&Value::Null, &["A".to_owned()]), None);
    }

    #[test]
    fn navigate_empty_path_returns_start() {
        assert_eq!(navigate(&Value::Int(5), &[]), Some(Value::Int(5)));
    }
}
