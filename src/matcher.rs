//! Path pattern matching
//!
//! A [`PathPattern`] is compiled once from a route's path template and then
//! matched against the *remaining* part of a location. Matching is
//! prefix-based on whole segments: `/family/:fid` matches `/family/f1/person/p1`
//! and consumes `/family/f1`. The resolver decides whether a prefix match is
//! complete.
//!
//! Template syntax:
//! - `users` - literal segment, compared case-insensitively (Unicode lowercase)
//! - `:id` - parameter capturing one segment verbatim
//! - `:id<\d+>` - parameter with a regex constraint
//! - `:id<uuid>` - parameter constrained to a UUID

use crate::error::{ConfigurationError, RouterError};
use crate::params::RouteParams;
use regex::Regex;

/// Join two paths with exactly one `/` between non-empty segments
///
/// ```
/// use gpui_shell_router::concatenate_paths;
///
/// assert_eq!(concatenate_paths("/", "family"), "/family");
/// assert_eq!(concatenate_paths("/family/f1", "person/p1"), "/family/f1/person/p1");
/// ```
pub fn concatenate_paths(parent: &str, child: &str) -> String {
    let segments: Vec<&str> = parent
        .split('/')
        .chain(child.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

// ============================================================================
// PathPattern
// ============================================================================

/// Compiled path template
#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    template: String,
    absolute: bool,
    segments: Vec<Segment>,
}

/// Successful prefix match
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Number of location segments consumed
    pub consumed: usize,
    /// Parameters captured by this pattern only
    pub params: RouteParams,
}

impl PathPattern {
    /// Compile a path template
    ///
    /// Leading-slash placement is validated by the configuration, which knows
    /// where in the tree the template sits.
    pub fn parse(template: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidPath {
            path: template.to_string(),
            reason,
        };

        if template.is_empty() {
            return Err(invalid("path cannot be empty".to_string()));
        }

        let absolute = template.starts_with('/');
        let body = template.trim_start_matches('/');
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for raw in body.split('/') {
                segments.push(Segment::parse(raw).map_err(invalid)?);
            }
        }

        Ok(Self {
            template: template.to_string(),
            absolute,
            segments,
        })
    }

    /// Original template text
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template starts with `/`
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Compiled segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters, in template order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Check if the template has any parameter
    pub fn has_params(&self) -> bool {
        self.param_names().next().is_some()
    }

    /// Match the pattern against the start of `location`
    ///
    /// `location` is the part of the path not yet consumed by ancestors, with
    /// or without a leading `/`. Parameter values are captured verbatim.
    pub fn match_prefix(&self, location: &str) -> Option<PatternMatch> {
        let mut candidate = location
            .split('/')
            .filter(|s| !s.is_empty());
        let mut params = RouteParams::new();

        for segment in &self.segments {
            let value = candidate.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if !eq_ignore_case(literal, value) {
                        return None;
                    }
                }
                Segment::Param { name, constraint } => {
                    if let Some(constraint) = constraint {
                        if !constraint.validate(value) {
                            return None;
                        }
                    }
                    params.insert(name.clone(), value);
                }
            }
        }

        Some(PatternMatch {
            consumed: self.segments.len(),
            params,
        })
    }

    /// Build the concrete path for this template
    ///
    /// Literals come from the template, parameters from `params` as given.
    /// Callers encode values beforehand when needed.
    pub fn to_path(&self, params: &RouteParams) -> Result<String, RouterError> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal.clone()),
                Segment::Param { name, .. } => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| RouterError::MissingParameter {
                            param: name.clone(),
                            path: self.template.clone(),
                        })?;
                    parts.push(value.to_string());
                }
            }
        }

        let joined = parts.join("/");
        Ok(if self.absolute {
            format!("/{joined}")
        } else {
            joined
        })
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ============================================================================
// Segment
// ============================================================================

/// A single segment in a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text that must match
    Literal(String),
    /// Parameter that captures a value
    Param {
        name: String,
        constraint: Option<Constraint>,
    },
}

impl Segment {
    /// Parse one template segment
    fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty segment".to_string());
        }

        let Some(rest) = raw.strip_prefix(':') else {
            return Ok(Segment::Literal(raw.to_string()));
        };

        let (name, constraint) = match rest.find('<') {
            Some(pos) => {
                let inner = rest[pos + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| format!("unterminated constraint in '{raw}'"))?;
                (&rest[..pos], Some(Constraint::parse(inner)?))
            }
            None => (rest, None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid parameter name in '{raw}'"));
        }

        Ok(Segment::Param {
            name: name.to_string(),
            constraint,
        })
    }
}

// ============================================================================
// Constraint
// ============================================================================

/// Constraint for validating parameter values
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Digits only
    Numeric,
    /// 8-4-4-4-12 hexadecimal groups
    Uuid,
    /// Arbitrary regex, anchored to the whole segment
    Pattern(Regex),
}

impl Constraint {
    fn parse(source: &str) -> Result<Self, String> {
        match source {
            "\\d+" => Ok(Constraint::Numeric),
            "uuid" => Ok(Constraint::Uuid),
            _ => Regex::new(&format!("^(?:{source})$"))
                .map(Constraint::Pattern)
                .map_err(|e| format!("invalid constraint '{source}': {e}")),
        }
    }

    /// Validate a value against this constraint
    pub fn validate(&self, value: &str) -> bool {
        match self {
            Constraint::Numeric => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            Constraint::Uuid => {
                let parts: Vec<&str> = value.split('-').collect();
                let lengths = [8, 4, 4, 4, 12];
                parts.len() == lengths.len()
                    && parts
                        .iter()
                        .zip(lengths)
                        .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
            }
            Constraint::Pattern(regex) => regex.is_match(value),
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constraint::Numeric, Constraint::Numeric) | (Constraint::Uuid, Constraint::Uuid) => true,
            (Constraint::Pattern(a), Constraint::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}
