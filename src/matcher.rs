//! Route template compilation, matching and rendering
//!
//! Template syntax:
//!
//! - literal text, matched verbatim (`/pages`)
//! - `:name` - named segment, one or more characters other than `/`
//! - `(...)` - optional group, may nest and may hold several segments (`/url(/:a)(/:b)`)
//! - `*` - wildcard, any run of characters, captured under [`WILDCARD_PARAM`]
//! - `\x` - escapes a syntax character
//!
//! A template is compiled once into a [`RoutePattern`] and reused for every match. Matching is
//! anchored at both ends: the whole pathname must match.

use crate::error::PatternError;
use crate::RouteParams;
use regex::Regex;
use std::fmt;

/// Parameter name under which a wildcard capture is stored
pub const WILDCARD_PARAM: &str = "_";

/// A single parsed piece of a route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly
    Static(String),
    /// Named parameter that captures a value
    Param(String),
    /// Optional group (can be missing as a whole)
    Optional(Vec<Segment>),
    /// Wildcard that matches any run of characters
    Wildcard,
}

/// A compiled route template
///
/// # Example
///
/// ```
/// use url_state_sync::{RouteParams, RoutePattern};
///
/// let pattern = RoutePattern::compile("/url(/:opt1)(/:opt2)").unwrap();
///
/// let params = pattern.matches("/url/a").unwrap();
/// assert_eq!(params.get("opt1"), Some("a"));
/// assert!(!params.contains("opt2"));
///
/// assert_eq!(pattern.render(&params).unwrap(), "/url/a");
/// ```
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
    names: Vec<String>,
    regex: Regex,
}

impl RoutePattern {
    /// Compile a route template
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let segments = parse_segments(template)?;

        let mut names = Vec::new();
        let mut expression = String::from("^");
        write_expression(&segments, &mut expression, &mut names);
        expression.push('$');

        for (index, name) in names.iter().enumerate() {
            if names[..index].contains(name) {
                return Err(PatternError::DuplicateParam {
                    template: template.to_string(),
                    name: name.clone(),
                });
            }
        }

        let regex = Regex::new(&expression).map_err(|e| PatternError::InvalidTemplate {
            template: template.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            segments,
            names,
            regex,
        })
    }

    /// The template this pattern was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parsed segments, in template order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in template order (a wildcard appears as [`WILDCARD_PARAM`])
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Check whether a pathname matches without extracting parameters
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match this pattern against a pathname
    ///
    /// Returns extracted parameters if matched. Optional parameters that did not take part in
    /// the match are absent from the result.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;

        Some(
            self.names
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    captures
                        .get(index + 1)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// Render a pathname from parameter values
    ///
    /// An optional group is written only if at least one parameter inside it is provided.
    pub fn render(&self, params: &RouteParams) -> Result<String, PatternError> {
        let mut path = String::new();
        self.render_segments(&self.segments, params, &mut path)?;
        Ok(path)
    }

    fn render_segments(
        &self,
        segments: &[Segment],
        params: &RouteParams,
        out: &mut String,
    ) -> Result<(), PatternError> {
        for segment in segments {
            match segment {
                Segment::Static(text) => out.push_str(text),
                Segment::Param(name) => out.push_str(self.required(params, name)?),
                Segment::Wildcard => out.push_str(self.required(params, WILDCARD_PARAM)?),
                Segment::Optional(inner) => {
                    if provides_any(inner, params) {
                        self.render_segments(inner, params, out)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn required<'a>(&self, params: &'a RouteParams, name: &str) -> Result<&'a str, PatternError> {
        params.get(name).ok_or_else(|| PatternError::MissingParam {
            template: self.template.clone(),
            name: name.to_string(),
        })
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Parse a template into segments, tracking open groups on a stack
fn parse_segments(template: &str) -> Result<Vec<Segment>, PatternError> {
    let unbalanced = || PatternError::UnbalancedParens {
        template: template.to_string(),
    };

    // (byte offset of the opening paren, segments collected so far)
    let mut stack: Vec<(usize, Vec<Segment>)> = vec![(0, Vec::new())];
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '(' => stack.push((position, Vec::new())),
            ')' => {
                if stack.len() < 2 {
                    return Err(unbalanced());
                }
                let Some((start, group)) = stack.pop() else {
                    return Err(unbalanced());
                };
                if group.is_empty() {
                    return Err(PatternError::EmptyGroup {
                        template: template.to_string(),
                        position: start,
                    });
                }
                push_segment(&mut stack, Segment::Optional(group));
            }
            ':' => {
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(PatternError::EmptyParamName {
                        template: template.to_string(),
                        position,
                    });
                }
                push_segment(&mut stack, Segment::Param(name));
            }
            '*' => push_segment(&mut stack, Segment::Wildcard),
            '\\' => match chars.next() {
                Some((_, escaped)) => push_literal(&mut stack, escaped),
                None => push_literal(&mut stack, '\\'),
            },
            other => push_literal(&mut stack, other),
        }
    }

    if stack.len() != 1 {
        return Err(unbalanced());
    }

    Ok(stack.pop().map(|(_, segments)| segments).unwrap_or_default())
}

fn push_segment(stack: &mut [(usize, Vec<Segment>)], segment: Segment) {
    if let Some((_, top)) = stack.last_mut() {
        top.push(segment);
    }
}

fn push_literal(stack: &mut [(usize, Vec<Segment>)], c: char) {
    if let Some((_, top)) = stack.last_mut() {
        if let Some(Segment::Static(text)) = top.last_mut() {
            text.push(c);
        } else {
            top.push(Segment::Static(c.to_string()));
        }
    }
}

fn write_expression(segments: &[Segment], expression: &mut String, names: &mut Vec<String>) {
    for segment in segments {
        match segment {
            Segment::Static(text) => expression.push_str(&regex::escape(text)),
            Segment::Param(name) => {
                expression.push_str("([^/]+)");
                names.push(name.clone());
            }
            Segment::Wildcard => {
                expression.push_str("(.*?)");
                names.push(WILDCARD_PARAM.to_string());
            }
            Segment::Optional(inner) => {
                expression.push_str("(?:");
                write_expression(inner, expression, names);
                expression.push_str(")?");
            }
        }
    }
}

fn provides_any(segments: &[Segment], params: &RouteParams) -> bool {
    segments.iter().any(|segment| match segment {
        Segment::Static(_) => false,
        Segment::Param(name) => params.contains(name),
        Segment::Wildcard => params.contains(WILDCARD_PARAM),
        Segment::Optional(inner) => provides_any(inner, params),
    })
}
