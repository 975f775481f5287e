//! Endpoint path templates
//!
//! Parses `/users/{id}/posts/{post_id}` style templates into literal and
//! placeholder segments. `{{` and `}}` stand for literal braces.

use super::{Error, Result};
use crate::client::Params;

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed endpoint path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template string
    ///
    /// `endpoint` is only used to name the endpoint in error messages.
    pub fn parse(endpoint: &str, raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(Error::invalid_template(
                                endpoint,
                                "nested '{' inside placeholder",
                            ));
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(Error::invalid_template(endpoint, "unterminated '{'"));
                    }
                    if name.is_empty() {
                        return Err(Error::invalid_template(endpoint, "empty placeholder '{}'"));
                    }
                    if let Some(pos) = name.find([':', '!']) {
                        return Err(Error::invalid_template(
                            endpoint,
                            &format!(
                                "format spec '{}' in placeholder '{{{}}}' is not supported; use '{{{}}}'",
                                &name[pos..],
                                name,
                                &name[..pos]
                            ),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    return Err(Error::invalid_template(endpoint, "single '}' in template"));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written in the configuration file
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance (repeats included)
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder with its value from `params`
    ///
    /// Entries in `params` that no placeholder refers to are ignored.
    pub fn render(&self, endpoint: &str, params: &Params) -> Result<String> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| Error::missing_parameter(endpoint, name))?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}
