//! `{placeholder}` templates used by the catalog to build resource URIs
//!
//! `projects/{projectId}/regions/{region}/subnetworks/{name}` is rendered by looking up `projectId`, `region`
//! and `name`. `{{` and `}}` produce literal braces.
use regex::Regex;
use std::sync::LazyLock;

/// Escaped braces, a `{name}` placeholder, or a stray brace
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]+)\}|[{}]").expect("valid token pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct UriTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Parameter(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("Missing template parameter '{0}'")]
    MissingParameter(String),
    #[error("Malformed uri template '{0}'")]
    Malformed(String),
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = vec![];
        let mut literal = String::new();
        let mut last = 0;

        for token in TOKEN_RE.captures_iter(template) {
            let Some(whole) = token.get(0) else {
                continue;
            };
            literal.push_str(&template[last..whole.start()]);
            last = whole.end();

            match (whole.as_str(), token.get(1)) {
                ("{{", _) => literal.push('{'),
                ("}}", _) => literal.push('}'),
                (_, Some(name)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Parameter(name.as_str().to_string()));
                }
                _ => return Err(TemplateError::Malformed(template.to_string())),
            }
        }

        literal.push_str(&template[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Parameter(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template, failing on the first parameter `lookup` has no value for
    pub fn render<F>(&self, mut lookup: F) -> Result<String, TemplateError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => rendered.push_str(literal),
                Segment::Parameter(name) => {
                    let value =
                        lookup(name).ok_or_else(|| TemplateError::MissingParameter(name.clone()))?;
                    rendered.push_str(&value);
                }
            }
        }

        Ok(rendered)
    }
}
