/// Path template compiler
///
/// Turns a cleaned path template such as
/// `test-arguments/{required1}/{required2:\d+}[/{optional1}]` into:
/// - a matching pattern (named captures, optional non-capturing groups),
/// - a reverse template used for URL generation,
/// - one [`ParamSpec`] per parameter, in order of appearance.
///
/// The grammar:
/// - `{name}`: parameter matching the default class `[^/]+`
/// - `{name:regex}`: parameter with a constraint; the constraint may hold
///   balanced `{...}` groups (`{year:\d{4}}`)
/// - `[...]`: optional group, nestable
///
/// Parsing is done with explicit scanners (see [`scanner`]), never with a
/// recursive regular expression.
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouterError};

mod render;
pub(crate) mod scanner;

pub use render::strip_lost_syntax;

/// Constraint used when a parameter declares none: any run of non-slash characters
pub const DEFAULT_MATCH_REGEX: &str = "[^/]+";

/// Descriptor of one `{name}` / `{name:regex}` occurrence in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Zero-based position of appearance in the template
    pub key: usize,
    /// Parameter name
    pub name: String,
    /// Constraint, or [`DEFAULT_MATCH_REGEX`]
    pub regex: String,
    /// Literal token text in the template, e.g. `{id:\d+}`
    pub subject: String,
    /// Literal text of the smallest enclosing optional group; empty when required
    #[serde(default)]
    pub optional: String,
}

impl ParamSpec {
    /// Whether the parameter sits inside an optional group
    pub fn is_optional(&self) -> bool {
        !self.optional.is_empty()
    }

    /// Capture group name used in the matching pattern
    pub(crate) fn capture_name(&self) -> String {
        capture_name(self.key)
    }
}

/// Compiler output for one language variant of one route
///
/// This is the serializable shape stored in the route cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRoute {
    /// Cleaned absolute template (base path included)
    pub original: String,
    /// Matching pattern, unanchored; matched anchored and case-insensitively
    pub regex: String,
    /// Reverse template, parameters and optional groups still in bracket form
    pub rewrite: String,
    /// Parameters in order of appearance
    pub params: Vec<ParamSpec>,
}

/// Parsed template node
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Param(usize),
    Group(Group),
}

/// Optional `[...]` group
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group {
    /// Literal group text including brackets
    pub text: String,
    pub nodes: Vec<Node>,
    /// Keys of parameters sitting directly in this group (not in a nested one)
    pub direct: Vec<usize>,
}

/// A parsed template, ready for pattern building and rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
    params: Vec<ParamSpec>,
}

impl Template {
    /// Parses a cleaned template
    ///
    /// Fails when the same parameter name appears twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_i18n_router::template::Template;
    ///
    /// let template = Template::parse("blog/{slug}[/page-{page:\\d+}]").unwrap();
    /// assert_eq!(template.params().len(), 2);
    /// assert_eq!(template.params()[1].optional, "[/page-{page:\\d+}]");
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let (nodes, params) = scanner::build_tree(source);

        for (index, param) in params.iter().enumerate() {
            if params[..index]
                .iter()
                .any(|earlier| earlier.name.eq_ignore_ascii_case(&param.name))
            {
                return Err(RouterError::DuplicateParam {
                    template: source.to_string(),
                    name: param.name.clone(),
                });
            }
        }

        Ok(Self {
            source: source.to_string(),
            nodes,
            params,
        })
    }

    /// The template text this was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter descriptors in order of appearance
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Builds the (unanchored) matching pattern
    ///
    /// Literal text is escaped, each parameter becomes a named capture
    /// `p<key>` around its constraint, each optional group becomes `(?:...)?`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_i18n_router::template::Template;
    ///
    /// let template = Template::parse("list[/page-{num:\\d+}]").unwrap();
    /// assert_eq!(template.pattern(), "list(?:/page-(?P<p0>\\d+))?");
    /// ```
    pub fn pattern(&self) -> String {
        let mut out = String::with_capacity(self.source.len() * 2);
        write_pattern(&self.nodes, &self.params, &mut out);
        out
    }

    /// Renders the template with the given values
    ///
    /// `value` returns the value for a parameter, `None` when it is unset. An
    /// optional group is emitted (brackets dropped) only when every parameter
    /// directly inside it has a value and at least one parameter anywhere
    /// inside it has one; otherwise the whole group disappears. Required
    /// parameters without a value render as nothing; callers check them first.
    pub fn render<'v, F>(&self, value: F) -> String
    where
        F: Fn(&ParamSpec) -> Option<&'v str>,
    {
        render::render(&self.nodes, &self.params, &value)
    }

    pub(crate) fn into_compiled(self) -> CompiledRoute {
        let regex = self.pattern();
        CompiledRoute {
            original: self.source.clone(),
            regex,
            rewrite: self.source,
            params: self.params,
        }
    }
}

/// Compiles a cleaned template
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::template::compile;
///
/// let compiled = compile("test-arguments/{required1}/{required2}").unwrap();
/// assert_eq!(
///     compiled.regex,
///     "test-arguments/(?P<p0>[^/]+)/(?P<p1>[^/]+)"
/// );
/// assert_eq!(compiled.rewrite, "test-arguments/{required1}/{required2}");
/// assert_eq!(compiled.params[1].name, "required2");
///
/// let plain = compile("accueil").unwrap();
/// assert_eq!(plain.regex, "accueil");
/// assert!(plain.params.is_empty());
/// ```
pub fn compile(template: &str) -> Result<CompiledRoute> {
    Ok(Template::parse(template)?.into_compiled())
}

/// Re-parses a cached route and checks it against its stored parameters
pub(crate) fn template_from_cache(compiled: &CompiledRoute) -> Result<Template> {
    let template = Template::parse(&compiled.rewrite)?;
    if template.params != compiled.params {
        return Err(RouterError::CacheMismatch {
            template: compiled.rewrite.clone(),
        });
    }
    Ok(template)
}

/// Escapes characters that are special outside a character class
fn escape_literal(text: &str, out: &mut String) {
    for ch in text.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
}

pub(crate) fn capture_name(key: usize) -> String {
    format!("p{}", key)
}

fn write_pattern(nodes: &[Node], params: &[ParamSpec], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_literal(text, out),
            Node::Param(key) => {
                let param = &params[*key];
                // Writing into a String cannot fail
                let _ = write!(out, "(?P<{}>{})", param.capture_name(), param.regex);
            }
            Node::Group(group) => {
                out.push_str("(?:");
                write_pattern(&group.nodes, params, out);
                out.push_str(")?");
            }
        }
    }
}
