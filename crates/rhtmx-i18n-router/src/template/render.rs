/// Reverse rendering of a parsed template
use once_cell::sync::Lazy;
use regex::Regex;

use super::scanner::{tokenize, Token};
use super::{Group, Node, ParamSpec};

// Any bracketed span left in literal text
static LOST_OPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

pub(super) fn render<'v, F>(nodes: &[Node], params: &[ParamSpec], value: &F) -> String
where
    F: Fn(&ParamSpec) -> Option<&'v str>,
{
    let mut out = String::new();
    render_nodes(nodes, params, value, &mut out);
    out
}

fn render_nodes<'v, F>(nodes: &[Node], params: &[ParamSpec], value: &F, out: &mut String)
where
    F: Fn(&ParamSpec) -> Option<&'v str>,
{
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&strip_lost_syntax(text)),
            Node::Param(key) => {
                if let Some(v) = value(&params[*key]) {
                    out.push_str(v);
                }
            }
            Node::Group(group) => {
                if group_is_filled(group, params, value) {
                    render_nodes(&group.nodes, params, value, out);
                }
            }
        }
    }
}

/// A group renders when none of its own parameters is missing and it carries
/// at least one value somewhere inside
fn group_is_filled<'v, F>(group: &Group, params: &[ParamSpec], value: &F) -> bool
where
    F: Fn(&ParamSpec) -> Option<&'v str>,
{
    group.direct.iter().all(|key| value(&params[*key]).is_some())
        && has_any_value(&group.nodes, params, value)
}

fn has_any_value<'v, F>(nodes: &[Node], params: &[ParamSpec], value: &F) -> bool
where
    F: Fn(&ParamSpec) -> Option<&'v str>,
{
    nodes.iter().any(|node| match node {
        Node::Text(_) => false,
        Node::Param(key) => value(&params[*key]).is_some(),
        Node::Group(group) => has_any_value(&group.nodes, params, value),
    })
}

/// Removes parameter tokens and bracketed spans that were never resolved
///
/// # Examples
///
/// ```
/// use rhtmx_i18n_router::template::strip_lost_syntax;
///
/// assert_eq!(strip_lost_syntax("news/{slug}[/page-2]"), "news/");
/// assert_eq!(strip_lost_syntax("plain/path"), "plain/path");
/// ```
pub fn strip_lost_syntax(text: &str) -> String {
    if !text.contains(['{', '[']) {
        return text.to_string();
    }

    let without_params: String = tokenize(text)
        .into_iter()
        .filter_map(|(_, token)| match token {
            Token::Text(t) => Some(t),
            Token::Param { .. } => None,
        })
        .collect();

    LOST_OPTION.replace_all(&without_params, "").into_owned()
}

#[cfg(test)]
mod tests {
    use crate::template::Template;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn render_with(template: &str, values: &[(&str, &str)]) -> String {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        let template = Template::parse(template).unwrap();
        template.render(|param| values.get(param.name.as_str()).copied())
    }

    #[test]
    fn test_render_required_params() {
        assert_eq!(
            render_with("test-arguments/{required1}/{required2}", &[("required1", "bonjour"), ("required2", "1234567890")]),
            "test-arguments/bonjour/1234567890"
        );
    }

    #[test]
    fn test_render_optional_group_removed_or_filled() {
        let template = "test-arguments-optionel[/optional-{optional}]";
        assert_eq!(render_with(template, &[]), "test-arguments-optionel");
        assert_eq!(
            render_with(template, &[("optional", "1234567890")]),
            "test-arguments-optionel/optional-1234567890"
        );
    }

    #[test]
    fn test_render_group_needs_all_of_its_params() {
        let template = "p/{r}[/{a}/{b}]";
        assert_eq!(render_with(template, &[("r", "1"), ("a", "x")]), "p/1");
        assert_eq!(render_with(template, &[("r", "1"), ("a", "x"), ("b", "y")]), "p/1/x/y");
    }

    #[test]
    fn test_render_nested_groups() {
        let template = "a[/{x}[/{y}]]";
        assert_eq!(render_with(template, &[("x", "1")]), "a/1");
        assert_eq!(render_with(template, &[("x", "1"), ("y", "2")]), "a/1/2");
        // Inner value alone cannot surface without its outer group
        assert_eq!(render_with(template, &[("y", "2")]), "a");
    }

    #[test]
    fn test_render_outer_group_without_direct_params() {
        let template = "a[/b[/{y}]]";
        assert_eq!(render_with(template, &[("y", "2")]), "a/b/2");
        assert_eq!(render_with(template, &[]), "a");
    }

    #[test]
    fn test_render_group_after_nested_group() {
        let template = "a[/b[/{y}]-{x}]";
        assert_eq!(render_with(template, &[("x", "X"), ("y", "Y")]), "a/b/Y-X");
        assert_eq!(render_with(template, &[("x", "X")]), "a/b-X");
    }

    #[test]
    fn test_strip_lost_syntax() {
        assert_eq!(super::strip_lost_syntax("a/{b:\\d{2}}/[c]d"), "a//d");
        assert_eq!(super::strip_lost_syntax("x]y"), "x]y");
    }
}
