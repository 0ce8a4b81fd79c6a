/// Template scanning
///
/// Two passes over a path template:
/// 1. [`tokenize`] splits the text into literal runs and parameter tokens
///    (`{name}` / `{name:constraint}`), counting braces so a constraint may
///    itself contain balanced `{...}` groups.
/// 2. [`build_tree`] walks the tokens with an explicit bracket stack and nests
///    every balanced `[...]` span found in literal text as an optional group.
///    Brackets inside a constraint never reach this pass.
use super::{Group, Node, ParamSpec, DEFAULT_MATCH_REGEX};

/// One lexical piece of a template
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Param {
        subject: &'a str,
        name: &'a str,
        constraint: Option<&'a str>,
    },
}

/// Splits a template into literal text and parameter tokens, with byte offsets
///
/// A `{` that does not open a well-formed token stays literal text.
pub(crate) fn tokenize(template: &str) -> Vec<(usize, Token<'_>)> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        match scan_param(template, i) {
            Some((end, token)) => {
                if text_start < i {
                    tokens.push((text_start, Token::Text(&template[text_start..i])));
                }
                tokens.push((i, token));
                i = end;
                text_start = end;
            }
            None => i += 1,
        }
    }

    if text_start < bytes.len() {
        tokens.push((text_start, Token::Text(&template[text_start..])));
    }

    tokens
}

/// Tries to read a parameter token starting at the `{` found at `start`
///
/// Returns the byte offset just past the closing `}` and the token.
fn scan_param(template: &str, start: usize) -> Option<(usize, Token<'_>)> {
    let bytes = template.as_bytes();

    // Name: [a-z_][a-z0-9_-]*, case-insensitive
    let name_start = start + 1;
    let first = *bytes.get(name_start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let name_end = bytes[name_start..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-'))
        .map(|offset| name_start + offset)?;
    let name = &template[name_start..name_end];

    match bytes[name_end] {
        b'}' => Some((
            name_end + 1,
            Token::Param {
                subject: &template[start..=name_end],
                name,
                constraint: None,
            },
        )),
        b':' => {
            let constraint_start = name_end + 1;
            let close = matching_brace(bytes, constraint_start)?;
            let constraint = &template[constraint_start..close];
            Some((
                close + 1,
                Token::Param {
                    subject: &template[start..=close],
                    name,
                    constraint: Some(constraint),
                },
            ))
        }
        _ => None,
    }
}

/// Finds the `}` closing a constraint, skipping balanced inner `{...}` groups
fn matching_brace(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in bytes[from..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(from + offset),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Open bracket frame while building the tree
struct Frame {
    start: usize,
    nodes: Vec<Node>,
    direct: Vec<usize>,
}

impl Frame {
    fn new(start: usize) -> Self {
        Self {
            start,
            nodes: Vec::new(),
            direct: Vec::new(),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.nodes.last_mut() {
            last.push_str(text);
        } else {
            self.nodes.push(Node::Text(text.to_string()));
        }
    }

    fn push_node(&mut self, node: Node) {
        match node {
            Node::Text(text) => self.push_text(&text),
            other => self.nodes.push(other),
        }
    }
}

/// Builds the node tree and parameter descriptors for a template
///
/// Parameters receive keys in left-to-right order. Each parameter sitting in
/// an optional group records the literal text of its smallest enclosing group.
/// An unmatched `[` or `]` is kept as literal text.
pub(crate) fn build_tree(template: &str) -> (Vec<Node>, Vec<ParamSpec>) {
    let mut params: Vec<ParamSpec> = Vec::new();
    let mut root = Frame::new(0);
    let mut open: Vec<Frame> = Vec::new();

    for (offset, token) in tokenize(template) {
        match token {
            Token::Param {
                subject,
                name,
                constraint,
            } => {
                let key = params.len();
                params.push(ParamSpec {
                    key,
                    name: name.to_string(),
                    regex: constraint
                        .filter(|c| !c.is_empty())
                        .unwrap_or(DEFAULT_MATCH_REGEX)
                        .to_string(),
                    subject: subject.to_string(),
                    optional: String::new(),
                });
                let top = open.last_mut().unwrap_or(&mut root);
                top.nodes.push(Node::Param(key));
                top.direct.push(key);
            }
            Token::Text(text) => {
                let mut run_start = 0;
                for (i, ch) in text.char_indices() {
                    match ch {
                        '[' => {
                            flush(open.last_mut().unwrap_or(&mut root), &text[run_start..i]);
                            open.push(Frame::new(offset + i));
                            run_start = i + 1;
                        }
                        ']' if !open.is_empty() => {
                            flush(open.last_mut().unwrap_or(&mut root), &text[run_start..i]);
                            run_start = i + 1;

                            if let Some(frame) = open.pop() {
                                let group_text = template[frame.start..=offset + i].to_string();
                                for key in &frame.direct {
                                    params[*key].optional = group_text.clone();
                                }
                                open.last_mut().unwrap_or(&mut root).nodes.push(Node::Group(Group {
                                    text: group_text,
                                    nodes: frame.nodes,
                                    direct: frame.direct,
                                }));
                            }
                        }
                        _ => {}
                    }
                }
                flush(open.last_mut().unwrap_or(&mut root), &text[run_start..]);
            }
        }
    }

    // Unclosed groups fall back to literal text inside their parent
    while let Some(frame) = open.pop() {
        let parent = open.last_mut().unwrap_or(&mut root);
        parent.push_text("[");
        for node in frame.nodes {
            parent.push_node(node);
        }
        parent.direct.extend(frame.direct);
    }

    (root.nodes, params)
}

fn flush(frame: &mut Frame, text: &str) {
    if !text.is_empty() {
        frame.push_text(text);
    }
}
