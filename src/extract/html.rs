//! Tolerant HTML tree builder.
//!
//! Not a conforming HTML5 parser: it recovers the element structure that
//! content extraction needs (nesting, attributes, text) from real-world,
//! frequently malformed markup. Script-like elements are dropped with their
//! content, comments and doctypes are skipped, and the usual implied end tags
//! (`p`, `li`, table cells, ...) are closed the way browsers do.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub type NodeId = usize;

const ROOT: NodeId = 0;
const MAX_DEPTH: usize = 256;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is never readable text.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "math", "iframe", "textarea", "object",
    "canvas",
];

/// Opening any of these implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed document tree. Node 0 is the synthetic root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .expect("tag regex is valid")
    })
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute regex is valid")
    })
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
            .expect("entity regex is valid")
    })
}

impl Document {
    /// Build a tree from raw HTML. Never fails; garbage in yields a flat tree.
    pub fn parse(html: &str) -> Self {
        let mut doc = Document {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        };
        // ASCII lowercasing keeps byte offsets aligned with `html`.
        let lower = html.to_ascii_lowercase();
        let mut stack: Vec<NodeId> = vec![ROOT];
        let mut pos = 0;

        while pos < html.len() {
            let rest = &html[pos..];

            if rest.starts_with("<!--") {
                pos = lower[pos + 4..]
                    .find("-->")
                    .map_or(html.len(), |i| pos + 4 + i + 3);
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                pos = rest.find('>').map_or(html.len(), |i| pos + i + 1);
                continue;
            }

            if let Some(caps) = tag_regex().captures(rest) {
                let consumed = caps.get(0).map_or(1, |m| m.end());
                let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
                let name = caps
                    .get(2)
                    .map_or(String::new(), |m| m.as_str().to_ascii_lowercase());
                let attr_src = caps.get(3).map_or("", |m| m.as_str());
                pos += consumed;

                if closing {
                    doc.close(&mut stack, &name);
                    continue;
                }

                let self_closing = attr_src.trim_end().ends_with('/');
                if DROPPED_TAGS.contains(&name.as_str()) {
                    if !self_closing {
                        pos = skip_past_end_tag(html, &lower, pos, &name);
                    }
                    continue;
                }

                doc.open(&mut stack, name, parse_attrs(attr_src), self_closing);
                continue;
            }

            // Text runs to the next '<'; a '<' that does not start a tag is literal.
            let offset = usize::from(rest.starts_with('<'));
            let end = rest[offset..]
                .find('<')
                .map_or(html.len(), |i| pos + offset + i);
            let parent = stack.last().copied().unwrap_or(ROOT);
            let text = decode_entities(&html[pos..end]).into_owned();
            doc.push_node(NodeKind::Text(text), parent);
            pos = end;
        }

        doc
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn open(
        &mut self,
        stack: &mut Vec<NodeId>,
        tag: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    ) {
        self.close_implied(stack, &tag);
        let parent = stack.last().copied().unwrap_or(ROOT);
        let is_void = self_closing || VOID_TAGS.contains(&tag.as_str());
        let id = self.push_node(NodeKind::Element { tag, attrs }, parent);
        if !is_void && stack.len() < MAX_DEPTH {
            stack.push(id);
        }
    }

    fn close_implied(&self, stack: &mut Vec<NodeId>, tag: &str) {
        if CLOSES_PARAGRAPH.contains(&tag)
            && stack.last().and_then(|&id| self.tag(id)) == Some("p")
        {
            stack.pop();
        }

        let (targets, boundaries): (&[&str], &[&str]) = match tag {
            "li" => (&["li"], &["ul", "ol", "menu"]),
            "dt" | "dd" => (&["dt", "dd"], &["dl"]),
            "tr" => (&["tr"], &["table", "thead", "tbody", "tfoot"]),
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            "option" => (&["option"], &["select", "datalist"]),
            _ => return,
        };
        for depth in (1..stack.len()).rev() {
            let open = self.tag(stack[depth]).unwrap_or("");
            if boundaries.contains(&open) {
                return;
            }
            if targets.contains(&open) {
                stack.truncate(depth);
                return;
            }
        }
    }

    fn close(&self, stack: &mut Vec<NodeId>, name: &str) {
        if let Some(depth) = (1..stack.len())
            .rev()
            .find(|&d| self.tag(stack[d]) == Some(name))
        {
            stack.truncate(depth);
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[ROOT].children.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Lowercase tag name, `None` for text and root nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// First element with `tag` in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|&id| self.tag(id) == Some(tag))
    }

    /// All elements with `tag`, in document order.
    pub fn elements<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        (0..self.nodes.len()).filter(move |&id| self.tag(id) == Some(tag))
    }

    /// Whether the `class` attribute lists `class` as one of its tokens.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of `id` and its descendants, whitespace untouched.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            match &self.nodes[current].kind {
                NodeKind::Text(text) => out.push_str(text),
                _ => pending.extend(self.nodes[current].children.iter().rev()),
            }
        }
        out
    }

    /// `<title>` text with whitespace collapsed.
    pub fn title(&self) -> Option<String> {
        let id = self.find_first("title")?;
        let title = collapse_whitespace(&self.text_content(id));
        (!title.is_empty()).then_some(title)
    }

    /// Whether any text node holds non-whitespace content.
    pub fn has_text(&self) -> bool {
        self.nodes.iter().any(|node| match &node.kind {
            NodeKind::Text(text) => !text.trim().is_empty(),
            _ => false,
        })
    }
}

fn skip_past_end_tag(html: &str, lower: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{name}");
    match lower[from..].find(&needle) {
        Some(i) => {
            let end_tag = from + i;
            html[end_tag..]
                .find('>')
                .map_or(html.len(), |j| end_tag + j + 1)
        }
        None => html.len(),
    }
}

fn parse_attrs(src: &str) -> Vec<(String, String)> {
    attr_regex()
        .captures_iter(src)
        .map(|caps| {
            let name = caps
                .get(1)
                .map_or(String::new(), |m| m.as_str().to_ascii_lowercase());
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or(String::new(), |m| decode_entities(m.as_str()).into_owned());
            (name, value)
        })
        .collect()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode numeric and common named character references.
///
/// Unknown names are left verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    entity_regex().replace_all(text, |caps: &Captures<'_>| {
        let raw = &caps[0];
        let body = &caps[1];
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(body)
        };
        decoded.map_or_else(|| raw.to_string(), |c| c.to_string())
    })
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "middot" => '·',
        "bull" => '•',
        "yen" => '¥',
        "euro" => '€',
        "times" => '×',
        _ => return None,
    };
    Some(c)
}
