//! Render a subtree as lightly formatted plain text.
//!
//! Headings become `#` lines, list items get `*` or number markers, links are
//! written as `[text](href)` and emphasis as `**bold**` / `_italic_`. Runs of
//! whitespace collapse outside `<pre>`, and at most one blank line separates
//! blocks.

use super::html::{Document, NodeId, NodeKind};

const PARAGRAPH_TAGS: &[&str] = &[
    "address", "article", "blockquote", "center", "div", "dl", "figure", "main", "p", "section",
    "table",
];
const LINE_TAGS: &[&str] = &["dd", "dt", "figcaption", "tr", "caption"];

pub(crate) fn render_text(doc: &Document, roots: &[NodeId], skipped: &[bool]) -> String {
    let mut writer = TextWriter::default();
    for &root in roots {
        writer.node(doc, root, skipped);
    }
    writer.finish()
}

#[derive(Default)]
struct TextWriter {
    buf: String,
    pending_break: usize,
    pending_space: bool,
    in_pre: usize,
    lists: Vec<Option<usize>>,
}

impl TextWriter {
    fn node(&mut self, doc: &Document, id: NodeId, skipped: &[bool]) {
        if skipped.get(id).copied().unwrap_or(false) {
            return;
        }
        let tag = match &doc.node(id).kind {
            NodeKind::Text(text) => {
                self.text(text);
                return;
            }
            NodeKind::Root => {
                self.children(doc, id, skipped);
                return;
            }
            NodeKind::Element { tag, .. } => tag.as_str(),
        };

        match tag {
            "br" => {
                self.flush();
                self.buf.push('\n');
                self.pending_space = false;
            }
            "hr" => {
                self.block(2);
                self.inline("* * *");
                self.block(2);
            }
            "img" => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.block(2);
                self.inline(&format!("{} ", "#".repeat(level)));
                self.children(doc, id, skipped);
                self.block(2);
            }
            "ul" | "ol" => {
                self.block(if self.lists.is_empty() { 2 } else { 1 });
                self.lists.push((tag == "ol").then_some(0));
                self.children(doc, id, skipped);
                self.lists.pop();
                self.block(if self.lists.is_empty() { 2 } else { 1 });
            }
            "li" => {
                self.block(1);
                let indent = "  ".repeat(self.lists.len().max(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        *n += 1;
                        format!("{indent}{n}. ")
                    }
                    _ => format!("{indent}* "),
                };
                self.inline(&marker);
                self.children(doc, id, skipped);
                self.block(1);
            }
            "pre" => {
                self.block(2);
                self.in_pre += 1;
                self.children(doc, id, skipped);
                self.in_pre -= 1;
                self.block(2);
            }
            "td" | "th" => {
                self.pending_space = true;
                self.children(doc, id, skipped);
                self.pending_space = true;
            }
            "a" => {
                let href = doc
                    .attr(id, "href")
                    .filter(|h| !h.is_empty() && !h.starts_with('#') && !h.starts_with("javascript:"))
                    .map(str::to_string);
                match href {
                    Some(href) => {
                        self.wrapped(doc, id, skipped, "[", &format!("]({href})"));
                    }
                    None => self.children(doc, id, skipped),
                }
            }
            "strong" | "b" => self.wrapped(doc, id, skipped, "**", "**"),
            "em" | "i" => self.wrapped(doc, id, skipped, "_", "_"),
            t if PARAGRAPH_TAGS.contains(&t) => {
                self.block(2);
                self.children(doc, id, skipped);
                self.block(2);
            }
            t if LINE_TAGS.contains(&t) => {
                self.block(1);
                self.children(doc, id, skipped);
                self.block(1);
            }
            _ => self.children(doc, id, skipped),
        }
    }

    fn children(&mut self, doc: &Document, id: NodeId, skipped: &[bool]) {
        for &child in doc.children(id) {
            self.node(doc, child, skipped);
        }
    }

    /// Write `open`, the children, then `close`; drop both markers if the
    /// children produced nothing.
    fn wrapped(&mut self, doc: &Document, id: NodeId, skipped: &[bool], open: &str, close: &str) {
        self.flush();
        let start = self.buf.len();
        self.buf.push_str(open);
        self.children(doc, id, skipped);
        if self.buf.len() == start + open.len() {
            self.buf.truncate(start);
        } else {
            self.buf.push_str(close);
        }
    }

    fn block(&mut self, newlines: usize) {
        self.pending_break = self.pending_break.max(newlines);
    }

    fn inline(&mut self, text: &str) {
        self.flush();
        self.buf.push_str(text);
    }

    fn text(&mut self, text: &str) {
        if self.in_pre > 0 {
            self.flush();
            self.buf.push_str(text);
            return;
        }
        let mut words = text.split_whitespace().peekable();
        if words.peek().is_none() {
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        self.flush();
        for (i, word) in words.enumerate() {
            if i > 0 {
                self.buf.push(' ');
            }
            self.buf.push_str(word);
        }
        self.pending_space = text.ends_with(char::is_whitespace);
    }

    fn flush(&mut self) {
        if self.pending_break > 0 {
            if !self.buf.is_empty() {
                let kept = self.buf.trim_end_matches([' ', '\t']).len();
                self.buf.truncate(kept);
                let existing = self.buf.len() - self.buf.trim_end_matches('\n').len();
                for _ in existing..self.pending_break {
                    self.buf.push('\n');
                }
            }
            self.pending_break = 0;
            self.pending_space = false;
        } else if self.pending_space {
            if !self.buf.is_empty() && !self.buf.ends_with(char::is_whitespace) {
                self.buf.push(' ');
            }
            self.pending_space = false;
        }
    }

    fn finish(self) -> String {
        let mut out = String::with_capacity(self.buf.len());
        let mut blank_run = 0;
        for line in self.buf.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }
        out.trim_matches('\n').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(html: &str) -> String {
        let doc = Document::parse(html);
        let skipped = vec![false; doc.len()];
        render_text(&doc, &[doc.root()], &skipped)
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        assert_eq!(render("<p>one</p><p>two</p>"), "one\n\ntwo");
    }

    #[test]
    fn collapses_whitespace_between_inline_nodes() {
        assert_eq!(render("<p>  hello\n   <span>big</span>   world </p>"), "hello big world");
    }

    #[test]
    fn headings_get_hash_prefix() {
        assert_eq!(render("<h2>Title</h2><p>body</p>"), "## Title\n\nbody");
    }

    #[test]
    fn unordered_and_ordered_lists() {
        assert_eq!(render("<ul><li>a</li><li>b</li></ul>"), "  * a\n  * b");
        assert_eq!(render("<ol><li>a</li><li>b</li></ol>"), "  1. a\n  2. b");
    }

    #[test]
    fn links_keep_their_target() {
        assert_eq!(
            render("<p>see <a href=\"https://example.com\">docs</a> now</p>"),
            "see [docs](https://example.com) now"
        );
        assert_eq!(render("<p><a href=\"#top\">top</a></p>"), "top");
    }

    #[test]
    fn empty_emphasis_is_dropped() {
        assert_eq!(render("<p>a <b></b>b <strong>c</strong></p>"), "a b **c**");
    }

    #[test]
    fn pre_preserves_whitespace() {
        assert_eq!(render("<pre>fn main() {\n    run();\n}</pre>"), "fn main() {\n    run();\n}");
    }

    #[test]
    fn line_break_element() {
        assert_eq!(render("<p>a<br>b</p>"), "a\nb");
    }

    #[test]
    fn skipped_nodes_are_not_rendered() {
        let doc = Document::parse("<div><p>keep</p><p>drop</p></div>");
        let mut skipped = vec![false; doc.len()];
        let div = doc.find_first("div").unwrap();
        skipped[doc.children(div)[1]] = true;
        assert_eq!(render_text(&doc, &[doc.root()], &skipped), "keep");
    }
}
