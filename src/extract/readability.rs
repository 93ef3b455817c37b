//! Main-content extraction.
//!
//! Paragraph-like elements are scored by length and punctuation; scores flow
//! to their parent and grandparent, and the best-scoring container (weighted
//! by link density) wins. Qualifying siblings of the winner are kept so
//! articles split across several containers survive.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::html::{collapse_whitespace, Document, NodeId, NodeKind};
use super::text::render_text;

/// Placeholder title when the document has no `<title>`.
pub const NO_TITLE: &str = "[no-title]";

const MIN_PARAGRAPH_CHARS: usize = 25;

/// Structural boilerplate never considered content.
const BOILERPLATE_TAGS: &[&str] = &[
    "aside", "button", "dialog", "footer", "form", "header", "input", "menu", "nav", "select",
];

/// Elements never pruned by class/id heuristics.
const PROTECTED_TAGS: &[&str] = &["a", "article", "body", "html", "main"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document has no readable content")]
    NoContent,
}

fn unlikely_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)banner|breadcrumbs|combx|comment|community|cookie|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|share|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup",
        )
        .expect("unlikely-candidate regex is valid")
    })
}

fn maybe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)and|article|body|column|content|main|shadow")
            .expect("maybe-candidate regex is valid")
    })
}

fn positive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story")
            .expect("positive regex is valid")
    })
}

fn negative_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)hidden|banner|combx|comment|com-|contact|foot|footer|footnote|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
        )
        .expect("negative regex is valid")
    })
}

/// Extract the title and main readable text of an HTML document.
pub fn extract(html: &str) -> Result<Article, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    let doc = Document::parse(html);
    if doc.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let title = doc.title();
    let body = doc.find_first("body").unwrap_or(doc.root());
    let skipped = prune(&doc, body);
    let scores = score_paragraphs(&doc, body, &skipped);

    let roots = match best_candidate(&doc, &scores, &skipped) {
        Some((top, top_score)) => with_siblings(&doc, top, top_score, &scores, &skipped),
        None => vec![body],
    };
    let text = render_text(&doc, &roots, &skipped);

    if text.is_empty() && title.is_none() && !doc.has_text() {
        return Err(ExtractError::NoContent);
    }
    Ok(Article {
        title: title.unwrap_or_else(|| NO_TITLE.to_string()),
        text,
    })
}

/// Pre-order walk of `id`'s descendants that does not enter skipped subtrees.
fn kept_descendants(doc: &Document, id: NodeId, skipped: &[bool]) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut pending: Vec<NodeId> = doc.children(id).iter().rev().copied().collect();
    while let Some(current) = pending.pop() {
        if skipped[current] {
            continue;
        }
        out.push(current);
        pending.extend(doc.children(current).iter().rev());
    }
    out
}

fn class_and_id(doc: &Document, id: NodeId) -> String {
    format!(
        "{} {}",
        doc.attr(id, "class").unwrap_or(""),
        doc.attr(id, "id").unwrap_or("")
    )
}

/// Mark boilerplate subtrees so scoring and rendering skip them.
fn prune(doc: &Document, body: NodeId) -> Vec<bool> {
    let mut skipped = vec![false; doc.len()];
    let candidates = kept_descendants(doc, body, &skipped);
    for id in candidates {
        let Some(tag) = doc.tag(id) else { continue };
        if BOILERPLATE_TAGS.contains(&tag) {
            skipped[id] = true;
            continue;
        }
        if PROTECTED_TAGS.contains(&tag) {
            continue;
        }
        let hints = class_and_id(doc, id);
        if unlikely_regex().is_match(&hints) && !maybe_regex().is_match(&hints) {
            skipped[id] = true;
        }
    }
    skipped
}

fn visible_text(doc: &Document, id: NodeId, skipped: &[bool]) -> String {
    let mut raw = String::new();
    for node in std::iter::once(id).chain(kept_descendants(doc, id, skipped)) {
        if let NodeKind::Text(text) = &doc.node(node).kind {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    collapse_whitespace(&raw)
}

fn link_density(doc: &Document, id: NodeId, skipped: &[bool]) -> f64 {
    let total = visible_text(doc, id, skipped).chars().count();
    if total == 0 {
        return 0.0;
    }
    let linked: usize = kept_descendants(doc, id, skipped)
        .into_iter()
        .filter(|&d| doc.tag(d) == Some("a"))
        .map(|a| visible_text(doc, a, skipped).chars().count())
        .sum();
    linked as f64 / total as f64
}

fn class_weight(doc: &Document, id: NodeId) -> f64 {
    let mut weight = 0.0;
    for hint in [doc.attr(id, "class"), doc.attr(id, "id")].into_iter().flatten() {
        if negative_regex().is_match(hint) {
            weight -= 25.0;
        }
        if positive_regex().is_match(hint) {
            weight += 25.0;
        }
    }
    weight
}

fn initial_score(doc: &Document, id: NodeId) -> f64 {
    let base = match doc.tag(id) {
        Some("div") | Some("article") | Some("main") => 5.0,
        Some("pre") | Some("td") | Some("blockquote") => 3.0,
        Some("address") | Some("ol") | Some("ul") | Some("dl") | Some("dd") | Some("dt")
        | Some("li") | Some("form") => -3.0,
        Some("h1") | Some("h2") | Some("h3") | Some("h4") | Some("h5") | Some("h6")
        | Some("th") => -5.0,
        _ => 0.0,
    };
    base + class_weight(doc, id)
}

fn score_paragraphs(doc: &Document, body: NodeId, skipped: &[bool]) -> HashMap<NodeId, f64> {
    let mut scores: HashMap<NodeId, f64> = HashMap::new();
    for id in kept_descendants(doc, body, skipped) {
        if !matches!(doc.tag(id), Some("p") | Some("pre") | Some("td")) {
            continue;
        }
        let text = visible_text(doc, id, skipped);
        let len = text.chars().count();
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let commas = text.matches([',', '、', '，']).count();
        let score = 1.0 + commas as f64 + (len / 100).min(3) as f64;

        let parent = doc.parent(id).filter(|&p| doc.tag(p).is_some());
        let grandparent = parent
            .and_then(|p| doc.parent(p))
            .filter(|&g| doc.tag(g).is_some());
        for (ancestor, share) in [(parent, 1.0), (grandparent, 0.5)] {
            let Some(ancestor) = ancestor else { continue };
            *scores
                .entry(ancestor)
                .or_insert_with(|| initial_score(doc, ancestor)) += score * share;
        }
    }
    scores
}

fn best_candidate(
    doc: &Document,
    scores: &HashMap<NodeId, f64>,
    skipped: &[bool],
) -> Option<(NodeId, f64)> {
    scores
        .iter()
        .map(|(&id, &score)| (id, score * (1.0 - link_density(doc, id, skipped))))
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
}

fn with_siblings(
    doc: &Document,
    top: NodeId,
    top_score: f64,
    scores: &HashMap<NodeId, f64>,
    skipped: &[bool],
) -> Vec<NodeId> {
    let Some(parent) = doc.parent(top).filter(|&p| doc.tag(p).is_some()) else {
        return vec![top];
    };
    let threshold = (top_score * 0.2).max(10.0);
    doc.children(parent)
        .iter()
        .copied()
        .filter(|&sibling| !skipped[sibling] && doc.tag(sibling).is_some())
        .filter(|&sibling| {
            if sibling == top {
                return true;
            }
            let density = link_density(doc, sibling, skipped);
            if let Some(score) = scores.get(&sibling) {
                if score * (1.0 - density) >= threshold {
                    return true;
                }
            }
            if doc.tag(sibling) != Some("p") {
                return false;
            }
            let text = visible_text(doc, sibling, skipped);
            let len = text.chars().count();
            (len > 80 && density < 0.25)
                || (len > 0 && density == 0.0 && (text.contains(". ") || text.ends_with('.') || text.ends_with('。')))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Rust async runtimes</title><style>body { margin: 0 }</style></head>
<body>
  <nav><a href="/">Home</a> <a href="/blog">Blog</a></nav>
  <div class="sidebar"><p>Subscribe to our newsletter for weekly updates and offers, today.</p></div>
  <div class="post-content">
    <h1>Choosing an async runtime</h1>
    <p>Tokio is the most widely used async runtime in the Rust ecosystem, with timers, I/O, and a work-stealing scheduler.</p>
    <p>Smaller runtimes exist, but libraries such as reqwest, hyper, and tonic assume Tokio, so most applications start there.</p>
  </div>
  <footer>Copyright 2024, Example Corp. All rights reserved.</footer>
</body>
</html>"#;

    #[test]
    fn extracts_title_and_main_content() {
        let article = extract(ARTICLE).unwrap();
        assert_eq!(article.title, "Rust async runtimes");
        assert!(article.text.contains("# Choosing an async runtime"));
        assert!(article.text.contains("Tokio is the most widely used async runtime"));
        assert!(article.text.contains("most applications start there."));
    }

    #[test]
    fn drops_navigation_sidebar_and_footer() {
        let article = extract(ARTICLE).unwrap();
        assert!(!article.text.contains("Home"));
        assert!(!article.text.contains("newsletter"));
        assert!(!article.text.contains("Copyright"));
        assert!(!article.text.contains("margin"));
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let article = extract("<body><p>Short note without a title element.</p></body>").unwrap();
        assert_eq!(article.title, NO_TITLE);
        assert_eq!(article.text, "Short note without a title element.");
    }

    #[test]
    fn japanese_commas_count_towards_score() {
        let html = "<body><div id=\"a\"><p>短い。</p></div><div id=\"b\"><p>東京、大阪、名古屋、福岡、札幌などの主要都市で、サービスを展開しています。</p></div></body>";
        let article = extract(html).unwrap();
        assert!(article.text.contains("主要都市"));
    }

    #[test]
    fn plain_text_without_markup_is_kept() {
        let article = extract("just some text").unwrap();
        assert_eq!(article.text, "just some text");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(extract("   \n"), Err(ExtractError::EmptyDocument));
    }

    #[test]
    fn markup_without_content_is_an_error() {
        assert_eq!(
            extract("<html><head><script>track()</script></head><body></body></html>"),
            Err(ExtractError::NoContent)
        );
    }
}
