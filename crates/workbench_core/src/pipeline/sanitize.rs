use ego_tree::NodeRef;
use scraper::node::{Element as HtmlElement, Node};
use scraper::Html;
use url::Url;

use crate::content::{ContentNode, ContentTree, Element};

/// Elements removed together with everything inside them.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "form", "textarea", "select", "button", "link", "meta", "base",
    "svg", "math", "title", "head",
];

/// Elements kept in the output. Anything else is unwrapped: the tag goes,
/// its children stay.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "b", "em", "i", "u", "del",
    "s", "code", "pre", "kbd", "blockquote", "ul", "ol", "li", "a", "img", "table", "thead",
    "tbody", "tr", "th", "td", "span", "div", "sup", "sub", "dl", "dt", "dd", "input",
];

/// Containers whose whitespace-only text between children is layout noise.
const BLOCK_CONTAINERS: &[&str] = &[
    "", "ul", "ol", "dl", "table", "thead", "tbody", "tr", "blockquote", "div",
];

/// Walks parsed HTML and rebuilds it as a [`ContentTree`] containing only
/// allowlisted elements and attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sanitizer;

impl Sanitizer {
    pub fn sanitize(&self, html: &str) -> ContentTree {
        let fragment = Html::parse_fragment(html);
        let mut out = Vec::new();
        for child in fragment.root_element().children() {
            self.visit_node(child, "", &mut out);
        }
        ContentTree::new(out)
    }

    /// `parent` is the tag of the nearest kept element, empty at the root.
    fn visit_node(&self, node: NodeRef<'_, Node>, parent: &str, out: &mut Vec<ContentNode>) {
        match node.value() {
            Node::Text(text) => {
                if !(BLOCK_CONTAINERS.contains(&parent) && text.trim().is_empty()) {
                    push_text(out, text);
                }
            }
            Node::Element(element) => self.visit_element(node, element, parent, out),
            // comments, doctypes and processing instructions carry nothing displayable
            _ => {}
        }
    }

    fn visit_element(
        &self,
        node: NodeRef<'_, Node>,
        element: &HtmlElement,
        parent: &str,
        out: &mut Vec<ContentNode>,
    ) {
        let tag = element.name().to_ascii_lowercase();
        if DROPPED_TAGS.contains(&tag.as_str()) {
            return;
        }
        if tag == "input" && !is_task_checkbox(element) {
            return;
        }
        if !ALLOWED_TAGS.contains(&tag.as_str()) {
            for child in node.children() {
                self.visit_node(child, parent, out);
            }
            return;
        }

        let mut cleaned = Element::new(tag.clone());
        for (name, value) in element.attrs() {
            let name = name.to_ascii_lowercase();
            if let Some(value) = allowed_attr(&tag, &name, value) {
                cleaned.attrs.push((name, value));
            }
        }
        if tag == "a" && cleaned.attr("href").is_some() {
            cleaned.attrs.push(("rel".into(), "noopener noreferrer".into()));
        }
        if tag == "img" && cleaned.attr("src").is_none() {
            return;
        }
        for child in node.children() {
            self.visit_node(child, &tag, &mut cleaned.children);
        }
        out.push(ContentNode::Element(cleaned));
    }
}

fn push_text(out: &mut Vec<ContentNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(ContentNode::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(ContentNode::Text(text.to_string()));
    }
}

fn is_task_checkbox(element: &HtmlElement) -> bool {
    element
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

fn allowed_attr(tag: &str, name: &str, value: &str) -> Option<String> {
    if name.starts_with("on") {
        return None;
    }
    match (tag, name) {
        (_, "title") => Some(value.to_string()),
        ("a", "href") | ("img", "src") => safe_url(value),
        ("img", "alt") => Some(value.to_string()),
        ("code" | "pre" | "span" | "div", "class") => {
            let classes: Vec<&str> = value
                .split_whitespace()
                .filter(|class| {
                    class.starts_with("language-") || class.starts_with("math")
                })
                .collect();
            (!classes.is_empty()).then(|| classes.join(" "))
        }
        ("th" | "td", "style") => text_align(value),
        ("ol", "start") => value.trim().parse::<u32>().ok().map(|n| n.to_string()),
        ("input", "type") => Some("checkbox".to_string()),
        ("input", "checked" | "disabled") => Some(String::new()),
        _ => None,
    }
}

/// Only `http`, `https`, `mailto` and relative references survive.
fn safe_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "mailto").then(|| trimmed.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // A colon before any path separator would smuggle in a scheme the
            // parser rejected for other reasons.
            let head = trimmed.split(['/', '?', '#']).next().unwrap_or_default();
            (!head.contains(':')).then(|| trimmed.to_string())
        }
        Err(_) => None,
    }
}

fn text_align(style: &str) -> Option<String> {
    let (property, value) = style.trim().trim_end_matches(';').split_once(':')?;
    if !property.trim().eq_ignore_ascii_case("text-align") {
        return None;
    }
    let value = value.trim().to_ascii_lowercase();
    matches!(value.as_str(), "left" | "center" | "right")
        .then(|| format!("text-align: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(html: &str) -> ContentTree {
        Sanitizer.sanitize(html)
    }

    #[test]
    fn script_and_style_are_removed_with_content() {
        let tree = sanitize("<p>hi</p><script>alert(1)</script><style>p{}</style>");
        assert!(tree.find_tag("script").is_empty());
        assert!(tree.find_tag("style").is_empty());
        assert_eq!(tree.plain_text(), "hi");
    }

    #[test]
    fn event_handlers_are_stripped() {
        let tree = sanitize(r#"<p onclick="evil()" title="t">x</p>"#);
        let p = tree.find_tag("p")[0];
        assert_eq!(p.attrs, vec![("title".to_string(), "t".to_string())]);
    }

    #[test]
    fn unsafe_urls_are_dropped() {
        let tree = sanitize(
            r#"<a href="javascript:alert(1)">a</a><a href="https://ok.example">b</a><a href="/docs">c</a>"#,
        );
        let links = tree.find_tag("a");
        assert_eq!(links[0].attr("href"), None);
        assert_eq!(links[1].attr("href"), Some("https://ok.example"));
        assert_eq!(links[2].attr("href"), Some("/docs"));
    }

    #[test]
    fn images_without_safe_source_disappear() {
        let tree = sanitize(r#"<img src="data:text/html;base64,AAAA"><img src="https://x/y.png" onerror="e()">"#);
        let images = tree.find_tag("img");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].attr("onerror"), None);
    }

    #[test]
    fn unknown_tags_are_unwrapped() {
        let tree = sanitize("<custom-box><b>bold</b></custom-box>");
        assert!(tree.find_tag("custom-box").is_empty());
        assert_eq!(tree.find_tag("b").len(), 1);
    }

    #[test]
    fn layout_whitespace_between_blocks_is_dropped() {
        let tree = sanitize("<p>a</p>\n<ul>\n<li>b</li>\n</ul>\n");
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.find_tag("ul")[0].children.len(), 1);
    }

    #[test]
    fn only_language_classes_survive_on_code() {
        let tree = sanitize(r#"<pre><code class="language-rust evil">fn</code></pre>"#);
        assert_eq!(tree.find_tag("code")[0].attr("class"), Some("language-rust"));
    }
}
