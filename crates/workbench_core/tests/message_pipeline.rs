use std::sync::Once;

use pretty_assertions::assert_eq;
use workbench_core::pipeline::{MathRenderer, PLAIN_LANGUAGE};
use workbench_core::{ContentTree, MessagePipeline};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(workbench_logging::initialize_for_tests);
}

fn render(raw: &str) -> ContentTree {
    init_logging();
    MessagePipeline::new().render(raw)
}

#[test]
fn script_never_survives() {
    let tree = render("hello\n\n<script>alert('x')</script>\n\n<p onclick=\"steal()\">there</p>");
    assert!(tree.find_tag("script").is_empty());
    assert!(!tree.plain_text().contains("alert"));
    assert!(tree
        .elements()
        .iter()
        .all(|el| el.attrs.iter().all(|(name, _)| !name.starts_with("on"))));
}

#[test]
fn javascript_links_lose_their_target() {
    let tree = render("[click](javascript:alert(1)) and [docs](https://docs.example.com)");
    let links = tree.find_tag("a");
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].attr("href"), None);
    assert_eq!(links[1].attr("href"), Some("https://docs.example.com"));
    assert_eq!(links[1].attr("rel"), Some("noopener noreferrer"));
}

#[test]
fn inline_dollar_math_becomes_a_math_node() {
    let tree = render("$x^2$");
    let math = tree.math_nodes();
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].tex, "x^2");
    assert!(!math[0].display);
    assert!(math[0].markup.contains("<math"), "{}", math[0].markup);
}

#[test]
fn unterminated_math_stays_literal() {
    let tree = render("$x^2");
    assert!(tree.math_nodes().is_empty());
    assert_eq!(tree.plain_text(), "$x^2");
}

#[test]
fn bracket_delimiters_survive_markdown() {
    let tree = render(r"Area: \[a^2\] and \(b\)");
    let math = tree.math_nodes();
    assert_eq!(math.len(), 2);
    assert!(math[0].display);
    assert_eq!(math[0].tex, "a^2");
    assert!(!math[1].display);
}

#[test]
fn math_inside_code_is_left_alone() {
    let tree = render("`$a$` costs money");
    assert!(tree.math_nodes().is_empty());
    assert_eq!(tree.find_tag("code")[0].text(), "$a$");
}

#[test]
fn malformed_tex_stays_literal() {
    let tree = render(r"$\notacommand{x}$");
    assert!(tree.math_nodes().is_empty());
    assert_eq!(tree.plain_text(), r"$\notacommand{x}$");
}

/// Every `<` in the markup must open a MathML tag.
fn assert_tags_only(markup: &str) {
    for segment in markup.split('<').skip(1) {
        let name = segment.trim_start_matches('/');
        assert!(
            name.starts_with('m') || name.starts_with("none"),
            "bare '<' in {markup}"
        );
        assert_eq!(segment.matches('>').count(), 1, "bare '>' in {markup}");
    }
}

#[test]
fn comparison_operators_are_escaped_in_math_markup() {
    let tree = render("$a &lt; b$ and $c > d$");
    let math = tree.math_nodes();
    assert_eq!(math.len(), 2);
    assert_eq!(math[0].tex, "a < b");
    for node in &math {
        assert_tags_only(&node.markup);
    }
    assert!(math[0].markup.contains("&lt;"), "{}", math[0].markup);
    assert!(math[1].markup.contains("&gt;"), "{}", math[1].markup);
}

#[test]
fn markup_smuggled_through_tex_never_reaches_the_tree() {
    let tree = render(r"$\mathrm{a}&lt;/math&gt;&lt;script&gt;x$ and $\text{</mtext><mi>}$");
    for node in tree.math_nodes() {
        assert_tags_only(&node.markup);
        assert!(!node.markup.contains("<script"), "{}", node.markup);
    }
    assert!(tree.find_tag("script").is_empty());
}

struct Refusing;

impl MathRenderer for Refusing {
    fn render(&self, _tex: &str, _display: bool) -> Result<String, String> {
        Err("no math today".to_string())
    }
}

#[test]
fn failing_math_renderer_keeps_source_and_siblings() {
    init_logging();
    let pipeline = MessagePipeline::with_math_renderer(Box::new(Refusing));
    let tree = pipeline.render("before $y$ after\n\n```rust\nlet y = 1;\n```");
    assert!(tree.math_nodes().is_empty());
    assert!(tree.plain_text().contains("before $y$ after"));
    assert_eq!(tree.find_tag("pre")[0].attr("data-language"), Some("rust"));
}

#[test]
fn fenced_code_is_highlighted_by_language() {
    let tree = render("```rust\nfn main() {\n    println!(\"hi\");\n}\n```");
    let pre = tree.find_tag("pre")[0];
    assert_eq!(pre.attr("data-language"), Some("rust"));
    assert_eq!(pre.attr("class"), Some("language-rust"));
    let code = tree.find_tag("code")[0];
    assert!(!tree.find_tag("span").is_empty());
    assert_eq!(code.text(), "fn main() {\n    println!(\"hi\");\n}\n");
}

#[test]
fn unknown_language_renders_as_plain_text() {
    let tree = render("```klingon\nqapla'\n```");
    let pre = tree.find_tag("pre")[0];
    assert_eq!(pre.attr("data-language"), Some(PLAIN_LANGUAGE));
    assert!(tree.find_tag("span").is_empty());
    assert_eq!(tree.find_tag("code")[0].text(), "qapla'\n");
}

#[test]
fn tables_and_line_breaks_follow_gfm() {
    let tree = render("| a | b |\n|---|---|\n| 1 | 2 |\n\nline one\nline two");
    assert_eq!(tree.find_tag("table").len(), 1);
    assert_eq!(tree.find_tag("td").len(), 2);
    assert_eq!(tree.find_tag("br").len(), 1);
}
