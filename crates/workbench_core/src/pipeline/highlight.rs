use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use workbench_logging::bench_debug;

use crate::content::{ContentNode, Element};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME_NAME: &str = "base16-ocean.dark";
pub const PLAIN_LANGUAGE: &str = "plaintext";

/// Highlights `pre > code` blocks with syntect. Blocks whose language is
/// unknown, missing, or fails mid-way keep their text unstyled.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeHighlighter;

impl CodeHighlighter {
    pub fn highlight_blocks(&self, nodes: Vec<ContentNode>) -> Vec<ContentNode> {
        nodes
            .into_iter()
            .map(|node| match node {
                ContentNode::Element(el) if el.tag == "pre" => match code_child(&el) {
                    Some(code) => ContentNode::Element(self.highlight_pre(&el, code)),
                    None => ContentNode::Element(el),
                },
                ContentNode::Element(mut el) => {
                    el.children = self.highlight_blocks(std::mem::take(&mut el.children));
                    ContentNode::Element(el)
                }
                other => other,
            })
            .collect()
    }

    fn highlight_pre(&self, pre: &Element, code: &Element) -> Element {
        let requested = code
            .attr("class")
            .or_else(|| pre.attr("class"))
            .and_then(language_from_class);
        let source = code.text();

        let (language, children) = match requested.as_deref().and_then(find_syntax) {
            Some(syntax) => match theme() {
                Some(theme) => {
                    let language = requested.unwrap_or_else(|| PLAIN_LANGUAGE.to_string());
                    (language, highlight(&source, syntax, theme))
                }
                None => (PLAIN_LANGUAGE.to_string(), plain(&source)),
            },
            None => {
                if let Some(lang) = &requested {
                    bench_debug!("no syntax for language {lang:?}, rendering as plain text");
                }
                (PLAIN_LANGUAGE.to_string(), plain(&source))
            }
        };

        let class = format!("language-{language}");
        let mut code_el = Element::new("code").with_attr("class", class.clone());
        code_el.children = children;
        Element::new("pre")
            .with_attr("class", class)
            .with_attr("data-language", language)
            .with_child(ContentNode::Element(code_el))
    }
}

fn code_child(pre: &Element) -> Option<&Element> {
    pre.children
        .iter()
        .filter_map(ContentNode::as_element)
        .find(|el| el.tag == "code")
}

fn language_from_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-"))
        .filter(|lang| !lang.is_empty())
        .map(str::to_ascii_lowercase)
}

fn find_syntax(token: &str) -> Option<&'static SyntaxReference> {
    if token == PLAIN_LANGUAGE || token == "text" {
        return None;
    }
    SYNTAX_SET.find_syntax_by_token(token)
}

fn theme() -> Option<&'static Theme> {
    THEME_SET.themes.get(THEME_NAME)
}

fn plain(source: &str) -> Vec<ContentNode> {
    if source.is_empty() {
        Vec::new()
    } else {
        vec![ContentNode::text(source)]
    }
}

fn highlight(source: &str, syntax: &SyntaxReference, theme: &Theme) -> Vec<ContentNode> {
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(source) {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => {
                for (style, text) in ranges {
                    if !text.is_empty() {
                        out.push(styled_span(style, text));
                    }
                }
            }
            Err(err) => {
                bench_debug!("highlighting failed, line left plain: {err}");
                out.push(ContentNode::text(line));
            }
        }
    }
    out
}

fn styled_span(style: Style, text: &str) -> ContentNode {
    let fg = style.foreground;
    let mut css = format!("color:#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b);
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    ContentNode::Element(
        Element::new("span")
            .with_attr("style", css)
            .with_child(ContentNode::text(text)),
    )
}
