use latex2mathml::{latex_to_mathml, DisplayStyle};
use workbench_logging::bench_debug;

use crate::content::{ContentNode, MathNode};

/// Turns a TeX expression into display markup.
pub trait MathRenderer: Send + Sync {
    fn render(&self, tex: &str, display: bool) -> Result<String, String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlRenderer;

impl MathRenderer for MathMlRenderer {
    fn render(&self, tex: &str, display: bool) -> Result<String, String> {
        let style = if display {
            DisplayStyle::Block
        } else {
            DisplayStyle::Inline
        };
        let markup = latex_to_mathml(tex, style).map_err(|err| err.to_string())?;
        if let Some(at) = markup.find(PARSE_ERROR_MARK) {
            return Err(markup[at..].trim_end_matches("</math>").to_string());
        }
        well_formed(&markup)
    }
}

/// `latex2mathml` reports some failures inline instead of as an `Err`.
const PARSE_ERROR_MARK: &str = "[PARSE ERROR";

/// Element names `latex2mathml` emits.
const MATHML_TAGS: &[&str] = &[
    "math",
    "mi",
    "mn",
    "mo",
    "ms",
    "mtext",
    "mspace",
    "mrow",
    "mfrac",
    "msqrt",
    "mroot",
    "msub",
    "msup",
    "msubsup",
    "munder",
    "mover",
    "munderover",
    "mmultiscripts",
    "mprescripts",
    "none",
    "mstyle",
    "mpadded",
    "mphantom",
    "menclose",
    "merror",
    "mtable",
    "mtr",
    "mtd",
    "semantics",
    "annotation",
];

enum TagKind {
    Open,
    Close,
    Empty,
}

/// The renderer copies token text verbatim, so `<`, `>` and stray `&` from
/// the source are escaped here. Source text that forms a MathML tag of its
/// own breaks the nesting and is rejected.
fn well_formed(markup: &str) -> Result<String, String> {
    let mut out = String::with_capacity(markup.len() + 16);
    let mut open: Vec<&str> = Vec::new();
    let mut rest = markup;

    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            if let Some((name, kind, len)) = read_tag(rest) {
                match kind {
                    TagKind::Open => open.push(name),
                    TagKind::Close => {
                        if open.pop() != Some(name) {
                            return Err(format!("unbalanced </{name}> in markup"));
                        }
                    }
                    TagKind::Empty => {}
                }
                out.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
        }
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if !starts_with_entity(rest) => out.push_str("&amp;"),
            other => out.push(other),
        }
        rest = &rest[ch.len_utf8()..];
    }

    match open.last() {
        Some(name) => Err(format!("unclosed <{name}> in markup")),
        None => Ok(out),
    }
}

/// Recognises a MathML tag at the start of `text`; returns its name, kind and
/// byte length.
fn read_tag(text: &str) -> Option<(&str, TagKind, usize)> {
    let end = text.find('>')?;
    let inner = &text[1..end];
    if inner.contains('<') {
        return None;
    }
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let (empty, inner) = match inner.strip_suffix('/') {
        Some(inner) => (true, inner),
        None => (false, inner),
    };
    let name_end = inner.find(char::is_whitespace).unwrap_or(inner.len());
    let name = &inner[..name_end];
    if !MATHML_TAGS.contains(&name) {
        return None;
    }
    let kind = match (closing, empty) {
        (false, false) => TagKind::Open,
        (false, true) => TagKind::Empty,
        (true, false) if name_end == inner.len() => TagKind::Close,
        (true, _) => return None,
    };
    Some((name, kind, end + 1))
}

fn starts_with_entity(text: &str) -> bool {
    let Some(end) = text.find(';') else {
        return false;
    };
    let body = &text[1..end];
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = body.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }
    body.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && body.chars().all(|c| c.is_ascii_alphanumeric())
}

struct Delimiter {
    open: &'static str,
    close: &'static str,
    display: bool,
}

/// Longer openers first so `$$` is never read as two `$`.
const DELIMITERS: [Delimiter; 4] = [
    Delimiter {
        open: "$$",
        close: "$$",
        display: true,
    },
    Delimiter {
        open: "\\[",
        close: "\\]",
        display: true,
    },
    Delimiter {
        open: "\\(",
        close: "\\)",
        display: false,
    },
    Delimiter {
        open: "$",
        close: "$",
        display: false,
    },
];

/// Tags whose text is never scanned for math.
const VERBATIM_TAGS: &[&str] = &["code", "pre", "kbd"];

/// Replaces delimited math in text nodes with [`ContentNode::Math`]. A span
/// the renderer rejects, or an unterminated one, stays as literal text.
pub fn render_math(nodes: Vec<ContentNode>, renderer: &dyn MathRenderer) -> Vec<ContentNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            ContentNode::Text(text) => split_text(&text, renderer, &mut out),
            ContentNode::Element(mut el) => {
                if !VERBATIM_TAGS.contains(&el.tag.as_str()) {
                    el.children = render_math(std::mem::take(&mut el.children), renderer);
                }
                out.push(ContentNode::Element(el));
            }
            math @ ContentNode::Math(_) => out.push(math),
        }
    }
    out
}

fn split_text(text: &str, renderer: &dyn MathRenderer, out: &mut Vec<ContentNode>) {
    let mut literal = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some((start, delimiter)) = find_opener(rest) else {
            break;
        };
        let body_start = start + delimiter.open.len();
        let Some(body_len) = find_closer(&rest[body_start..], delimiter) else {
            // Unterminated here; a later, different delimiter may still match.
            literal.push_str(&rest[..body_start]);
            rest = &rest[body_start..];
            continue;
        };

        literal.push_str(&rest[..start]);
        let tex = &rest[body_start..body_start + body_len];
        let span_end = body_start + body_len + delimiter.close.len();
        match renderer.render(tex.trim(), delimiter.display) {
            Ok(markup) => {
                flush_literal(&mut literal, out);
                out.push(ContentNode::Math(MathNode {
                    tex: tex.trim().to_string(),
                    display: delimiter.display,
                    markup,
                }));
            }
            Err(err) => {
                bench_debug!("math fallback for {tex:?}: {err}");
                literal.push_str(&rest[start..span_end]);
            }
        }
        rest = &rest[span_end..];
    }

    literal.push_str(rest);
    flush_literal(&mut literal, out);
}

fn flush_literal(literal: &mut String, out: &mut Vec<ContentNode>) {
    if literal.is_empty() {
        return;
    }
    let text = std::mem::take(literal);
    if let Some(ContentNode::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(ContentNode::Text(text));
    }
}

fn find_opener(text: &str) -> Option<(usize, &'static Delimiter)> {
    let mut best: Option<(usize, &'static Delimiter)> = None;
    for delimiter in &DELIMITERS {
        let found = if delimiter.open == "$" {
            find_inline_dollar(text)
        } else {
            find_unescaped(text, delimiter.open, false)
        };
        let Some(pos) = found else {
            continue;
        };
        let better = match best {
            None => true,
            Some((best_pos, _)) => pos < best_pos,
        };
        if better {
            best = Some((pos, delimiter));
        }
    }
    best
}

/// Length of the body before the closing delimiter.
fn find_closer(body: &str, delimiter: &Delimiter) -> Option<usize> {
    if delimiter.open == "$" {
        let mut offset = 0;
        while let Some(pos) = find_unescaped(&body[offset..], "$", true) {
            let at = offset + pos;
            if at > 0 && !body[..at].ends_with(char::is_whitespace) {
                return Some(at);
            }
            offset = at + 1;
        }
        return None;
    }
    let at = body.find(delimiter.close)?;
    (at > 0).then_some(at)
}

/// Finds `needle`; for `$` a preceding backslash escapes it and `$$` is not a
/// single dollar.
fn find_unescaped(text: &str, needle: &str, single_dollar: bool) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(needle) {
        let at = offset + pos;
        let escaped = single_dollar && text[..at].ends_with('\\');
        let doubled = single_dollar
            && (text[at + 1..].starts_with('$') || text[..at].ends_with('$'));
        if !escaped && !doubled {
            return Some(at);
        }
        offset = at + needle.len();
    }
    None
}

/// First `$` that can open inline math: it must be followed by a non-space
/// character.
fn find_inline_dollar(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = find_unescaped(&text[offset..], "$", true) {
        let at = offset + pos;
        let opens = text[at + 1..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace());
        if opens {
            return Some(at);
        }
        offset = at + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl MathRenderer for Echo {
        fn render(&self, tex: &str, display: bool) -> Result<String, String> {
            Ok(format!("<{}>{tex}", if display { "block" } else { "inline" }))
        }
    }

    struct Rejecting;
    impl MathRenderer for Rejecting {
        fn render(&self, _tex: &str, _display: bool) -> Result<String, String> {
            Err("unsupported".into())
        }
    }

    fn scan(text: &str, renderer: &dyn MathRenderer) -> Vec<ContentNode> {
        render_math(vec![ContentNode::text(text)], renderer)
    }

    fn math(tex: &str, display: bool) -> ContentNode {
        ContentNode::Math(MathNode {
            tex: tex.to_string(),
            display,
            markup: format!("<{}>{tex}", if display { "block" } else { "inline" }),
        })
    }

    #[test]
    fn all_four_delimiters_are_recognised() {
        let nodes = scan(r"a $x$ b $$y$$ c \(z\) d \[w\]", &Echo);
        assert_eq!(
            nodes,
            vec![
                ContentNode::text("a "),
                math("x", false),
                ContentNode::text(" b "),
                math("y", true),
                ContentNode::text(" c "),
                math("z", false),
                ContentNode::text(" d "),
                math("w", true),
            ]
        );
    }

    #[test]
    fn unterminated_dollar_is_literal() {
        assert_eq!(scan("$x^2", &Echo), vec![ContentNode::text("$x^2")]);
    }

    #[test]
    fn prices_are_not_math() {
        assert_eq!(
            scan("costs $ 5 and $ 10", &Echo),
            vec![ContentNode::text("costs $ 5 and $ 10")]
        );
    }

    #[test]
    fn dollar_followed_by_space_does_not_hide_later_math() {
        let nodes = scan("pay $ 5 for $x$", &Echo);
        assert_eq!(nodes[1], math("x", false));
    }

    #[test]
    fn renderer_errors_fall_back_to_source_text() {
        assert_eq!(
            scan("before $\\bad$ after", &Rejecting),
            vec![ContentNode::text("before $\\bad$ after")]
        );
    }

    #[test]
    fn token_text_is_escaped() {
        let markup = well_formed(
            "<math><mi>a</mi><mo><</mo><mo>></mo><mo>&</mo><mo>&#x2062;</mo></math>",
        );
        assert_eq!(
            markup.as_deref(),
            Ok("<math><mi>a</mi><mo>&lt;</mo><mo>&gt;</mo><mo>&amp;</mo><mo>&#x2062;</mo></math>")
        );
    }

    #[test]
    fn injected_tags_are_rejected() {
        assert!(well_formed("<math><mtext></mtext><mi></mtext></math>").is_err());
        assert!(well_formed("<math><mtext><mrow></mtext></math>").is_err());
    }

    #[test]
    fn empty_elements_and_attributes_are_kept() {
        let markup =
            r#"<math display="block"><mspace width="1em"/><mi mathvariant="normal">d</mi></math>"#;
        assert_eq!(well_formed(markup).as_deref(), Ok(markup));
    }

    #[test]
    fn inline_parse_errors_are_failures() {
        assert!(MathMlRenderer.render(r"\notacommand{x}", false).is_err());
    }

    #[test]
    fn escaped_dollar_is_ignored() {
        assert_eq!(scan(r"\$5 $a$", &Echo)[1], math("a", false));
    }
}
