use std::borrow::Cow;

use pulldown_cmark::{html, Event, Options, Parser};

/// Markdown to HTML with GFM extensions. Single newlines become `<br>` so
/// chat replies keep their line structure.
pub fn to_html(markdown: &str) -> String {
    let source = protect_tex_brackets(markdown);
    let parser = Parser::new_ext(&source, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// `\[`, `\]`, `\(` and `\)` are markdown escapes; double the backslash so the
/// TeX delimiters survive into the HTML text. Fenced and indented code blocks
/// and inline code spans are left untouched.
fn protect_tex_brackets(markdown: &str) -> Cow<'_, str> {
    if !markdown.contains("\\[") && !markdown.contains("\\(") {
        return Cow::Borrowed(markdown);
    }

    let mut out = String::with_capacity(markdown.len() + 8);
    let mut fence: Option<&str> = None;
    let mut indented_code = false;
    let mut after_blank = true;
    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(open) = fence {
            if trimmed.starts_with(open) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }
        let blank = trimmed.trim_end().is_empty();
        if !blank && code_indent(line) && (after_blank || indented_code) {
            indented_code = true;
            after_blank = false;
            out.push_str(line);
            continue;
        }
        if !blank {
            indented_code = false;
        }
        after_blank = blank;
        if let Some(open) = ["```", "~~~"].into_iter().find(|open| trimmed.starts_with(open)) {
            fence = Some(open);
            out.push_str(line);
            continue;
        }
        escape_line(line, &mut out);
    }
    Cow::Owned(out)
}

/// Four columns of leading whitespace, a tab counting as four.
fn code_indent(line: &str) -> bool {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
        if width >= 4 {
            return true;
        }
    }
    false
}

fn escape_line(line: &str, out: &mut String) {
    let chars: Vec<char> = line.chars().collect();
    let mut code_ticks = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '`' {
            let run = chars[i..].iter().take_while(|c| **c == '`').count();
            if code_ticks == 0 {
                code_ticks = run;
            } else if code_ticks == run {
                code_ticks = 0;
            }
            out.extend(std::iter::repeat('`').take(run));
            i += run;
            continue;
        }
        if ch == '\\' && code_ticks == 0 {
            match chars.get(i + 1) {
                Some(next @ ('[' | ']' | '(' | ')')) => {
                    out.push_str("\\\\");
                    out.push(*next);
                    i += 2;
                    continue;
                }
                Some('\\') => {
                    out.push_str("\\\\");
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }
        out.push(ch);
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_breaks_become_line_breaks() {
        let html = to_html("first\nsecond");
        assert!(html.contains("first<br />"), "{html}");
    }

    #[test]
    fn tex_brackets_survive_markdown_escapes() {
        let html = to_html(r"before \[x^2\] after");
        assert!(html.contains(r"\[x^2\]"), "{html}");
    }

    #[test]
    fn code_spans_are_not_rewritten() {
        let html = to_html(r"`\[` and \(y\)");
        assert!(html.contains(r"<code>\[</code>"), "{html}");
        assert!(html.contains(r"\(y\)"), "{html}");
    }

    #[test]
    fn fenced_blocks_are_not_rewritten() {
        let html = to_html("```\n\\[raw\\]\n```\n");
        assert!(html.contains("\\[raw\\]"), "{html}");
        assert!(!html.contains("\\\\["), "{html}");
    }

    #[test]
    fn indented_blocks_are_not_rewritten() {
        let html = to_html("intro\n\n    \\[x\\]\n    \\(y\\)\n\nafter \\[z\\]\n");
        assert!(html.contains("<pre><code>\\[x\\]\n\\(y\\)\n</code></pre>"), "{html}");
        assert!(!html.contains("\\\\"), "{html}");
        assert!(html.contains("after \\[z\\]"), "{html}");
    }

    #[test]
    fn indented_paragraph_continuation_is_still_protected() {
        let html = to_html("para line\n    \\[w\\]\n");
        assert!(html.contains("\\[w\\]"), "{html}");
        assert!(!html.contains("<pre>"), "{html}");
    }
}
