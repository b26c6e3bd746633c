//! A [`DisplaySurface`] that types revealed content onto a terminal.

use std::io::{self, Write};

use workbench_core::reveal::{DisplaySurface, RevealStep, TreeSurface};
use workbench_core::{ContentNode, ContentTree};
use workbench_logging::bench_warn;

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "tr", "ul", "ol", "table", "div",
];

/// Prints text as it is revealed and keeps the revealed tree alongside, so
/// post-processing still has something to work on.
pub struct TerminalSurface<W> {
    out: W,
    tree: TreeSurface,
    open: Vec<String>,
    write_failed: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tree: TreeSurface::new(),
            open: Vec::new(),
            write_failed: false,
        }
    }

    fn write(&mut self, text: &str) {
        if self.write_failed {
            return;
        }
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            bench_warn!("terminal output failed: {err}");
            self.write_failed = true;
        }
    }

    fn enter(&mut self, tag: &str, language: Option<&str>) {
        match tag {
            "li" => self.write("  - "),
            "pre" => {
                let fence = format!("```{}\n", language.unwrap_or_default());
                self.write(&fence);
            }
            "blockquote" => self.write("> "),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                let marker = format!("{} ", "#".repeat(level));
                self.write(&marker);
            }
            _ => {}
        }
    }

    fn leave(&mut self, tag: &str) {
        match tag {
            "pre" => self.write("```\n"),
            "td" | "th" => self.write(" | "),
            tag if BLOCK_TAGS.contains(&tag) => self.write("\n"),
            _ => {}
        }
    }

    fn atom(&mut self, node: &ContentNode) {
        match node {
            ContentNode::Math(math) if math.display => {
                let text = format!("\n$${}$$\n", math.tex);
                self.write(&text);
            }
            ContentNode::Math(math) => {
                let text = format!("${}$", math.tex);
                self.write(&text);
            }
            ContentNode::Element(el) => match el.tag.as_str() {
                "br" => self.write("\n"),
                "hr" => self.write("----\n"),
                "img" => {
                    let text = format!("[image: {}]", el.attr("alt").unwrap_or_default());
                    self.write(&text);
                }
                _ => {}
            },
            ContentNode::Text(text) => {
                let text = text.clone();
                self.write(&text);
            }
        }
    }
}

impl<W: Write + Send> DisplaySurface for TerminalSurface<W> {
    fn begin(&mut self) {
        self.tree.begin();
        self.open.clear();
    }

    fn apply(&mut self, step: &RevealStep) {
        self.tree.apply(step);
        match step {
            RevealStep::Enter(el) => {
                self.enter(&el.tag, el.attr("data-language"));
                self.open.push(el.tag.clone());
            }
            RevealStep::Leave => {
                if let Some(tag) = self.open.pop() {
                    self.leave(&tag);
                }
            }
            RevealStep::Text => {}
            RevealStep::Char(ch) => {
                let mut buf = [0u8; 4];
                self.write(ch.encode_utf8(&mut buf));
            }
            RevealStep::Atom(node) => self.atom(node),
        }
    }

    fn content_mut(&mut self) -> &mut ContentTree {
        self.tree.content_mut()
    }

    fn finish(&mut self) {
        self.write("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workbench_core::reveal::reveal_instantly;
    use workbench_core::MessagePipeline;

    fn typed(markdown: &str) -> String {
        let tree = MessagePipeline::new().render(markdown);
        let mut surface = TerminalSurface::new(Vec::new());
        reveal_instantly(&mut surface, &tree, None);
        String::from_utf8(surface.out).unwrap()
    }

    #[test]
    fn paragraphs_and_lists_become_lines() {
        assert_eq!(
            typed("Hello **there**\n\n- one\n- two"),
            "Hello there\n  - one\n  - two\n\n\n"
        );
    }

    #[test]
    fn code_blocks_are_fenced_with_their_language() {
        assert_eq!(
            typed("```rust\nlet x = 1;\n```"),
            "```rust\nlet x = 1;\n```\n\n"
        );
    }

    #[test]
    fn math_is_shown_as_tex() {
        assert_eq!(typed("area $a^2$"), "area $a^2$\n\n");
    }

    #[test]
    fn tree_is_kept_for_post_processing() {
        let tree = MessagePipeline::new().render("plain words");
        let mut surface = TerminalSurface::new(Vec::new());
        reveal_instantly(&mut surface, &tree, None);
        assert_eq!(surface.content_mut().plain_text(), "plain words");
    }
}
