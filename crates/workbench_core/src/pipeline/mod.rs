//! Raw assistant text to a sanitized [`ContentTree`]: markdown, sanitizing,
//! math, then code highlighting.

mod highlight;
mod markdown;
mod math;
mod sanitize;

use workbench_logging::bench_trace;

pub use highlight::{CodeHighlighter, PLAIN_LANGUAGE};
pub use markdown::to_html;
pub use math::{render_math, MathMlRenderer, MathRenderer};
pub use sanitize::Sanitizer;

use crate::content::ContentTree;

pub struct MessagePipeline {
    sanitizer: Sanitizer,
    math: Box<dyn MathRenderer>,
    highlighter: CodeHighlighter,
}

impl Default for MessagePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePipeline {
    pub fn new() -> Self {
        Self::with_math_renderer(Box::new(MathMlRenderer))
    }

    pub fn with_math_renderer(math: Box<dyn MathRenderer>) -> Self {
        Self {
            sanitizer: Sanitizer,
            math,
            highlighter: CodeHighlighter,
        }
    }

    pub fn render(&self, raw: &str) -> ContentTree {
        let html = to_html(raw);
        let tree = self.sanitizer.sanitize(&html);
        let nodes = render_math(tree.nodes, self.math.as_ref());
        let nodes = self.highlighter.highlight_blocks(nodes);
        bench_trace!(
            "rendered {} bytes of markdown into {} top-level nodes",
            raw.len(),
            nodes.len()
        );
        ContentTree::new(nodes)
    }
}

impl std::fmt::Debug for MessagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePipeline").finish_non_exhaustive()
    }
}
