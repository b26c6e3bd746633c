//! Incremental reveal of a [`ContentTree`].
//!
//! A tree is flattened into [`RevealStep`]s in document order. Applying every
//! step of a tree to an empty [`TreeSurface`] rebuilds that tree; applying a
//! prefix of the steps shows a prefix of the content. The async presenter in
//! the client crate drives the timing; everything here is synchronous.

use workbench_logging::bench_warn;

use crate::content::{ContentNode, ContentTree, Element};

/// Elements that have no children to reveal and appear at once.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealStep {
    /// Open an element (attributes only, children follow).
    Enter(Element),
    /// Start a new, empty text node.
    Text,
    /// Append one character to the current text node.
    Char(char),
    /// Insert a node whole: math and void elements.
    Atom(ContentNode),
    /// Close the innermost open element.
    Leave,
}

pub fn reveal_steps(tree: &ContentTree) -> Vec<RevealStep> {
    let mut steps = Vec::new();
    push_steps(&tree.nodes, &mut steps);
    steps
}

fn push_steps(nodes: &[ContentNode], steps: &mut Vec<RevealStep>) {
    for node in nodes {
        match node {
            ContentNode::Text(text) if text.is_empty() => {}
            ContentNode::Text(text) => {
                steps.push(RevealStep::Text);
                steps.extend(text.chars().map(RevealStep::Char));
            }
            ContentNode::Math(_) => steps.push(RevealStep::Atom(node.clone())),
            ContentNode::Element(el) if VOID_TAGS.contains(&el.tag.as_str()) => {
                steps.push(RevealStep::Atom(node.clone()));
            }
            ContentNode::Element(el) => {
                steps.push(RevealStep::Enter(el.shell()));
                push_steps(&el.children, steps);
                steps.push(RevealStep::Leave);
            }
        }
    }
}

/// Somewhere revealed content is shown.
pub trait DisplaySurface: Send {
    /// Prepares an empty area for the next message.
    fn begin(&mut self);

    fn apply(&mut self, step: &RevealStep);

    /// The content revealed since the last [`DisplaySurface::begin`].
    fn content_mut(&mut self) -> &mut ContentTree;

    /// Called once after the last step, post-processing included.
    fn finish(&mut self) {}

    /// Removes everything shown so far.
    fn clear(&mut self) {
        self.begin();
    }
}

/// Runs once over a fully revealed message.
pub trait PostProcessor: Send + Sync {
    fn process(&self, tree: &mut ContentTree);
}

/// Adds a copy button after every `pre > code` block.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyButtons;

impl PostProcessor for CopyButtons {
    fn process(&self, tree: &mut ContentTree) {
        attach_copy_buttons(tree);
    }
}

pub const COPY_BUTTON_CLASS: &str = "copy-button";

pub fn attach_copy_buttons(tree: &mut ContentTree) {
    fn walk(nodes: &mut [ContentNode]) {
        for node in nodes {
            let ContentNode::Element(el) = node else {
                continue;
            };
            if el.tag != "pre" {
                walk(&mut el.children);
                continue;
            }
            let already = el.children.iter().any(|child| {
                child
                    .as_element()
                    .is_some_and(|c| c.attr("class") == Some(COPY_BUTTON_CLASS))
            });
            if already {
                continue;
            }
            let Some(position) = el
                .children
                .iter()
                .position(|child| child.as_element().is_some_and(|c| c.tag == "code"))
            else {
                continue;
            };
            let code_text = el.children[position]
                .as_element()
                .map(Element::text)
                .unwrap_or_default();
            let button = Element::new("button")
                .with_attr("class", COPY_BUTTON_CLASS)
                .with_attr("data-clipboard-text", code_text)
                .with_child(ContentNode::text("Copy"));
            el.children
                .insert(position + 1, ContentNode::Element(button));
        }
    }
    walk(&mut tree.nodes);
}

/// Applies every step at once, then post-processes. Used for content that is
/// not typed out, such as the user's own messages.
pub fn reveal_instantly(
    surface: &mut dyn DisplaySurface,
    tree: &ContentTree,
    post: Option<&dyn PostProcessor>,
) {
    surface.begin();
    for step in reveal_steps(tree) {
        surface.apply(&step);
    }
    if let Some(post) = post {
        post.process(surface.content_mut());
    }
    surface.finish();
}

/// A surface that rebuilds the revealed tree in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSurface {
    tree: ContentTree,
    /// Child indices from the root down to the innermost open element.
    cursor: Vec<usize>,
}

impl TreeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn plain_text(&self) -> String {
        self.tree.plain_text()
    }

    fn open_children(&mut self) -> Option<&mut Vec<ContentNode>> {
        children_at(&mut self.tree.nodes, &self.cursor)
    }
}

fn children_at<'a>(
    nodes: &'a mut Vec<ContentNode>,
    path: &[usize],
) -> Option<&'a mut Vec<ContentNode>> {
    match path.split_first() {
        None => Some(nodes),
        Some((first, rest)) => match nodes.get_mut(*first)? {
            ContentNode::Element(el) => children_at(&mut el.children, rest),
            _ => None,
        },
    }
}

impl DisplaySurface for TreeSurface {
    fn begin(&mut self) {
        self.tree = ContentTree::default();
        self.cursor.clear();
    }

    fn apply(&mut self, step: &RevealStep) {
        let Some(children) = self.open_children() else {
            bench_warn!("reveal cursor {:?} points at no element", self.cursor);
            return;
        };
        match step {
            RevealStep::Enter(shell) => {
                children.push(ContentNode::Element(shell.clone()));
                let index = children.len() - 1;
                self.cursor.push(index);
            }
            RevealStep::Text => children.push(ContentNode::text("")),
            RevealStep::Char(ch) => match children.last_mut() {
                Some(ContentNode::Text(text)) => text.push(*ch),
                _ => children.push(ContentNode::text(ch.to_string())),
            },
            RevealStep::Atom(node) => children.push(node.clone()),
            RevealStep::Leave => {
                self.cursor.pop();
            }
        }
    }

    fn content_mut(&mut self) -> &mut ContentTree {
        &mut self.tree
    }
}

/// A chat transcript: one [`TreeSurface`] per message.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSurface {
    messages: Vec<TreeSurface>,
}

impl TranscriptSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &ContentTree> {
        self.messages.iter().map(TreeSurface::tree)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn current(&mut self) -> &mut TreeSurface {
        if self.messages.is_empty() {
            self.messages.push(TreeSurface::new());
        }
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }
}

impl DisplaySurface for TranscriptSurface {
    fn begin(&mut self) {
        self.messages.push(TreeSurface::new());
    }

    fn apply(&mut self, step: &RevealStep) {
        self.current().apply(step);
    }

    fn content_mut(&mut self) -> &mut ContentTree {
        self.current().content_mut()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> ContentTree {
        ContentTree::new(vec![ContentNode::Element(
            Element::new("p").with_child(ContentNode::text(text)),
        )])
    }

    #[test]
    fn steps_rebuild_the_tree() {
        let tree = ContentTree::new(vec![
            ContentNode::Element(
                Element::new("p")
                    .with_attr("title", "t")
                    .with_child(ContentNode::text("hi "))
                    .with_child(ContentNode::Element(
                        Element::new("strong").with_child(ContentNode::text("there")),
                    )),
            ),
            ContentNode::Element(Element::new("hr")),
            ContentNode::text("tail"),
        ]);
        let mut surface = TreeSurface::new();
        for step in reveal_steps(&tree) {
            surface.apply(&step);
        }
        assert_eq!(surface.tree(), &tree);
    }

    #[test]
    fn prefixes_grow_one_character_at_a_time() {
        let steps = reveal_steps(&paragraph("ab"));
        let mut surface = TreeSurface::new();
        let mut seen = vec![surface.plain_text()];
        for step in &steps {
            surface.apply(step);
            if matches!(step, RevealStep::Char(_)) {
                seen.push(surface.plain_text());
            }
        }
        assert_eq!(seen, vec!["", "a", "ab"]);
    }

    #[test]
    fn copy_button_follows_code_block_once() {
        let mut tree = ContentTree::new(vec![ContentNode::Element(
            Element::new("pre").with_child(ContentNode::Element(
                Element::new("code").with_child(ContentNode::text("let x = 1;")),
            )),
        )]);
        attach_copy_buttons(&mut tree);
        attach_copy_buttons(&mut tree);
        let buttons = tree.find_tag("button");
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].attr("data-clipboard-text"), Some("let x = 1;"));
        let pre = tree.find_tag("pre")[0];
        assert_eq!(pre.children[1].as_element().map(|b| b.tag.as_str()), Some("button"));
    }

    #[test]
    fn transcript_keeps_messages_apart() {
        let mut transcript = TranscriptSurface::new();
        reveal_instantly(&mut transcript, &paragraph("one"), None);
        reveal_instantly(&mut transcript, &paragraph("two"), None);
        let texts: Vec<String> = transcript.messages().map(ContentTree::plain_text).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
