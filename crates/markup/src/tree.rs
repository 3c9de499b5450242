//! Immutable arena tree built from an html5ever parse.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::text::collapse_whitespace;

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An element with a lowercase tag name and its attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic root standing in for the flattened document/body.
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena of parsed markup nodes. Node 0 is always the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

const ROOT: NodeId = NodeId(0);

impl Tree {
    /// Parses markup with the HTML5 tree-construction algorithm.
    ///
    /// Fragments and full documents are both accepted. The `html` and `body`
    /// wrappers are flattened into the root, `head` is dropped together with
    /// comments, doctypes and processing instructions.
    pub fn parse(markup: &str) -> Tree {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);

        let mut tree = Tree {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        };

        let mut stack: Vec<(Handle, NodeId)> = Vec::new();
        push_children(&dom.document, ROOT, &mut stack);

        while let Some((handle, parent)) = stack.pop() {
            match &handle.data {
                NodeData::Element { name, attrs, .. } => {
                    let tag = (*name.local).to_ascii_lowercase();
                    match tag.as_str() {
                        "html" | "body" => push_children(&handle, parent, &mut stack),
                        "head" => {}
                        _ => {
                            let attrs = attrs
                                .borrow()
                                .iter()
                                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                                .collect();
                            let id = tree.push(NodeKind::Element(Element { tag, attrs }), parent);
                            push_children(&handle, id, &mut stack);
                        }
                    }
                }
                NodeData::Text { contents } => {
                    let text = contents.borrow().to_string();
                    tree.push_text(text, parent);
                }
                _ => {}
            }
        }

        tree
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    // Text split around a flattened wrapper would otherwise land as two
    // adjacent siblings.
    fn push_text(&mut self, text: String, parent: NodeId) {
        if let Some(&last) = self.nodes[parent.index()].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.index()].kind {
                existing.push_str(&text);
                return;
            }
        }
        self.push(NodeKind::Text(text), parent);
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text_node(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    /// True when `id` is a `tag` element, optionally carrying `class`.
    pub fn is(&self, id: NodeId, tag: &str, class: Option<&str>) -> bool {
        match self.element(id) {
            Some(el) if el.tag == tag => class.is_none_or(|c| el.has_class(c)),
            _ => false,
        }
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.element(*child).is_some())
    }

    /// First direct element child matching `tag` and optional `class`.
    pub fn child_element(&self, id: NodeId, tag: &str, class: Option<&str>) -> Option<NodeId> {
        self.element_children(id).find(|child| self.is(*child, tag, class))
    }

    /// Preorder walk over every node below `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// First descendant in document order matching `tag` and optional `class`.
    pub fn find_element(&self, id: NodeId, tag: &str, class: Option<&str>) -> Option<NodeId> {
        self.descendants(id).find(|node| self.is(*node, tag, class))
    }

    pub fn find_all<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
        class: Option<&'a str>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .filter(move |node| self.is(*node, tag, class))
    }

    /// Next sibling that is an element, skipping text in between.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|s| self.element(*s).is_some())
    }

    /// Walks up from the parent of `id` to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |node| self.parent(*node))
    }

    /// Concatenated text of `id` and all of its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text_node(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.text_node(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// [`Tree::text`] with whitespace collapsed and edges trimmed.
    pub fn collapsed_text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text(id))
    }
}

fn push_children(handle: &Handle, parent: NodeId, stack: &mut Vec<(Handle, NodeId)>) {
    for child in handle.children.borrow().iter().rev() {
        stack.push((child.clone(), parent));
    }
}

/// Preorder iterator returned by [`Tree::descendants`].
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(next).iter().rev().copied());
        Some(next)
    }
}
