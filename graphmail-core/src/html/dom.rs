//! Arena document tree built from an html5ever parse.
//!
//! Nodes are addressed by index. Detaching a node unlinks it from its
//! parent, so every traversal that starts at the root only sees the live
//! tree.

use scraper::Html;

/// Index of a node inside a [`Document`].
pub type NodeId = usize;

const ROOT: NodeId = 0;

/// Element classification, computed once from the tag name while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `h1`..`h6`; the level is 1 for `h1`.
    Heading(u8),
    Paragraph,
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    /// `td` or `th`.
    TableCell,
    Anchor,
    LineBreak,
    /// `div`.
    Block,
    /// `script`, `style`, `meta`, `link`.
    NonContent,
    Other,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "p" => ElementKind::Paragraph,
            "ul" => ElementKind::UnorderedList,
            "ol" => ElementKind::OrderedList,
            "li" => ElementKind::ListItem,
            "table" => ElementKind::Table,
            "tr" => ElementKind::TableRow,
            "td" | "th" => ElementKind::TableCell,
            "a" => ElementKind::Anchor,
            "br" => ElementKind::LineBreak,
            "div" => ElementKind::Block,
            "script" | "style" | "meta" | "link" => ElementKind::NonContent,
            _ => heading_level(tag)
                .map(ElementKind::Heading)
                .unwrap_or(ElementKind::Other),
        }
    }

    /// Kinds whose rendering already carries its own line structure.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ElementKind::Heading(_)
                | ElementKind::Paragraph
                | ElementKind::UnorderedList
                | ElementKind::OrderedList
                | ElementKind::Table
        )
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) if digit.len() == 1 => Some(level),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Root,
    Element {
        name: String,
        kind: ElementKind,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
        /// Kind of the element this text replaced, if any.
        origin: Option<ElementKind>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed HTML fragment.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse markup with HTML5 error recovery. Never fails.
    pub fn parse(html: &str) -> Self {
        let fragment = Html::parse_fragment(html);
        let mut doc = Document {
            nodes: vec![Node {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
        };

        let mut stack: Vec<_> = fragment
            .tree
            .root()
            .children()
            .rev()
            .map(|child| (child, ROOT))
            .collect();

        while let Some((source, parent)) = stack.pop() {
            let data = match source.value() {
                scraper::Node::Element(el) => NodeData::Element {
                    name: el.name().to_string(),
                    kind: ElementKind::from_tag(el.name()),
                    attrs: el
                        .attrs()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
                scraper::Node::Text(text) => NodeData::Text {
                    text: text.text.to_string(),
                    origin: None,
                },
                _ => continue,
            };
            let id = doc.push(data, parent);
            if matches!(doc.nodes[id].data, NodeData::Element { .. }) {
                stack.extend(source.children().rev().map(|child| (child, id)));
            }
        }

        doc
    }

    fn push(&mut self, data: NodeData, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id].data
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Element kind, or `None` for text and the root.
    pub fn kind(&self, id: NodeId) -> Option<ElementKind> {
        match &self.nodes[id].data {
            NodeData::Element { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The element kind a node is or stands in for.
    pub fn effective_kind(&self, id: NodeId) -> Option<ElementKind> {
        match &self.nodes[id].data {
            NodeData::Element { kind, .. } => Some(*kind),
            NodeData::Text { origin, .. } => *origin,
            NodeData::Root => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == ROOT {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Descendants of `id` (excluding itself) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `id` whose kind matches, in document order.
    pub fn find_within<F>(&self, id: NodeId, matches: F) -> Vec<NodeId>
    where
        F: Fn(ElementKind) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.kind(node).is_some_and(&matches))
            .collect()
    }

    /// All live elements whose kind matches, in document order.
    pub fn find_all<F>(&self, matches: F) -> Vec<NodeId>
    where
        F: Fn(ElementKind) -> bool,
    {
        self.find_within(ROOT, matches)
    }

    /// Concatenated text of the node and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text { text, .. } = &self.nodes[id].data {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeData::Text { text, .. } = &self.nodes[node].data {
                out.push_str(text);
            }
        }
        out
    }

    /// Unlink a node (and its subtree) from the live tree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }

    /// Put a text node in place of `id`, remembering what it replaced.
    pub fn replace_with_text(&mut self, id: NodeId, text: String) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let origin = self.kind(id);
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&child| child == id)?;

        let new_id = self.nodes.len();
        self.nodes.push(Node {
            data: NodeData::Text { text, origin },
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children[position] = new_id;
        self.nodes[id].parent = None;
        Some(new_id)
    }
}
