use crate::{PropValue, Properties};

/// Output of a render pass. A plain description value; the engine keeps the
/// latest one per instance and never diffs it.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(String),
    Element(Element),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: String,
    pub props: Properties,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Node::Element(Element {
            tag: tag.into(),
            props: Properties::new(),
            children: Vec::new(),
        })
    }

    /// Sets a prop on an element. Ignored on text/empty nodes.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        if let Node::Element(el) = &mut self {
            el.props.set(key, value);
        }
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.extend(children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.tag),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants, depth first.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Empty => {}
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => {
                for c in &el.children {
                    c.collect_text(out);
                }
            }
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }
}
