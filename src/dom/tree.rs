//! Index-linked document tree.
//!
//! html5ever builds into this tree; the cleaner then unlinks subtrees and
//! walks what remains. Nodes live in one vector and are never freed, so a
//! [`NodeId`] stays valid for the life of the [`Dom`].

use html5ever::{Attribute, QualName};

const OPS_NAMESPACE: &str = "http://www.idpf.org/2007/ops";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Root,
    /// The name is boxed so its address survives growth of the node vector;
    /// the tree sink lends out references to it.
    Element {
        name: Box<QualName>,
        attrs: Vec<Attribute>,
    },
    Text(String),
    /// Comments, doctypes and processing instructions.
    Other,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty tree holding only the root.
    pub fn new() -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push(NodeKind::Root);
        dom
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing but the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        });
        id
    }

    pub fn push_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.push(NodeKind::Element {
            name: Box::new(name),
            attrs,
        })
    }

    /// Link `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let prev = self.node(parent).and_then(|n| n.last_child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = None;
        }
        if let Some(prev) = prev {
            if let Some(prev) = self.node_mut(prev) {
                prev.next_sibling = Some(child);
            }
        } else if let Some(node) = self.node_mut(parent) {
            node.first_child = Some(child);
        }
        if let Some(node) = self.node_mut(parent) {
            node.last_child = Some(child);
        }
    }

    /// Link `node` immediately before `sibling`, under the same parent.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        let Some((parent, prev)) = self.node(sibling).map(|n| (n.parent, n.prev_sibling)) else {
            return;
        };
        if let Some(new) = self.node_mut(node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = Some(sibling);
        }
        if let Some(sib) = self.node_mut(sibling) {
            sib.prev_sibling = Some(node);
        }
        match prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next_sibling = Some(node);
                }
            }
            None => {
                if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
                    parent.first_child = Some(node);
                }
            }
        }
    }

    /// Append text under `parent`, merging into a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.node(parent).and_then(|n| n.last_child);
        if let Some(NodeKind::Text(existing)) = last.and_then(|id| self.node_mut(id)).map(|n| &mut n.kind)
        {
            existing.push_str(text);
            return;
        }
        let node = self.push(NodeKind::Text(text.to_string()));
        self.append(parent, node);
    }

    /// Unlink `id` from its parent. Its subtree goes with it.
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, prev, next)) = self
            .node(id)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };

        match prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next_sibling = next;
                }
            }
            None => {
                if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
                    parent.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(next) = self.node_mut(next) {
                    next.prev_sibling = prev;
                }
            }
            None => {
                if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
                    parent.last_child = prev;
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.node(id).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.node(current).and_then(|n| n.next_sibling);
            Some(current)
        })
    }

    /// `root` and everything linked below it, in document order.
    pub fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
            Some(id)
        })
    }

    pub fn find(&self, root: NodeId, predicate: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.descendants(root).find(|&id| predicate(id))
    }

    /// Local tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    /// Attribute value by qualified spelling (`"href"`, `"epub:type"`).
    ///
    /// html5ever keeps unknown prefixes inside the local name on HTML
    /// elements but splits them on foreign content, so both forms match.
    /// From xml5ever, `epub:` also matches by the OPS namespace whatever
    /// prefix the document bound it to.
    pub fn attr(&self, id: NodeId, qualified: &str) -> Option<&str> {
        let NodeKind::Element { attrs, .. } = &self.node(id)?.kind else {
            return None;
        };
        let (prefix, local) = match qualified.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qualified),
        };
        attrs
            .iter()
            .find(|a| {
                if &*a.name.local == qualified {
                    return true;
                }
                &*a.name.local == local
                    && (a.name.prefix.as_deref() == prefix
                        || (prefix == Some("epub") && &*a.name.ns == OPS_NAMESPACE))
            })
            .map(|a| &*a.value)
    }

    /// Whether a whitespace-separated attribute lists `token`, ignoring case.
    pub fn has_token(&self, id: NodeId, qualified: &str, token: &str) -> bool {
        self.attr(id, qualified).is_some_and(|value| {
            value
                .split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token))
        })
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Every text node under `id`, concatenated.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id).filter_map(|n| self.text(n)).collect()
    }
}
