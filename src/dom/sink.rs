//! Tree builder target shared by html5ever and xml5ever.

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName, local_name, ns};

use super::tree::{Dom, NodeId, NodeKind};

/// Builds a [`Dom`]. Both parsers drive sinks through `&self`, hence the
/// `RefCell`.
pub struct DomSink {
    dom: RefCell<Dom>,
}

impl Default for DomSink {
    fn default() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
        }
    }
}

impl DomSink {
    pub fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }

    fn insert(&self, anchor: NodeId, child: NodeOrText<NodeId>, before: bool) {
        let mut dom = self.dom.borrow_mut();
        let node = match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) if !before => {
                dom.append_text(anchor, &text);
                return;
            }
            NodeOrText::AppendText(text) => dom.push(NodeKind::Text(text.to_string())),
        };
        if before {
            dom.insert_before(anchor, node);
        } else {
            dom.append(anchor, node);
        }
    }
}

static NO_NAME: QualName = QualName {
    prefix: None,
    ns: ns!(),
    local: local_name!(""),
};

impl TreeSink for DomSink {
    type Handle = NodeId;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self {
        self
    }

    // Content documents in the wild are rarely valid; recover silently.
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> NodeId {
        self.dom.borrow().root()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> &'a QualName {
        let dom = self.dom.borrow();
        match dom.node(*target).map(|n| &n.kind) {
            Some(NodeKind::Element { name, .. }) => {
                let name: *const QualName = &**name;
                // SAFETY: names are boxed and nodes are never dropped or
                // replaced while the sink lives, so the pointee outlives the
                // `RefCell` guard released here.
                unsafe { &*name }
            }
            _ => &NO_NAME,
        }
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, _: ElementFlags) -> NodeId {
        self.dom.borrow_mut().push_element(name, attrs)
    }

    fn create_comment(&self, _text: StrTendril) -> NodeId {
        self.dom.borrow_mut().push(NodeKind::Other)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> NodeId {
        self.dom.borrow_mut().push(NodeKind::Other)
    }

    fn append(&self, parent: &NodeId, child: NodeOrText<NodeId>) {
        self.insert(*parent, child, false);
    }

    fn append_before_sibling(&self, sibling: &NodeId, child: NodeOrText<NodeId>) {
        self.insert(*sibling, child, true);
    }

    fn append_based_on_parent_node(
        &self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        let attached = self
            .dom
            .borrow()
            .node(*element)
            .is_some_and(|n| n.parent.is_some());
        if attached {
            self.insert(*element, child, true);
        } else {
            self.insert(*prev_element, child, false);
        }
    }

    fn append_doctype_to_document(&self, _: StrTendril, _: StrTendril, _: StrTendril) {}

    // Template contents are pruned by the cleaner, so the element itself
    // can stand in for its fragment.
    fn get_template_contents(&self, target: &NodeId) -> NodeId {
        *target
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&self, target: &NodeId, attrs: Vec<Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(NodeKind::Element { attrs: existing, .. }) =
            dom.node_mut(*target).map(|n| &mut n.kind)
        {
            for attr in attrs {
                if existing.iter().all(|a| a.name != attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &NodeId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &NodeId, new_parent: &NodeId) {
        let mut dom = self.dom.borrow_mut();
        let children: Vec<_> = dom.children(*node).collect();
        for child in children {
            dom.detach(child);
            dom.append(*new_parent, child);
        }
    }
}
