// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host tree.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use sapwood_core::backend::{AttrChange, HostAdapter, HostKind, attr_changes};
use sapwood_core::element::{Attrs, PropValue, Props, TEXT_VALUE};

/// A handle to a node in a [`MemoryHost`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A visible change to the host tree.
///
/// Node creation is not logged; detached nodes are not observable.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// `child` was appended to `parent`.
    Insert {
        /// The parent node.
        parent: NodeId,
        /// The appended node.
        child: NodeId,
    },
    /// `child` was detached from `parent`.
    Remove {
        /// The parent node.
        parent: NodeId,
        /// The detached node.
        child: NodeId,
    },
    /// An attribute was set on an attached node.
    SetAttr {
        /// The updated node.
        node: NodeId,
        /// Attribute name.
        key: String,
        /// New value.
        value: PropValue,
    },
    /// An attribute was removed from an attached node.
    RemoveAttr {
        /// The updated node.
        node: NodeId,
        /// Attribute name.
        key: String,
    },
}

/// Errors from [`MemoryHost::create_node`](HostAdapter::create_node).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryHostError {
    /// The node limit set with [`MemoryHost::set_node_limit`] was reached.
    NodeLimit(usize),
    /// The tag was rejected with [`MemoryHost::reject_tag`].
    Rejected(String),
}

impl fmt::Display for MemoryHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeLimit(limit) => write!(f, "node limit of {limit} reached"),
            Self::Rejected(tag) => write!(f, "tag <{tag}> is not supported"),
        }
    }
}

impl std::error::Error for MemoryHostError {}

#[derive(Clone, Debug)]
enum NodeKind {
    Element(String),
    Text,
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    attrs: Attrs,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A host tree kept in memory.
///
/// Node handles are plain indices; nodes are never freed, so detached nodes
/// stay inspectable after removal.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<NodeData>,
    log: Vec<Mutation>,
    created: usize,
    node_limit: Option<usize>,
    rejected: BTreeSet<String>,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container element to pass to
    /// [`Scheduler::create_root`](sapwood_core::scheduler::Scheduler::create_root).
    ///
    /// Containers do not count toward the node limit.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(tag.to_owned()), Attrs::new())
    }

    /// Makes every later `create_node` fail once `limit` nodes were created.
    pub fn set_node_limit(&mut self, limit: Option<usize>) {
        self.node_limit = limit;
    }

    /// Makes `create_node` fail for elements with this tag.
    pub fn reject_tag(&mut self, tag: &str) {
        self.rejected.insert(tag.to_owned());
    }

    /// Returns the mutation log.
    #[must_use]
    pub fn log(&self) -> &[Mutation] {
        &self.log
    }

    /// Returns and clears the mutation log.
    pub fn take_log(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    /// Returns how many nodes `create_node` produced.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }

    /// Returns the children of `node` in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    /// Returns the parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Returns the attributes of `node`.
    #[must_use]
    pub fn attrs(&self, node: NodeId) -> &Attrs {
        &self.node(node).attrs
    }

    /// Returns the tag of an element node, or `None` for text.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text => None,
        }
    }

    /// Serializes the children of `node` as markup.
    ///
    /// Attributes appear in key order; text nodes print their value.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(&mut out, child);
        }
        out
    }

    /// Counts the nodes currently reachable from `node`, excluding `node`.
    #[must_use]
    pub fn descendant_count(&self, node: NodeId) -> usize {
        self.children(node)
            .iter()
            .map(|&c| 1 + self.descendant_count(c))
            .sum()
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let data = self.node(id);
        match &data.kind {
            NodeKind::Text => {
                if let Some(value) = data.attrs.get(TEXT_VALUE) {
                    _ = write!(out, "{value}");
                }
            }
            NodeKind::Element(tag) => {
                _ = write!(out, "<{tag}");
                for (key, value) in &data.attrs {
                    _ = write!(out, " {key}=\"{value}\"");
                }
                out.push('>');
                for &child in &data.children {
                    self.write_node(out, child);
                }
                _ = write!(out, "</{tag}>");
            }
        }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        match self.nodes.get(id.0 as usize) {
            Some(node) => node,
            None => panic!("unknown node {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.nodes.get_mut(id.0 as usize) {
            Some(node) => node,
            None => panic!("unknown node {id:?}"),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "node count never reaches u32::MAX"
    )]
    fn alloc(&mut self, kind: NodeKind, attrs: Attrs) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            attrs,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let siblings = &mut self.node_mut(parent).children;
        let Some(pos) = siblings.iter().position(|&c| c == child) else {
            panic!("{child:?} is not a child of {parent:?}");
        };
        siblings.remove(pos);
        self.node_mut(child).parent = None;
    }
}

impl HostAdapter for MemoryHost {
    type Node = NodeId;
    type Error = MemoryHostError;

    fn create_node(&mut self, kind: HostKind<'_>, props: &Props) -> Result<NodeId, Self::Error> {
        if let Some(limit) = self.node_limit
            && self.created >= limit
        {
            return Err(MemoryHostError::NodeLimit(limit));
        }
        let kind = match kind {
            HostKind::Element(tag) if self.rejected.contains(tag) => {
                return Err(MemoryHostError::Rejected(tag.to_owned()));
            }
            HostKind::Element(tag) => NodeKind::Element(tag.to_owned()),
            HostKind::Text => NodeKind::Text,
        };
        self.created += 1;
        Ok(self.alloc(kind, props.attrs.clone()))
    }

    fn update_props(&mut self, node: &NodeId, old: &Props, new: &Props) {
        for change in attr_changes(&old.attrs, &new.attrs) {
            match change {
                AttrChange::Set(key, value) => {
                    self.node_mut(*node)
                        .attrs
                        .insert(key.to_owned(), value.clone());
                    self.log.push(Mutation::SetAttr {
                        node: *node,
                        key: key.to_owned(),
                        value: value.clone(),
                    });
                }
                AttrChange::Remove(key) => {
                    self.node_mut(*node).attrs.remove(key);
                    self.log.push(Mutation::RemoveAttr {
                        node: *node,
                        key: key.to_owned(),
                    });
                }
            }
        }
    }

    fn insert_child(&mut self, parent: &NodeId, child: &NodeId) {
        if let Some(old_parent) = self.node(*child).parent {
            self.detach(old_parent, *child);
        }
        self.node_mut(*parent).children.push(*child);
        self.node_mut(*child).parent = Some(*parent);
        self.log.push(Mutation::Insert {
            parent: *parent,
            child: *child,
        });
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(*parent, *child);
        self.log.push(Mutation::Remove {
            parent: *parent,
            child: *child,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapwood_core::element::attrs;

    fn props(pairs: &[(&str, &str)]) -> Props {
        Props {
            attrs: attrs(pairs.iter().copied()),
            children: Vec::new(),
        }
    }

    #[test]
    fn insert_and_serialize() {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let div = host
            .create_node(HostKind::Element("div"), &props(&[("id", "x")]))
            .unwrap();
        let text = host
            .create_node(HostKind::Text, &props(&[(TEXT_VALUE, "hi")]))
            .unwrap();
        host.insert_child(&div, &text);
        host.insert_child(&root, &div);
        assert_eq!(host.inner_html(root), "<div id=\"x\">hi</div>");
        assert_eq!(host.created(), 2);
        assert_eq!(host.descendant_count(root), 2);
        assert_eq!(host.parent(text), Some(div));
    }

    #[test]
    fn update_props_logs_attribute_changes() {
        let mut host = MemoryHost::new();
        let old = props(&[("a", "1"), ("b", "2")]);
        let node = host.create_node(HostKind::Element("p"), &old).unwrap();
        host.update_props(&node, &old, &props(&[("a", "3")]));
        assert_eq!(
            host.log(),
            [
                Mutation::RemoveAttr {
                    node,
                    key: "b".into()
                },
                Mutation::SetAttr {
                    node,
                    key: "a".into(),
                    value: "3".into()
                },
            ]
        );
        assert_eq!(host.attrs(node), &attrs([("a", "3")]));
    }

    #[test]
    fn reinserting_moves_the_node() {
        let mut host = MemoryHost::new();
        let a = host.create_container("a");
        let b = host.create_container("b");
        let n = host
            .create_node(HostKind::Element("i"), &Props::default())
            .unwrap();
        host.insert_child(&a, &n);
        host.insert_child(&b, &n);
        assert!(host.children(a).is_empty());
        assert_eq!(host.children(b), [n]);
    }

    #[test]
    fn limits_and_rejections() {
        let mut host = MemoryHost::new();
        host.reject_tag("blink");
        assert_eq!(
            host.create_node(HostKind::Element("blink"), &Props::default()),
            Err(MemoryHostError::Rejected("blink".into()))
        );
        host.set_node_limit(Some(0));
        assert_eq!(
            host.create_node(HostKind::Text, &Props::default()),
            Err(MemoryHostError::NodeLimit(0))
        );
    }

    #[test]
    #[should_panic(expected = "is not a child of")]
    fn removing_a_stranger_panics() {
        let mut host = MemoryHost::new();
        let a = host.create_container("a");
        let b = host.create_container("b");
        host.remove_child(&a, &b);
    }
}
