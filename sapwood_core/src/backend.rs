// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter trait.
//!
//! A [`HostAdapter`] owns the concrete host tree (DOM nodes, terminal cells,
//! an in-memory node table) and exposes the four capabilities the reconciler
//! needs. Backends implement it; core never names a concrete node type.
//!
//! Only [`create_node`](HostAdapter::create_node) is fallible. It runs during
//! reconciliation, where a failure can still abort the cycle without visible
//! effects. The remaining capabilities run during commit, which is
//! all-or-nothing, so they cannot report errors.

use alloc::vec::Vec;

use crate::element::{Attrs, PropValue, Props};

/// The host-side description of a node to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostKind<'a> {
    /// An element node with the given tag.
    Element(&'a str),
    /// A text node.
    Text,
}

/// Capabilities the reconciler needs from a host tree.
pub trait HostAdapter {
    /// Handle to a realized host node. Cloning must yield a handle to the
    /// same node.
    type Node: Clone;

    /// Error produced when a node cannot be created.
    type Error;

    /// Creates a detached node and applies `props.attrs` to it.
    ///
    /// The node is not attached anywhere; the commit pass inserts it.
    fn create_node(&mut self, kind: HostKind<'_>, props: &Props)
    -> Result<Self::Node, Self::Error>;

    /// Reconciles the attributes of `node` from `old` to `new`.
    ///
    /// [`attr_changes`] computes the minimal attribute diff.
    fn update_props(&mut self, node: &Self::Node, old: &Props, new: &Props);

    /// Appends `child` as the last child of `parent`.
    fn insert_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);
}

/// One attribute-level change between two props snapshots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttrChange<'a> {
    /// The attribute was added or its value changed.
    Set(&'a str, &'a PropValue),
    /// The attribute is no longer present.
    Remove(&'a str),
}

/// Computes the attribute changes from `old` to `new`.
///
/// Removals come first, then sets, each in key order.
#[must_use]
pub fn attr_changes<'a>(old: &'a Attrs, new: &'a Attrs) -> Vec<AttrChange<'a>> {
    let mut out: Vec<_> = old
        .keys()
        .filter(|k| !new.contains_key(*k))
        .map(|k| AttrChange::Remove(k))
        .collect();
    out.extend(
        new.iter()
            .filter(|(k, v)| old.get(*k) != Some(*v))
            .map(|(k, v)| AttrChange::Set(k, v)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::attrs;

    #[test]
    fn attr_diff_reports_removals_then_sets() {
        let old = attrs([("class", "a"), ("id", "x"), ("title", "t")]);
        let new = attrs([("class", "b"), ("id", "x"), ("lang", "en")]);
        let changes = attr_changes(&old, &new);
        assert_eq!(
            changes,
            [
                AttrChange::Remove("title"),
                AttrChange::Set("class", &PropValue::from("b")),
                AttrChange::Set("lang", &PropValue::from("en")),
            ]
        );
    }

    #[test]
    fn identical_attrs_produce_no_changes() {
        let a = attrs([("n", 1)]);
        assert!(attr_changes(&a, &a.clone()).is_empty());
    }
}
