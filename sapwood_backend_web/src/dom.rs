// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host adapter.
//!
//! Host elements map to DOM elements with their attributes set through
//! `setAttribute`. Text elements map to DOM text nodes whose value lives in
//! `nodeValue`.

use alloc::string::{String, ToString};
use core::fmt;

use sapwood_core::backend::{AttrChange, HostAdapter, HostKind, attr_changes};
use sapwood_core::element::{PropValue, Props, TEXT_VALUE};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, Node};

/// A DOM call rejected by the browser, typically an invalid tag or
/// attribute name.
#[derive(Clone, Debug)]
pub struct DomError {
    /// What was being created.
    pub what: String,
    /// The exception thrown by the browser.
    pub value: JsValue,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.as_string() {
            Some(message) => write!(f, "could not create {}: {message}", self.what),
            None => write!(f, "could not create {}: {:?}", self.what, self.value),
        }
    }
}

impl core::error::Error for DomError {}

/// A [`HostAdapter`] that builds real DOM nodes in a [`Document`].
pub struct DomHost {
    document: Document,
}

impl fmt::Debug for DomHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .finish()
    }
}

impl DomHost {
    /// Creates a host that creates nodes in `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Creates a host for the current window's document, if there is one.
    #[must_use]
    pub fn from_window() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self::new(document))
    }

    /// Returns the document nodes are created in.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Sets `key` on an element. `false` removes the attribute; `true` sets it
/// empty, matching HTML boolean attributes.
fn set_attribute(el: &Element, key: &str, value: &PropValue) -> Result<(), JsValue> {
    match value {
        PropValue::Bool(false) => el.remove_attribute(key),
        PropValue::Bool(true) => el.set_attribute(key, ""),
        other => el.set_attribute(key, &other.to_string()),
    }
}

/// Checks the result of a commit-time DOM call. Those calls only fail when
/// the DOM has drifted from the committed tree.
fn debug_check<T, E: fmt::Debug>(result: Result<T, E>, op: &str) {
    debug_assert!(result.is_ok(), "{op} failed: {:?}", result.err());
}

impl HostAdapter for DomHost {
    type Node = Node;
    type Error = DomError;

    fn create_node(&mut self, kind: HostKind<'_>, props: &Props) -> Result<Node, DomError> {
        match kind {
            HostKind::Element(tag) => {
                let fail = |value| DomError {
                    what: alloc::format!("<{tag}>"),
                    value,
                };
                let el = self.document.create_element(tag).map_err(fail)?;
                for (key, value) in &props.attrs {
                    set_attribute(&el, key, value).map_err(fail)?;
                }
                Ok(el.into())
            }
            HostKind::Text => {
                let value = props
                    .get(TEXT_VALUE)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                Ok(self.document.create_text_node(&value).into())
            }
        }
    }

    fn update_props(&mut self, node: &Node, old: &Props, new: &Props) {
        let Some(el) = node.dyn_ref::<Element>() else {
            // Text node.
            let value = new.get(TEXT_VALUE).map(ToString::to_string);
            node.set_node_value(value.as_deref());
            return;
        };
        for change in attr_changes(&old.attrs, &new.attrs) {
            let result = match change {
                AttrChange::Remove(key) => el.remove_attribute(key),
                AttrChange::Set(key, value) => set_attribute(el, key, value),
            };
            debug_check(result, "updating an attribute");
        }
    }

    fn insert_child(&mut self, parent: &Node, child: &Node) {
        // Appending an attached node moves it.
        debug_check(parent.append_child(child), "appendChild");
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) {
        debug_check(parent.remove_child(child), "removeChild");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_calls_pass() {
        debug_check(Ok::<(), &str>(()), "removeChild");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "removeChild failed")]
    fn failed_removal_panics_in_debug_builds() {
        debug_check(Err::<(), _>("NotFoundError"), "removeChild");
    }
}
