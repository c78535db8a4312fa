// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element descriptions and the element factory.
//!
//! An [`Element`] is an immutable `{kind, props}` record produced by
//! application code. Props are shared behind an [`Rc`], so cloning an element
//! is cheap and the reconciler can detect "same props" by pointer identity.
//!
//! [`create_element`] is the boundary where malformed input is rejected:
//! the reconciler never sees an element without a kind.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::backend::HostKind;
use crate::component::ComponentType;

/// Attribute key under which text elements store their value.
pub const TEXT_VALUE: &str = "nodeValue";

/// A single attribute or state value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered attribute map. Also used for component state and state patches.
pub type Attrs = BTreeMap<String, PropValue>;

/// Builds an [`Attrs`] map from key/value pairs.
pub fn attrs<K, V, I>(pairs: I) -> Attrs
where
    K: Into<String>,
    V: Into<PropValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The props snapshot of an element: attributes plus ordered children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    /// Attributes, excluding children.
    pub attrs: Attrs,
    /// Child elements, already flattened and filtered.
    pub children: Vec<Element>,
}

impl Props {
    /// Returns the attribute stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attrs.get(key)
    }
}

/// What an element describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// A host node with the given tag (e.g. `"div"`).
    Host(String),
    /// A text node; the value lives under [`TEXT_VALUE`].
    Text,
    /// A component, rendered through its [`Component`](crate::component::Component)
    /// implementation.
    Component(ComponentType),
}

impl ElementKind {
    /// Creates a host kind.
    #[must_use]
    pub fn host(tag: impl Into<String>) -> Self {
        Self::Host(tag.into())
    }

    /// Returns the host-side view of this kind, or `None` for components.
    #[must_use]
    pub fn host_kind(&self) -> Option<HostKind<'_>> {
        match self {
            Self::Host(tag) => Some(HostKind::Element(tag)),
            Self::Text => Some(HostKind::Text),
            Self::Component(_) => None,
        }
    }

    /// Returns `true` for component kinds.
    #[must_use]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => f.write_str(tag),
            Self::Text => f.write_str("#text"),
            Self::Component(ty) => write!(f, "<{}>", ty.name()),
        }
    }
}

/// An immutable element description.
#[derive(Clone, Debug)]
pub struct Element {
    kind: ElementKind,
    props: Rc<Props>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && (Rc::ptr_eq(&self.props, &other.props) || self.props == other.props)
    }
}

impl Element {
    /// Creates a text element holding `value`.
    #[must_use]
    pub fn text(value: impl Into<PropValue>) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert(TEXT_VALUE.into(), value.into());
        Self {
            kind: ElementKind::Text,
            props: Rc::new(Props {
                attrs,
                children: Vec::new(),
            }),
        }
    }

    /// Returns the element's kind.
    #[must_use]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Returns the shared props snapshot.
    #[must_use]
    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }
}

/// A raw child argument accepted by [`create_element`].
#[derive(Clone, Debug)]
pub enum Child {
    /// An already-built element.
    Element(Element),
    /// A string, wrapped as a text element.
    Text(String),
    /// An integer, wrapped as a text element (`0` is kept).
    Int(i64),
    /// A float, wrapped as a text element.
    Float(f64),
    /// `false` is dropped; `true` becomes the text `"true"`.
    Bool(bool),
    /// Dropped.
    Null,
    /// A sequence spliced one level into the child list.
    List(Vec<Child>),
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Child {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Errors from [`create_element`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementError {
    /// A host element was given an empty tag.
    MissingType,
    /// A child list contained another list below the first splice level.
    NestedChildList,
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingType => f.write_str("element has no type"),
            Self::NestedChildList => {
                f.write_str("child lists may only be nested one level deep")
            }
        }
    }
}

impl core::error::Error for ElementError {}

/// Builds an element from a kind, optional attributes, and raw children.
///
/// Children are flattened one level, `Null` and `false` are dropped, and
/// scalar values are wrapped as text elements. Falsy-but-meaningful values
/// such as `0` and `""` are kept.
///
/// # Errors
///
/// Returns [`ElementError::MissingType`] for a host element with an empty tag
/// and [`ElementError::NestedChildList`] for lists nested below the first
/// splice level.
pub fn create_element<I>(
    kind: ElementKind,
    attrs: Option<Attrs>,
    children: I,
) -> Result<Element, ElementError>
where
    I: IntoIterator<Item = Child>,
{
    if let ElementKind::Host(tag) = &kind
        && tag.is_empty()
    {
        return Err(ElementError::MissingType);
    }

    let mut flat = Vec::new();
    for child in children {
        match child {
            Child::List(items) => {
                for item in items {
                    push_child(&mut flat, item)?;
                }
            }
            other => push_child(&mut flat, other)?,
        }
    }

    Ok(Element {
        kind,
        props: Rc::new(Props {
            attrs: attrs.unwrap_or_default(),
            children: flat,
        }),
    })
}

fn push_child(out: &mut Vec<Element>, child: Child) -> Result<(), ElementError> {
    match child {
        Child::Element(e) => out.push(e),
        Child::Text(s) => out.push(Element::text(s)),
        Child::Int(n) => out.push(Element::text(n)),
        Child::Float(x) => out.push(Element::text(format!("{x}"))),
        Child::Bool(true) => out.push(Element::text(true)),
        Child::Bool(false) | Child::Null => {}
        Child::List(_) => return Err(ElementError::NestedChildList),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn div(children: Vec<Child>) -> Element {
        create_element(ElementKind::host("div"), None, children).unwrap()
    }

    #[test]
    fn empty_tag_is_rejected() {
        let err = create_element(ElementKind::host(""), None, []).unwrap_err();
        assert_eq!(err, ElementError::MissingType);
    }

    #[test]
    fn null_and_false_are_dropped() {
        let e = div(vec![Child::Null, Child::Bool(false), "a".into()]);
        assert_eq!(e.props().children.len(), 1);
        assert_eq!(e.props().children[0], Element::text("a"));
    }

    #[test]
    fn falsy_but_meaningful_values_are_kept() {
        let e = div(vec![0.into(), "".into()]);
        let kids = &e.props().children;
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].props().get(TEXT_VALUE), Some(&PropValue::Int(0)));
        assert_eq!(
            kids[1].props().get(TEXT_VALUE),
            Some(&PropValue::Str(String::new()))
        );
    }

    #[test]
    fn lists_splice_one_level() {
        let e = div(vec![
            "head".into(),
            Child::List(vec!["x".into(), Child::Null, "y".into()]),
            "tail".into(),
        ]);
        let texts: Vec<_> = e
            .props()
            .children
            .iter()
            .map(|c| c.props().get(TEXT_VALUE).unwrap().to_string())
            .collect();
        assert_eq!(texts, ["head", "x", "y", "tail"]);
    }

    #[test]
    fn doubly_nested_list_is_rejected() {
        let err = create_element(
            ElementKind::host("ul"),
            None,
            [Child::List(vec![Child::List(vec!["x".into()])])],
        )
        .unwrap_err();
        assert_eq!(err, ElementError::NestedChildList);
    }

    #[test]
    fn attrs_are_kept_and_children_stored_separately() {
        let e = create_element(
            ElementKind::host("a"),
            Some(attrs([("href", "/home")])),
            ["home".into()],
        )
        .unwrap();
        assert_eq!(e.props().get("href"), Some(&PropValue::from("/home")));
        assert_eq!(e.props().children.len(), 1);
    }

    #[test]
    fn true_becomes_text() {
        let e = div(vec![true.into()]);
        assert_eq!(
            e.props().children[0].props().get(TEXT_VALUE),
            Some(&PropValue::Bool(true))
        );
    }
}
