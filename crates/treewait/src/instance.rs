//! The capabilities a live object tree must offer.
//!
//! Waits never own or mutate the tree. They look things up through
//! [`Instance`] and subscribe to its signals, and that is all. Any host can
//! be awaited on by implementing the required methods; the lookups are
//! provided in terms of [`Instance::children`].
use crate::{Str, signal::Signal};

/// A value stored in an instance's attribute map.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Bool(bool),
    Number(f64),
    String(Str),
}

impl From<bool> for Attribute {
    fn from(b: bool) -> Self {
        Attribute::Bool(b)
    }
}

impl From<f64> for Attribute {
    fn from(n: f64) -> Self {
        Attribute::Number(n)
    }
}

impl From<&'static str> for Attribute {
    fn from(s: &'static str) -> Self {
        Attribute::String(s.into())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::String(s.into())
    }
}

/// A node in the host's live object tree.
///
/// Clones are handles to the same node.
pub trait Instance: Clone + 'static {
    fn name(&self) -> Str;

    /// The exact class of this instance.
    fn class_name(&self) -> Str;

    /// Whether this instance's class is `class` or inherits from it.
    fn is_a(&self, class: &str) -> bool;

    /// Whether the instance has been destroyed. Once true it stays true.
    fn is_destroyed(&self) -> bool;

    /// Direct children, in order.
    fn children(&self) -> Vec<Self>;

    /// The designated primary part of a model, if set.
    fn primary_part(&self) -> Option<Self>;

    /// The instance referenced by a value-holding container, if set.
    fn value(&self) -> Option<Self>;

    fn attribute(&self, name: &str) -> Option<Attribute>;

    /// Fires with each new direct child.
    fn child_added(&self) -> Signal<Self>;

    /// Fires with each new descendant at any depth.
    fn descendant_added(&self) -> Signal<Self>;

    /// Fires when the named property changes.
    fn property_changed(&self, property: &str) -> Signal<()>;

    /// Fires when a value-holding container's value changes.
    fn value_changed(&self) -> Signal<()>;

    /// Fires when the named attribute changes.
    fn attribute_changed(&self, attribute: &str) -> Signal<()>;

    /// Fires once, right before the instance becomes permanently unusable.
    fn destroying(&self) -> Signal<()>;

    /// First child named `name`. With `recursive`, search all descendants
    /// depth-first.
    fn find_first_child(&self, name: &str, recursive: bool) -> Option<Self> {
        find_first(self, recursive, &|child: &Self| child.name() == name)
    }

    /// First child whose class is or inherits from `class`.
    fn find_first_child_which_is_a(&self, class: &str, recursive: bool) -> Option<Self> {
        find_first(self, recursive, &|child: &Self| child.is_a(class))
    }

    /// First direct child whose class is exactly `class`.
    fn find_first_child_of_class(&self, class: &str) -> Option<Self> {
        find_first(self, false, &|child: &Self| child.class_name() == class)
    }

    /// Every descendant, depth-first pre-order.
    fn descendants(&self) -> Vec<Self> {
        let mut out = vec![];
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }
}

fn find_first<I: Instance>(parent: &I, recursive: bool, matches: &dyn Fn(&I) -> bool) -> Option<I> {
    for child in parent.children() {
        if matches(&child) {
            return Some(child);
        }
        if recursive {
            if let Some(found) = find_first(&child, true, matches) {
                return Some(found);
            }
        }
    }
    None
}
