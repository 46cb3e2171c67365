//! An in-memory live object tree.
//!
//! [`SimInstance`] is a small stand-in for a game engine's instance
//! hierarchy: named, classed nodes with children, a primary part, a value
//! slot, attributes and the change signals waits subscribe to. Tests and the
//! demo use it as the host; it is also a reference for implementing
//! [`Instance`] over a real engine.
use crate::{
    Str,
    error::SimError,
    instance::{Attribute, Instance},
    signal::Signal,
    sync::{Shared, WeakShared},
};

/// The class a built-in class directly inherits from.
///
/// Classes not in the table inherit from `Instance`.
pub fn superclass(class: &str) -> Option<&'static str> {
    match class {
        "Instance" => None,
        "BasePart" | "Model" => Some("PVInstance"),
        "Part" | "MeshPart" | "WedgePart" | "TrussPart" | "Seat" => Some("BasePart"),
        "Workspace" => Some("Model"),
        "ObjectValue" | "StringValue" | "NumberValue" | "BoolValue" | "IntValue" => {
            Some("ValueBase")
        }
        _ => Some("Instance"),
    }
}

#[derive(Default)]
struct NodeSignals {
    child_added: Signal<SimInstance>,
    descendant_added: Signal<SimInstance>,
    destroying: Signal<()>,
    value_changed: Signal<()>,
    properties: Vec<(Str, Signal<()>)>,
    attributes: Vec<(Str, Signal<()>)>,
}

impl NodeSignals {
    fn disconnect_all(&self) {
        self.child_added.disconnect_all();
        self.descendant_added.disconnect_all();
        self.destroying.disconnect_all();
        self.value_changed.disconnect_all();
        for (_, signal) in self.properties.iter().chain(self.attributes.iter()) {
            signal.disconnect_all();
        }
    }
}

fn named_signal(list: &mut Vec<(Str, Signal<()>)>, name: &str) -> Signal<()> {
    if let Some((_, signal)) = list.iter().find(|(n, _)| n == name) {
        return signal.clone();
    }
    let signal = Signal::new();
    list.push((Str::from_ref(name), signal.clone()));
    signal
}

fn existing_signal(list: &[(Str, Signal<()>)], name: &str) -> Option<Signal<()>> {
    list.iter()
        .find(|(n, _)| n == name)
        .map(|(_, signal)| signal.clone())
}

struct Node {
    name: Str,
    class: Str,
    parent: Option<WeakShared<Node>>,
    children: Vec<SimInstance>,
    attributes: Vec<(Str, Attribute)>,
    primary_part: Option<SimInstance>,
    value: Option<SimInstance>,
    destroyed: bool,
    signals: NodeSignals,
}

/// A handle to a node in the in-memory tree.
#[derive(Clone)]
pub struct SimInstance {
    node: Shared<Node>,
}

impl PartialEq for SimInstance {
    fn eq(&self, other: &Self) -> bool {
        self.node.ptr_eq(&other.node)
    }
}

impl Eq for SimInstance {}

impl core::fmt::Debug for SimInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.class_name(), self.full_name())
    }
}

impl SimInstance {
    pub fn new(class: impl Into<Str>, name: impl Into<Str>) -> Self {
        SimInstance {
            node: Shared::new(Node {
                name: name.into(),
                class: class.into(),
                parent: None,
                children: vec![],
                attributes: vec![],
                primary_part: None,
                value: None,
                destroyed: false,
                signals: NodeSignals::default(),
            }),
        }
    }

    /// Create an instance already parented under `parent`.
    pub fn new_in(
        class: impl Into<Str>,
        name: impl Into<Str>,
        parent: &SimInstance,
    ) -> Result<Self, SimError> {
        let instance = Self::new(class, name);
        instance.set_parent(Some(parent))?;
        Ok(instance)
    }

    pub fn parent(&self) -> Option<SimInstance> {
        let node = self.node.get();
        let parent = node.parent.as_ref()?.upgrade()?;
        Some(SimInstance { node: parent })
    }

    /// Names from the root down to this instance, joined with `.`.
    pub fn full_name(&self) -> String {
        let mut names = vec![self.name().to_string()];
        let mut current = self.parent();
        while let Some(instance) = current {
            names.push(instance.name().to_string());
            current = instance.parent();
        }
        names.reverse();
        names.join(".")
    }

    /// Whether `self` is `other` or one of its ancestors.
    fn is_ancestor_of(&self, other: &SimInstance) -> bool {
        let mut current = Some(other.clone());
        while let Some(instance) = current {
            if &instance == self {
                return true;
            }
            current = instance.parent();
        }
        false
    }

    fn fire_property_changed(&self, property: &str) {
        let signal = existing_signal(&self.node.get().signals.properties, property);
        if let Some(signal) = signal {
            signal.fire(&());
        }
    }

    /// Remove this instance from its parent's children without any events.
    fn detach_from_parent(&self) {
        let parent = self.parent();
        self.node.get_mut().parent = None;
        if let Some(parent) = parent {
            parent.node.get_mut().children.retain(|child| child != self);
        }
    }

    /// Move this instance under `parent`, or out of the tree with `None`.
    ///
    /// Fires `child_added` on the new parent, then `descendant_added` on the
    /// new parent and each of its ancestors for this instance and each of its
    /// descendants.
    pub fn set_parent(&self, parent: Option<&SimInstance>) -> Result<(), SimError> {
        if self.is_destroyed() || parent.is_some_and(|p| p.is_destroyed()) {
            return Err(SimError::Destroyed);
        }
        if parent.is_some_and(|p| self.is_ancestor_of(p)) {
            return Err(SimError::Cycle);
        }
        if self.parent().as_ref() == parent {
            return Ok(());
        }

        self.detach_from_parent();
        let Some(parent) = parent else {
            self.fire_property_changed("Parent");
            return Ok(());
        };
        self.node.get_mut().parent = Some(parent.node.downgrade());
        parent.node.get_mut().children.push(self.clone());
        log::trace!("{} added to {}", self.name(), parent.full_name());

        self.fire_property_changed("Parent");
        let child_added = parent.node.get().signals.child_added.clone();
        child_added.fire(self);

        let mut added = vec![self.clone()];
        added.extend(self.descendants());
        let mut ancestor = Some(parent.clone());
        while let Some(instance) = ancestor {
            let descendant_added = instance.node.get().signals.descendant_added.clone();
            for descendant in added.iter() {
                descendant_added.fire(descendant);
            }
            ancestor = instance.parent();
        }
        Ok(())
    }

    pub fn set_name(&self, name: impl Into<Str>) {
        self.node.get_mut().name = name.into();
        self.fire_property_changed("Name");
    }

    pub fn set_primary_part(&self, part: Option<&SimInstance>) {
        self.node.get_mut().primary_part = part.cloned();
        self.fire_property_changed("PrimaryPart");
    }

    /// Set the value slot, firing `value_changed`.
    pub fn set_value(&self, value: Option<&SimInstance>) {
        self.node.get_mut().value = value.cloned();
        let value_changed = self.node.get().signals.value_changed.clone();
        value_changed.fire(&());
        self.fire_property_changed("Value");
    }

    /// Set or clear an attribute, firing `attribute_changed` if it changed.
    pub fn set_attribute(&self, name: impl Into<Str>, value: Option<Attribute>) {
        let name = name.into();
        let changed = {
            let mut node = self.node.get_mut();
            let index = node.attributes.iter().position(|(n, _)| n == &name);
            match (index, value) {
                (Some(i), Some(value)) => {
                    let changed = node.attributes[i].1 != value;
                    node.attributes[i].1 = value;
                    changed
                }
                (Some(i), None) => {
                    node.attributes.remove(i);
                    true
                }
                (None, Some(value)) => {
                    node.attributes.push((name.clone(), value));
                    true
                }
                (None, None) => false,
            }
        };
        if changed {
            let signal = existing_signal(&self.node.get().signals.attributes, &name);
            if let Some(signal) = signal {
                signal.fire(&());
            }
        }
    }

    /// Permanently destroy this instance and all of its descendants.
    ///
    /// `destroying` fires first, while the instance is still intact. Then it
    /// is marked destroyed, its descendants are destroyed, it leaves its
    /// parent and every listener on it is disconnected. Destroying an
    /// already destroyed instance does nothing.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        log::debug!("destroying {}", self.full_name());
        let destroying = self.node.get().signals.destroying.clone();
        destroying.fire(&());
        self.node.get_mut().destroyed = true;

        let children = self.children();
        for child in children {
            child.destroy();
        }
        if self.parent().is_some() {
            self.detach_from_parent();
            self.fire_property_changed("Parent");
        }

        let signals = {
            let mut node = self.node.get_mut();
            node.primary_part = None;
            node.value = None;
            std::mem::take(&mut node.signals)
        };
        signals.disconnect_all();
    }
}

impl Instance for SimInstance {
    fn name(&self) -> Str {
        self.node.get().name.clone()
    }

    fn class_name(&self) -> Str {
        self.node.get().class.clone()
    }

    fn is_a(&self, class: &str) -> bool {
        let own = self.class_name();
        if own == class {
            return true;
        }
        let mut current = superclass(&own);
        while let Some(ancestor) = current {
            if ancestor == class {
                return true;
            }
            current = superclass(ancestor);
        }
        false
    }

    fn is_destroyed(&self) -> bool {
        self.node.get().destroyed
    }

    fn children(&self) -> Vec<Self> {
        self.node.get().children.clone()
    }

    fn primary_part(&self) -> Option<Self> {
        self.node.get().primary_part.clone()
    }

    fn value(&self) -> Option<Self> {
        self.node.get().value.clone()
    }

    fn attribute(&self, name: &str) -> Option<Attribute> {
        self.node
            .get()
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
    }

    fn child_added(&self) -> Signal<Self> {
        self.node.get().signals.child_added.clone()
    }

    fn descendant_added(&self) -> Signal<Self> {
        self.node.get().signals.descendant_added.clone()
    }

    fn property_changed(&self, property: &str) -> Signal<()> {
        named_signal(&mut self.node.get_mut().signals.properties, property)
    }

    fn value_changed(&self) -> Signal<()> {
        self.node.get().signals.value_changed.clone()
    }

    fn attribute_changed(&self, attribute: &str) -> Signal<()> {
        named_signal(&mut self.node.get_mut().signals.attributes, attribute)
    }

    fn destroying(&self) -> Signal<()> {
        self.node.get().signals.destroying.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn model() -> (SimInstance, SimInstance, SimInstance) {
        let workspace = SimInstance::new("Workspace", "Workspace");
        let model = SimInstance::new_in("Model", "Character", &workspace).unwrap();
        let head = SimInstance::new_in("Part", "Head", &model).unwrap();
        (workspace, model, head)
    }

    #[test]
    fn class_hierarchy() {
        let part = SimInstance::new("Part", "P");
        assert!(part.is_a("Part"));
        assert!(part.is_a("BasePart"));
        assert!(part.is_a("PVInstance"));
        assert!(part.is_a("Instance"));
        assert!(!part.is_a("Model"));
        let custom = SimInstance::new("Gizmo", "G");
        assert!(custom.is_a("Instance"));
        assert!(!custom.is_a("BasePart"));
    }

    #[test]
    fn lookups() {
        let (workspace, model, head) = model();
        let eye = SimInstance::new_in("MeshPart", "Eye", &head).unwrap();
        assert_eq!(workspace.find_first_child("Head", false), None);
        assert_eq!(workspace.find_first_child("Head", true), Some(head.clone()));
        assert_eq!(model.find_first_child_which_is_a("BasePart", false), Some(head.clone()));
        assert_eq!(model.find_first_child_of_class("MeshPart"), None);
        assert_eq!(head.find_first_child_of_class("MeshPart"), Some(eye.clone()));
        assert_eq!(workspace.descendants(), vec![model.clone(), head.clone(), eye.clone()]);
        assert_eq!(eye.full_name(), "Workspace.Character.Head.Eye");
    }

    #[test]
    fn parenting_fires_child_and_descendant_added() {
        let (workspace, model, _head) = model();
        let seen = Shared::new(Vec::<String>::new());
        let _child = model.child_added().connect({
            let seen = seen.clone();
            move |c: &SimInstance| seen.get_mut().push(format!("child {}", c.name()))
        });
        let _desc = workspace.descendant_added().connect({
            let seen = seen.clone();
            move |d: &SimInstance| seen.get_mut().push(format!("desc {}", d.name()))
        });

        let arm = SimInstance::new("Model", "Arm");
        let _hand = SimInstance::new_in("Part", "Hand", &arm).unwrap();
        arm.set_parent(Some(&model)).unwrap();
        assert_eq!(*seen.get(), vec!["child Arm", "desc Arm", "desc Hand"]);
    }

    #[test]
    fn parenting_errors() {
        let (workspace, model, head) = model();
        assert_eq!(workspace.set_parent(Some(&head)), Err(SimError::Cycle));
        assert_eq!(model.set_parent(Some(&model)), Err(SimError::Cycle));
        head.destroy();
        assert_eq!(head.set_parent(Some(&workspace)), Err(SimError::Destroyed));
        let loose = SimInstance::new("Part", "Loose");
        assert_eq!(loose.set_parent(Some(&head)), Err(SimError::Destroyed));
    }

    #[test]
    fn destroy_cascades_and_disconnects() {
        let (workspace, model, head) = model();
        let fired = Shared::new(Vec::<&'static str>::new());
        let _model_conn = model.destroying().connect({
            let fired = fired.clone();
            move |_| fired.get_mut().push("model")
        });
        let _head_conn = head.destroying().connect({
            let fired = fired.clone();
            move |_| fired.get_mut().push("head")
        });
        let _added = model.child_added().connect(|_| {});

        model.destroy();
        model.destroy();
        assert_eq!(*fired.get(), vec!["model", "head"]);
        assert!(model.is_destroyed());
        assert!(head.is_destroyed());
        assert!(workspace.children().is_empty());
        assert!(model.children().is_empty());
        assert_eq!(model.destroying().listener_count(), 0);
        assert_eq!(model.child_added().listener_count(), 0);
    }

    #[test]
    fn attributes_fire_only_on_change() {
        let part = SimInstance::new("Part", "P");
        let count = Shared::new(0u32);
        let _conn = part.attribute_changed("Health").connect({
            let count = count.clone();
            move |_| *count.get_mut() += 1
        });
        part.set_attribute("Health", Some(Attribute::Number(100.0)));
        part.set_attribute("Health", Some(Attribute::Number(100.0)));
        part.set_attribute("Other", Some(true.into()));
        assert_eq!(*count.get(), 1);
        assert_eq!(part.attribute("Health"), Some(Attribute::Number(100.0)));
        part.set_attribute("Health", None);
        assert_eq!(*count.get(), 2);
        assert_eq!(part.attribute("Health"), None);
    }
}
