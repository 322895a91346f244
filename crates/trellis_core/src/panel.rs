//! Base container types
//!
//! [`BasicPanel`] is the child bookkeeping every node carries: a private list
//! that only the owning component manages, and a public list exposed through
//! the container API. Private children render first.
//!
//! [`SimplePanel`] is the plain `div` container built on top of it.

use indexmap::IndexSet;

use crate::component::{ComponentId, RenderContext};
use crate::vnode::{h, VNode};
use crate::Component;

/// Ordered private and public child lists of a node
#[derive(Clone, Debug, Default)]
pub struct BasicPanel {
    private: Vec<ComponentId>,
    public: Vec<ComponentId>,
}

impl BasicPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Private children, in insertion order
    pub fn private(&self) -> &[ComponentId] {
        &self.private
    }

    /// Public children, in insertion order
    pub fn public(&self) -> &[ComponentId] {
        &self.public
    }

    pub fn push_private(&mut self, child: ComponentId) {
        self.private.push(child);
    }

    /// Insert a public child, appending when `index` is `None` or past the end
    pub fn insert_public(&mut self, child: ComponentId, index: Option<usize>) -> usize {
        match index {
            Some(index) if index < self.public.len() => {
                self.public.insert(index, child);
                index
            }
            _ => {
                self.public.push(child);
                self.public.len() - 1
            }
        }
    }

    /// Position of a public child
    pub fn position(&self, child: ComponentId) -> Option<usize> {
        self.public.iter().position(|&c| c == child)
    }

    /// Remove a child from whichever list holds it
    pub fn remove(&mut self, child: ComponentId) -> bool {
        if let Some(pos) = self.position(child) {
            self.public.remove(pos);
            return true;
        }
        if let Some(pos) = self.private.iter().position(|&c| c == child) {
            self.private.remove(pos);
            return true;
        }
        false
    }

    pub fn contains(&self, child: ComponentId) -> bool {
        self.public.contains(&child) || self.private.contains(&child)
    }

    /// Empty the public list, returning what it held
    pub fn take_public(&mut self) -> Vec<ComponentId> {
        std::mem::take(&mut self.public)
    }

    /// Empty both lists, private children first
    pub fn take_all(&mut self) -> Vec<ComponentId> {
        let mut all = std::mem::take(&mut self.private);
        all.append(&mut self.public);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.private.is_empty() && self.public.is_empty()
    }
}

/// A `div` container rendering its visible children in order
#[derive(Clone, Debug, Default)]
pub struct SimplePanel {
    element_id: Option<String>,
    classes: IndexSet<String>,
}

impl SimplePanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the DOM id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Add a CSS class
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }
}

impl Component for SimplePanel {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let mut el = h("div").classes(self.classes.iter().cloned());
        if let Some(id) = &self.element_id {
            el = el.id(id.clone());
        }
        el.children(cx.render_children()).into()
    }

    fn is_container(&self) -> bool {
        true
    }
}
