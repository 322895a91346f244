//! Leaf components
//!
//! [`Widget`] is the generic element: a tag with an optional DOM id, classes,
//! attributes and text. Properties are plain fields; change them through
//! [`ComponentTree::update`](crate::ComponentTree::update) so the change marks
//! the widget dirty and reaches the patcher.

use indexmap::{IndexMap, IndexSet};

use crate::component::{Component, RenderContext};
use crate::vnode::{h, VNode};

/// Generic element component
#[derive(Clone, Debug)]
pub struct Widget {
    tag: String,
    element_id: Option<String>,
    classes: IndexSet<String>,
    attributes: IndexMap<String, String>,
    text: Option<String>,
}

/// Structural element, such as a divider or a heading
pub type Tag = Widget;

impl Widget {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            element_id: None,
            classes: IndexSet::new(),
            attributes: IndexMap::new(),
            text: None,
        }
    }

    /// Builder: DOM id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    /// Builder: CSS class
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    /// Builder: attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder: text content
    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn clear_text(&mut self) {
        self.text = None;
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.element_id = id;
    }

    /// Returns false if the class was already present
    pub fn add_class(&mut self, class: impl Into<String>) -> bool {
        self.classes.insert(class.into())
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        self.classes.shift_remove(class)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }
}

impl Component for Widget {
    fn render(&self, _cx: &RenderContext<'_>) -> VNode {
        let mut el = h(self.tag.as_str()).classes(self.classes.iter().cloned());
        if let Some(id) = &self.element_id {
            el = el.id(id.clone());
        }
        for (name, value) in &self.attributes {
            el = el.attr(name.clone(), value.clone());
        }
        if let Some(text) = &self.text {
            el = el.text(text.clone());
        }
        el.into()
    }
}

/// A `<style>` element carrying raw CSS text
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    css: String,
}

impl StyleSheet {
    pub fn new(css: impl Into<String>) -> Self {
        Self { css: css.into() }
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn set_css(&mut self, css: impl Into<String>) {
        self.css = css.into();
    }
}

impl Component for StyleSheet {
    fn render(&self, _cx: &RenderContext<'_>) -> VNode {
        h("style").text(self.css.clone()).into()
    }
}
