//! Virtual nodes
//!
//! A [`VNode`] is the lightweight description of a DOM element that components
//! produce when rendered. The tree never touches a live document itself: the
//! nodes are handed to a [`Patcher`](crate::patch::Patcher), which reconciles
//! them against whatever backend it drives.
//!
//! ```rust
//! use trellis_core::vnode::h;
//!
//! let node = h("div")
//!     .id("app")
//!     .class("container")
//!     .child(h("span").text("Hello"));
//!
//! assert_eq!(
//!     node.to_string(),
//!     r#"<div id="app" class="container"><span>Hello</span></div>"#
//! );
//! ```

use std::fmt;

use indexmap::{IndexMap, IndexSet};

/// Create a new element node with the given tag
pub fn h(tag: impl Into<String>) -> VElement {
    VElement::new(tag)
}

/// A node of the virtual document
#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
    /// An element with attributes and children
    Element(VElement),
    /// A text node
    Text(String),
}

impl VNode {
    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    /// Get the element, if this is an element node
    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(el) => Some(el),
            VNode::Text(_) => None,
        }
    }

    /// Get the element mutably, if this is an element node
    pub fn as_element_mut(&mut self) -> Option<&mut VElement> {
        match self {
            VNode::Element(el) => Some(el),
            VNode::Text(_) => None,
        }
    }

    /// Tag name of an element node
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    /// Children of an element node (empty for text)
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(el) => &el.children,
            VNode::Text(_) => &[],
        }
    }

    /// Element id, if any
    pub fn element_id(&self) -> Option<&str> {
        self.as_element().and_then(|el| el.id.as_deref())
    }

    /// Merge style entries into an element node. Text nodes are left untouched.
    pub fn merge_style(&mut self, style: &IndexMap<String, String>) {
        if let Some(el) = self.as_element_mut() {
            for (key, value) in style {
                el.style.insert(key.clone(), value.clone());
            }
        }
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        VNode::Element(el)
    }
}

impl From<&str> for VNode {
    fn from(text: &str) -> Self {
        VNode::Text(text.to_string())
    }
}

/// An element node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VElement {
    /// Tag name (`div`, `span`, ...)
    pub tag: String,
    /// DOM id
    pub id: Option<String>,
    /// CSS classes, in insertion order
    pub classes: IndexSet<String>,
    /// Plain attributes
    pub attrs: IndexMap<String, String>,
    /// Inline style declarations
    pub style: IndexMap<String, String>,
    /// Child nodes
    pub children: Vec<VNode>,
}

impl VElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set the DOM id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a CSS class
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    /// Add several CSS classes
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    /// Set an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set an inline style declaration
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Set an inline style declaration when a value is present
    pub fn style_opt(self, property: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.style(property, value),
            None => self,
        }
    }

    /// Append a child node
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several child nodes
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = VNode>,
    {
        self.children.extend(children);
        self
    }

    /// Append a text child
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.children.push(VNode::Text(content.into()));
        self
    }

    /// Whether the element carries the given class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

fn escape(text: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' => f.write_str("&quot;")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}

impl fmt::Display for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Text(text) => escape(text, f),
            VNode::Element(el) => el.fmt(f),
        }
    }
}

impl fmt::Display for VElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if let Some(id) = &self.id {
            f.write_str(" id=\"")?;
            escape(id, f)?;
            f.write_str("\"")?;
        }
        if !self.classes.is_empty() {
            f.write_str(" class=\"")?;
            for (i, class) in self.classes.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                escape(class, f)?;
            }
            f.write_str("\"")?;
        }
        for (name, value) in &self.attrs {
            write!(f, " {name}=\"")?;
            escape(value, f)?;
            f.write_str("\"")?;
        }
        if !self.style.is_empty() {
            f.write_str(" style=\"")?;
            for (i, (property, value)) in self.style.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{property}: ")?;
                escape(value, f)?;
                f.write_str(";")?;
            }
            f.write_str("\"")?;
        }
        f.write_str(">")?;
        for child in &self.children {
            child.fmt(f)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_markup() {
        let node: VNode = h("div")
            .id("root")
            .class("a")
            .class("b")
            .class("a")
            .attr("role", "main")
            .style("margin-bottom", "4px")
            .child(h("span").text("x < y"))
            .into();

        assert_eq!(
            node.to_string(),
            r#"<div id="root" class="a b" role="main" style="margin-bottom: 4px;"><span>x &lt; y</span></div>"#
        );
    }

    #[test]
    fn test_merge_style_overrides() {
        let mut node: VNode = h("div").style("width", "10px").into();
        let mut style = IndexMap::new();
        style.insert("width".to_string(), "20px".to_string());
        style.insert("order".to_string(), "2".to_string());

        node.merge_style(&style);

        let el = node.as_element().unwrap();
        assert_eq!(el.style.get("width").map(String::as_str), Some("20px"));
        assert_eq!(el.style.get("order").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_merge_style_ignores_text() {
        let mut node = VNode::text("plain");
        let mut style = IndexMap::new();
        style.insert("width".to_string(), "20px".to_string());
        node.merge_style(&style);
        assert_eq!(node, VNode::text("plain"));
    }
}
