//! Layout wrappers
//!
//! Panels that place children with per-item style (flex order, grid
//! placement) can put each child inside a [`WidgetWrapper`]. The wrapper owns
//! the child as its only private child and carries the layout style, so the
//! child's own rendering stays untouched. Wrappers are invisible to the
//! container API: [`ComponentTree::children`] resolves them to the wrapped
//! component, and removing the wrapped component disposes the wrapper.

use crate::component::{Component, ComponentId, RenderContext};
use crate::error::Result;
use crate::tree::ComponentTree;
use crate::vnode::{h, VNode};

/// A `div` carrying layout style for exactly one child
#[derive(Clone, Debug, Default)]
pub struct WidgetWrapper {
    class: Option<String>,
}

impl WidgetWrapper {
    pub fn new(class: Option<String>) -> Self {
        Self { class }
    }

    /// Create a wrapper around `child`. The wrapper itself is standalone; the
    /// caller attaches it where it belongs.
    pub fn wrap(
        tree: &mut ComponentTree,
        child: ComponentId,
        class: Option<String>,
    ) -> Result<ComponentId> {
        let wrapper = tree.create(Self::new(class));
        tree.attach_private(wrapper, child)?;
        tracing::trace!(?wrapper, ?child, "wrapped child");
        Ok(wrapper)
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }
}

impl Component for WidgetWrapper {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let mut el = h("div");
        if let Some(class) = &self.class {
            el = el.class(class.clone());
        }
        el.children(cx.render_visible(cx.private_children())).into()
    }

    fn is_wrapper(&self) -> bool {
        true
    }
}
