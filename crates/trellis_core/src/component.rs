//! The component contract
//!
//! Every element of the tree is a [`Component`] stored in the arena owned by
//! [`ComponentTree`]. A component renders itself into a [`VNode`] and, if it
//! is a container, customises how children are placed through the hook
//! methods. Hooks receive the tree mutably while their own payload is checked
//! out, so they must only touch their own node through the low-level
//! primitives (`attach`, `detach`, `destroy`, ...).

use std::any::Any;

use slotmap::new_key_type;

use crate::error::Result;
use crate::tree::ComponentTree;
use crate::vnode::VNode;

new_key_type! {
    /// Unique identifier for a component in a [`ComponentTree`]
    pub struct ComponentId;
}

/// Type-erased access used for downcasting payloads
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A renderable element of the component tree
pub trait Component: AsAny {
    /// Render this component. Must not mutate anything observable.
    fn render(&self, cx: &RenderContext<'_>) -> VNode;

    /// Whether public children may be added through the container API
    fn is_container(&self) -> bool {
        false
    }

    /// Whether this component only exists to carry layout style for a single
    /// wrapped child
    fn is_wrapper(&self) -> bool {
        false
    }

    /// Place an already detached child, at `index` among the public children
    /// or at the end
    fn add_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
        index: Option<usize>,
    ) -> Result<()> {
        tree.attach_at(this, child, index)
    }

    /// Remove a logical child. Returns whether anything was removed.
    fn remove_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
    ) -> Result<bool> {
        Ok(tree.detach_logical(this, child))
    }

    /// Detach every public child without disposing it
    fn remove_all_children(&mut self, tree: &mut ComponentTree, this: ComponentId) -> Result<()> {
        for child in tree.detach_all(this) {
            if tree.is_wrapper_node(child) {
                tree.release_wrapper(child);
            }
        }
        Ok(())
    }

    /// Detach and dispose every public child
    fn dispose_all_children(&mut self, tree: &mut ComponentTree, this: ComponentId) -> Result<()> {
        for child in tree.detach_all(this) {
            tree.destroy(child);
        }
        Ok(())
    }

    /// Public children as seen by users of the container, wrappers resolved
    fn logical_children(&self, tree: &ComponentTree, this: ComponentId) -> Vec<ComponentId> {
        tree.public_children(this)
            .iter()
            .map(|&child| tree.unwrap_wrapper(child))
            .collect()
    }

    /// Release resources held by the payload. Children are already gone.
    fn on_dispose(&mut self) {}
}

/// Read-only view of the tree handed to [`Component::render`]
pub struct RenderContext<'a> {
    tree: &'a ComponentTree,
    id: ComponentId,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(tree: &'a ComponentTree, id: ComponentId) -> Self {
        Self { tree, id }
    }

    /// The component being rendered
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The whole tree
    pub fn tree(&self) -> &'a ComponentTree {
        self.tree
    }

    /// Private children of the component being rendered
    pub fn private_children(&self) -> &'a [ComponentId] {
        self.tree.private_children(self.id)
    }

    /// Public children of the component being rendered (wrappers included)
    pub fn public_children(&self) -> &'a [ComponentId] {
        self.tree.public_children(self.id)
    }

    /// Whether a child would be shown, taking wrapped children into account
    pub fn is_visible(&self, child: ComponentId) -> bool {
        self.tree.is_effectively_visible(child)
    }

    /// Render any component regardless of its visibility
    pub fn render_child(&self, child: ComponentId) -> Option<VNode> {
        self.tree.render_node(child)
    }

    /// Render the visible components of a list, in order
    pub fn render_visible(&self, ids: &[ComponentId]) -> Vec<VNode> {
        ids.iter()
            .filter(|&&child| self.is_visible(child))
            .filter_map(|&child| self.render_child(child))
            .collect()
    }

    /// Render visible private children followed by visible public children
    pub fn render_children(&self) -> Vec<VNode> {
        let mut nodes = self.render_visible(self.private_children());
        nodes.extend(self.render_visible(self.public_children()));
        nodes
    }
}
