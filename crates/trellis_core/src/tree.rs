//! Component arena and the container contract
//!
//! [`ComponentTree`] owns every component in a slotmap. Containers hold owning
//! child lists; children point back through a plain `parent` id that is
//! cleared on detach, so there are no reference cycles.
//!
//! Mutations are synchronous. Each public mutation ends with a refresh that
//! marks the touched node and its ancestors dirty and re-patches the root at
//! the top of the chain. Mutations performed by panel hooks while an outer
//! operation is running are flushed once when that operation finishes.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::prelude::*;
//!
//! let patcher = RecordingPatcher::new().with_element("app");
//! let mut tree = ComponentTree::new(patcher.clone());
//! let root = Root::by_element_id(&mut tree, "app", RootConfig::default())?;
//!
//! let label = tree.create(Widget::new("span").content("Hello"));
//! tree.add(root, label)?;
//!
//! // Mount + one re-patch for the add
//! assert_eq!(patcher.patch_count(), 2);
//! # Ok::<(), trellis_core::TreeError>(())
//! ```

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use indexmap::IndexMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::component::{Component, ComponentId, RenderContext};
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::panel::BasicPanel;
use crate::patch::Patcher;
use crate::root::RootRegistry;
use crate::router::Router;
use crate::vnode::VNode;

/// Work scheduled for the next turn of the event loop
pub type DeferredTask = Box<dyn FnOnce(&mut ComponentTree) -> Result<()>>;

/// Per-component record stored in the arena
pub(crate) struct Node {
    pub(crate) parent: Option<ComponentId>,
    visible: bool,
    dirty: Cell<bool>,
    cache: RefCell<Option<VNode>>,
    pub(crate) panel: BasicPanel,
    /// Style imposed by the owning panel, merged over the rendered element
    layout_style: IndexMap<String, String>,
    /// `None` while a hook of this component is running
    payload: Option<Box<dyn Component>>,
}

impl Node {
    fn new(payload: Box<dyn Component>) -> Self {
        Self {
            parent: None,
            visible: true,
            dirty: Cell::new(true),
            cache: RefCell::new(None),
            panel: BasicPanel::new(),
            layout_style: IndexMap::new(),
            payload: Some(payload),
        }
    }
}

/// The component tree
pub struct ComponentTree {
    nodes: SlotMap<ComponentId, Node>,
    pub(crate) config: TreeConfig,
    pub(crate) patcher: Box<dyn Patcher>,
    pub(crate) router: Option<Box<dyn Router>>,
    pub(crate) registry: RootRegistry,
    tasks: VecDeque<DeferredTask>,
    /// Number of hooks currently running
    depth: usize,
    /// Roots invalidated while `depth > 0`
    pending_roots: SmallVec<[ComponentId; 2]>,
    id_counter: u64,
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("tasks", &self.tasks.len())
            .field("router", &self.router.is_some())
            .finish()
    }
}

impl ComponentTree {
    /// Create a tree with the standard configuration
    pub fn new(patcher: impl Patcher + 'static) -> Self {
        Self::with_config(TreeConfig::default(), patcher)
    }

    /// Create a tree with a custom configuration
    pub fn with_config(config: TreeConfig, patcher: impl Patcher + 'static) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            config,
            patcher: Box::new(patcher),
            router: None,
            registry: RootRegistry::default(),
            tasks: VecDeque::new(),
            depth: 0,
            pending_roots: SmallVec::new(),
            id_counter: 0,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Enable or disable patching. Disabled trees still track dirty state;
    /// re-enabling patches every mounted root that changed meanwhile.
    pub fn set_rendering_enabled(&mut self, enabled: bool) -> Result<()> {
        let was_enabled = std::mem::replace(&mut self.config.rendering_enabled, enabled);
        if enabled && !was_enabled {
            let dirty: Vec<ComponentId> = self
                .registry
                .roots()
                .iter()
                .copied()
                .filter(|&root| self.is_dirty(root))
                .collect();
            for root in dirty {
                self.re_render_root(root)?;
            }
        }
        Ok(())
    }

    /// Generate a unique DOM id
    pub fn next_element_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{}_{}_{}", self.config.id_prefix, prefix, self.id_counter)
    }

    // =========================================================================
    // Arena access
    // =========================================================================

    /// Insert a standalone component
    pub fn create<C: Component + 'static>(&mut self, component: C) -> ComponentId {
        let id = self.nodes.insert(Node::new(Box::new(component)));
        tracing::trace!(?id, component = type_name::<C>(), "created component");
        id
    }

    pub fn contains(&self, id: impl Into<ComponentId>) -> bool {
        self.nodes.contains_key(id.into())
    }

    /// Number of live components
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a typed payload
    pub fn get<T: Component + 'static>(&self, id: impl Into<ComponentId>) -> Option<&T> {
        self.nodes
            .get(id.into())?
            .payload
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Borrow a typed payload mutably. Does not refresh; see [`update`](Self::update).
    pub fn get_mut<T: Component + 'static>(&mut self, id: impl Into<ComponentId>) -> Option<&mut T> {
        self.nodes
            .get_mut(id.into())?
            .payload
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Change a typed payload, then mark it dirty and propagate the refresh
    pub fn update<T, R>(&mut self, id: impl Into<ComponentId>, f: impl FnOnce(&mut T) -> R) -> Result<R>
    where
        T: Component + 'static,
    {
        self.mutate(id, |payload: &mut T, _| Ok(f(payload)))
    }

    /// Like [`update`](Self::update), with access to the rest of the tree
    ///
    /// While `f` runs the payload is checked out: `f` must not use the
    /// high-level container API on `id` itself.
    pub fn mutate<T, R>(
        &mut self,
        id: impl Into<ComponentId>,
        f: impl FnOnce(&mut T, &mut ComponentTree) -> Result<R>,
    ) -> Result<R>
    where
        T: Component + 'static,
    {
        let id = id.into();
        let out = self.with_payload(id, |payload, tree| {
            let typed = payload
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or(TreeError::WrongType {
                    id,
                    expected: type_name::<T>(),
                })?;
            f(typed, tree)
        })?;
        self.refresh(id)?;
        Ok(out)
    }

    fn with_payload<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component, &mut ComponentTree) -> Result<R>,
    ) -> Result<R> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or(TreeError::UnknownComponent(id))?;
        let mut payload = node.payload.take().ok_or(TreeError::Reentrant(id))?;

        self.depth += 1;
        let result = f(&mut *payload, self);
        self.depth -= 1;

        match self.nodes.get_mut(id) {
            Some(node) => node.payload = Some(payload),
            // Disposed by its own hook
            None => payload.on_dispose(),
        }
        result
    }

    fn payload_available(&self, id: ComponentId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.payload.is_some())
    }

    // =========================================================================
    // Node state
    // =========================================================================

    /// Direct parent (a wrapper, for wrapped children)
    pub fn parent(&self, id: impl Into<ComponentId>) -> Option<ComponentId> {
        self.nodes.get(id.into())?.parent
    }

    /// Parent as seen through the container API, skipping wrappers
    pub fn logical_parent(&self, id: impl Into<ComponentId>) -> Option<ComponentId> {
        let parent = self.parent(id)?;
        if self.is_wrapper_node(parent) {
            self.parent(parent).or(Some(parent))
        } else {
            Some(parent)
        }
    }

    pub fn is_visible(&self, id: impl Into<ComponentId>) -> bool {
        self.nodes.get(id.into()).is_some_and(|node| node.visible)
    }

    /// Whether a component would be rendered by its container
    pub fn is_effectively_visible(&self, id: ComponentId) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        if self.is_wrapper_node(id) {
            let wrapped = self.unwrap_wrapper(id);
            return wrapped == id || self.is_visible(wrapped);
        }
        true
    }

    /// Show or hide a component. Hidden components are omitted from their
    /// container's output.
    pub fn set_visible(&mut self, id: impl Into<ComponentId>, visible: bool) -> Result<()> {
        let id = id.into();
        let node = self
            .nodes
            .get_mut(id)
            .ok_or(TreeError::UnknownComponent(id))?;
        if node.visible == visible {
            return Ok(());
        }
        node.visible = visible;
        self.refresh(id)
    }

    pub fn is_dirty(&self, id: impl Into<ComponentId>) -> bool {
        self.nodes.get(id.into()).is_some_and(|node| node.dirty.get())
    }

    pub fn private_children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes.get(id).map_or(&[], |node| node.panel.private())
    }

    pub fn public_children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes.get(id).map_or(&[], |node| node.panel.public())
    }

    pub fn is_wrapper_node(&self, id: ComponentId) -> bool {
        self.nodes
            .get(id)
            .and_then(|node| node.payload.as_deref())
            .is_some_and(|payload| payload.is_wrapper())
    }

    /// The component carried by a wrapper, or `id` itself
    pub fn unwrap_wrapper(&self, id: ComponentId) -> ComponentId {
        if self.is_wrapper_node(id) {
            self.private_children(id).first().copied().unwrap_or(id)
        } else {
            id
        }
    }

    /// Style imposed on a component by its panel
    pub fn layout_style(&self, id: impl Into<ComponentId>) -> Option<&IndexMap<String, String>> {
        self.nodes.get(id.into()).map(|node| &node.layout_style)
    }

    /// Set one layout style entry. Marks the component dirty without patching.
    pub fn set_layout_style(
        &mut self,
        id: ComponentId,
        property: impl Into<String>,
        value: impl Into<String>,
    ) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.layout_style.insert(property.into(), value.into());
            self.invalidate(id);
        }
    }

    /// Remove layout style entries. Marks the component dirty without patching.
    pub fn remove_layout_style(&mut self, id: ComponentId, properties: &[&str]) {
        if let Some(node) = self.nodes.get_mut(id) {
            let before = node.layout_style.len();
            node.layout_style.retain(|key, _| !properties.contains(&key.as_str()));
            if node.layout_style.len() != before {
                self.invalidate(id);
            }
        }
    }

    // =========================================================================
    // Container API
    // =========================================================================

    /// Append a child. A child that already has a parent is detached from it
    /// first.
    pub fn add(&mut self, container: impl Into<ComponentId>, child: impl Into<ComponentId>) -> Result<()> {
        self.insert_child_at(container.into(), child.into(), None)
    }

    /// Append several children, patching once at the end
    pub fn add_all<I>(&mut self, container: impl Into<ComponentId>, children: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ComponentId>,
    {
        let container = container.into();
        self.batched(|tree| {
            for child in children {
                tree.insert_child_at(container, child.into(), None)?;
            }
            Ok(())
        })?;
        self.refresh(container)
    }

    /// Insert a child at a position among the logical children
    pub fn insert(
        &mut self,
        container: impl Into<ComponentId>,
        index: usize,
        child: impl Into<ComponentId>,
    ) -> Result<()> {
        let container = container.into();
        let len = self.children(container)?.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds {
                index: index as isize,
                len,
            });
        }
        self.insert_child_at(container, child.into(), Some(index))
    }

    fn insert_child_at(
        &mut self,
        container: ComponentId,
        child: ComponentId,
        index: Option<usize>,
    ) -> Result<()> {
        self.adopt(container, child)?;
        self.with_payload(container, |payload, tree| {
            payload.add_child(tree, container, child, index)
        })?;
        tracing::debug!(?container, ?child, ?index, "added child");
        self.refresh(container)
    }

    /// Add a non-removable child, rendered before the public children
    pub fn add_private(
        &mut self,
        container: impl Into<ComponentId>,
        child: impl Into<ComponentId>,
    ) -> Result<()> {
        let (container, child) = (container.into(), child.into());
        self.check_attachable(container, child)?;
        self.detach_from_parent(child)?;
        self.attach_private(container, child)?;
        self.refresh(container)
    }

    /// Validate that `child` may be placed into `container` and detach it from
    /// its current parent. Panels call this before placing children through
    /// their own typed operations.
    pub fn adopt(&mut self, container: ComponentId, child: ComponentId) -> Result<()> {
        let node = self
            .nodes
            .get(container)
            .ok_or(TreeError::UnknownComponent(container))?;
        match node.payload.as_deref() {
            Some(payload) if !payload.is_container() => {
                return Err(TreeError::NotAContainer(container))
            }
            None => return Err(TreeError::Reentrant(container)),
            Some(_) => {}
        }
        self.check_attachable(container, child)?;
        self.detach_from_parent(child)
    }

    fn check_attachable(&self, container: ComponentId, child: ComponentId) -> Result<()> {
        if !self.nodes.contains_key(container) {
            return Err(TreeError::UnknownComponent(container));
        }
        if !self.nodes.contains_key(child) {
            return Err(TreeError::UnknownComponent(child));
        }
        if self.is_ancestor_or_self(child, container) {
            return Err(TreeError::Cycle { container, child });
        }
        Ok(())
    }

    pub(crate) fn is_ancestor_or_self(&self, ancestor: ComponentId, mut id: ComponentId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    /// Detach a component from wherever it lives, through its container's
    /// removal policy. No-op for standalone components.
    pub fn detach_from_parent(&mut self, child: impl Into<ComponentId>) -> Result<()> {
        let child = child.into();
        let Some(parent) = self.parent(child) else {
            return Ok(());
        };
        let owner = self.logical_parent(child).unwrap_or(parent);

        if self.payload_available(owner) {
            self.with_payload(owner, |payload, tree| payload.remove_child(tree, owner, child))?;
        }
        if self.parent(child).is_some() {
            // Not listed by its owner, or the owner is mid-hook
            self.detach_raw(child);
        }
        self.invalidate(owner);
        Ok(())
    }

    /// Remove a child. No-op if it is not a child of `container`.
    pub fn remove(&mut self, container: impl Into<ComponentId>, child: impl Into<ComponentId>) -> Result<()> {
        let (container, child) = (container.into(), child.into());
        let removed =
            self.with_payload(container, |payload, tree| payload.remove_child(tree, container, child))?;
        if removed {
            tracing::debug!(?container, ?child, "removed child");
            self.refresh(container)?;
        }
        Ok(())
    }

    /// Remove the logical child at `index`
    pub fn remove_at(&mut self, container: impl Into<ComponentId>, index: usize) -> Result<()> {
        let container = container.into();
        let children = self.children(container)?;
        let child = *children.get(index).ok_or(TreeError::IndexOutOfBounds {
            index: index as isize,
            len: children.len(),
        })?;
        self.remove(container, child)
    }

    /// Detach every public child without disposing
    pub fn remove_all(&mut self, container: impl Into<ComponentId>) -> Result<()> {
        let container = container.into();
        self.with_payload(container, |payload, tree| {
            payload.remove_all_children(tree, container)
        })?;
        tracing::debug!(?container, "removed all children");
        self.refresh(container)
    }

    /// Dispose every public child
    pub fn dispose_all(&mut self, container: impl Into<ComponentId>) -> Result<()> {
        let container = container.into();
        self.with_payload(container, |payload, tree| {
            payload.dispose_all_children(tree, container)
        })?;
        tracing::debug!(?container, "disposed all children");
        self.refresh(container)
    }

    /// Logical children, in the container's deterministic order
    pub fn children(&self, container: impl Into<ComponentId>) -> Result<Vec<ComponentId>> {
        let container = container.into();
        let node = self
            .nodes
            .get(container)
            .ok_or(TreeError::UnknownComponent(container))?;
        Ok(match node.payload.as_deref() {
            Some(payload) => payload.logical_children(self, container),
            None => self
                .public_children(container)
                .iter()
                .map(|&child| self.unwrap_wrapper(child))
                .collect(),
        })
    }

    /// Dispose a component: its children (private and public) first, then
    /// its own resources, then detach it. Idempotent.
    pub fn dispose(&mut self, id: impl Into<ComponentId>) -> Result<()> {
        let id = id.into();
        if !self.nodes.contains_key(id) {
            return Ok(());
        }
        let owner = self.logical_parent(id);
        self.detach_from_parent(id)?;
        self.destroy(id);
        tracing::debug!(?id, "disposed component");
        match owner {
            Some(owner) => self.refresh(owner),
            None => self.flush(),
        }
    }

    // =========================================================================
    // Low-level primitives for hooks
    // =========================================================================

    /// Insert into the public list without running hooks or patching
    pub fn attach_at(
        &mut self,
        container: ComponentId,
        child: ComponentId,
        index: Option<usize>,
    ) -> Result<()> {
        self.prepare_raw(container, child)?;
        if let Some(node) = self.nodes.get_mut(container) {
            node.panel.insert_public(child, index);
        }
        self.link(container, child);
        Ok(())
    }

    /// Insert into the private list without running hooks or patching
    pub fn attach_private(&mut self, container: ComponentId, child: ComponentId) -> Result<()> {
        self.prepare_raw(container, child)?;
        if let Some(node) = self.nodes.get_mut(container) {
            node.panel.push_private(child);
        }
        self.link(container, child);
        Ok(())
    }

    fn prepare_raw(&mut self, container: ComponentId, child: ComponentId) -> Result<()> {
        self.check_attachable(container, child)?;
        if self.parent(child).is_some() {
            self.detach_raw(child);
        }
        Ok(())
    }

    fn link(&mut self, container: ComponentId, child: ComponentId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(container);
        }
        tracing::trace!(?container, ?child, "attached");
        self.invalidate(container);
    }

    /// Remove a direct child from either list. Returns whether it was there.
    pub fn detach(&mut self, container: ComponentId, child: ComponentId) -> bool {
        let removed = self
            .nodes
            .get_mut(container)
            .is_some_and(|node| node.panel.remove(child));
        if removed {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
            tracing::trace!(?container, ?child, "detached");
            self.invalidate(container);
        }
        removed
    }

    /// Remove a child given either directly or through its wrapper. The
    /// wrapper, if any, is disposed.
    pub fn detach_logical(&mut self, container: ComponentId, child: ComponentId) -> bool {
        if self.public_children(container).contains(&child) {
            return self.detach(container, child);
        }
        let wrapper = self
            .public_children(container)
            .iter()
            .copied()
            .find(|&w| w != child && self.unwrap_wrapper(w) == child);
        match wrapper {
            Some(wrapper) => {
                self.detach(container, wrapper);
                self.release_wrapper(wrapper);
                true
            }
            None => false,
        }
    }

    /// Empty the public list, returning the detached children
    pub fn detach_all(&mut self, container: ComponentId) -> Vec<ComponentId> {
        let children = self
            .nodes
            .get_mut(container)
            .map(|node| node.panel.take_public())
            .unwrap_or_default();
        for &child in &children {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
        }
        if !children.is_empty() {
            self.invalidate(container);
        }
        children
    }

    /// Free a wrapped child from its wrapper and dispose the wrapper
    pub fn release_wrapper(&mut self, wrapper: ComponentId) {
        let wrapped = self.unwrap_wrapper(wrapper);
        if wrapped != wrapper {
            self.detach(wrapper, wrapped);
        }
        self.destroy(wrapper);
    }

    /// Point a non-listed child (a modal, a context menu) at its owner
    pub(crate) fn set_parent(&mut self, child: ComponentId, parent: Option<ComponentId>) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
    }

    fn detach_raw(&mut self, child: ComponentId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.panel.remove(child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        self.invalidate(parent);
    }

    /// Free a component and everything it owns, without hooks or patching.
    /// Removes it from its parent's lists if it is still listed there.
    pub fn destroy(&mut self, id: ComponentId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let owned = node.panel.take_all();
        if node.parent.is_some() {
            self.detach_raw(id);
        }
        for child in owned {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
            }
            self.destroy(child);
        }
        if self.registry.is_root(id) {
            self.unregister_root(id);
        }
        self.registry.forget(id);
        if let Some(node) = self.nodes.remove(id) {
            if let Some(mut payload) = node.payload {
                payload.on_dispose();
            }
        }
        tracing::trace!(?id, "destroyed");
    }

    // =========================================================================
    // Rendering and refresh
    // =========================================================================

    /// Render a component. Clean components return their cached node.
    pub fn render(&self, id: impl Into<ComponentId>) -> Result<VNode> {
        let id = id.into();
        if !self.nodes.contains_key(id) {
            return Err(TreeError::UnknownComponent(id));
        }
        self.render_node(id).ok_or(TreeError::Reentrant(id))
    }

    pub(crate) fn render_node(&self, id: ComponentId) -> Option<VNode> {
        let node = self.nodes.get(id)?;
        if !node.dirty.get() {
            if let Some(cached) = node.cache.borrow().as_ref() {
                tracing::trace!(?id, "render cache hit");
                return Some(cached.clone());
            }
        }
        let Some(payload) = node.payload.as_deref() else {
            tracing::warn!(?id, "cannot render a component while it is being mutated");
            return None;
        };

        let mut vnode = payload.render(&RenderContext::new(self, id));
        if !node.layout_style.is_empty() {
            vnode.merge_style(&node.layout_style);
        }
        *node.cache.borrow_mut() = Some(vnode.clone());
        node.dirty.set(false);
        Some(vnode)
    }

    /// Mark a component and all its ancestors dirty. Returns the topmost
    /// ancestor.
    pub fn mark_dirty(&self, id: impl Into<ComponentId>) -> Option<ComponentId> {
        let mut current = id.into();
        let mut node = self.nodes.get(current)?;
        loop {
            node.dirty.set(true);
            match node.parent.and_then(|parent| self.nodes.get(parent).map(|n| (parent, n))) {
                Some((parent, parent_node)) => {
                    current = parent;
                    node = parent_node;
                }
                None => return Some(current),
            }
        }
    }

    /// Mark dirty and queue the root above, without patching
    fn invalidate(&mut self, id: ComponentId) {
        if let Some(top) = self.mark_dirty(id) {
            if self.registry.is_root(top) && !self.pending_roots.contains(&top) {
                self.pending_roots.push(top);
            }
        }
    }

    /// Mark a component dirty and re-patch the root above it
    pub fn refresh(&mut self, id: impl Into<ComponentId>) -> Result<()> {
        let id = id.into();
        self.invalidate(id);
        if self.depth > 0 {
            tracing::trace!(?id, "refresh deferred until the running operation completes");
            return Ok(());
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.depth > 0 {
            return Ok(());
        }
        let mut roots = std::mem::take(&mut self.pending_roots).into_iter();
        while let Some(root) = roots.next() {
            if !self.registry.is_root(root) {
                continue;
            }
            if let Err(err) = self.re_render_root(root) {
                // Unpatched roots stay queued ahead of anything queued since
                let mut rest: SmallVec<[ComponentId; 2]> = roots.collect();
                for queued in self.pending_roots.drain(..) {
                    if !rest.contains(&queued) {
                        rest.push(queued);
                    }
                }
                self.pending_roots = rest;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Run `f` with refreshes held back until it returns
    pub fn batched<R>(&mut self, f: impl FnOnce(&mut ComponentTree) -> Result<R>) -> Result<R> {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Deferred tasks
    // =========================================================================

    /// Schedule work for the next turn, outside the current call stack
    pub fn defer(&mut self, task: impl FnOnce(&mut ComponentTree) -> Result<()> + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Run the tasks queued before this call. Tasks they schedule wait for
    /// the next turn. Returns how many ran.
    pub fn run_pending_tasks(&mut self) -> Result<usize> {
        let mut batch = std::mem::take(&mut self.tasks);
        let mut ran = 0;
        while let Some(task) = batch.pop_front() {
            if let Err(err) = task(self) {
                batch.append(&mut self.tasks);
                self.tasks = batch;
                return Err(err);
            }
            ran += 1;
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::SimplePanel;
    use crate::patch::RecordingPatcher;
    use crate::root::{Root, RootConfig};
    use crate::widget::Widget;
    use crate::wrapper::WidgetWrapper;

    fn tree() -> (ComponentTree, RecordingPatcher) {
        let patcher = RecordingPatcher::new().with_element("app");
        (ComponentTree::new(patcher.clone()), patcher)
    }

    fn label(tree: &mut ComponentTree, text: &str) -> ComponentId {
        tree.create(Widget::new("span").content(text))
    }

    #[test]
    fn test_add_remove_round_trip() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        tree.add(panel, a).unwrap();
        let before = tree.children(panel).unwrap();

        tree.add(panel, b).unwrap();
        tree.remove(panel, b).unwrap();

        assert_eq!(tree.children(panel).unwrap(), before);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn test_single_parent() {
        let (mut tree, _) = tree();
        let first = tree.create(SimplePanel::new());
        let second = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");

        tree.add(first, a).unwrap();
        tree.add(second, a).unwrap();

        assert!(tree.children(first).unwrap().is_empty());
        assert_eq!(tree.children(second).unwrap(), vec![a]);
        assert_eq!(tree.parent(a), Some(second));
    }

    #[test]
    fn test_leaf_rejects_children() {
        let (mut tree, _) = tree();
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        assert!(matches!(tree.add(a, b), Err(TreeError::NotAContainer(id)) if id == a));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, _) = tree();
        let outer = tree.create(SimplePanel::new());
        let inner = tree.create(SimplePanel::new());
        tree.add(outer, inner).unwrap();

        assert!(matches!(tree.add(inner, outer), Err(TreeError::Cycle { .. })));
        assert!(matches!(tree.add(outer, outer), Err(TreeError::Cycle { .. })));
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        tree.remove(panel, a).unwrap();
        assert!(tree.children(panel).unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_remove_at() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        let c = label(&mut tree, "c");
        tree.add_all(panel, [a, c]).unwrap();
        tree.insert(panel, 1, b).unwrap();
        assert_eq!(tree.children(panel).unwrap(), vec![a, b, c]);

        tree.remove_at(panel, 0).unwrap();
        assert_eq!(tree.children(panel).unwrap(), vec![b, c]);

        assert!(matches!(
            tree.remove_at(panel, 5),
            Err(TreeError::IndexOutOfBounds { index: 5, len: 2 })
        ));
        assert!(matches!(
            tree.insert(panel, 3, a),
            Err(TreeError::IndexOutOfBounds { index: 3, len: 2 })
        ));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let child = tree.create(SimplePanel::new());
        let grandchild = label(&mut tree, "g");
        let private = label(&mut tree, "p");
        tree.add(panel, child).unwrap();
        tree.add(child, grandchild).unwrap();
        tree.add_private(child, private).unwrap();

        tree.dispose(child).unwrap();
        let len_after_first = tree.len();
        tree.dispose(child).unwrap();

        assert_eq!(tree.len(), len_after_first);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(grandchild));
        assert!(!tree.contains(private));
        assert!(tree.children(panel).unwrap().is_empty());
    }

    #[test]
    fn test_remove_all_keeps_components_alive() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let private = label(&mut tree, "p");
        let a = label(&mut tree, "a");
        tree.add_private(panel, private).unwrap();
        tree.add(panel, a).unwrap();

        tree.remove_all(panel).unwrap();

        assert!(tree.children(panel).unwrap().is_empty());
        assert!(tree.contains(a));
        assert_eq!(tree.private_children(panel), &[private]);
    }

    #[test]
    fn test_dispose_all_frees_public_children() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        tree.add_all(panel, [a, b]).unwrap();

        tree.dispose_all(panel).unwrap();
        tree.dispose_all(panel).unwrap();

        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert!(tree.contains(panel));
    }

    #[test]
    fn test_hidden_children_are_omitted() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        tree.add_all(panel, [a, b]).unwrap();

        tree.set_visible(a, false).unwrap();
        let node = tree.render(panel).unwrap();
        assert_eq!(node.to_string(), "<div><span>b</span></div>");

        tree.set_visible(a, true).unwrap();
        let node = tree.render(panel).unwrap();
        assert_eq!(node.to_string(), "<div><span>a</span><span>b</span></div>");
    }

    #[test]
    fn test_private_children_render_first() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let public = label(&mut tree, "public");
        let private = label(&mut tree, "private");
        tree.add(panel, public).unwrap();
        tree.add_private(panel, private).unwrap();

        let node = tree.render(panel).unwrap();
        assert_eq!(
            node.to_string(),
            "<div><span>private</span><span>public</span></div>"
        );
        assert_eq!(tree.children(panel).unwrap(), vec![public]);
    }

    #[test]
    fn test_dirty_propagates_and_clears() {
        let (mut tree, _) = tree();
        let outer = tree.create(SimplePanel::new());
        let inner = tree.create(SimplePanel::new());
        let leaf = label(&mut tree, "x");
        tree.add(outer, inner).unwrap();
        tree.add(inner, leaf).unwrap();
        tree.render(outer).unwrap();
        assert!(!tree.is_dirty(outer));
        assert!(!tree.is_dirty(leaf));

        tree.update::<Widget, _>(leaf, |w| w.set_text("y")).unwrap();
        assert!(tree.is_dirty(leaf));
        assert!(tree.is_dirty(inner));
        assert!(tree.is_dirty(outer));

        let node = tree.render(outer).unwrap();
        assert_eq!(node.to_string(), "<div><div><span>y</span></div></div>");
        assert!(!tree.is_dirty(outer));
    }

    #[test]
    fn test_update_wrong_type() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let err = tree.update::<Widget, _>(panel, |_| ()).unwrap_err();
        assert!(matches!(err, TreeError::WrongType { .. }));
    }

    #[test]
    fn test_every_mutation_patches_once() {
        let (mut tree, patcher) = tree();
        let root = Root::by_element_id(&mut tree, "app", RootConfig::default()).unwrap();
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        assert_eq!(patcher.patch_count(), 1);

        tree.add(root, a).unwrap();
        tree.add(root, b).unwrap();
        assert_eq!(patcher.patch_count(), 3);

        tree.update::<Widget, _>(a, |w| w.set_text("a2")).unwrap();
        tree.update::<Widget, _>(b, |w| w.set_text("b2")).unwrap();
        assert_eq!(patcher.patch_count(), 5);

        let c = label(&mut tree, "c");
        let d = label(&mut tree, "d");
        tree.add_all(root, [c, d]).unwrap();
        assert_eq!(patcher.patch_count(), 6);
    }

    #[test]
    fn test_detached_subtree_does_not_patch() {
        let (mut tree, patcher) = tree();
        let root = Root::by_element_id(&mut tree, "app", RootConfig::default()).unwrap();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        tree.add(panel, a).unwrap();
        tree.add(root, panel).unwrap();
        let count = patcher.patch_count();

        tree.remove(root, panel).unwrap();
        assert_eq!(patcher.patch_count(), count + 1);

        tree.update::<Widget, _>(a, |w| w.set_text("changed")).unwrap();
        assert_eq!(patcher.patch_count(), count + 1);
    }

    #[test]
    fn test_failed_patch_keeps_other_roots_queued() {
        let patcher = RecordingPatcher::new().with_element("app").with_element("side");
        let mut tree = ComponentTree::new(patcher.clone());
        let first = Root::by_element_id(&mut tree, "app", RootConfig::default()).unwrap();
        let second = Root::by_element_id(&mut tree, "side", RootConfig::default()).unwrap();
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        tree.add(first, a).unwrap();
        tree.add(second, b).unwrap();

        tree.batched(|tree| {
            tree.update::<Widget, _>(a, |w| w.set_text("a2"))?;
            tree.update::<Widget, _>(b, |w| w.set_text("b2"))
        })
        .unwrap();
        let count = patcher.patch_count();
        patcher.fail_next(crate::error::PatchError::Backend("lost".into()));

        assert!(tree.refresh(a).is_err());
        assert_eq!(patcher.patch_count(), count);

        tree.refresh(a).unwrap();
        assert_eq!(patcher.patch_count(), count + 2);
        let markup: Vec<String> = patcher
            .records()
            .iter()
            .skip(count)
            .map(|r| r.node.to_string())
            .collect();
        assert!(markup.iter().any(|m| m.contains("<span>b2</span>")));
        assert!(markup.iter().any(|m| m.contains("<span>a2</span>")));
    }

    #[test]
    fn test_moving_wrapped_child_releases_wrapper() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let other = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");
        let wrapper = WidgetWrapper::wrap(&mut tree, a, None).unwrap();
        tree.attach_at(panel, wrapper, None).unwrap();
        assert_eq!(tree.children(panel).unwrap(), vec![a]);
        assert_eq!(tree.logical_parent(a), Some(panel));

        tree.add(other, a).unwrap();

        assert!(!tree.contains(wrapper));
        assert!(tree.public_children(panel).is_empty());
        assert_eq!(tree.parent(a), Some(other));
    }

    #[test]
    fn test_deferred_tasks_run_next_turn() {
        let (mut tree, _) = tree();
        let panel = tree.create(SimplePanel::new());
        let a = label(&mut tree, "a");

        tree.defer(move |tree| {
            tree.add(panel, a)?;
            tree.defer(move |tree| tree.set_visible(a, false));
            Ok(())
        });
        assert!(tree.children(panel).unwrap().is_empty());

        assert_eq!(tree.run_pending_tasks().unwrap(), 1);
        assert_eq!(tree.children(panel).unwrap(), vec![a]);
        assert!(tree.is_visible(a));
        assert_eq!(tree.pending_tasks(), 1);

        assert_eq!(tree.run_pending_tasks().unwrap(), 1);
        assert!(!tree.is_visible(a));
    }

    #[test]
    fn test_failed_task_keeps_remaining_queue() {
        let (mut tree, _) = tree();
        let a = label(&mut tree, "a");
        let b = label(&mut tree, "b");
        tree.defer(move |tree| tree.add(a, b));
        tree.defer(move |tree| tree.set_visible(b, false));

        assert!(tree.run_pending_tasks().is_err());
        assert_eq!(tree.pending_tasks(), 1);
        assert_eq!(tree.run_pending_tasks().unwrap(), 1);
        assert!(!tree.is_visible(b));
    }
}
