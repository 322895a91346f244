//! Stack panel
//!
//! Shows exactly one child at a time. `active_index` is `-1` when nothing is
//! active and otherwise indexes the public children; every mutation keeps it
//! within `[-1, len - 1]`.
//!
//! Children can be bound to routes. Registration with the router is deferred
//! to the next task turn so that it never runs inside the construction call
//! stack.

use indexmap::IndexMap;
use trellis_core::router::route_handler;
use trellis_core::vnode::h;
use trellis_core::{
    Component, ComponentId, ComponentTree, RenderContext, Result, TreeError, VNode,
};

/// Stack panel payload
#[derive(Clone, Debug)]
pub struct StackState {
    activate_last: bool,
    active_index: i32,
    /// Route pattern to the child it activates
    routes: IndexMap<String, ComponentId>,
}

impl StackState {
    pub fn new(activate_last: bool) -> Self {
        Self {
            activate_last,
            active_index: -1,
            routes: IndexMap::new(),
        }
    }

    pub fn activate_last(&self) -> bool {
        self.activate_last
    }

    pub fn active_index(&self) -> i32 {
        self.active_index
    }

    pub fn routes(&self) -> &IndexMap<String, ComponentId> {
        &self.routes
    }

    fn reset(&mut self) {
        self.active_index = -1;
        self.routes.clear();
    }
}

fn position(tree: &ComponentTree, this: ComponentId, child: ComponentId) -> Option<i32> {
    tree.public_children(this)
        .iter()
        .position(|&c| c == child)
        .map(|pos| pos as i32)
}

impl Component for StackState {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let active = usize::try_from(self.active_index)
            .ok()
            .and_then(|index| cx.public_children().get(index).copied());
        let shown = active
            .filter(|&child| cx.is_visible(child))
            .and_then(|child| cx.render_child(child));
        h("div").children(shown).into()
    }

    fn is_container(&self) -> bool {
        true
    }

    fn add_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
        index: Option<usize>,
    ) -> Result<()> {
        tree.attach_at(this, child, index)?;
        let pos = position(tree, this, child).unwrap_or(-1);
        if self.activate_last {
            self.active_index = pos;
        } else if self.active_index == -1 {
            self.active_index = 0;
        } else if pos <= self.active_index {
            self.active_index += 1;
        }
        Ok(())
    }

    fn remove_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
    ) -> Result<bool> {
        let Some(pos) = position(tree, this, child) else {
            return Ok(false);
        };
        tree.detach(this, child);
        let len = tree.public_children(this).len() as i32;
        if pos < self.active_index {
            self.active_index -= 1;
        }
        if self.active_index >= len {
            self.active_index = len - 1;
        }
        self.routes.retain(|_, bound| *bound != child);
        Ok(true)
    }

    fn remove_all_children(&mut self, tree: &mut ComponentTree, this: ComponentId) -> Result<()> {
        tree.detach_all(this);
        self.reset();
        Ok(())
    }

    fn dispose_all_children(&mut self, tree: &mut ComponentTree, this: ComponentId) -> Result<()> {
        for child in tree.detach_all(this) {
            tree.destroy(child);
        }
        self.reset();
        Ok(())
    }
}

/// Handle to a stack panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StackPanel(ComponentId);

impl From<StackPanel> for ComponentId {
    fn from(panel: StackPanel) -> Self {
        panel.0
    }
}

impl StackPanel {
    /// Create a stack that activates each newly added child
    pub fn new(tree: &mut ComponentTree) -> Self {
        Self::with_activate_last(tree, true)
    }

    pub fn with_activate_last(tree: &mut ComponentTree, activate_last: bool) -> Self {
        Self(tree.create(StackState::new(activate_last)))
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    pub fn active_index(self, tree: &ComponentTree) -> i32 {
        tree.get::<StackState>(self.0)
            .map_or(-1, StackState::active_index)
    }

    pub fn active_child(self, tree: &ComponentTree) -> Option<ComponentId> {
        let index = usize::try_from(self.active_index(tree)).ok()?;
        tree.public_children(self.0).get(index).copied()
    }

    /// Activate a child by index, or nothing with `-1`
    pub fn set_active_index(self, tree: &mut ComponentTree, index: i32) -> Result<()> {
        let len = tree.public_children(self.0).len();
        if index < -1 || index >= len as i32 {
            return Err(TreeError::IndexOutOfBounds {
                index: index as isize,
                len,
            });
        }
        tree.update::<StackState, _>(self.0, |state| state.active_index = index)
    }

    pub fn set_active_child(self, tree: &mut ComponentTree, child: ComponentId) -> Result<()> {
        let index = position(tree, self.0, child).ok_or(TreeError::NotAChild {
            container: self.0,
            child,
        })?;
        tree.update::<StackState, _>(self.0, |state| state.active_index = index)
    }

    /// Add a child and bind it to a route. Navigating to the route
    /// activates the child.
    pub fn add_with_route(
        self,
        tree: &mut ComponentTree,
        child: ComponentId,
        route: impl Into<String>,
    ) -> Result<()> {
        let route = route.into();
        tree.add(self, child)?;
        tree.update::<StackState, _>(self.0, |state| {
            state.routes.insert(route.clone(), child);
        })?;

        let stack = self;
        tree.defer(move |tree| {
            let handler_route = route.clone();
            tree.register_route(
                &route,
                route_handler(move |tree| stack.activate_route(tree, &handler_route, child)),
            )?;
            tracing::debug!(stack = ?stack.0, route = %route, "bound stack route");
            tree.resolve_routes()
        });
        Ok(())
    }

    fn activate_route(self, tree: &mut ComponentTree, route: &str, child: ComponentId) -> Result<()> {
        let bound = tree
            .get::<StackState>(self.0)
            .and_then(|state| state.routes.get(route).copied());
        if bound != Some(child) {
            tracing::warn!(stack = ?self.0, route, "route fired for a child no longer in the stack");
            return Ok(());
        }
        self.set_active_child(tree, child)
    }
}
