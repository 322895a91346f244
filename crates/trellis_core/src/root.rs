//! Roots
//!
//! A root is the top of a component tree bound to a live element. It is the
//! only place where rendering reaches the [`Patcher`](crate::patch::Patcher):
//! every refresh climbs the parent chain and, if it ends at a mounted root,
//! re-patches that root.
//!
//! The [`RootRegistry`] keeps the live roots and the process-wide style sheets
//! and modals. Exactly one root, the primary, renders those global lists.
//! Globals point at the primary root as their parent so that changes to them
//! refresh it, but they are not owned by it.

use crate::component::{Component, ComponentId, RenderContext};
use crate::error::{Result, TreeError};
use crate::patch::{ElementRef, MountHandle, PatchTarget};
use crate::tree::ComponentTree;
use crate::vnode::{h, VNode};

pub use crate::config::{ContainerKind, RootConfig};

/// Live roots and process-wide globals
#[derive(Clone, Debug, Default)]
pub struct RootRegistry {
    roots: Vec<ComponentId>,
    primary: Option<ComponentId>,
    styles: Vec<ComponentId>,
    modals: Vec<ComponentId>,
}

impl RootRegistry {
    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    pub fn primary(&self) -> Option<ComponentId> {
        self.primary
    }

    pub fn styles(&self) -> &[ComponentId] {
        &self.styles
    }

    pub fn modals(&self) -> &[ComponentId] {
        &self.modals
    }

    pub fn is_root(&self, id: ComponentId) -> bool {
        self.roots.contains(&id)
    }

    /// Drop a component from the global lists. Returns whether it was listed.
    pub(crate) fn forget(&mut self, id: ComponentId) -> bool {
        let before = self.styles.len() + self.modals.len();
        self.styles.retain(|&s| s != id);
        self.modals.retain(|&m| m != id);
        before != self.styles.len() + self.modals.len()
    }

    fn globals(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.styles.iter().chain(self.modals.iter()).copied()
    }
}

/// The root container component
#[derive(Clone, Debug)]
pub struct RootPanel {
    element_id: String,
    config: RootConfig,
    element: Option<ElementRef>,
    mounted: Option<MountHandle>,
    context_menus: Vec<ComponentId>,
}

impl RootPanel {
    fn new(element_id: String, config: RootConfig) -> Self {
        Self {
            element_id,
            config,
            element: None,
            mounted: None,
            context_menus: Vec::new(),
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn config(&self) -> RootConfig {
        self.config
    }

    pub fn context_menus(&self) -> &[ComponentId] {
        &self.context_menus
    }

    fn target(&self) -> Option<PatchTarget> {
        match (&self.mounted, &self.element) {
            (Some(handle), _) => Some(PatchTarget::Mounted(handle.clone())),
            (None, Some(element)) => Some(PatchTarget::Element(element.clone())),
            (None, None) => None,
        }
    }
}

impl Component for RootPanel {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let mut el = h("div").id(self.element_id.clone());
        if let Some(class) = self.config.container.class_name() {
            el = el.class(class);
        }

        let children = cx.render_children();
        el = if self.config.add_row {
            el.child(h("div").class("row").children(children))
        } else {
            el.children(children)
        };

        let registry = &cx.tree().registry;
        if registry.primary() == Some(cx.id()) {
            el = el
                .children(cx.render_visible(registry.styles()))
                .children(cx.render_visible(registry.modals()));
        }
        el.children(cx.render_visible(&self.context_menus)).into()
    }

    fn is_container(&self) -> bool {
        true
    }

    fn remove_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
    ) -> Result<bool> {
        if let Some(pos) = self.context_menus.iter().position(|&m| m == child) {
            self.context_menus.remove(pos);
            tree.set_parent(child, None);
            return Ok(true);
        }
        if tree.registry.forget(child) {
            tree.set_parent(child, None);
            return Ok(true);
        }
        Ok(tree.detach_logical(this, child))
    }
}

/// Handle to a root component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Root(ComponentId);

impl From<Root> for ComponentId {
    fn from(root: Root) -> Self {
        root.0
    }
}

impl Root {
    /// Create a root for the element with the given id, using the tree's
    /// default root options
    pub fn new(tree: &mut ComponentTree, element_id: impl Into<String>) -> Result<Self> {
        let config = tree.config.root;
        Self::by_element_id(tree, element_id, config)
    }

    /// Create a root for the element with the given id. Mounts immediately if
    /// the patcher knows the element, otherwise waits for [`attach`](Self::attach).
    pub fn by_element_id(
        tree: &mut ComponentTree,
        element_id: impl Into<String>,
        config: RootConfig,
    ) -> Result<Self> {
        let element_id = element_id.into();
        let element = tree.patcher.lookup(&element_id);
        let root = Self::register(tree, element_id, config);
        match element {
            Some(element) => root.attach(tree, element)?,
            None => tracing::debug!(id = ?root.0, "root element not found, staying unmounted"),
        }
        Ok(root)
    }

    /// Create a root bound to an element and mount it immediately
    pub fn with_element(
        tree: &mut ComponentTree,
        element: ElementRef,
        config: RootConfig,
    ) -> Result<Self> {
        let root = Self::register(tree, element.id().to_string(), config);
        root.attach(tree, element)?;
        Ok(root)
    }

    fn register(tree: &mut ComponentTree, element_id: String, config: RootConfig) -> Self {
        let id = tree.create(RootPanel::new(element_id, config));
        tree.registry.roots.push(id);
        if tree.registry.primary.is_none() {
            tree.registry.primary = Some(id);
            let globals: Vec<ComponentId> = tree.registry.globals().collect();
            for global in globals {
                tree.set_parent(global, Some(id));
            }
        }
        let primary = tree.registry.primary == Some(id);
        tracing::debug!(?id, primary, "registered root");
        Root(id)
    }

    /// Wrap an existing root id
    pub fn from_id(tree: &ComponentTree, id: ComponentId) -> Result<Self> {
        if tree.registry.is_root(id) {
            Ok(Root(id))
        } else {
            Err(TreeError::NotARoot(id))
        }
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    /// Bind to an element and mount into it
    pub fn attach(self, tree: &mut ComponentTree, element: ElementRef) -> Result<()> {
        let panel = tree
            .get_mut::<RootPanel>(self.0)
            .ok_or(TreeError::NotARoot(self.0))?;
        panel.element = Some(element);
        panel.mounted = None;
        tree.patch_root(self.0)?;
        tracing::debug!(id = ?self.0, "mounted root");
        Ok(())
    }

    /// Patch the current tree. No-op while rendering is disabled or before
    /// the first mount.
    pub fn re_render(self, tree: &mut ComponentTree) -> Result<()> {
        tree.re_render_root(self.0)
    }

    /// Patch an empty root element, then the real tree
    pub fn restart(self, tree: &mut ComponentTree) -> Result<()> {
        let panel = tree
            .get::<RootPanel>(self.0)
            .ok_or(TreeError::NotARoot(self.0))?;
        let Some(target) = panel.target() else {
            return Ok(());
        };
        let blank: VNode = h("div").id(panel.element_id.clone()).into();
        let handle = tree.patcher.patch(target, &blank)?;
        if let Some(panel) = tree.get_mut::<RootPanel>(self.0) {
            panel.mounted = Some(handle);
        }
        tree.mark_dirty(self.0);
        tree.patch_root(self.0)
    }

    /// Dispose the root and everything it owns
    pub fn dispose(self, tree: &mut ComponentTree) -> Result<()> {
        tree.dispose(self.0)
    }

    pub fn is_mounted(self, tree: &ComponentTree) -> bool {
        self.mount_handle(tree).is_some()
    }

    pub fn mount_handle(self, tree: &ComponentTree) -> Option<&MountHandle> {
        tree.get::<RootPanel>(self.0)?.mounted.as_ref()
    }

    pub fn is_primary(self, tree: &ComponentTree) -> bool {
        tree.registry.primary == Some(self.0)
    }

    /// Add a context menu, rendered by this root after its children
    pub fn add_context_menu(self, tree: &mut ComponentTree, menu: ComponentId) -> Result<()> {
        if !tree.contains(menu) {
            return Err(TreeError::UnknownComponent(menu));
        }
        if tree.is_ancestor_or_self(menu, self.0) {
            return Err(TreeError::Cycle {
                container: self.0,
                child: menu,
            });
        }
        tree.detach_from_parent(menu)?;
        let root = self.0;
        tree.mutate::<RootPanel, _>(root, |panel, tree| {
            panel.context_menus.push(menu);
            tree.set_parent(menu, Some(root));
            Ok(())
        })
    }

    pub fn remove_context_menu(self, tree: &mut ComponentTree, menu: ComponentId) -> Result<()> {
        let root = self.0;
        tree.mutate::<RootPanel, _>(root, |panel, tree| {
            if let Some(pos) = panel.context_menus.iter().position(|&m| m == menu) {
                panel.context_menus.remove(pos);
                tree.set_parent(menu, None);
            }
            Ok(())
        })
    }
}

impl ComponentTree {
    pub fn registry(&self) -> &RootRegistry {
        &self.registry
    }

    pub fn primary_root(&self) -> Option<Root> {
        self.registry.primary.map(Root)
    }

    /// Hand the primary role, and with it the global lists, to another root
    pub fn set_primary_root(&mut self, root: Root) -> Result<()> {
        if !self.registry.is_root(root.0) {
            return Err(TreeError::NotARoot(root.0));
        }
        if self.registry.primary == Some(root.0) {
            return Ok(());
        }
        let globals: Vec<ComponentId> = self.registry.globals().collect();
        if let Some(&global) = globals
            .iter()
            .find(|&&global| self.is_ancestor_or_self(global, root.0))
        {
            return Err(TreeError::Cycle {
                container: root.0,
                child: global,
            });
        }
        let previous = self.registry.primary.replace(root.0);
        for global in globals {
            self.set_parent(global, Some(root.0));
        }
        tracing::debug!(?previous, primary = ?root.0, "primary root changed");
        self.batched(|tree| {
            if let Some(previous) = previous {
                tree.refresh(previous)?;
            }
            Ok(())
        })?;
        self.refresh(root.0)
    }

    /// Add a global modal, rendered by the primary root
    pub fn add_modal(&mut self, modal: impl Into<ComponentId>) -> Result<()> {
        let modal = modal.into();
        self.add_global(modal, |registry| &mut registry.modals)
    }

    pub fn remove_modal(&mut self, modal: impl Into<ComponentId>) -> Result<()> {
        let modal = modal.into();
        self.remove_global(modal, |registry| &mut registry.modals)
    }

    /// Add a global style sheet, rendered by the primary root
    pub fn add_style(&mut self, style: impl Into<ComponentId>) -> Result<()> {
        let style = style.into();
        self.add_global(style, |registry| &mut registry.styles)
    }

    pub fn remove_style(&mut self, style: impl Into<ComponentId>) -> Result<()> {
        let style = style.into();
        self.remove_global(style, |registry| &mut registry.styles)
    }

    fn add_global(
        &mut self,
        id: ComponentId,
        list: impl FnOnce(&mut RootRegistry) -> &mut Vec<ComponentId>,
    ) -> Result<()> {
        if !self.contains(id) {
            return Err(TreeError::UnknownComponent(id));
        }
        // A root, or a panel holding the primary root, would close a loop
        let holds_primary = self
            .registry
            .primary
            .is_some_and(|primary| self.is_ancestor_or_self(id, primary));
        if self.registry.is_root(id) || holds_primary {
            return Err(TreeError::Cycle {
                container: self.registry.primary.unwrap_or(id),
                child: id,
            });
        }
        self.detach_from_parent(id)?;
        let list = list(&mut self.registry);
        if !list.contains(&id) {
            list.push(id);
        }
        let primary = self.registry.primary;
        self.set_parent(id, primary);
        match primary {
            Some(primary) => self.refresh(primary),
            None => Ok(()),
        }
    }

    fn remove_global(
        &mut self,
        id: ComponentId,
        list: impl FnOnce(&mut RootRegistry) -> &mut Vec<ComponentId>,
    ) -> Result<()> {
        let list = list(&mut self.registry);
        let Some(pos) = list.iter().position(|&g| g == id) else {
            return Ok(());
        };
        list.remove(pos);
        self.set_parent(id, None);
        match self.registry.primary {
            Some(primary) => self.refresh(primary),
            None => Ok(()),
        }
    }

    /// Drop a root from the registry while it is being destroyed
    pub(crate) fn unregister_root(&mut self, id: ComponentId) {
        self.registry.roots.retain(|&r| r != id);

        let menus = self
            .get_mut::<RootPanel>(id)
            .map(|panel| std::mem::take(&mut panel.context_menus))
            .unwrap_or_default();
        for menu in menus {
            self.set_parent(menu, None);
            self.destroy(menu);
        }

        if self.registry.primary == Some(id) {
            self.registry.primary = None;
            let globals: Vec<ComponentId> = self.registry.globals().collect();
            self.registry.styles.clear();
            self.registry.modals.clear();
            for global in globals {
                self.set_parent(global, None);
            }
            tracing::debug!(?id, "primary root disposed, globals cleared");
        }
        tracing::debug!(?id, "unregistered root");
    }

    /// Re-patch a mounted root
    pub(crate) fn re_render_root(&mut self, id: ComponentId) -> Result<()> {
        if !self.config.rendering_enabled {
            tracing::trace!(?id, "rendering disabled, skipping patch");
            return Ok(());
        }
        if !self.get::<RootPanel>(id).is_some_and(|panel| panel.mounted.is_some()) {
            return Ok(());
        }
        self.patch_root(id)
    }

    fn patch_root(&mut self, id: ComponentId) -> Result<()> {
        let target = self
            .get::<RootPanel>(id)
            .ok_or(TreeError::NotARoot(id))?
            .target();
        let Some(target) = target else {
            return Ok(());
        };
        let node = self.render(id)?;
        let handle = self.patcher.patch(target, &node)?;
        tracing::trace!(?id, generation = handle.generation(), "patched root");
        if let Some(panel) = self.get_mut::<RootPanel>(id) {
            panel.mounted = Some(handle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::error::PatchError;
    use crate::panel::SimplePanel;
    use crate::patch::RecordingPatcher;
    use crate::widget::{StyleSheet, Widget};

    fn setup() -> (ComponentTree, RecordingPatcher) {
        let patcher = RecordingPatcher::new().with_element("app").with_element("side");
        let tree = ComponentTree::with_config(TreeConfig::testing(), patcher.clone());
        (tree, patcher)
    }

    fn last_markup(patcher: &RecordingPatcher) -> String {
        patcher.last_node().map(|n| n.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_missing_element_stays_unmounted() {
        let (mut tree, patcher) = setup();
        let root = Root::by_element_id(&mut tree, "nowhere", RootConfig::default()).unwrap();
        assert!(!root.is_mounted(&tree));

        let label = tree.create(Widget::new("span"));
        tree.add(root, label).unwrap();
        root.re_render(&mut tree).unwrap();
        assert_eq!(patcher.patch_count(), 0);

        patcher.add_element("nowhere");
        root.attach(&mut tree, ElementRef::new("nowhere")).unwrap();
        assert!(root.is_mounted(&tree));
        assert_eq!(patcher.patch_count(), 1);
    }

    #[test]
    fn test_with_element_mounts_immediately() {
        let (mut tree, patcher) = setup();
        let root = Root::with_element(
            &mut tree,
            ElementRef::new("app"),
            RootConfig::new(ContainerKind::Fluid).with_row(true),
        )
        .unwrap();
        let label = tree.create(Widget::new("span").content("hi"));
        tree.add(root, label).unwrap();

        assert!(root.is_mounted(&tree));
        assert_eq!(
            last_markup(&patcher),
            r#"<div id="app" class="container-fluid"><div class="row"><span>hi</span></div></div>"#
        );
    }

    #[test]
    fn test_with_unknown_element_fails() {
        let (mut tree, _) = setup();
        let err = Root::with_element(&mut tree, ElementRef::new("ghost"), RootConfig::default())
            .unwrap_err();
        assert!(matches!(err, TreeError::Patch(PatchError::TargetMissing(_))));
    }

    #[test]
    fn test_rendering_disabled_defers_patches() {
        let (mut tree, patcher) = setup();
        let root = Root::new(&mut tree, "app").unwrap();
        tree.set_rendering_enabled(false).unwrap();

        let label = tree.create(Widget::new("span"));
        tree.add(root, label).unwrap();
        assert_eq!(patcher.patch_count(), 1);

        tree.set_rendering_enabled(true).unwrap();
        assert_eq!(patcher.patch_count(), 2);
    }

    #[test]
    fn test_restart_patches_blank_first() {
        let (mut tree, patcher) = setup();
        let root = Root::new(&mut tree, "app").unwrap();
        let label = tree.create(Widget::new("span").content("x"));
        tree.add(root, label).unwrap();
        patcher.clear();

        root.restart(&mut tree).unwrap();

        let records = patcher.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].node.to_string(), r#"<div id="app"></div>"#);
        assert_eq!(
            records[1].node.to_string(),
            r#"<div id="app"><span>x</span></div>"#
        );
    }

    #[test]
    fn test_only_primary_renders_globals() {
        let (mut tree, _) = setup();
        let first = Root::new(&mut tree, "app").unwrap();
        let second = Root::new(&mut tree, "side").unwrap();
        let modal = tree.create(Widget::new("dialog"));
        let style = tree.create(StyleSheet::new("body {}"));
        tree.add_modal(modal).unwrap();
        tree.add_style(style).unwrap();

        assert!(first.is_primary(&tree));
        assert!(!second.is_primary(&tree));
        assert_eq!(
            tree.render(first).unwrap().to_string(),
            r#"<div id="app"><style>body {}</style><dialog></dialog></div>"#
        );
        assert_eq!(tree.render(second).unwrap().to_string(), r#"<div id="side"></div>"#);

        tree.set_primary_root(second).unwrap();
        assert_eq!(tree.render(first).unwrap().to_string(), r#"<div id="app"></div>"#);
        assert_eq!(
            tree.render(second).unwrap().to_string(),
            r#"<div id="side"><style>body {}</style><dialog></dialog></div>"#
        );
    }

    #[test]
    fn test_disposing_primary_clears_globals() {
        let (mut tree, _) = setup();
        let first = Root::new(&mut tree, "app").unwrap();
        let second = Root::new(&mut tree, "side").unwrap();
        let modal = tree.create(Widget::new("dialog"));
        tree.add_modal(modal).unwrap();

        first.dispose(&mut tree).unwrap();

        assert!(tree.registry().modals().is_empty());
        assert!(tree.contains(modal));
        assert_eq!(tree.parent(modal), None);
        assert_eq!(tree.primary_root(), None);
        assert!(!second.is_primary(&tree));
        assert_eq!(tree.registry().roots(), &[second.id()]);
    }

    #[test]
    fn test_modal_change_refreshes_primary() {
        let (mut tree, patcher) = setup();
        let _root = Root::new(&mut tree, "app").unwrap();
        let modal = tree.create(Widget::new("dialog"));
        tree.add_modal(modal).unwrap();
        let count = patcher.patch_count();

        tree.update::<Widget, _>(modal, |w| w.set_text("open")).unwrap();
        assert_eq!(patcher.patch_count(), count + 1);
        assert!(last_markup(&patcher).contains("<dialog>open</dialog>"));

        tree.remove_modal(modal).unwrap();
        assert!(!last_markup(&patcher).contains("dialog"));
    }

    #[test]
    fn test_globals_added_before_any_root() {
        let (mut tree, patcher) = setup();
        let modal = tree.create(Widget::new("dialog"));
        tree.add_modal(modal).unwrap();
        assert_eq!(tree.parent(modal), None);

        let root = Root::new(&mut tree, "app").unwrap();
        assert_eq!(tree.parent(modal), Some(root.id()));
        assert_eq!(last_markup(&patcher), r#"<div id="app"><dialog></dialog></div>"#);

        let count = patcher.patch_count();
        tree.update::<Widget, _>(modal, |w| w.set_text("open")).unwrap();
        assert_eq!(patcher.patch_count(), count + 1);
        assert!(last_markup(&patcher).contains("<dialog>open</dialog>"));
    }

    #[test]
    fn test_ancestor_cannot_become_menu_or_global() {
        let (mut tree, _) = setup();
        let root = Root::new(&mut tree, "app").unwrap();
        let outer = tree.create(SimplePanel::new());
        tree.add(outer, root).unwrap();

        assert!(matches!(
            root.add_context_menu(&mut tree, outer),
            Err(TreeError::Cycle { .. })
        ));
        assert!(matches!(tree.add_modal(outer), Err(TreeError::Cycle { .. })));
        assert!(matches!(tree.add_style(outer), Err(TreeError::Cycle { .. })));
        assert_eq!(tree.parent(outer), None);
        assert!(tree.registry().modals().is_empty());
        assert!(tree.render(outer).is_ok());
    }

    #[test]
    fn test_primary_cannot_move_into_global() {
        let (mut tree, _) = setup();
        let first = Root::new(&mut tree, "app").unwrap();
        let second = Root::new(&mut tree, "side").unwrap();
        let holder = tree.create(SimplePanel::new());
        tree.add_modal(holder).unwrap();
        tree.add(holder, second).unwrap();

        assert!(matches!(
            tree.set_primary_root(second),
            Err(TreeError::Cycle { .. })
        ));
        assert!(first.is_primary(&tree));
        assert_eq!(tree.parent(holder), Some(first.id()));
    }

    #[test]
    fn test_context_menus_render_per_root() {
        let (mut tree, _) = setup();
        let first = Root::new(&mut tree, "app").unwrap();
        let second = Root::new(&mut tree, "side").unwrap();
        let menu = tree.create(Widget::new("menu"));
        let panel = tree.create(SimplePanel::new());
        tree.add(second, panel).unwrap();

        second.add_context_menu(&mut tree, menu).unwrap();
        assert_eq!(
            tree.render(second).unwrap().to_string(),
            r#"<div id="side"><div></div><menu></menu></div>"#
        );
        assert_eq!(tree.render(first).unwrap().to_string(), r#"<div id="app"></div>"#);

        second.remove_context_menu(&mut tree, menu).unwrap();
        assert_eq!(
            tree.render(second).unwrap().to_string(),
            r#"<div id="side"><div></div></div>"#
        );
        assert!(tree.contains(menu));
    }

    #[test]
    fn test_dispose_root_frees_subtree() {
        let (mut tree, _) = setup();
        let root = Root::new(&mut tree, "app").unwrap();
        let panel = tree.create(SimplePanel::new());
        let menu = tree.create(Widget::new("menu"));
        tree.add(root, panel).unwrap();
        root.add_context_menu(&mut tree, menu).unwrap();

        root.dispose(&mut tree).unwrap();
        root.dispose(&mut tree).unwrap();

        assert!(tree.is_empty());
        assert!(Root::from_id(&tree, root.id()).is_err());
    }
}
