//! Split panel
//!
//! Two children with a draggable divider between them. Any other number of
//! children renders nothing. The divider is a private [`Tag`] that only
//! appears in the rendered output, never among the children.
//!
//! Dragging is handled by an external [`ResizePlugin`] bound to the first
//! child. Only the first child's size survives a re-mount: the plugin reports
//! the final size through [`SplitPanel::finish_drag`], which stores it as
//! layout style.

use trellis_core::vnode::h;
use trellis_core::{
    Component, ComponentId, ComponentTree, PatchError, RenderContext, Result, Tag, TreeError,
    VNode,
};

use crate::style::px;

/// Arrangement of the two children
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SplitDirection {
    /// Side by side, divider is a vertical bar
    #[default]
    Vertical,
    /// Stacked, divider is a horizontal bar
    Horizontal,
}

impl SplitDirection {
    pub fn name(self) -> &'static str {
        match self {
            SplitDirection::Vertical => "vertical",
            SplitDirection::Horizontal => "horizontal",
        }
    }

    /// Dimension of the first child that dragging changes
    pub fn dimension(self) -> &'static str {
        match self {
            SplitDirection::Vertical => "width",
            SplitDirection::Horizontal => "height",
        }
    }
}

/// What a resize plugin needs to drive a split
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizeBinding {
    /// The first child, whose size changes
    pub target: ComponentId,
    /// CSS selector of the divider
    pub handle_selector: String,
    pub direction: SplitDirection,
}

/// External drag-to-resize behaviour
pub trait ResizePlugin {
    fn attach(&mut self, binding: &ResizeBinding) -> std::result::Result<(), PatchError>;
}

/// Split panel payload
#[derive(Clone, Debug)]
pub struct SplitState {
    direction: SplitDirection,
    element_id: String,
    divider: ComponentId,
}

impl SplitState {
    pub fn direction(&self) -> SplitDirection {
        self.direction
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn divider(&self) -> ComponentId {
        self.divider
    }

    fn handle_id(&self) -> String {
        format!("{}-splitter-handle", self.element_id)
    }
}

impl Component for SplitState {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let el = h("div")
            .id(self.element_id.clone())
            .class(format!("splitpanel-{}", self.direction.name()));
        let [first, second] = cx.public_children() else {
            return el.into();
        };
        let nodes: Vec<VNode> = match (cx.is_visible(*first), cx.is_visible(*second)) {
            (true, true) => [*first, self.divider, *second]
                .iter()
                .filter_map(|&id| cx.render_child(id))
                .collect(),
            (true, false) => cx.render_child(*first).into_iter().collect(),
            (false, true) => cx.render_child(*second).into_iter().collect(),
            (false, false) => Vec::new(),
        };
        el.children(nodes).into()
    }

    fn is_container(&self) -> bool {
        true
    }
}

/// Handle to a split panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SplitPanel(ComponentId);

impl From<SplitPanel> for ComponentId {
    fn from(panel: SplitPanel) -> Self {
        panel.0
    }
}

impl SplitPanel {
    pub fn new(tree: &mut ComponentTree, direction: SplitDirection) -> Result<Self> {
        let element_id = tree.next_element_id("split");
        let divider = tree.create(
            Tag::new("div")
                .id(format!("{element_id}-splitter-handle"))
                .class(format!("splitter-{}", direction.name())),
        );
        let id = tree.create(SplitState {
            direction,
            element_id,
            divider,
        });
        tree.add_private(id, divider)?;
        Ok(Self(id))
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    fn state(self, tree: &ComponentTree) -> Result<&SplitState> {
        tree.get::<SplitState>(self.0).ok_or(TreeError::WrongType {
            id: self.0,
            expected: "SplitState",
        })
    }

    /// Binding for a resize plugin, available once there are two children
    pub fn resize_binding(self, tree: &ComponentTree) -> Result<Option<ResizeBinding>> {
        let state = self.state(tree)?;
        let binding = match tree.public_children(self.0) {
            [first, _] => Some(ResizeBinding {
                target: *first,
                handle_selector: format!("#{}", state.handle_id()),
                direction: state.direction,
            }),
            _ => None,
        };
        Ok(binding)
    }

    /// Hand the divider to a resize plugin. Returns false while the panel
    /// does not have exactly two children.
    pub fn attach_resizer(self, tree: &ComponentTree, plugin: &mut dyn ResizePlugin) -> Result<bool> {
        match self.resize_binding(tree)? {
            Some(binding) => {
                plugin.attach(&binding)?;
                tracing::debug!(split = ?self.0, target = ?binding.target, "attached resizer");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist the first child's size after a drag
    pub fn finish_drag(self, tree: &mut ComponentTree, size_px: u32) -> Result<()> {
        let dimension = self.state(tree)?.direction.dimension();
        let children = tree.public_children(self.0);
        let first = *children.first().ok_or(TreeError::IndexOutOfBounds {
            index: 0,
            len: children.len(),
        })?;
        tree.set_layout_style(first, dimension, px(size_px));
        tree.refresh(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{RecordingPatcher, Widget};

    #[derive(Default)]
    struct Recorder {
        bindings: Vec<ResizeBinding>,
    }

    impl ResizePlugin for Recorder {
        fn attach(&mut self, binding: &ResizeBinding) -> std::result::Result<(), PatchError> {
            self.bindings.push(binding.clone());
            Ok(())
        }
    }

    #[test]
    fn test_divider_is_private() {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        let split = SplitPanel::new(&mut tree, SplitDirection::Horizontal).unwrap();
        let a = tree.create(Widget::new("a"));
        let b = tree.create(Widget::new("b"));
        tree.add_all(split, [a, b]).unwrap();

        assert_eq!(tree.children(split).unwrap(), vec![a, b]);
        let divider = tree.get::<SplitState>(split).unwrap().divider();
        assert_eq!(tree.private_children(split.id()), &[divider]);
    }

    #[test]
    fn test_hidden_child_drops_divider() {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        let split = SplitPanel::new(&mut tree, SplitDirection::Vertical).unwrap();
        let a = tree.create(Widget::new("a"));
        let b = tree.create(Widget::new("b"));
        tree.add_all(split, [a, b]).unwrap();
        tree.set_visible(a, false).unwrap();

        let node = tree.render(split).unwrap();
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].tag(), Some("b"));
    }

    #[test]
    fn test_resizer_and_drag() {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        let split = SplitPanel::new(&mut tree, SplitDirection::Vertical).unwrap();
        let a = tree.create(Widget::new("a"));
        let b = tree.create(Widget::new("b"));
        let mut plugin = Recorder::default();

        tree.add(split, a).unwrap();
        assert!(!split.attach_resizer(&tree, &mut plugin).unwrap());

        tree.add(split, b).unwrap();
        assert!(split.attach_resizer(&tree, &mut plugin).unwrap());
        let element_id = tree.get::<SplitState>(split).unwrap().element_id().to_string();
        assert_eq!(
            plugin.bindings,
            vec![ResizeBinding {
                target: a,
                handle_selector: format!("#{element_id}-splitter-handle"),
                direction: SplitDirection::Vertical,
            }]
        );

        split.finish_drag(&mut tree, 240).unwrap();
        assert_eq!(
            tree.layout_style(a).unwrap().get("width").map(String::as_str),
            Some("240px")
        );
    }
}
