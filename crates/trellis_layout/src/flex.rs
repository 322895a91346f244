//! Flex panel
//!
//! Arranges children along one flex axis. Per-item properties (order, grow,
//! shrink, basis, align-self) and the spacing margin live on the item's
//! wrapper when wrappers are enabled, or directly on the child's layout style
//! otherwise. The child's own state is never touched.
//!
//! ```rust
//! use trellis_core::prelude::*;
//! use trellis_layout::prelude::*;
//!
//! let mut tree = ComponentTree::new(RecordingPatcher::new());
//! let row = FlexPanel::new(
//!     &mut tree,
//!     FlexOptions::row().with_spacing(8).with_wrappers(true),
//! );
//! let a = tree.create(Widget::new("span").content("a"));
//! row.add_item(&mut tree, a, FlexItem::new().grow(1))?;
//!
//! assert_eq!(
//!     tree.render(row)?.to_string(),
//!     r#"<div style="display: flex; flex-direction: row;"><div style="flex-grow: 1; margin-right: 8px;"><span>a</span></div></div>"#
//! );
//! # Ok::<(), trellis_core::TreeError>(())
//! ```

use trellis_core::vnode::h;
use trellis_core::{Component, ComponentId, ComponentTree, RenderContext, Result, VNode};

use crate::style::{
    css, place_item, px, stamp, unplace_item, AlignContent, AlignItems, AlignSelf, CssValue,
    FlexDirection, FlexWrap, JustifyContent,
};

/// Style properties a flex panel may put on an item
pub(crate) const ITEM_PROPERTIES: &[&str] = &[
    "order",
    "flex-grow",
    "flex-shrink",
    "flex-basis",
    "align-self",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
];

const MARGINS: &[&str] = &["margin-top", "margin-right", "margin-bottom", "margin-left"];

/// Container options
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlexOptions {
    pub direction: FlexDirection,
    pub wrap: Option<FlexWrap>,
    pub justify: Option<JustifyContent>,
    pub align_items: Option<AlignItems>,
    pub align_content: Option<AlignContent>,
    /// Gap between items in px, applied as a directional margin
    pub spacing: Option<u32>,
    /// Put every item in its own wrapper
    pub use_wrappers: bool,
    pub class: Option<String>,
}

impl FlexOptions {
    pub fn new(direction: FlexDirection) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn row() -> Self {
        Self::new(FlexDirection::Row)
    }

    pub fn column() -> Self {
        Self::new(FlexDirection::Column)
    }

    pub fn with_wrap(mut self, wrap: FlexWrap) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn with_justify(mut self, justify: JustifyContent) -> Self {
        self.justify = Some(justify);
        self
    }

    pub fn with_align_items(mut self, align: AlignItems) -> Self {
        self.align_items = Some(align);
        self
    }

    pub fn with_align_content(mut self, align: AlignContent) -> Self {
        self.align_content = Some(align);
        self
    }

    pub fn with_spacing(mut self, spacing: u32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn with_wrappers(mut self, use_wrappers: bool) -> Self {
        self.use_wrappers = use_wrappers;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Margin property and value that realise the spacing
    fn spacing_margin(&self) -> Option<(&'static str, String)> {
        let spacing = self.spacing?;
        let flex_end = self.justify == Some(JustifyContent::FlexEnd);
        let property = match self.direction {
            FlexDirection::Column => "margin-bottom",
            FlexDirection::ColumnReverse => "margin-top",
            FlexDirection::Row if flex_end => "margin-left",
            FlexDirection::Row => "margin-right",
            FlexDirection::RowReverse if flex_end => "margin-right",
            FlexDirection::RowReverse => "margin-left",
        };
        Some((property, px(spacing)))
    }
}

/// Per-item properties
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlexItem {
    pub order: Option<i32>,
    pub grow: Option<u32>,
    pub shrink: Option<u32>,
    /// CSS length, e.g. `"120px"` or `"25%"`
    pub basis: Option<String>,
    pub align_self: Option<AlignSelf>,
    /// Class of the wrapper
    pub class: Option<String>,
}

impl FlexItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn grow(mut self, grow: u32) -> Self {
        self.grow = Some(grow);
        self
    }

    pub fn shrink(mut self, shrink: u32) -> Self {
        self.shrink = Some(shrink);
        self
    }

    pub fn basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }

    pub fn align_self(mut self, align: AlignSelf) -> Self {
        self.align_self = Some(align);
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

/// Flex panel payload
#[derive(Clone, Debug)]
pub struct FlexState {
    options: FlexOptions,
}

impl FlexState {
    pub fn new(options: FlexOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FlexOptions {
        &self.options
    }

    fn place(
        &self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
        item: FlexItem,
        index: Option<usize>,
    ) -> Result<()> {
        let target = place_item(tree, this, child, self.options.use_wrappers, item.class, index)?;
        stamp(
            tree,
            target,
            vec![
                ("order", item.order.map(|v| v.to_string())),
                ("flex-grow", item.grow.map(|v| v.to_string())),
                ("flex-shrink", item.shrink.map(|v| v.to_string())),
                ("flex-basis", item.basis),
                ("align-self", css(item.align_self).map(str::to_string)),
            ],
        );
        if let Some((property, value)) = self.options.spacing_margin() {
            tree.set_layout_style(target, property, value);
        }
        tracing::trace!(panel = ?this, ?child, ?target, "placed flex item");
        Ok(())
    }

    /// Recompute the spacing margin of every current item
    fn reapply_spacing(&self, tree: &mut ComponentTree, this: ComponentId) {
        let margin = self.options.spacing_margin();
        for target in tree.public_children(this).to_vec() {
            tree.remove_layout_style(target, MARGINS);
            if let Some((property, value)) = &margin {
                tree.set_layout_style(target, *property, value.clone());
            }
        }
    }
}

impl Component for FlexState {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let o = &self.options;
        let mut el = h("div")
            .style("display", "flex")
            .style("flex-direction", o.direction.css_value())
            .style_opt("flex-wrap", css(o.wrap))
            .style_opt("justify-content", css(o.justify))
            .style_opt("align-items", css(o.align_items))
            .style_opt("align-content", css(o.align_content));
        if let Some(class) = &o.class {
            el = el.class(class.clone());
        }
        el.children(cx.render_children()).into()
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
        self.place(tree, this, child, FlexItem::default(), index)
    }

    fn remove_child(
        &mut self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
    ) -> Result<bool> {
        Ok(unplace_item(tree, this, child, ITEM_PROPERTIES))
    }

    fn remove_all_children(&mut self, tree: &mut ComponentTree, this: ComponentId) -> Result<()> {
        for child in tree.detach_all(this) {
            if tree.is_wrapper_node(child) {
                tree.release_wrapper(child);
            } else {
                tree.remove_layout_style(child, ITEM_PROPERTIES);
            }
        }
        Ok(())
    }
}

/// Handle to a flex panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlexPanel(ComponentId);

impl From<FlexPanel> for ComponentId {
    fn from(panel: FlexPanel) -> Self {
        panel.0
    }
}

impl FlexPanel {
    pub fn new(tree: &mut ComponentTree, options: FlexOptions) -> Self {
        Self(tree.create(FlexState::new(options)))
    }

    /// Horizontal panel
    pub fn hpanel(tree: &mut ComponentTree) -> Self {
        Self::new(tree, FlexOptions::row())
    }

    /// Vertical panel
    pub fn vpanel(tree: &mut ComponentTree) -> Self {
        Self::new(tree, FlexOptions::column())
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    pub fn options(self, tree: &ComponentTree) -> Option<&FlexOptions> {
        tree.get::<FlexState>(self.0).map(FlexState::options)
    }

    /// Add a child with item properties
    pub fn add_item(self, tree: &mut ComponentTree, child: ComponentId, item: FlexItem) -> Result<()> {
        let this = self.0;
        tree.adopt(this, child)?;
        tree.mutate::<FlexState, _>(this, |state, tree| state.place(tree, this, child, item, None))?;
        tracing::debug!(panel = ?this, ?child, "added flex item");
        Ok(())
    }

    /// Change the spacing and re-apply it to every item
    pub fn set_spacing(self, tree: &mut ComponentTree, spacing: Option<u32>) -> Result<()> {
        self.reconfigure(tree, |o| o.spacing = spacing)
    }

    pub fn set_direction(self, tree: &mut ComponentTree, direction: FlexDirection) -> Result<()> {
        self.reconfigure(tree, |o| o.direction = direction)
    }

    pub fn set_justify(self, tree: &mut ComponentTree, justify: Option<JustifyContent>) -> Result<()> {
        self.reconfigure(tree, |o| o.justify = justify)
    }

    pub fn set_wrap(self, tree: &mut ComponentTree, wrap: Option<FlexWrap>) -> Result<()> {
        tree.update::<FlexState, _>(self.0, |state| state.options.wrap = wrap)
    }

    pub fn set_align_items(self, tree: &mut ComponentTree, align: Option<AlignItems>) -> Result<()> {
        tree.update::<FlexState, _>(self.0, |state| state.options.align_items = align)
    }

    pub fn set_align_content(
        self,
        tree: &mut ComponentTree,
        align: Option<AlignContent>,
    ) -> Result<()> {
        tree.update::<FlexState, _>(self.0, |state| state.options.align_content = align)
    }

    fn reconfigure(self, tree: &mut ComponentTree, f: impl FnOnce(&mut FlexOptions)) -> Result<()> {
        let this = self.0;
        tree.mutate::<FlexState, _>(this, |state, tree| {
            f(&mut state.options);
            state.reapply_spacing(tree, this);
            Ok(())
        })
    }
}
