//! Grid panel
//!
//! Places children on a CSS grid. Placement is stamped onto each item's
//! wrapper (or onto the child when wrappers are off) and passed through as
//! is: overlapping placements are not detected.

use trellis_core::vnode::h;
use trellis_core::{Component, ComponentId, ComponentTree, RenderContext, Result, VNode};

use crate::style::{
    css, place_item, px, stamp, unplace_item, AlignContent, AlignItems, AlignSelf, GridAutoFlow,
    JustifyContent, JustifyItems, JustifySelf,
};

const ITEM_PROPERTIES: &[&str] = &[
    "grid-column-start",
    "grid-row-start",
    "grid-column-end",
    "grid-row-end",
    "grid-area",
    "justify-self",
    "align-self",
];

/// Container options
#[derive(Clone, Debug, PartialEq)]
pub struct GridOptions {
    pub auto_columns: Option<String>,
    pub auto_rows: Option<String>,
    pub auto_flow: Option<GridAutoFlow>,
    pub template_columns: Option<String>,
    pub template_rows: Option<String>,
    /// One string per row of named areas
    pub template_areas: Vec<String>,
    pub column_gap: Option<u32>,
    pub row_gap: Option<u32>,
    pub justify_items: Option<JustifyItems>,
    pub align_items: Option<AlignItems>,
    pub justify_content: Option<JustifyContent>,
    pub align_content: Option<AlignContent>,
    pub use_wrappers: bool,
    pub class: Option<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            auto_columns: None,
            auto_rows: None,
            auto_flow: None,
            template_columns: None,
            template_rows: None,
            template_areas: Vec::new(),
            column_gap: None,
            row_gap: None,
            justify_items: None,
            align_items: None,
            justify_content: None,
            align_content: None,
            use_wrappers: true,
            class: None,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid without wrappers: placement goes onto the children
    pub fn basic() -> Self {
        Self {
            use_wrappers: false,
            ..Self::default()
        }
    }

    pub fn with_template_columns(mut self, template: impl Into<String>) -> Self {
        self.template_columns = Some(template.into());
        self
    }

    pub fn with_template_rows(mut self, template: impl Into<String>) -> Self {
        self.template_rows = Some(template.into());
        self
    }

    pub fn with_template_areas<I, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.template_areas = rows.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_auto_flow(mut self, flow: GridAutoFlow) -> Self {
        self.auto_flow = Some(flow);
        self
    }

    pub fn with_gaps(mut self, column_gap: u32, row_gap: u32) -> Self {
        self.column_gap = Some(column_gap);
        self.row_gap = Some(row_gap);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    fn template_areas_css(&self) -> Option<String> {
        if self.template_areas.is_empty() {
            return None;
        }
        let rows: Vec<String> = self
            .template_areas
            .iter()
            .map(|row| format!("\"{row}\""))
            .collect();
        Some(rows.join(" "))
    }
}

/// Placement of one item
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridItem {
    pub column_start: Option<u32>,
    pub row_start: Option<u32>,
    pub column_end: Option<u32>,
    pub row_end: Option<u32>,
    pub area: Option<String>,
    pub justify_self: Option<JustifySelf>,
    pub align_self: Option<AlignSelf>,
    /// Class of the wrapper
    pub class: Option<String>,
}

impl GridItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start cell, 1-based
    pub fn at(mut self, column: u32, row: u32) -> Self {
        self.column_start = Some(column);
        self.row_start = Some(row);
        self
    }

    /// End lines, exclusive
    pub fn until(mut self, column: u32, row: u32) -> Self {
        self.column_end = Some(column);
        self.row_end = Some(row);
        self
    }

    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn justify_self(mut self, justify: JustifySelf) -> Self {
        self.justify_self = Some(justify);
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

/// Grid panel payload
#[derive(Clone, Debug)]
pub struct GridState {
    options: GridOptions,
}

impl GridState {
    pub fn new(options: GridOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    fn place(
        &self,
        tree: &mut ComponentTree,
        this: ComponentId,
        child: ComponentId,
        item: GridItem,
        index: Option<usize>,
    ) -> Result<()> {
        let target = place_item(tree, this, child, self.options.use_wrappers, item.class, index)?;
        stamp(
            tree,
            target,
            vec![
                ("grid-column-start", item.column_start.map(|v| v.to_string())),
                ("grid-row-start", item.row_start.map(|v| v.to_string())),
                ("grid-column-end", item.column_end.map(|v| v.to_string())),
                ("grid-row-end", item.row_end.map(|v| v.to_string())),
                ("grid-area", item.area),
                ("justify-self", css(item.justify_self).map(str::to_string)),
                ("align-self", css(item.align_self).map(str::to_string)),
            ],
        );
        tracing::trace!(panel = ?this, ?child, ?target, "placed grid item");
        Ok(())
    }
}

impl Component for GridState {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        let o = &self.options;
        let mut el = h("div")
            .style("display", "grid")
            .style_opt("grid-auto-columns", o.auto_columns.clone())
            .style_opt("grid-auto-rows", o.auto_rows.clone())
            .style_opt("grid-auto-flow", css(o.auto_flow))
            .style_opt("grid-template-columns", o.template_columns.clone())
            .style_opt("grid-template-rows", o.template_rows.clone())
            .style_opt("grid-template-areas", o.template_areas_css())
            .style_opt("column-gap", o.column_gap.map(px))
            .style_opt("row-gap", o.row_gap.map(px))
            .style_opt("justify-items", css(o.justify_items))
            .style_opt("align-items", css(o.align_items))
            .style_opt("justify-content", css(o.justify_content))
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
        self.place(tree, this, child, GridItem::default(), index)
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

/// Handle to a grid panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPanel(ComponentId);

impl From<GridPanel> for ComponentId {
    fn from(panel: GridPanel) -> Self {
        panel.0
    }
}

impl GridPanel {
    pub fn new(tree: &mut ComponentTree, options: GridOptions) -> Self {
        Self(tree.create(GridState::new(options)))
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    pub fn options(self, tree: &ComponentTree) -> Option<&GridOptions> {
        tree.get::<GridState>(self.0).map(GridState::options)
    }

    /// Add a child at a grid position
    pub fn add_item(self, tree: &mut ComponentTree, child: ComponentId, item: GridItem) -> Result<()> {
        let this = self.0;
        tree.adopt(this, child)?;
        tree.mutate::<GridState, _>(this, |state, tree| state.place(tree, this, child, item, None))?;
        tracing::debug!(panel = ?this, ?child, "added grid item");
        Ok(())
    }

    /// Change container options. Item placement is left as is.
    pub fn configure(self, tree: &mut ComponentTree, f: impl FnOnce(&mut GridOptions)) -> Result<()> {
        tree.update::<GridState, _>(self.0, |state| {
            let use_wrappers = state.options.use_wrappers;
            f(&mut state.options);
            // Existing items were placed under the old mode
            state.options.use_wrappers = use_wrappers;
        })
    }
}
