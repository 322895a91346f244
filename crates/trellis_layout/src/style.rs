//! Style vocabulary shared by the layout panels
//!
//! Flex and grid properties use taffy's enums so that the same values drive
//! both CSS output here and a native layout pass elsewhere. [`CssValue`]
//! gives each one its CSS keyword.

use trellis_core::{ComponentId, ComponentTree, Result, WidgetWrapper};

pub use taffy::style::{
    AlignContent, AlignItems, AlignSelf, FlexDirection, FlexWrap, GridAutoFlow, JustifyContent,
    JustifyItems, JustifySelf,
};

/// CSS keyword for a style enum
pub trait CssValue {
    fn css_value(&self) -> &'static str;
}

impl CssValue for FlexDirection {
    fn css_value(&self) -> &'static str {
        match self {
            FlexDirection::Row => "row",
            FlexDirection::Column => "column",
            FlexDirection::RowReverse => "row-reverse",
            FlexDirection::ColumnReverse => "column-reverse",
        }
    }
}

impl CssValue for FlexWrap {
    fn css_value(&self) -> &'static str {
        match self {
            FlexWrap::NoWrap => "nowrap",
            FlexWrap::Wrap => "wrap",
            FlexWrap::WrapReverse => "wrap-reverse",
        }
    }
}

// Also covers AlignSelf, JustifyItems and JustifySelf
impl CssValue for AlignItems {
    fn css_value(&self) -> &'static str {
        match self {
            AlignItems::Start => "start",
            AlignItems::End => "end",
            AlignItems::FlexStart => "flex-start",
            AlignItems::FlexEnd => "flex-end",
            AlignItems::Center => "center",
            AlignItems::Baseline => "baseline",
            AlignItems::Stretch => "stretch",
        }
    }
}

// Also covers JustifyContent
impl CssValue for AlignContent {
    fn css_value(&self) -> &'static str {
        match self {
            AlignContent::Start => "start",
            AlignContent::End => "end",
            AlignContent::FlexStart => "flex-start",
            AlignContent::FlexEnd => "flex-end",
            AlignContent::Center => "center",
            AlignContent::Stretch => "stretch",
            AlignContent::SpaceBetween => "space-between",
            AlignContent::SpaceEvenly => "space-evenly",
            AlignContent::SpaceAround => "space-around",
        }
    }
}

impl CssValue for GridAutoFlow {
    fn css_value(&self) -> &'static str {
        match self {
            GridAutoFlow::Row => "row",
            GridAutoFlow::Column => "column",
            GridAutoFlow::RowDense => "row dense",
            GridAutoFlow::ColumnDense => "column dense",
        }
    }
}

/// Pixel length
pub fn px(value: u32) -> String {
    format!("{value}px")
}

/// Keyword of an optional style value
pub(crate) fn css<T: CssValue>(value: Option<T>) -> Option<&'static str> {
    value.map(|v| v.css_value())
}

/// Put `child` into `container`, inside a fresh wrapper when `use_wrappers`
/// is set. Returns the component that should carry the item style.
pub(crate) fn place_item(
    tree: &mut ComponentTree,
    container: ComponentId,
    child: ComponentId,
    use_wrappers: bool,
    class: Option<String>,
    index: Option<usize>,
) -> Result<ComponentId> {
    if use_wrappers {
        let wrapper = WidgetWrapper::wrap(tree, child, class)?;
        tree.attach_at(container, wrapper, index)?;
        Ok(wrapper)
    } else {
        tree.attach_at(container, child, index)?;
        Ok(child)
    }
}

/// Stamp item style onto the carrier, skipping unset entries
pub(crate) fn stamp(tree: &mut ComponentTree, target: ComponentId, entries: Vec<(&str, Option<String>)>) {
    for (property, value) in entries {
        if let Some(value) = value {
            tree.set_layout_style(target, property, value);
        }
    }
}

/// Remove `child` from `container`. A wrapper is disposed; an unwrapped
/// child loses the item style the panel put on it.
pub(crate) fn unplace_item(
    tree: &mut ComponentTree,
    container: ComponentId,
    child: ComponentId,
    item_properties: &[&str],
) -> bool {
    if tree.public_children(container).contains(&child) {
        tree.detach(container, child);
        tree.remove_layout_style(child, item_properties);
        true
    } else {
        tree.detach_logical(container, child)
    }
}
