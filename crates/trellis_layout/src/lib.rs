//! Trellis Layout
//!
//! Layout panels built on the [`trellis_core`] container contract:
//!
//! - [`FlexPanel`]: one flex axis, optional per-item wrappers and spacing
//! - [`GridPanel`]: CSS grid placement
//! - [`DockPanel`]: up/down/left/right/center slots
//! - [`StackPanel`]: one active child, optionally bound to routes
//! - [`SplitPanel`]: two children and a draggable divider
//!
//! Every panel is a component in the tree; the handle types are thin `Copy`
//! wrappers around its [`ComponentId`](trellis_core::ComponentId) and work
//! with the generic container API (`tree.add(panel, child)`) as well as with
//! their own typed operations.

pub mod dock;
pub mod flex;
pub mod grid;
pub mod split;
pub mod stack;
pub mod style;

pub use dock::{DockPanel, DockState, Side};
pub use flex::{FlexItem, FlexOptions, FlexPanel, FlexState};
pub use grid::{GridItem, GridOptions, GridPanel, GridState};
pub use split::{ResizeBinding, ResizePlugin, SplitDirection, SplitPanel, SplitState};
pub use stack::{StackPanel, StackState};
pub use style::CssValue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dock::{DockPanel, Side};
    pub use crate::flex::{FlexItem, FlexOptions, FlexPanel};
    pub use crate::grid::{GridItem, GridOptions, GridPanel};
    pub use crate::split::{ResizeBinding, ResizePlugin, SplitDirection, SplitPanel};
    pub use crate::stack::StackPanel;
    pub use crate::style::{
        AlignContent, AlignItems, AlignSelf, CssValue, FlexDirection, FlexWrap, GridAutoFlow,
        JustifyContent, JustifyItems, JustifySelf,
    };
}
