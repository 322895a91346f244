//! Trellis Core
//!
//! A retained component tree for browser-style UIs:
//!
//! - **Component arena**: every component lives in a [`ComponentTree`] and is
//!   addressed by a [`ComponentId`]
//! - **Containers**: panels customise child placement through [`Component`]
//!   hooks while the generic container API stays the same
//! - **Render/refresh**: components render to [`VNode`]s; mutations mark the
//!   parent chain dirty and re-patch the root above
//! - **Roots**: mount points bound to live elements through a [`Patcher`]
//!
//! # Example
//!
//! ```rust
//! use trellis_core::prelude::*;
//!
//! let patcher = RecordingPatcher::new().with_element("app");
//! let mut tree = ComponentTree::with_config(TreeConfig::testing(), patcher.clone());
//! let root = Root::new(&mut tree, "app")?;
//!
//! let panel = tree.create(SimplePanel::new().class("list"));
//! let item = tree.create(Widget::new("li").content("first"));
//! tree.add(panel, item)?;
//! tree.add(root, panel)?;
//!
//! assert_eq!(
//!     patcher.last_node().unwrap().to_string(),
//!     r#"<div id="app"><div class="list"><li>first</li></div></div>"#
//! );
//! # Ok::<(), trellis_core::TreeError>(())
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod panel;
pub mod patch;
pub mod root;
pub mod router;
pub mod tree;
pub mod vnode;
pub mod widget;
pub mod wrapper;

pub use component::{AsAny, Component, ComponentId, RenderContext};
pub use config::{ContainerKind, RootConfig, TreeConfig};
pub use error::{PatchError, Result, TreeError};
pub use panel::{BasicPanel, SimplePanel};
pub use patch::{ElementRef, MountHandle, PatchRecord, PatchTarget, Patcher, RecordingPatcher};
pub use root::{Root, RootPanel, RootRegistry};
pub use router::{route_handler, route_matches, PathRouter, RouteHandler, Router};
pub use tree::{ComponentTree, DeferredTask};
pub use vnode::{h, VElement, VNode};
pub use widget::{StyleSheet, Tag, Widget};
pub use wrapper::WidgetWrapper;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::component::{Component, ComponentId, RenderContext};
    pub use crate::config::{ContainerKind, RootConfig, TreeConfig};
    pub use crate::error::{PatchError, TreeError};
    pub use crate::panel::SimplePanel;
    pub use crate::patch::{ElementRef, Patcher, RecordingPatcher};
    pub use crate::root::Root;
    pub use crate::router::{route_handler, PathRouter, Router};
    pub use crate::tree::ComponentTree;
    pub use crate::vnode::{h, VNode};
    pub use crate::widget::{StyleSheet, Tag, Widget};
}
