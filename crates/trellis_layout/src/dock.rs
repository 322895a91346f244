//! Dock panel
//!
//! Five named slots around a center. Two private flex panels do the layout:
//! a main column holding `up`, the sub row and `down`, and the sub row
//! holding `left`, `center` and `right`. Each slot holds at most one
//! component; adding to an occupied slot removes (without disposing) the
//! previous occupant.

use trellis_core::vnode::h;
use trellis_core::{Component, ComponentId, ComponentTree, RenderContext, Result, VNode};

use crate::flex::{FlexItem, FlexOptions, FlexPanel};
use crate::style::{AlignItems, JustifyContent};

/// A dock slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Up,
    Down,
    Left,
    Center,
    Right,
}

impl Side {
    /// Order of [`ComponentTree::children`] for a dock
    pub const ALL: [Side; 5] = [Side::Up, Side::Left, Side::Center, Side::Right, Side::Down];

    fn slot(self) -> usize {
        match self {
            Side::Up => 0,
            Side::Left => 1,
            Side::Center => 2,
            Side::Right => 3,
            Side::Down => 4,
        }
    }

    fn item(self) -> FlexItem {
        match self {
            Side::Up | Side::Left => FlexItem::new().order(1),
            Side::Center => FlexItem::new().order(2).grow(1),
            Side::Down | Side::Right => FlexItem::new().order(3),
        }
    }
}

/// Dock panel payload
#[derive(Clone, Debug)]
pub struct DockState {
    main: FlexPanel,
    sub: FlexPanel,
    slots: [Option<ComponentId>; 5],
}

impl DockState {
    fn flex_for(&self, side: Side) -> FlexPanel {
        match side {
            Side::Up | Side::Down => self.main,
            Side::Left | Side::Center | Side::Right => self.sub,
        }
    }

    /// Occupant of a slot, ignoring entries whose component has since been
    /// moved elsewhere
    pub fn occupant(&self, tree: &ComponentTree, side: Side) -> Option<ComponentId> {
        self.slots[side.slot()]
            .filter(|&child| tree.logical_parent(child) == Some(self.flex_for(side).id()))
    }

    fn side_of(&self, tree: &ComponentTree, child: ComponentId) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|&side| self.occupant(tree, side) == Some(child))
    }

    fn place(&mut self, tree: &mut ComponentTree, child: ComponentId, side: Side) -> Result<()> {
        for slot in self.slots.iter_mut() {
            if *slot == Some(child) {
                *slot = None;
            }
        }
        if let Some(previous) = self.occupant(tree, side) {
            tree.remove(self.flex_for(side), previous)?;
            tracing::debug!(?side, ?previous, "replaced dock occupant");
        }
        self.flex_for(side).add_item(tree, child, side.item())?;
        self.slots[side.slot()] = Some(child);
        Ok(())
    }

    fn clear(&mut self, tree: &mut ComponentTree, side: Side) -> Result<Option<ComponentId>> {
        let occupant = self.occupant(tree, side);
        if let Some(child) = occupant {
            tree.remove(self.flex_for(side), child)?;
        }
        self.slots[side.slot()] = None;
        Ok(occupant)
    }
}

impl Component for DockState {
    fn render(&self, cx: &RenderContext<'_>) -> VNode {
        h("div").children(cx.render_children()).into()
    }

    fn is_container(&self) -> bool {
        true
    }

    fn add_child(
        &mut self,
        tree: &mut ComponentTree,
        _this: ComponentId,
        child: ComponentId,
        _index: Option<usize>,
    ) -> Result<()> {
        self.place(tree, child, Side::Center)
    }

    fn remove_child(
        &mut self,
        tree: &mut ComponentTree,
        _this: ComponentId,
        child: ComponentId,
    ) -> Result<bool> {
        match self.side_of(tree, child) {
            Some(side) => {
                self.clear(tree, side)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_all_children(&mut self, tree: &mut ComponentTree, _this: ComponentId) -> Result<()> {
        for side in Side::ALL {
            self.clear(tree, side)?;
        }
        Ok(())
    }

    fn dispose_all_children(&mut self, tree: &mut ComponentTree, _this: ComponentId) -> Result<()> {
        for side in Side::ALL {
            if let Some(child) = self.occupant(tree, side) {
                tree.dispose(child)?;
            }
            self.slots[side.slot()] = None;
        }
        Ok(())
    }

    fn logical_children(&self, tree: &ComponentTree, _this: ComponentId) -> Vec<ComponentId> {
        Side::ALL
            .into_iter()
            .filter_map(|side| self.occupant(tree, side))
            .collect()
    }
}

/// Handle to a dock panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DockPanel(ComponentId);

impl From<DockPanel> for ComponentId {
    fn from(panel: DockPanel) -> Self {
        panel.0
    }
}

impl DockPanel {
    pub fn new(tree: &mut ComponentTree) -> Result<Self> {
        let main = FlexPanel::new(
            tree,
            FlexOptions::column()
                .with_justify(JustifyContent::SpaceBetween)
                .with_align_items(AlignItems::Stretch)
                .with_wrappers(true),
        );
        let sub = FlexPanel::new(
            tree,
            FlexOptions::row()
                .with_justify(JustifyContent::SpaceBetween)
                .with_align_items(AlignItems::Center)
                .with_wrappers(true),
        );
        main.add_item(tree, sub.id(), FlexItem::new().order(2))?;

        let id = tree.create(DockState {
            main,
            sub,
            slots: [None; 5],
        });
        tree.add_private(id, main)?;
        Ok(Self(id))
    }

    pub fn id(self) -> ComponentId {
        self.0
    }

    /// Put `child` into a slot, removing the current occupant
    pub fn add_at(self, tree: &mut ComponentTree, child: ComponentId, side: Side) -> Result<()> {
        let this = self.0;
        tree.adopt(this, child)?;
        tree.mutate::<DockState, _>(this, |state, tree| state.place(tree, child, side))?;
        tracing::debug!(dock = ?this, ?child, ?side, "docked child");
        Ok(())
    }

    /// Empty a slot without disposing its occupant, which is returned
    pub fn remove_at(self, tree: &mut ComponentTree, side: Side) -> Result<Option<ComponentId>> {
        tree.mutate::<DockState, _>(self.0, |state, tree| state.clear(tree, side))
    }

    pub fn occupant(self, tree: &ComponentTree, side: Side) -> Option<ComponentId> {
        tree.get::<DockState>(self.0)?.occupant(tree, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{RecordingPatcher, Widget};

    fn setup() -> (ComponentTree, DockPanel) {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        let dock = DockPanel::new(&mut tree).unwrap();
        (tree, dock)
    }

    #[test]
    fn test_children_order() {
        let (mut tree, dock) = setup();
        let ids: Vec<ComponentId> = (0..5).map(|_| tree.create(Widget::new("div"))).collect();
        dock.add_at(&mut tree, ids[0], Side::Down).unwrap();
        dock.add_at(&mut tree, ids[1], Side::Right).unwrap();
        dock.add_at(&mut tree, ids[2], Side::Up).unwrap();
        tree.add(dock, ids[3]).unwrap();
        dock.add_at(&mut tree, ids[4], Side::Left).unwrap();

        assert_eq!(
            tree.children(dock).unwrap(),
            vec![ids[2], ids[4], ids[3], ids[1], ids[0]]
        );
        assert_eq!(dock.occupant(&tree, Side::Center), Some(ids[3]));
    }

    #[test]
    fn test_moving_between_sides() {
        let (mut tree, dock) = setup();
        let a = tree.create(Widget::new("div"));
        dock.add_at(&mut tree, a, Side::Left).unwrap();
        dock.add_at(&mut tree, a, Side::Right).unwrap();

        assert_eq!(dock.occupant(&tree, Side::Left), None);
        assert_eq!(dock.occupant(&tree, Side::Right), Some(a));
        assert_eq!(tree.children(dock).unwrap(), vec![a]);
    }

    #[test]
    fn test_remove_at_keeps_component() {
        let (mut tree, dock) = setup();
        let a = tree.create(Widget::new("div"));
        dock.add_at(&mut tree, a, Side::Up).unwrap();

        assert_eq!(dock.remove_at(&mut tree, Side::Up).unwrap(), Some(a));
        assert_eq!(dock.remove_at(&mut tree, Side::Up).unwrap(), None);
        assert!(tree.contains(a));
        assert_eq!(tree.parent(a), None);
        assert!(tree.children(dock).unwrap().is_empty());
    }

    #[test]
    fn test_moving_out_invalidates_slot() {
        let (mut tree, dock) = setup();
        let elsewhere = tree.create(trellis_core::SimplePanel::new());
        let a = tree.create(Widget::new("div"));
        dock.add_at(&mut tree, a, Side::Center).unwrap();

        tree.add(elsewhere, a).unwrap();

        assert_eq!(dock.occupant(&tree, Side::Center), None);
        assert!(tree.children(dock).unwrap().is_empty());
    }

    #[test]
    fn test_markup_orders_slots() {
        let (mut tree, dock) = setup();
        let up = tree.create(Widget::new("header"));
        let center = tree.create(Widget::new("main"));
        dock.add_at(&mut tree, up, Side::Up).unwrap();
        dock.add_at(&mut tree, center, Side::Center).unwrap();

        let markup = tree.render(dock).unwrap().to_string();
        assert!(markup.contains(r#"<div style="order: 1;"><header></header></div>"#));
        assert!(markup.contains(r#"<div style="order: 2; flex-grow: 1;"><main></main></div>"#));
    }
}
