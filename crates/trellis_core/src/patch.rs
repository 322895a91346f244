//! The patch primitive
//!
//! The tree never reconciles virtual nodes itself. Roots hand their rendered
//! node to a [`Patcher`], which applies it to a live document (or anything
//! else) and returns a [`MountHandle`] to patch against next time.
//!
//! [`RecordingPatcher`] keeps everything in memory. It is what tests and
//! headless tools use, in the same spirit as a recording draw context.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::error::PatchError;
use crate::vnode::VNode;

/// A live element found by id
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementRef {
    id: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Result of a successful patch, used as the target of the next one
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MountHandle {
    element_id: String,
    generation: u64,
}

impl MountHandle {
    pub fn new(element_id: impl Into<String>, generation: u64) -> Self {
        Self {
            element_id: element_id.into(),
            generation,
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a patch applies to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchTarget {
    /// First mount into a bare element
    Element(ElementRef),
    /// Update of a previous mount
    Mounted(MountHandle),
}

impl PatchTarget {
    pub fn element_id(&self) -> &str {
        match self {
            PatchTarget::Element(el) => el.id(),
            PatchTarget::Mounted(handle) => handle.element_id(),
        }
    }
}

/// Reconciles virtual nodes against a live document
pub trait Patcher {
    /// Find an element by DOM id
    fn lookup(&self, id: &str) -> Option<ElementRef>;

    /// Apply `node` to `target`
    fn patch(&mut self, target: PatchTarget, node: &VNode) -> Result<MountHandle, PatchError>;
}

/// One call made to a [`RecordingPatcher`]
#[derive(Clone, Debug)]
pub struct PatchRecord {
    pub target: PatchTarget,
    pub node: VNode,
}

#[derive(Debug, Default)]
struct RecordingState {
    elements: FxHashSet<String>,
    log: Vec<PatchRecord>,
    fail_next: Option<PatchError>,
    generation: u64,
}

/// In-memory patcher that records every call
///
/// Clones share state, so a test can keep one clone while the tree owns
/// another.
#[derive(Clone, Debug, Default)]
pub struct RecordingPatcher {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: make an element id resolvable by [`Patcher::lookup`]
    pub fn with_element(self, id: impl Into<String>) -> Self {
        self.add_element(id);
        self
    }

    pub fn add_element(&self, id: impl Into<String>) {
        self.state.borrow_mut().elements.insert(id.into());
    }

    /// Every patch applied so far, oldest first
    pub fn records(&self) -> Vec<PatchRecord> {
        self.state.borrow().log.clone()
    }

    pub fn patch_count(&self) -> usize {
        self.state.borrow().log.len()
    }

    /// The node passed to the most recent patch
    pub fn last_node(&self) -> Option<VNode> {
        self.state.borrow().log.last().map(|record| record.node.clone())
    }

    /// Make the next patch fail with `error`
    pub fn fail_next(&self, error: PatchError) {
        self.state.borrow_mut().fail_next = Some(error);
    }

    pub fn clear(&self) {
        self.state.borrow_mut().log.clear();
    }
}

impl Patcher for RecordingPatcher {
    fn lookup(&self, id: &str) -> Option<ElementRef> {
        self.state
            .borrow()
            .elements
            .contains(id)
            .then(|| ElementRef::new(id))
    }

    fn patch(&mut self, target: PatchTarget, node: &VNode) -> Result<MountHandle, PatchError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        if let PatchTarget::Element(el) = &target {
            if !state.elements.contains(el.id()) {
                return Err(PatchError::TargetMissing(el.id().to_string()));
            }
        }

        state.generation += 1;
        let element_id = node.element_id().unwrap_or(target.element_id()).to_string();
        let handle = MountHandle::new(element_id, state.generation);
        state.log.push(PatchRecord {
            target,
            node: node.clone(),
        });
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::h;

    #[test]
    fn test_patch_requires_known_element() {
        let mut patcher = RecordingPatcher::new();
        let node: VNode = h("div").id("app").into();

        let err = patcher
            .patch(PatchTarget::Element(ElementRef::new("app")), &node)
            .unwrap_err();
        assert_eq!(err, PatchError::TargetMissing("app".into()));
        assert_eq!(patcher.patch_count(), 0);

        patcher.add_element("app");
        let handle = patcher
            .patch(PatchTarget::Element(ElementRef::new("app")), &node)
            .unwrap();
        assert_eq!(handle.element_id(), "app");
        assert_eq!(handle.generation(), 1);
    }

    #[test]
    fn test_handles_advance() {
        let mut patcher = RecordingPatcher::new().with_element("app");
        let node: VNode = h("div").id("app").into();
        let first = patcher
            .patch(PatchTarget::Element(ElementRef::new("app")), &node)
            .unwrap();
        let second = patcher.patch(PatchTarget::Mounted(first), &node).unwrap();

        assert_eq!(second.generation(), 2);
        assert_eq!(patcher.patch_count(), 2);
        assert!(matches!(
            patcher.records()[1].target,
            PatchTarget::Mounted(_)
        ));
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mut patcher = RecordingPatcher::new().with_element("app");
        let shared = patcher.clone();
        shared.fail_next(PatchError::Backend("boom".into()));
        let node: VNode = h("div").into();

        assert!(patcher
            .patch(PatchTarget::Element(ElementRef::new("app")), &node)
            .is_err());
        assert!(patcher
            .patch(PatchTarget::Element(ElementRef::new("app")), &node)
            .is_ok());
        assert_eq!(shared.patch_count(), 1);
    }
}
