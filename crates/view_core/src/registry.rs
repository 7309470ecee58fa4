//! Generational registry of viewer controllers
//!
//! Undo commands refer to their controller by [`ControllerId`] instead of
//! holding it. Removing a controller retires its key, so stale ids resolve
//! to `None` rather than to whatever reuses the slot.

use crate::controller::ViewerController;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Non-owning handle to a registered controller
    pub struct ControllerId;
}

#[derive(Default)]
pub struct ControllerRegistry {
    controllers: SlotMap<ControllerId, ViewerController>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, controller: ViewerController) -> ControllerId {
        self.controllers.insert(controller)
    }

    pub fn remove(&mut self, id: ControllerId) -> Option<ViewerController> {
        self.controllers.remove(id)
    }

    pub fn get(&self, id: ControllerId) -> Option<&ViewerController> {
        self.controllers.get(id)
    }

    pub fn get_mut(&mut self, id: ControllerId) -> Option<&mut ViewerController> {
        self.controllers.get_mut(id)
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.controllers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut registry = ControllerRegistry::new();
        let id = registry.insert(ViewerController::default());
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id).is_some());
        assert!(!registry.contains(id));
        assert!(registry.get_mut(id).is_none());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stale_id_does_not_alias_reused_slot() {
        let mut registry = ControllerRegistry::new();
        let old = registry.insert(ViewerController::default());
        registry.remove(old);

        let new = registry.insert(ViewerController::default());
        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert!(registry.get(new).is_some());
    }

    #[test]
    fn test_default_id_resolves_to_nothing() {
        let mut registry = ControllerRegistry::new();
        registry.insert(ViewerController::default());
        assert!(registry.get(ControllerId::default()).is_none());
    }
}
