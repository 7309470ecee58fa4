//! Linear undo/redo history of viewer-state snapshots
//!
//! One branch only: pushing after an undo discards the undone tail.

use crate::controller::ViewerState;
use crate::image_store::FilterKind;
use crate::registry::{ControllerId, ControllerRegistry};

/// What kind of edit a command records. Undo/redo behave the same for all
/// of them; the tag only feeds labels and logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditKind {
    Rotate(f64),
    FlipHorizontal,
    FlipVertical,
    Filter(FilterKind),
}

impl EditKind {
    pub fn is_transform(&self) -> bool {
        !matches!(self, EditKind::Filter(_))
    }

    pub fn default_label(&self) -> String {
        match self {
            EditKind::Rotate(angle) if *angle == 90.0 => "Rotate Right (90°)".to_string(),
            EditKind::Rotate(angle) if *angle == -90.0 => "Rotate Left (-90°)".to_string(),
            EditKind::Rotate(_) => "Rotate".to_string(),
            EditKind::FlipHorizontal => "Flip Horizontal".to_string(),
            EditKind::FlipVertical => "Flip Vertical".to_string(),
            EditKind::Filter(_) => "Apply Filter".to_string(),
        }
    }
}

/// Immutable before/after pair for one completed edit
#[derive(Debug, Clone)]
pub struct UndoCommand {
    target: ControllerId,
    kind: EditKind,
    label: String,
    old_state: ViewerState,
    new_state: ViewerState,
}

impl UndoCommand {
    pub fn new(target: ControllerId, kind: EditKind, old_state: ViewerState, new_state: ViewerState) -> Self {
        Self {
            target,
            kind,
            label: kind.default_label(),
            old_state,
            new_state,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn target(&self) -> ControllerId {
        self.target
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn old_state(&self) -> &ViewerState {
        &self.old_state
    }

    pub fn new_state(&self) -> &ViewerState {
        &self.new_state
    }
}

#[derive(Debug, Default)]
pub struct UndoEngine {
    commands: Vec<UndoCommand>,
    /// Number of commands currently applied
    position: usize,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed edit, dropping anything that was undone
    pub fn push(&mut self, command: UndoCommand) {
        if self.position < self.commands.len() {
            let dropped = self.commands.len() - self.position;
            self.commands.truncate(self.position);
            tracing::debug!("Pruned {} undone commands", dropped);
        }
        tracing::debug!(
            "Push {} '{}' ({:?})",
            if command.kind.is_transform() { "transform" } else { "filter" },
            command.label,
            command.kind
        );
        self.commands.push(command);
        self.position = self.commands.len();
    }

    /// Restore the previous state. A no-op with nothing to undo or when the
    /// command's controller no longer exists.
    pub fn undo(&mut self, controllers: &mut ControllerRegistry) -> bool {
        if !self.can_undo() {
            return false;
        }
        let command = &self.commands[self.position - 1];
        let Some(controller) = controllers.get_mut(command.target) else {
            tracing::debug!("Undo '{}' skipped: controller is gone", command.label);
            return false;
        };
        if !controller.restore_state(&command.old_state) {
            return false;
        }
        tracing::debug!("Undo '{}'", command.label);
        self.position -= 1;
        true
    }

    /// Re-apply the next undone state. Same no-op rules as [`Self::undo`].
    pub fn redo(&mut self, controllers: &mut ControllerRegistry) -> bool {
        if !self.can_redo() {
            return false;
        }
        let command = &self.commands[self.position];
        let Some(controller) = controllers.get_mut(command.target) else {
            tracing::debug!("Redo '{}' skipped: controller is gone", command.label);
            return false;
        };
        if !controller.restore_state(&command.new_state) {
            return false;
        }
        tracing::debug!("Redo '{}'", command.label);
        self.position += 1;
        true
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.position = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.commands.len()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Label of the command `undo` would revert
    pub fn undo_text(&self) -> Option<&str> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(UndoCommand::label)
    }

    /// Label of the command `redo` would re-apply
    pub fn redo_text(&self) -> Option<&str> {
        self.commands.get(self.position).map(UndoCommand::label)
    }
}
