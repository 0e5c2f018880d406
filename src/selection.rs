//! Location selection for the start and end ports.
//!
//! Map clicks and search hits are both *candidates*: they preview into the
//! active slot and only become durable when the user confirms. Cancelling
//! restores whatever the slot held before the pick began.

use serde::{Deserialize, Serialize};

use crate::event::Coordinate;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    #[default]
    Idle,
    SelectingStart,
    SelectingEnd,
}

impl SelectionMode {
    #[must_use]
    pub const fn is_selecting(self) -> bool {
        !matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn slot(self) -> Option<PortSlot> {
        match self {
            Self::Idle => None,
            Self::SelectingStart => Some(PortSlot::Start),
            Self::SelectingEnd => Some(PortSlot::End),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PortSlot {
    Start,
    End,
}

impl PortSlot {
    #[must_use]
    pub const fn mode(self) -> SelectionMode {
        match self {
            Self::Start => SelectionMode::SelectingStart,
            Self::End => SelectionMode::SelectingEnd,
        }
    }
}

/// The selection state machine. Owns the committed port values and, while a
/// pick is active, the rollback value for the slot being edited.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SelectionController {
    mode: SelectionMode,
    start_port: Option<Coordinate>,
    end_port: Option<Coordinate>,
    // Present exactly while a pick is active; the slot value to restore on
    // cancel. The inner Option is the pre-pick value, which may be empty.
    rollback: Option<Option<Coordinate>>,
    zoom_target: Option<Coordinate>,
}

impl SelectionController {
    /// Enter selection for `slot`. Switching slots mid-pick abandons the
    /// previous preview first, restoring that slot.
    pub fn begin(&mut self, slot: PortSlot) {
        if self.mode.is_selecting() {
            self.cancel();
        }
        self.rollback = Some(*self.slot_value(slot));
        self.mode = slot.mode();
    }

    /// Preview a candidate location into the active slot. Returns `false`
    /// when no pick is active; the candidate is discarded and nothing
    /// changes.
    pub fn candidate(&mut self, location: Coordinate) -> bool {
        let Some(slot) = self.mode.slot() else {
            return false;
        };
        *self.slot_value_mut(slot) = Some(location);
        self.zoom_target = Some(location);
        true
    }

    /// Commit the previewed value and leave selection. Returns the committed
    /// slot and coordinate, or `None` when no candidate was previewed.
    pub fn confirm(&mut self) -> Option<(PortSlot, Coordinate)> {
        let slot = self.mode.slot()?;
        let committed = *self.slot_value(slot);
        self.mode = SelectionMode::Idle;
        self.rollback = None;
        self.zoom_target = None;
        committed.map(|location| (slot, location))
    }

    /// Abandon the pick, restoring the slot to its pre-pick value.
    pub fn cancel(&mut self) {
        if let (Some(slot), Some(previous)) = (self.mode.slot(), self.rollback.take()) {
            *self.slot_value_mut(slot) = previous;
        }
        self.mode = SelectionMode::Idle;
        self.rollback = None;
        self.zoom_target = None;
    }

    /// Overwrite the committed ports, e.g. when rehydrating from a saved
    /// session. Drops any active pick.
    pub fn restore_ports(&mut self, start: Option<Coordinate>, end: Option<Coordinate>) {
        self.mode = SelectionMode::Idle;
        self.rollback = None;
        self.zoom_target = None;
        self.start_port = start;
        self.end_port = end;
    }

    #[must_use]
    pub const fn mode(&self) -> SelectionMode {
        self.mode
    }

    #[must_use]
    pub const fn start_port(&self) -> Option<Coordinate> {
        self.start_port
    }

    #[must_use]
    pub const fn end_port(&self) -> Option<Coordinate> {
        self.end_port
    }

    #[must_use]
    pub const fn zoom_target(&self) -> Option<Coordinate> {
        self.zoom_target
    }

    const fn slot_value(&self, slot: PortSlot) -> &Option<Coordinate> {
        match slot {
            PortSlot::Start => &self.start_port,
            PortSlot::End => &self.end_port,
        }
    }

    fn slot_value_mut(&mut self, slot: PortSlot) -> &mut Option<Coordinate> {
        match slot {
            PortSlot::Start => &mut self.start_port,
            PortSlot::End => &mut self.end_port,
        }
    }
}
