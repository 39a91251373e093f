use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use crate::error::{EditError, Result};
use crate::session::ActorId;

/// Which corner of a selection is being set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSlot {
    First,
    Second,
}

impl TryFrom<u8> for SelectionSlot {
    type Error = EditError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(SelectionSlot::First),
            2 => Ok(SelectionSlot::Second),
            other => Err(EditError::invalid(format!("selection slot {} (expected 1 or 2)", other))),
        }
    }
}

/// The two corner points an actor has marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    owner: ActorId,
    first: Option<BlockPosition>,
    second: Option<BlockPosition>,
}

impl Selection {
    pub fn new(owner: ActorId) -> Self {
        Self {
            owner,
            first: None,
            second: None,
        }
    }

    pub fn owner(&self) -> ActorId {
        self.owner
    }

    /// Stores `pos` in `slot`, replacing whatever was there. World limits are
    /// not checked here.
    pub fn set_position(&mut self, slot: SelectionSlot, pos: BlockPosition) {
        match slot {
            SelectionSlot::First => self.first = Some(pos),
            SelectionSlot::Second => self.second = Some(pos),
        }
    }

    pub fn get_position(&self, slot: SelectionSlot) -> Option<BlockPosition> {
        match slot {
            SelectionSlot::First => self.first,
            SelectionSlot::Second => self.second,
        }
    }

    pub fn get_position_count(&self) -> usize {
        self.first.is_some() as usize + self.second.is_some() as usize
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        match (self.first, self.second) {
            (Some(a), Some(b)) => Ok(BoundingBox::new(a, b)),
            _ => Err(EditError::IncompleteSelection),
        }
    }
}
