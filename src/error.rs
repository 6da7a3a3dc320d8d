use std::path::PathBuf;

use thiserror::Error;

use crate::grid_config::{GridCoord, Slot};
use crate::SlotId;

/// Problems with the puzzle instance itself. These are detected while building a `GridConfig` or
/// `WordList`, before any consistency or search work starts.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("word list is empty")]
    EmptyWordList,

    #[error("structure has no open cells")]
    EmptyStructure,

    #[error("slot {0:?} has no cells")]
    EmptySlot(Slot),

    #[error("slot {0:?} extends past the edge of the grid")]
    SlotOutOfBounds(Slot),

    #[error("slot {slot:?} covers blocked cell {cell:?}")]
    SlotCoversBlockedCell { slot: Slot, cell: GridCoord },

    #[error("slot {0:?} appears more than once")]
    DuplicateSlot(Slot),

    #[error("slots {0} and {1} run in the same direction through cell {2:?}")]
    ParallelOverlap(SlotId, SlotId, GridCoord),

    #[error("no slot with id {0}")]
    UnknownSlot(SlotId),
}

/// Reasons a search stopped before it could decide whether a fill exists. Running out of options
/// is not one of them: that's reported as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FillError {
    #[error("search deadline passed")]
    Timeout,

    #[error("search aborted")]
    Aborted,
}
