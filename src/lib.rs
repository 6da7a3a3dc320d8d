//! Crossword filling as a constraint satisfaction problem.
//!
//! A `GridConfig` describes the slots of a grid and where they cross, a `WordList` supplies the
//! candidate words, and `find_fill` (or a `Solver`, for finer control) looks for an assignment of
//! one distinct word per slot in which every crossing agrees on its letter.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid_config;
pub mod render;
pub mod word_list;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slots`.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the `WordList`.
pub type WordId = usize;

pub use backtracking_search::{
    find_fill, Assignment, FillOptions, FillOutcome, Inference, Solver, Statistics,
};
pub use domains::DomainStore;
pub use error::{Error, FillError};
pub use grid_config::{Direction, GridConfig, Overlap, Slot, Structure};
pub use render::{letter_grid, render_grid};
pub use word_list::{Word, WordList};
