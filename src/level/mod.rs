//! Level layouts
//!
//! - `cell`: single-character cell codes (blocks and prize capsules)
//! - `descriptor`: rectangular grids and the board snapshot encoding
//! - `catalog`: the fixed, indexed table of built-in levels

pub mod catalog;
pub mod cell;
pub mod descriptor;

pub use catalog::{TOTAL_LEVELS, clamp_index, decode, next_level};
pub use cell::{BlockKind, Cell};
pub use descriptor::LevelDescriptor;
