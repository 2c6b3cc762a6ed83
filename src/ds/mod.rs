pub mod linked_index;

pub use linked_index::{LinkedIndex, SlotId};
