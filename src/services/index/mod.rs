pub mod expansion_index;

pub use expansion_index::{ExpansionIndex, IndexMatch, IndexSnapshot, RefreshSummary};
