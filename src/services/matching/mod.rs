pub mod similarity;

pub use similarity::{best_match, similarity};
