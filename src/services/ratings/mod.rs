pub mod ratings_cache;

pub use ratings_cache::{RatingsCache, RatingsSettings, RatingsTable};
