pub mod config;
pub mod index;
pub mod matching;
pub mod pipeline;
pub mod ratings;
pub mod reply;
pub mod resolver;
pub mod sources;
