pub mod card;
pub mod comment;
pub mod errors;

pub use card::{CardName, CardRecord, Resolution, ResolvedCard, UnresolvedReason};
pub use comment::IncomingComment;
pub use errors::{BotError, BotResult};
