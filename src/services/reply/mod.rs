pub mod composer;
pub mod guard;

pub use composer::compose;
pub use guard::{ReplyGuard, ReplyGuardEntry};
