pub mod error;
pub mod learned;
pub mod static_rules;

pub use learned::{LearnedCache, SlotUpdate};
pub use static_rules::StaticRuleCache;

/// Where the answer to a request came from.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ReplySource {
    /// administrator-installed rule
    Static,
    /// slot filled from an earlier server response
    Learned,
    /// backend server
    Server,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Static => "static rule",
            ReplySource::Learned => "learned slot",
            ReplySource::Server => "server",
        }
    }
}
