use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    #[error("learned cache needs at least one slot")]
    ZeroCapacity,
}

pub type Result<T> = std::result::Result<T, CacheError>;
