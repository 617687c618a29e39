// Core algorithm exports
pub mod discover;

pub use discover::{DiscoverFeed, FeedResult};
