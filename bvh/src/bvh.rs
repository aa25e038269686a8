mod config;
mod insert;
mod optimize;
mod query;
mod remove;
mod storage;
mod types;
mod validate;

pub use config::Config;
pub use storage::Bvh;
#[cfg(feature = "query_stats")]
pub use types::QueryStats;
pub use types::{Node, INVALID_INDEX};

pub(crate) use types::{validate_aabb, NodeStack};
