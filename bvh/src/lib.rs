pub mod bvh;
pub mod error;

pub use common::aabb;
pub use error::{BvhError, BvhResult};
