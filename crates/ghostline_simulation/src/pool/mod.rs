//! Pool domain — переиспользуемые экземпляры с bounded growth
//!
//! - `arena` — generational handles (stale handle не резолвится после reuse)
//! - `object_pool` — buckets по классу, acquire/release/prewarm/stats

pub mod arena;
pub mod object_pool;


pub use arena::{Arena, PoolHandle};
pub use object_pool::{
    ObjectPool, PoolActivity, PoolBucketConfig, PoolClass, PoolFactory, PoolId, PoolStats, Poolable,
};
