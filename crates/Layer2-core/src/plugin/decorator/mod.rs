//! Discovery Decorators
//!
//! 각 데코레이터는 내부 디스커버리를 소유하고 `Discovery`를 다시 구현하므로
//! 생성 시점에 원하는 순서로 감쌀 수 있습니다.
//!
//! ```text
//! ProcessDiscovery::new(
//!     StaticMergeDiscovery::new(
//!         DerivativeDiscovery::new(
//!             CachedDiscovery::new(raw, backend, key),
//!             derivers),
//!         register),
//!     process)
//! ```

mod cached;
mod derivative;
mod process;
mod static_merge;

pub use cached::{CachedDiscovery, DiscoveryState};
pub use derivative::DerivativeDiscovery;
pub use process::{ProcessDiscovery, ProcessFn};
pub use static_merge::{RegisterFn, StaticMergeDiscovery};
