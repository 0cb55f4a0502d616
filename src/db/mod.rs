pub mod journal;
pub mod nightly;
pub mod pool;
pub mod store;

pub use pool::create_pool;
pub use store::Store;
