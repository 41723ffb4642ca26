pub mod db;
pub mod jwt;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod pusher;

pub use db::DbAdapter;
pub use jwt::JwtTokenAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryDatabase, RecordingRelay};
pub use pusher::PusherAdapter;
