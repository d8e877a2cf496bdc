//! collaborator の実装
//!
//! - `inmemory`: HashMap をインメモリ DB として使う実装

pub mod inmemory;

pub use inmemory::{InMemoryIdentityResolver, InMemoryRoomDirectory, InMemoryVariableRepository};
