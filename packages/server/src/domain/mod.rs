//! ドメイン層
//!
//! ベクタークロック・変数レコード・競合解決・ルーム単位の状態ストアと、
//! ドメインが外部に要求する collaborator の trait を定義します。

pub mod conflict_resolver;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod room_registry;
pub mod room_state_store;
pub mod value_object;
pub mod vector_clock;

pub use entity::{
    DEFAULT_PRECISION_DIGITS, DEFAULT_SOURCE, Resolution, VariableRecord, VariableUpdate,
};
pub use error::{
    IdentityError, MessagePushError, RepositoryError, StoreError, ValueObjectError,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{IdentityResolver, RoomDirectory, VariableRepository};
pub use room_registry::{LiveRoom, RoomRegistry};
pub use room_state_store::RoomStateStore;
pub use value_object::{RoomId, SessionId, Symbol, Timestamp, UserId};
pub use vector_clock::{ClockOrdering, VectorClock};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::{MockIdentityResolver, MockRoomDirectory, MockVariableRepository};
