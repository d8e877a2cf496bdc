//! InMemory collaborator 実装

pub mod identity;
pub mod room;
pub mod variable;

pub use identity::InMemoryIdentityResolver;
pub use room::InMemoryRoomDirectory;
pub use variable::InMemoryVariableRepository;
