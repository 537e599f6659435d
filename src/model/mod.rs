//! Domain types: targets, log families, parsed events and checkpoints

pub mod checkpoint;
pub mod events;
pub mod types;

pub use checkpoint::Checkpoint;
pub use events::{
    Actor, AdminCommand, ChatMessage, DomainEvent, KillEvent, KillSource, LoginState,
    LoginTransition, Position, SentryDestroyed,
};
pub use types::{LogType, RemoteTarget, TransportKind};
