//! # Domain Entities
//!
//! Core entities and their repository traits. Each entity file carries the
//! struct mapped to its table plus the data-access contract implemented by
//! the Postgres adapters in the infrastructure layer.

mod channel;
mod guild;
mod invite;
mod member;
mod message;
mod user;

pub use channel::{Channel, ChannelKind, ChannelRepository};
pub use guild::{Guild, GuildRepository};
pub use invite::{GuildInvite, InviteRepository, INVITE_CODE_LEN};
pub use member::{GuildMember, MemberRepository};
pub use message::{Message, MessageRepository};
pub use user::{User, UserPatch, UserRepository};
