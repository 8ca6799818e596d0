//! Data Transfer Objects
//!
//! Request and response shapes of the wire protocol, and the compact DTOs
//! stored in the cache tier.

mod cache;
mod request;
mod response;

pub use cache::UserCacheDto;
pub use request::{
    CreateChannelRequest, CreateGuildRequest, CreateInviteRequest, HistoryQuery, LoginRequest,
    RefreshTokenRequest, RegisterRequest, SearchQuery, SendMessageRequest, UpdateProfileRequest,
};
pub use response::{
    ChannelResponse, GuildResponse, HistoryResponse, InviteResponse, MemberResponse,
    MessageResponse, RegisterResponse, UserResponse,
};
