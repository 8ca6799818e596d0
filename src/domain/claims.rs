//! Bearer credential claim schema.
//!
//! The claim set is versioned (`ver`) so the layout can evolve without
//! breaking validation of older deployments, and carries a key id in the
//! token header so signing keys can rotate without a schema change.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Claim schema version embedded in every token.
pub const TOKEN_SCHEMA_VERSION: u32 = 1;

/// Issuer stamped into and required from every token.
pub const TOKEN_ISSUER: &str = "roost-auth";

/// Accepted audiences.
pub const TOKEN_AUDIENCE: &[&str] = &["roost-core"];

/// Accepted clock skew when validating `exp` / `nbf`, in seconds.
pub const TOKEN_LEEWAY_SECS: u64 = 5 * 60;

/// The kind of credential a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
    Service,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::Service => "service",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(TokenKind::Access),
            "refresh" => Some(TokenKind::Refresh),
            "service" => Some(TokenKind::Service),
            _ => None,
        }
    }
}

/// Bearer token claim set.
///
/// `sub` duplicates `uid`; both carry the user id. Refresh tokens chain to
/// their predecessor through `rat` (previous token id) and preserve
/// `orig_iat` (when the session first authenticated) across rotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// User id (duplicate of subject)
    pub uid: String,
    /// Realm that issued the token
    pub rid: String,
    /// Token kind: "access" | "refresh" | "service"
    pub typ: String,
    /// Session id shared by the access/refresh pair
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sid: String,
    /// Scopes granted to the bearer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scp: Vec<String>,
    /// Claim schema version
    pub ver: u32,

    /// Authentication methods (access tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,
    /// Authorized party (access tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// First issuance of the session (refresh tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_iat: Option<i64>,
    /// Previous token id in the rotation chain (refresh tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rat: Option<String>,

    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Token kind, if recognized.
    pub fn kind(&self) -> Option<TokenKind> {
        TokenKind::parse(&self.typ)
    }

    /// Subject parsed as a user id.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::TokenInvalid("subject is not a valid user id".into()))
    }
}
