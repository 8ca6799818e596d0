//! Token Service
//!
//! The only component that produces or consumes bearer material. Tokens are
//! HMAC-SHA256 signed JWTs with a key id in the header, so the signing key
//! can rotate without a claim schema change.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::domain::claims::{
    Claims, TokenKind, TOKEN_AUDIENCE, TOKEN_ISSUER, TOKEN_LEEWAY_SECS, TOKEN_SCHEMA_VERSION,
};
use crate::shared::error::AppError;

/// Signs and validates bearer tokens. The signing key is immutable after
/// startup; rotation happens by swapping the key id.
pub struct TokenService {
    secret: String,
    key_id: String,
    realm_id: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(settings: &AuthSettings, realm_id: &str) -> Self {
        Self {
            secret: settings.secret.clone(),
            key_id: settings.key_id.clone(),
            realm_id: realm_id.to_string(),
            access_ttl: Duration::minutes(settings.access_token_expiry_minutes),
            refresh_ttl: Duration::days(settings.refresh_token_expiry_days),
        }
    }

    /// Access token lifetime in seconds, for response envelopes.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a token of the given kind for the subject.
    ///
    /// `orig_iat` and `chain` only apply to refresh tokens: the first carries
    /// the session's original issuance across rotations, the second links to
    /// the previous token id for auditability.
    pub fn sign(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        session_id: &str,
        orig_iat: Option<i64>,
        chain: Option<String>,
    ) -> Result<String, AppError> {
        self.sign_at(kind, user_id, session_id, Utc::now(), orig_iat, chain)
    }

    fn sign_at(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        session_id: &str,
        now: DateTime<Utc>,
        orig_iat: Option<i64>,
        chain: Option<String>,
    ) -> Result<String, AppError> {
        let iat = now.timestamp();
        let ttl = match kind {
            TokenKind::Refresh => self.refresh_ttl,
            TokenKind::Access | TokenKind::Service => self.access_ttl,
        };

        let mut claims = Claims {
            sub: user_id.to_string(),
            uid: user_id.to_string(),
            rid: self.realm_id.clone(),
            typ: kind.as_str().to_string(),
            sid: session_id.to_string(),
            scp: vec!["user".to_string()],
            ver: TOKEN_SCHEMA_VERSION,
            amr: None,
            azp: None,
            orig_iat: None,
            rat: None,
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.iter().map(|a| a.to_string()).collect(),
            iat,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        };

        match kind {
            TokenKind::Access => {
                claims.amr = Some(vec!["pwd".to_string()]);
                claims.azp = Some("desktop".to_string());
            }
            TokenKind::Refresh => {
                claims.orig_iat = Some(orig_iat.unwrap_or(iat));
                claims.rat = chain;
            }
            TokenKind::Service => {}
        }

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.key_id.clone());

        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validate a token of any kind and return its claims.
    ///
    /// Rejects unknown algorithms, unknown key ids, wrong issuer/audience,
    /// wrong schema version, and unrecognized kinds. Clock skew up to the
    /// configured leeway is tolerated.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let header = decode_header(token)
            .map_err(|_| AppError::TokenInvalid("malformed token header".into()))?;

        if header.alg != Algorithm::HS256 {
            return Err(AppError::TokenInvalid("unexpected signing algorithm".into()));
        }
        if header.kid.as_deref() != Some(self.key_id.as_str()) {
            return Err(AppError::TokenInvalid("unknown signing key id".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = TOKEN_LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(TOKEN_AUDIENCE);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid("failed to parse token".into()),
        })?;

        let claims = data.claims;

        if claims.ver != TOKEN_SCHEMA_VERSION {
            return Err(AppError::TokenInvalid("unsupported token schema version".into()));
        }
        if claims.kind().is_none() {
            return Err(AppError::TokenInvalid("unrecognized token kind".into()));
        }

        Ok(claims)
    }

    /// Validate and require an access token.
    pub fn validate_access(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.validate(token)?;
        if claims.kind() != Some(TokenKind::Access) {
            return Err(AppError::TokenInvalid("not an access token".into()));
        }
        Ok(claims)
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The session id and the original issuance survive the rotation; the new
    /// refresh token chains to the old one via its token id. Stateless: the
    /// old token is not invalidated here.
    pub fn refresh_pair(&self, refresh: &str) -> Result<(String, String), AppError> {
        let old = self.validate(refresh)?;
        if old.kind() != Some(TokenKind::Refresh) {
            return Err(AppError::TokenInvalid("not a refresh token".into()));
        }

        let user_id = old.user_id()?;
        let orig_iat = old.orig_iat.unwrap_or(old.iat);

        let access = self.sign(TokenKind::Access, user_id, &old.sid, None, None)?;
        let refresh = self.sign(
            TokenKind::Refresh,
            user_id,
            &old.sid,
            Some(orig_iat),
            Some(old.jti.clone()),
        )?;

        Ok((access, refresh))
    }
}
