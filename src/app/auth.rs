use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use sha2::{Digest, Sha256};
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::domain::user::User;
use crate::infra::db::Db;

const TOKEN_ISSUER: &str = "vidtube";

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: OffsetDateTime,
    pub refresh_expires_at: OffsetDateTime,
}

/// The two token flavours. Each has its own key and `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn typ(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// Claims every token carries: the user and the session (the
/// `refresh_tokens` row) it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionClaims {
    user_id: Uuid,
    session_id: Uuid,
}

/// Sessions are rows in `refresh_tokens`. An access token is only honoured
/// while the session it was issued with is live, so logout and rotation
/// end it immediately.
#[derive(Clone)]
pub struct AuthService {
    db: Db,
    access_key: [u8; 32],
    refresh_key: [u8; 32],
    access_ttl_minutes: u64,
    refresh_ttl_days: u64,
}

impl AuthService {
    pub fn new(
        db: Db,
        access_key: [u8; 32],
        refresh_key: [u8; 32],
        access_ttl_minutes: u64,
        refresh_ttl_days: u64,
    ) -> Self {
        Self {
            db,
            access_key,
            refresh_key,
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    /// `identifier` may be either the email or the username.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Option<(User, TokenPair)>> {
        let row = sqlx::query(
            "SELECT id, username, email, full_name, avatar_url, created_at, password_hash \
             FROM users WHERE email = $1 OR username = $1",
        )
        .bind(identifier)
        .fetch_optional(self.db.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash: String = row.get("password_hash");
        if password_hash.is_empty() || !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let user = user_from_row(&row);
        let tokens = self.issue_token_pair(user.id).await?;
        Ok(Some((user, tokens)))
    }

    /// Exchanges a live refresh token for a new pair. The old session is
    /// revoked and linked to its successor in the same transaction.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<TokenPair>> {
        let Some(session) = self.open(refresh_token, TokenKind::Refresh)? else {
            return Ok(None);
        };
        let next_session_id = Uuid::new_v4();

        let mut tx = self.db.pool().begin().await?;
        let revoked = sqlx::query(
            "UPDATE refresh_tokens \
             SET revoked_at = now(), replaced_by = $4 \
             WHERE id = $1 \
               AND user_id = $2 \
               AND token_hash = $3 \
               AND revoked_at IS NULL \
               AND expires_at > now()",
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(hash_token(refresh_token))
        .bind(next_session_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let tokens = self
            .start_session(session.user_id, next_session_id, &mut tx)
            .await?;
        tx.commit().await?;
        Ok(Some(tokens))
    }

    /// Ends every live session of the user. Returns how many were ended.
    pub async fn logout(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = now() \
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Resolves an access token to its user. `None` when the token does not
    /// verify, its session was revoked or expired, or the user is gone.
    pub async fn resolve_session(&self, access_token: &str) -> Result<Option<User>> {
        let Some(session) = self.open(access_token, TokenKind::Access)? else {
            return Ok(None);
        };

        let row = sqlx::query(
            "SELECT u.id, u.username, u.email, u.full_name, u.avatar_url, u.created_at \
             FROM users u \
             JOIN refresh_tokens s ON s.user_id = u.id \
             WHERE u.id = $1 \
               AND s.id = $2 \
               AND s.revoked_at IS NULL \
               AND s.expires_at > now()",
        )
        .bind(session.user_id)
        .bind(session.session_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Opens a new session for the user.
    pub async fn issue_token_pair(&self, user_id: Uuid) -> Result<TokenPair> {
        let mut tx = self.db.pool().begin().await?;
        let tokens = self
            .start_session(user_id, Uuid::new_v4(), &mut tx)
            .await?;
        tx.commit().await?;
        Ok(tokens)
    }

    async fn start_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<TokenPair> {
        let session = SessionClaims {
            user_id,
            session_id,
        };
        let now = OffsetDateTime::now_utc();
        let access_expires_at = now + Duration::minutes(self.access_ttl_minutes as i64);
        let refresh_expires_at = now + Duration::days(self.refresh_ttl_days as i64);

        let access_token = self.seal(
            TokenKind::Access,
            session,
            self.access_ttl_minutes * 60,
        )?;
        let refresh_token = self.seal(
            TokenKind::Refresh,
            session,
            self.refresh_ttl_days * 24 * 60 * 60,
        )?;

        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(hash_token(&refresh_token))
        .bind(refresh_expires_at)
        .execute(&mut **tx)
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn key(&self, kind: TokenKind) -> Result<SymmetricKey<V4>> {
        let bytes = match kind {
            TokenKind::Access => &self.access_key,
            TokenKind::Refresh => &self.refresh_key,
        };
        Ok(SymmetricKey::<V4>::from(bytes)?)
    }

    fn seal(&self, kind: TokenKind, session: SessionClaims, ttl_seconds: u64) -> Result<String> {
        let mut claims = Claims::new_expires_in(&std::time::Duration::from_secs(ttl_seconds))?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&session.user_id.to_string())?;
        claims.token_identifier(&session.session_id.to_string())?;
        claims.add_additional("typ", kind.typ())?;

        Ok(local::encrypt(&self.key(kind)?, &claims, None, None)?)
    }

    /// Decrypts and validates a token of the given kind. Tokens that fail to
    /// parse, decrypt or validate are `None`, not errors.
    fn open(&self, token: &str, kind: TokenKind) -> Result<Option<SessionClaims>> {
        let key = self.key(kind)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let Ok(untrusted) = UntrustedToken::<Local, V4>::try_from(token) else {
            return Ok(None);
        };
        let Ok(trusted) = local::decrypt(&key, &untrusted, &rules, None, None) else {
            return Ok(None);
        };
        let Some(claims) = trusted.payload_claims() else {
            return Ok(None);
        };

        if claim_str(claims, "typ") != Some(kind.typ()) {
            return Ok(None);
        }
        let user_id = claim_uuid(claims, "sub")?;
        let session_id = claim_uuid(claims, "jti")?;
        Ok(Some(SessionClaims {
            user_id,
            session_id,
        }))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
    }
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn claim_str<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get_claim(name).and_then(|value| value.as_str())
}

fn claim_uuid(claims: &Claims, name: &str) -> Result<Uuid> {
    let value = claim_str(claims, name).ok_or_else(|| anyhow!("missing {} claim", name))?;
    Ok(Uuid::parse_str(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_token("v4.local.abc");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_token("v4.local.abc"));
        assert_ne!(hash, hash_token("v4.local.abd"));
    }

    #[test]
    fn token_kinds_have_distinct_types() {
        assert_eq!(TokenKind::Access.typ(), "access");
        assert_eq!(TokenKind::Refresh.typ(), "refresh");
    }
}
