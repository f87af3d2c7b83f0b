//! Admin accounts and bearer-token sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::AdminSession;

/// The authenticated admin for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    admin_id: i64,
    username: String,
}

impl AdminContext {
    pub fn new(admin_id: i64, username: impl Into<String>) -> Self {
        Self {
            admin_id,
            username: username.into(),
        }
    }

    pub fn admin_id(&self) -> i64 {
        self.admin_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Create `username` unless it already exists. Returns whether it was created.
///
/// The first admin also seeds the default labor rate when none is set.
pub async fn ensure_admin(
    db: &Database,
    username: &str,
    password: &str,
    cost: u32,
    default_labor_rate: f64,
) -> Result<bool> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(Error::validation("admin username and password are required"));
    }
    if db.find_admin_by_username(username).await?.is_some() {
        return Ok(false);
    }

    let hash = hash_password(password, cost)?;
    let id = db.create_admin(username, &hash, default_labor_rate).await?;
    tracing::info!(admin_id = id, username, "admin account created");

    Ok(true)
}

/// Check credentials and open a new session.
pub async fn login(
    db: &Database,
    credentials: &Credentials,
    ttl: chrono::Duration,
) -> Result<SessionToken> {
    let Some(admin) = db.find_admin_by_username(&credentials.username).await? else {
        tracing::warn!(username = %credentials.username, "login for unknown admin");
        return Err(Error::Unauthorized);
    };

    if !bcrypt::verify(&credentials.password, &admin.password_hash)? {
        tracing::warn!(username = %credentials.username, "login with wrong password");
        return Err(Error::Unauthorized);
    }

    let now = Utc::now();
    let session = AdminSession {
        token: Uuid::new_v4().simple().to_string(),
        admin_id: admin.id,
        created_at: now,
        expires_at: now + ttl,
    };
    db.create_session(&session).await?;

    let purged = db.delete_expired_sessions(now).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    tracing::info!(admin_id = admin.id, "admin logged in");

    Ok(SessionToken {
        token: session.token,
        expires_at: session.expires_at,
    })
}

pub async fn logout(db: &Database, token: &str) -> Result<()> {
    db.delete_session(token).await?;
    Ok(())
}

/// Resolve a bearer token to the admin it belongs to.
pub async fn resolve_session(
    db: &Database,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<AdminContext>> {
    let Some(session) = db.get_session(token).await? else {
        return Ok(None);
    };
    if session.is_expired(now) {
        db.delete_session(token).await?;
        return Ok(None);
    }

    let admin = db.get_admin(session.admin_id).await?;
    Ok(admin.map(|a| AdminContext::new(a.id, a.username)))
}
