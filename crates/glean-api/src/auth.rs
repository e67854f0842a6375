//! Identity resolution: HTTP Basic credentials checked against a directory
//! of configured accounts.
//!
//! The [`Directory`] doubles as the billing collaborator, since each account
//! declares its plan.

use std::convert::Infallible;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use glean_core::{
  account::{AccountPlan, Plan, UserId},
  collab::Billing,
  store::GleanStore,
};
use rand_core::OsRng;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One login, as declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
  pub user_id:       UserId,
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub plan:          Plan,
}

/// Every account this instance accepts.
#[derive(Debug, Clone, Default)]
pub struct Directory {
  accounts: Vec<Account>,
}

impl Directory {
  pub fn new(accounts: Vec<Account>) -> Self { Self { accounts } }

  /// Resolve the `Authorization` header to a user id.
  pub fn authenticate(&self, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let header_val = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    let account = self
      .accounts
      .iter()
      .find(|a| a.username == username)
      .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(account.user_id.clone())
  }

  pub fn plan_of(&self, user: &UserId) -> Plan {
    self
      .accounts
      .iter()
      .find(|a| &a.user_id == user)
      .map(|a| a.plan)
      .unwrap_or_default()
  }
}

impl Billing for Directory {
  type Error = Infallible;

  async fn plan(&self, user: &UserId) -> Result<Plan, Infallible> { Ok(self.plan_of(user)) }

  async fn accounts(&self) -> Result<Vec<AccountPlan>, Infallible> {
    Ok(
      self
        .accounts
        .iter()
        .map(|a| AccountPlan { user_id: a.user_id.clone(), plan: a.plan })
        .collect(),
    )
  }
}

/// Hash `password` into an argon2 PHC string suitable for [`Account`].
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// The authenticated caller. Extracting it rejects the request with 401 when
/// credentials are missing or wrong.
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: GleanStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.directory.authenticate(&parts.headers).map(CurrentUser)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn directory() -> Directory {
    Directory::new(vec![
      Account {
        user_id:       UserId::from("u-alice"),
        username:      "alice".into(),
        password_hash: hash_password("secret").unwrap(),
        plan:          Plan::Free,
      },
      Account {
        user_id:       UserId::from("u-bob"),
        username:      "bob".into(),
        password_hash: hash_password("hunter2").unwrap(),
        plan:          Plan::Pro,
      },
    ])
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode(format!("{user}:{pass}")));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    headers
  }

  #[test]
  fn correct_credentials_resolve_user_id() {
    let d = directory();
    assert_eq!(d.authenticate(&basic("bob", "hunter2")).unwrap(), UserId::from("u-bob"));
  }

  #[test]
  fn wrong_password_or_user_is_rejected() {
    let d = directory();
    assert!(matches!(d.authenticate(&basic("alice", "nope")), Err(ApiError::Unauthorized)));
    assert!(matches!(d.authenticate(&basic("carol", "secret")), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn malformed_header_is_rejected() {
    let d = directory();
    assert!(matches!(d.authenticate(&HeaderMap::new()), Err(ApiError::Unauthorized)));

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    assert!(matches!(d.authenticate(&headers), Err(ApiError::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_users_bill_as_free() {
    let d = directory();
    assert_eq!(d.plan(&UserId::from("u-bob")).await.unwrap(), Plan::Pro);
    assert_eq!(d.plan(&UserId::from("stranger")).await.unwrap(), Plan::Free);
    assert_eq!(d.accounts().await.unwrap().len(), 2);
  }
}
