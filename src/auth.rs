use actix_web::http::header::AUTHORIZATION;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::errors::ApiError;
use crate::models::User;
use crate::store::LedgerStore;

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    sub: String,
    exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::Internal(format!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    PasswordHash::new(hashed_password)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Issues a signed bearer token carrying the user id, expiring after the
/// configured number of minutes.
pub fn create_access_token(user_id: ObjectId, settings: &Settings) -> Result<String, ApiError> {
    let expires_at = Utc::now() + Duration::minutes(settings.access_token_expire_minutes);
    let claims = Claims {
        sub: user_id.to_hex(),
        exp: expires_at.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret_key.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("token signing failed: {err}")))
}

pub fn decode_access_token(token: &str, settings: &Settings) -> Result<ObjectId, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret_key.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;
    ObjectId::parse_str(&data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
}

/// The requester, resolved from the bearer token on every authenticated
/// route. Extraction fails closed: a missing or stale token, an unknown
/// user, or a deactivated account all reject the request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<AuthenticatedUser, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let settings = req
                .app_data::<web::Data<Settings>>()
                .ok_or_else(|| ApiError::Internal("settings not configured".to_string()))?
                .get_ref();
            let store = req
                .app_data::<web::Data<dyn LedgerStore>>()
                .ok_or_else(|| ApiError::Internal("store not configured".to_string()))?
                .get_ref();

            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    ApiError::Unauthorized("missing authorization header".to_string())
                })?;
            let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                ApiError::Unauthorized("invalid authorization header format".to_string())
            })?;

            let user_id = decode_access_token(token, settings)?;
            let user = store
                .get_user(user_id)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("invalid or expired token".to_string()))?;
            if !user.is_active {
                return Err(ApiError::Forbidden("inactive user".to_string()));
            }
            Ok(AuthenticatedUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            mongodb_uri: String::new(),
            database_name: "splitledger-test".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            secret_key: "test-secret".to_string(),
            access_token_expire_minutes: 30,
        }
    }

    #[test]
    fn hashes_and_verifies_passwords() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn rejects_garbage_password_hashes() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn tokens_round_trip_the_user_id() {
        let settings = settings();
        let user_id = ObjectId::new();
        let token = create_access_token(user_id, &settings).unwrap();
        assert_eq!(decode_access_token(&token, &settings).unwrap(), user_id);
    }

    #[test]
    fn rejects_tokens_signed_with_another_key() {
        let settings = settings();
        let mut other = settings.clone();
        other.secret_key = "other-secret".to_string();

        let token = create_access_token(ObjectId::new(), &other).unwrap();
        assert!(decode_access_token(&token, &settings).is_err());
    }

    #[test]
    fn rejects_expired_tokens() {
        let mut settings = settings();
        settings.access_token_expire_minutes = -5;

        let token = create_access_token(ObjectId::new(), &settings).unwrap();
        assert!(decode_access_token(&token, &settings).is_err());
    }
}
