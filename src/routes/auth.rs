use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::auth::{self, AuthenticatedUser};
use crate::config::Settings;
use crate::errors::ApiError;
use crate::models::NewUser;
use crate::schemas::{LoginRequest, SignupRequest, TokenResponse, UserResponse};
use crate::store::LedgerStore;

#[post("/auth/signup")]
pub async fn signup(
    store: web::Data<dyn LedgerStore>,
    json: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    request.validate()?;

    let username_taken = store
        .find_user_by_username(&request.username)
        .await?
        .is_some();
    let email_taken = store.find_user_by_email(&request.email).await?.is_some();
    if username_taken || email_taken {
        return Err(ApiError::Conflict(
            "Username or email already registered".to_string(),
        ));
    }

    let user = store
        .insert_user(NewUser {
            email: request.email,
            username: request.username,
            hashed_password: auth::hash_password(&request.password)?,
            full_name: request.full_name,
        })
        .await?;
    tracing::info!(user_id = %user.id, "user signed up");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[post("/auth/login")]
pub async fn login(
    store: web::Data<dyn LedgerStore>,
    settings: web::Data<Settings>,
    json: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();

    let user = store.find_user_by_email(&request.email).await?;
    let user = match user {
        Some(user) if auth::verify_password(&request.password, &user.hashed_password) => user,
        _ => {
            tracing::warn!(email = %request.email, "failed login attempt");
            return Err(ApiError::Unauthorized(
                "Incorrect email or password".to_string(),
            ));
        }
    };

    let token = auth::create_access_token(user.id, settings.get_ref())?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

#[get("/auth/me")]
pub async fn me(requester: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(requester.0))
}
