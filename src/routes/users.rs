use actix_web::{get, put, web, HttpResponse};
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::routes::parse_object_id;
use crate::schemas::{UpdateProfileRequest, UserResponse};
use crate::store::LedgerStore;

#[get("/users/me")]
pub async fn get_my_profile(requester: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(requester.0))
}

#[put("/users/me")]
pub async fn update_my_profile(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    json: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    request.validate()?;
    let current = requester.0;

    if request.username != current.username
        && store
            .find_user_by_username(&request.username)
            .await?
            .is_some()
    {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }
    if request.email != current.email && store.find_user_by_email(&request.email).await?.is_some()
    {
        return Err(ApiError::Conflict("Email already taken".to_string()));
    }

    let updated = store
        .update_user_profile(current.id, request.email, request.username, request.full_name)
        .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

#[get("/users/{user_id}")]
pub async fn get_user(
    store: web::Data<dyn LedgerStore>,
    _requester: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_object_id(&path.into_inner(), "user")?;
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
