use actix_web::{get, web, HttpResponse};
use bson::oid::ObjectId;
use serde_json::json;

use crate::errors::ApiError;
use crate::schemas::UserResponse;
use crate::store::LedgerStore;

pub mod auth;
pub mod expenses;
pub mod groups;
pub mod users;

/// Registers everything served under the /api/v1 scope.
pub fn api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::signup)
        .service(auth::login)
        .service(auth::me)
        .service(users::get_my_profile)
        .service(users::update_my_profile)
        .service(users::get_user)
        .service(groups::create_group)
        .service(groups::get_my_groups)
        .service(groups::get_group)
        .service(groups::add_member)
        .service(expenses::create_expense)
        .service(expenses::get_group_expenses)
        .service(expenses::get_group_balance);
}

/// Unprefixed liveness and banner endpoints.
pub fn system(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(root);
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "splitledger",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::InvalidArgument(format!("invalid {what} id")))
}

/// Users referenced by stored rows are expected to exist; a miss here is
/// an integrity problem, not a client error.
pub(crate) async fn load_user_response(
    store: &dyn LedgerStore,
    user_id: ObjectId,
) -> Result<UserResponse, ApiError> {
    store
        .get_user(user_id)
        .await?
        .map(UserResponse::from)
        .ok_or_else(|| ApiError::Internal(format!("user {user_id} referenced but not stored")))
}
