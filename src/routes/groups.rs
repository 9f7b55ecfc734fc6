use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::ledger;
use crate::models::Group;
use crate::routes::{load_user_response, parse_object_id};
use crate::schemas::{
    AddMemberRequest, CreateGroupRequest, GroupResponse, GroupWithMembersResponse,
    MembershipResponse,
};
use crate::store::LedgerStore;

async fn group_with_members(
    store: &dyn LedgerStore,
    group: Group,
) -> Result<GroupWithMembersResponse, ApiError> {
    let mut members = Vec::new();
    for membership in store.list_members(group.id).await? {
        let user = load_user_response(store, membership.user_id).await?;
        members.push(MembershipResponse::new(membership, user));
    }
    Ok(GroupWithMembersResponse {
        group: GroupResponse::from(group),
        members,
    })
}

#[post("/groups")]
pub async fn create_group(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    json: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    request.validate()?;

    let group = ledger::create_group(
        store.get_ref(),
        request.name,
        request.description,
        requester.0.id,
    )
    .await?;
    Ok(HttpResponse::Created().json(GroupResponse::from(group)))
}

#[get("/groups")]
pub async fn get_my_groups(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let mut response = Vec::new();
    for group in store.list_groups_for_user(requester.0.id).await? {
        response.push(group_with_members(store.get_ref(), group).await?);
    }
    Ok(HttpResponse::Ok().json(response))
}

#[get("/groups/{group_id}")]
pub async fn get_group(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group_id = parse_object_id(&path.into_inner(), "group")?;
    let group = ledger::require_group(store.get_ref(), group_id).await?;
    ledger::ensure_member(store.get_ref(), group_id, requester.0.id).await?;
    Ok(HttpResponse::Ok().json(group_with_members(store.get_ref(), group).await?))
}

#[post("/groups/{group_id}/members")]
pub async fn add_member(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    path: web::Path<String>,
    json: web::Json<AddMemberRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    request.validate()?;
    let group_id = parse_object_id(&path.into_inner(), "group")?;

    let (membership, user) =
        ledger::add_member_by_email(store.get_ref(), group_id, requester.0.id, &request.email)
            .await?;
    Ok(HttpResponse::Created().json(MembershipResponse::new(membership, user.into())))
}
