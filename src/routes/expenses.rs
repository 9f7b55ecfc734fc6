use std::collections::HashMap;

use actix_web::{get, post, web, HttpResponse};
use bson::oid::ObjectId;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::ledger;
use crate::money;
use crate::routes::{load_user_response, parse_object_id};
use crate::schemas::{
    CreateExpenseRequest, ExpenseResponse, GroupBalanceResponse, GroupResponse,
    MemberBalanceResponse, UserResponse,
};
use crate::store::LedgerStore;

#[post("/expenses")]
pub async fn create_expense(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    json: web::Json<CreateExpenseRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = json.into_inner();
    request.validate()?;
    let group_id = parse_object_id(&request.group_id, "group")?;
    let paid_by_user_id = parse_object_id(&request.paid_by_user_id, "user")?;
    let amount_cents = money::to_cents(request.amount)?;

    let expense = ledger::record_expense(
        store.get_ref(),
        group_id,
        paid_by_user_id,
        amount_cents,
        request.description,
        request.metadata,
        requester.0.id,
    )
    .await?;

    let paid_by_user = load_user_response(store.get_ref(), expense.paid_by_user_id).await?;
    Ok(HttpResponse::Created().json(ExpenseResponse::new(expense, paid_by_user)))
}

#[get("/expenses/group/{group_id}")]
pub async fn get_group_expenses(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group_id = parse_object_id(&path.into_inner(), "group")?;
    let expenses = ledger::list_group_expenses(store.get_ref(), group_id, requester.0.id).await?;

    let mut users: HashMap<ObjectId, UserResponse> = HashMap::new();
    let mut response = Vec::with_capacity(expenses.len());
    for expense in expenses {
        let payer = match users.get(&expense.paid_by_user_id) {
            Some(user) => user.clone(),
            None => {
                let user = load_user_response(store.get_ref(), expense.paid_by_user_id).await?;
                users.insert(expense.paid_by_user_id, user.clone());
                user
            }
        };
        response.push(ExpenseResponse::new(expense, payer));
    }
    Ok(HttpResponse::Ok().json(response))
}

#[get("/expenses/group/{group_id}/balance")]
pub async fn get_group_balance(
    store: web::Data<dyn LedgerStore>,
    requester: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group_id = parse_object_id(&path.into_inner(), "group")?;
    let (group, balances) =
        ledger::group_balance(store.get_ref(), group_id, requester.0.id).await?;

    let mut response = Vec::with_capacity(balances.len());
    for balance in balances {
        let user = load_user_response(store.get_ref(), balance.user_id).await?;
        response.push(MemberBalanceResponse::new(balance, user));
    }
    Ok(HttpResponse::Ok().json(GroupBalanceResponse {
        group_id: group.id.to_hex(),
        group: GroupResponse::from(group),
        balances: response,
    }))
}
