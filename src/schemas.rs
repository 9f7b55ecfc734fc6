use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::balance::MemberBalance;
use crate::models::{Expense, Group, Membership, User};
use crate::money;

// Requests

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    pub group_id: String,
    pub paid_by_user_id: String,
    #[validate(range(min = 0.01, message = "must be positive"))]
    pub amount: f64,
    pub description: Option<String>,
    pub metadata: Option<String>,
}

// Responses

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> TokenResponse {
        TokenResponse {
            access_token,
            token_type: "bearer",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> UserResponse {
        UserResponse {
            id: user.id.to_hex(),
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            created_at: user.created_at,
            is_active: user.is_active,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> GroupResponse {
        GroupResponse {
            id: group.id.to_hex(),
            name: group.name,
            description: group.description,
            created_by_user_id: group.created_by_user_id.to_hex(),
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl MembershipResponse {
    pub fn new(membership: Membership, user: UserResponse) -> MembershipResponse {
        MembershipResponse {
            id: membership.id.to_hex(),
            group_id: membership.group_id.to_hex(),
            user_id: membership.user_id.to_hex(),
            joined_at: membership.joined_at,
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupWithMembersResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members: Vec<MembershipResponse>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub id: String,
    pub group_id: String,
    pub paid_by_user_id: String,
    pub amount: f64,
    pub description: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_by_user: UserResponse,
}

impl ExpenseResponse {
    pub fn new(expense: Expense, paid_by_user: UserResponse) -> ExpenseResponse {
        ExpenseResponse {
            id: expense.id.to_hex(),
            group_id: expense.group_id.to_hex(),
            paid_by_user_id: expense.paid_by_user_id.to_hex(),
            amount: money::to_major_units(expense.amount_cents),
            description: expense.description,
            metadata: expense.metadata,
            created_at: expense.created_at,
            paid_by_user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberBalanceResponse {
    pub user_id: String,
    pub user: UserResponse,
    pub total_paid: f64,
    pub total_owed: f64,
    pub net_balance: f64,
}

impl MemberBalanceResponse {
    pub fn new(balance: MemberBalance, user: UserResponse) -> MemberBalanceResponse {
        MemberBalanceResponse {
            user_id: balance.user_id.to_hex(),
            user,
            total_paid: money::to_major_units(balance.total_paid),
            total_owed: money::to_major_units(balance.total_owed),
            net_balance: money::to_major_units(balance.net_balance),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupBalanceResponse {
    pub group_id: String,
    pub group: GroupResponse,
    pub balances: Vec<MemberBalanceResponse>,
}
