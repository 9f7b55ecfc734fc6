use async_trait::async_trait;
use bson::oid::ObjectId;

use crate::errors::ApiError;
use crate::models::{
    Expense, Group, Membership, NewExpense, NewGroup, NewMembership, NewUser, User,
};

mod memory;
mod mongo;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

/// The persistence boundary for users, groups, memberships and the
/// append-only expense ledger. The store assigns ids and creation
/// timestamps on insert. Backed by MongoDB in production and by an
/// in-memory implementation in tests.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, ApiError>;
    async fn get_user(&self, user_id: ObjectId) -> Result<Option<User>, ApiError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    /// Rewrites the mutable profile fields of an existing user.
    async fn update_user_profile(
        &self,
        user_id: ObjectId,
        email: String,
        username: String,
        full_name: Option<String>,
    ) -> Result<User, ApiError>;

    async fn insert_group(&self, new_group: NewGroup) -> Result<Group, ApiError>;
    async fn get_group(&self, group_id: ObjectId) -> Result<Option<Group>, ApiError>;
    /// Groups the user belongs to, oldest first.
    async fn list_groups_for_user(&self, user_id: ObjectId) -> Result<Vec<Group>, ApiError>;

    async fn insert_membership(
        &self,
        new_membership: NewMembership,
    ) -> Result<Membership, ApiError>;
    async fn get_membership(
        &self,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Membership>, ApiError>;
    /// A group's memberships in join order.
    async fn list_members(&self, group_id: ObjectId) -> Result<Vec<Membership>, ApiError>;

    /// Appends one immutable expense row; nothing else is mutated.
    async fn insert_expense(&self, new_expense: NewExpense) -> Result<Expense, ApiError>;
    /// A group's expenses, newest first.
    async fn list_expenses(&self, group_id: ObjectId) -> Result<Vec<Expense>, ApiError>;
}
