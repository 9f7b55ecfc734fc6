use async_trait::async_trait;
use bson::doc;
use bson::oid::ObjectId;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::errors::ApiError;
use crate::models::{
    Expense, Group, Membership, NewExpense, NewGroup, NewMembership, NewUser, User,
};
use crate::store::LedgerStore;

/// MongoDB-backed ledger store. One collection per entity; expenses are
/// plain documents appended to their own collection, never updated.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub fn new(database: Database) -> MongoStore {
        MongoStore { database }
    }

    fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    fn groups(&self) -> Collection<Group> {
        self.database.collection("groups")
    }

    fn memberships(&self) -> Collection<Membership> {
        self.database.collection("memberships")
    }

    fn expenses(&self) -> Collection<Expense> {
        self.database.collection("expenses")
    }

    /// Unique indexes backing the username/email and (group, user)
    /// uniqueness invariants. Called once at startup.
    pub async fn ensure_indexes(&self) -> Result<(), ApiError> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.memberships()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "group_id": 1, "user_id": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.expenses()
            .create_index(
                IndexModel::builder().keys(doc! { "group_id": 1 }).build(),
                None,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MongoStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, ApiError> {
        let user = User {
            id: ObjectId::new(),
            email: new_user.email,
            username: new_user.username,
            hashed_password: new_user.hashed_password,
            full_name: new_user.full_name,
            created_at: Utc::now(),
            is_active: true,
        };
        self.users().insert_one(&user, None).await?;
        Ok(user)
    }

    async fn get_user(&self, user_id: ObjectId) -> Result<Option<User>, ApiError> {
        Ok(self.users().find_one(doc! { "_id": user_id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn update_user_profile(
        &self,
        user_id: ObjectId,
        email: String,
        username: String,
        full_name: Option<String>,
    ) -> Result<User, ApiError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.users()
            .find_one_and_update(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "email": email,
                    "username": username,
                    "full_name": full_name,
                } },
                options,
            )
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    async fn insert_group(&self, new_group: NewGroup) -> Result<Group, ApiError> {
        let group = Group {
            id: ObjectId::new(),
            name: new_group.name,
            description: new_group.description,
            created_by_user_id: new_group.created_by_user_id,
            created_at: Utc::now(),
        };
        self.groups().insert_one(&group, None).await?;
        Ok(group)
    }

    async fn get_group(&self, group_id: ObjectId) -> Result<Option<Group>, ApiError> {
        Ok(self.groups().find_one(doc! { "_id": group_id }, None).await?)
    }

    async fn list_groups_for_user(&self, user_id: ObjectId) -> Result<Vec<Group>, ApiError> {
        let memberships = self
            .memberships()
            .find(doc! { "user_id": user_id }, None)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let group_ids: Vec<ObjectId> = memberships.iter().map(|m| m.group_id).collect();
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        Ok(self
            .groups()
            .find(doc! { "_id": { "$in": group_ids } }, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_membership(
        &self,
        new_membership: NewMembership,
    ) -> Result<Membership, ApiError> {
        let membership = Membership {
            id: ObjectId::new(),
            group_id: new_membership.group_id,
            user_id: new_membership.user_id,
            joined_at: Utc::now(),
        };
        self.memberships().insert_one(&membership, None).await?;
        Ok(membership)
    }

    async fn get_membership(
        &self,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Membership>, ApiError> {
        Ok(self
            .memberships()
            .find_one(doc! { "group_id": group_id, "user_id": user_id }, None)
            .await?)
    }

    async fn list_members(&self, group_id: ObjectId) -> Result<Vec<Membership>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "joined_at": 1, "_id": 1 })
            .build();
        Ok(self
            .memberships()
            .find(doc! { "group_id": group_id }, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_expense(&self, new_expense: NewExpense) -> Result<Expense, ApiError> {
        let expense = Expense {
            id: ObjectId::new(),
            group_id: new_expense.group_id,
            paid_by_user_id: new_expense.paid_by_user_id,
            amount_cents: new_expense.amount_cents,
            description: new_expense.description,
            metadata: new_expense.metadata,
            created_at: Utc::now(),
        };
        self.expenses().insert_one(&expense, None).await?;
        Ok(expense)
    }

    async fn list_expenses(&self, group_id: ObjectId) -> Result<Vec<Expense>, ApiError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();
        Ok(self
            .expenses()
            .find(doc! { "group_id": group_id }, options)
            .await?
            .try_collect()
            .await?)
    }
}
