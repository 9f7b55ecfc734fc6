use std::sync::RwLock;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;

use crate::errors::ApiError;
use crate::models::{
    Expense, Group, Membership, NewExpense, NewGroup, NewMembership, NewUser, User,
};
use crate::store::LedgerStore;

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    groups: Vec<Group>,
    memberships: Vec<Membership>,
    expenses: Vec<Expense>,
}

/// In-memory ledger store. Intended for tests/dev; rows live in insertion
/// order, which doubles as join order for memberships.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, ApiError> {
        self.inner
            .read()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, ApiError> {
        self.inner
            .write()
            .map_err(|_| ApiError::Internal("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
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
        self.write()?.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: ObjectId) -> Result<Option<User>, ApiError> {
        Ok(self.read()?.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user_profile(
        &self,
        user_id: ObjectId,
        email: String,
        username: String,
        full_name: Option<String>,
    ) -> Result<User, ApiError> {
        let mut inner = self.write()?;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        user.email = email;
        user.username = username;
        user.full_name = full_name;
        Ok(user.clone())
    }

    async fn insert_group(&self, new_group: NewGroup) -> Result<Group, ApiError> {
        let group = Group {
            id: ObjectId::new(),
            name: new_group.name,
            description: new_group.description,
            created_by_user_id: new_group.created_by_user_id,
            created_at: Utc::now(),
        };
        self.write()?.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, group_id: ObjectId) -> Result<Option<Group>, ApiError> {
        Ok(self
            .read()?
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned())
    }

    async fn list_groups_for_user(&self, user_id: ObjectId) -> Result<Vec<Group>, ApiError> {
        let inner = self.read()?;
        Ok(inner
            .groups
            .iter()
            .filter(|g| {
                inner
                    .memberships
                    .iter()
                    .any(|m| m.group_id == g.id && m.user_id == user_id)
            })
            .cloned()
            .collect())
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
        self.write()?.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn get_membership(
        &self,
        group_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Membership>, ApiError> {
        Ok(self
            .read()?
            .memberships
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, group_id: ObjectId) -> Result<Vec<Membership>, ApiError> {
        Ok(self
            .read()?
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
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
        self.write()?.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn list_expenses(&self, group_id: ObjectId) -> Result<Vec<Expense>, ApiError> {
        let mut expenses: Vec<Expense> = self
            .read()?
            .expenses
            .iter()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.reverse();
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            hashed_password: "hash".to_string(),
            full_name: None,
        }
    }

    #[actix_web::test]
    async fn assigns_ids_and_finds_users_by_email_and_username() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("alice")).await.unwrap();

        let by_email = store
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        let by_username = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_username.id, user.id);
        assert!(store
            .find_user_by_email("bob@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_web::test]
    async fn lists_members_in_join_order() {
        let store = InMemoryStore::new();
        let group_id = ObjectId::new();
        let first = ObjectId::new();
        let second = ObjectId::new();
        for user_id in [first, second] {
            store
                .insert_membership(NewMembership { group_id, user_id })
                .await
                .unwrap();
        }

        let members = store.list_members(group_id).await.unwrap();
        let ids: Vec<ObjectId> = members.iter().map(|m| m.user_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[actix_web::test]
    async fn lists_expenses_newest_first() {
        let store = InMemoryStore::new();
        let group_id = ObjectId::new();
        let payer = ObjectId::new();
        let mut inserted = Vec::new();
        for amount_cents in [100, 200, 300] {
            let expense = store
                .insert_expense(NewExpense {
                    group_id,
                    paid_by_user_id: payer,
                    amount_cents,
                    description: None,
                    metadata: None,
                })
                .await
                .unwrap();
            inserted.push(expense.id);
        }

        let listed = store.list_expenses(group_id).await.unwrap();
        let ids: Vec<ObjectId> = listed.iter().map(|e| e.id).collect();
        inserted.reverse();
        assert_eq!(ids, inserted);
    }
}
