//! Group-scoped operations and their precondition chains. Each operation
//! checks in a fixed order and the first failure wins; a failed check
//! leaves the ledger untouched.

use bson::oid::ObjectId;

use crate::balance::{self, MemberBalance};
use crate::errors::ApiError;
use crate::models::{Expense, Group, Membership, NewExpense, NewGroup, NewMembership, User};
use crate::money::Cents;
use crate::store::LedgerStore;

pub async fn require_group(
    store: &dyn LedgerStore,
    group_id: ObjectId,
) -> Result<Group, ApiError> {
    store
        .get_group(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

/// Membership guard. Fails closed: any group-scoped action by a
/// non-member is rejected as Forbidden, not NotFound.
pub async fn ensure_member(
    store: &dyn LedgerStore,
    group_id: ObjectId,
    user_id: ObjectId,
) -> Result<(), ApiError> {
    store
        .get_membership(group_id, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::Forbidden("You are not a member of this group".to_string()))
}

/// Creates a group and enrolls the creator as its first member. Every
/// group therefore has at least one member, which the balance engine
/// relies on.
pub async fn create_group(
    store: &dyn LedgerStore,
    name: String,
    description: Option<String>,
    creator_id: ObjectId,
) -> Result<Group, ApiError> {
    let group = store
        .insert_group(NewGroup {
            name,
            description,
            created_by_user_id: creator_id,
        })
        .await?;
    store
        .insert_membership(NewMembership {
            group_id: group.id,
            user_id: creator_id,
        })
        .await?;
    tracing::info!(group_id = %group.id, creator_id = %creator_id, "group created");
    Ok(group)
}

/// Adds the user with the given email to a group. The requester must be a
/// member; adding someone twice is a conflict and changes nothing.
pub async fn add_member_by_email(
    store: &dyn LedgerStore,
    group_id: ObjectId,
    requester_id: ObjectId,
    email: &str,
) -> Result<(Membership, User), ApiError> {
    require_group(store, group_id).await?;
    ensure_member(store, group_id, requester_id).await?;

    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if store.get_membership(group_id, user.id).await?.is_some() {
        return Err(ApiError::Conflict(
            "User is already a member of this group".to_string(),
        ));
    }

    let membership = store
        .insert_membership(NewMembership {
            group_id,
            user_id: user.id,
        })
        .await?;
    Ok((membership, user))
}

/// Appends a validated expense to the group's ledger. Preconditions, first
/// failure wins: group exists, requester is a member, payer is a member.
/// The amount arrives already validated and converted to cents at the
/// boundary.
pub async fn record_expense(
    store: &dyn LedgerStore,
    group_id: ObjectId,
    paid_by_user_id: ObjectId,
    amount_cents: Cents,
    description: Option<String>,
    metadata: Option<String>,
    requester_id: ObjectId,
) -> Result<Expense, ApiError> {
    require_group(store, group_id).await?;
    ensure_member(store, group_id, requester_id).await?;
    if store
        .get_membership(group_id, paid_by_user_id)
        .await?
        .is_none()
    {
        return Err(ApiError::InvalidArgument(
            "Paying user must be a member of the group".to_string(),
        ));
    }

    let expense = store
        .insert_expense(NewExpense {
            group_id,
            paid_by_user_id,
            amount_cents,
            description,
            metadata,
        })
        .await?;
    tracing::info!(
        expense_id = %expense.id,
        group_id = %group_id,
        amount_cents,
        "expense recorded"
    );
    Ok(expense)
}

/// Expense history for a group, newest first. Guard-gated.
pub async fn list_group_expenses(
    store: &dyn LedgerStore,
    group_id: ObjectId,
    requester_id: ObjectId,
) -> Result<Vec<Expense>, ApiError> {
    require_group(store, group_id).await?;
    ensure_member(store, group_id, requester_id).await?;
    store.list_expenses(group_id).await
}

/// Loads the current membership set and expense list and computes the
/// balance report. No caching: the report is recomputed in full from the
/// ledger on every call.
pub async fn group_balance(
    store: &dyn LedgerStore,
    group_id: ObjectId,
    requester_id: ObjectId,
) -> Result<(Group, Vec<MemberBalance>), ApiError> {
    let group = require_group(store, group_id).await?;
    ensure_member(store, group_id, requester_id).await?;

    let member_ids: Vec<ObjectId> = store
        .list_members(group_id)
        .await?
        .into_iter()
        .map(|membership| membership.user_id)
        .collect();
    let expenses = store.list_expenses(group_id).await?;

    let balances = balance::compute_balances(&member_ids, &expenses)?;
    Ok((group, balances))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::InMemoryStore;

    async fn user(store: &InMemoryStore, name: &str) -> User {
        store
            .insert_user(NewUser {
                email: format!("{name}@example.com"),
                username: name.to_string(),
                hashed_password: "hash".to_string(),
                full_name: None,
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn creating_a_group_enrolls_the_creator() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;

        let group = create_group(&store, "Trip".to_string(), None, alice.id)
            .await
            .unwrap();

        assert!(ensure_member(&store, group.id, alice.id).await.is_ok());
    }

    #[actix_web::test]
    async fn missing_groups_report_not_found_before_forbidden() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;

        let err = record_expense(
            &store,
            ObjectId::new(),
            alice.id,
            1000,
            None,
            None,
            alice.id,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[actix_web::test]
    async fn non_member_requesters_cannot_record_expenses() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let mallory = user(&store, "mallory").await;
        let group = create_group(&store, "Trip".to_string(), None, alice.id)
            .await
            .unwrap();

        let err = record_expense(&store, group.id, alice.id, 1000, None, None, mallory.id)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(store.list_expenses(group.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn non_member_payers_are_invalid() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let outsider = user(&store, "outsider").await;
        let group = create_group(&store, "Trip".to_string(), None, alice.id)
            .await
            .unwrap();

        let err = record_expense(&store, group.id, outsider.id, 1000, None, None, alice.id)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(store.list_expenses(group.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn duplicate_members_conflict_and_leave_membership_unchanged() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let group = create_group(&store, "Trip".to_string(), None, alice.id)
            .await
            .unwrap();

        add_member_by_email(&store, group.id, alice.id, "bob@example.com")
            .await
            .unwrap();
        let err = add_member_by_email(&store, group.id, alice.id, "bob@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
        let members = store.list_members(group.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().any(|m| m.user_id == bob.id));
    }

    #[actix_web::test]
    async fn balances_cover_the_full_membership_in_join_order() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let group = create_group(&store, "Trip".to_string(), None, alice.id)
            .await
            .unwrap();
        add_member_by_email(&store, group.id, alice.id, "bob@example.com")
            .await
            .unwrap();
        record_expense(&store, group.id, alice.id, 10000, None, None, alice.id)
            .await
            .unwrap();

        let (_, balances) = group_balance(&store, group.id, bob.id).await.unwrap();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].user_id, alice.id);
        assert_eq!(balances[0].net_balance, 5000);
        assert_eq!(balances[1].user_id, bob.id);
        assert_eq!(balances[1].net_balance, -5000);
    }
}
