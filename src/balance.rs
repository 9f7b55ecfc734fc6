use std::collections::HashMap;

use bson::oid::ObjectId;
use thiserror::Error;

use crate::errors::ApiError;
use crate::models::Expense;
use crate::money::Cents;

type CentsByUser = HashMap<ObjectId, Cents>;

/// Per-member totals for one group, in cents. `net_balance` is positive when
/// the member is owed money and negative when they owe.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberBalance {
    pub user_id: ObjectId,
    pub total_paid: Cents,
    pub total_owed: Cents,
    pub net_balance: Cents,
}

#[derive(Debug, Error, PartialEq)]
pub enum BalanceError {
    #[error("group has no members to split expenses between")]
    EmptyGroup,
}

impl From<BalanceError> for ApiError {
    fn from(err: BalanceError) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

/// Computes every member's paid total, owed share and net balance under the
/// equal-split model. Pure: the report is a function of the current
/// membership set and expense list, recomputed in full on every call.
///
/// `member_ids` must be the group's membership in join order; the report
/// comes back in the same order, and members with no expenses still appear
/// with zeroed totals. Each expense splits into `amount / n` per member with
/// the leftover cents going one each to the earliest-joined members, so the
/// result does not depend on the order of `expenses` and the totals are
/// conserved exactly: sum(paid) == sum(owed) == sum(amounts), sum(net) == 0.
pub fn compute_balances(
    member_ids: &[ObjectId],
    expenses: &[Expense],
) -> Result<Vec<MemberBalance>, BalanceError> {
    if member_ids.is_empty() {
        // Group creation always enrolls the creator, so this is
        // unreachable through the API; reject rather than divide by zero.
        return Err(BalanceError::EmptyGroup);
    }

    let mut paid: CentsByUser = member_ids.iter().map(|id| (*id, 0)).collect();
    let mut owed: CentsByUser = member_ids.iter().map(|id| (*id, 0)).collect();

    let member_count = member_ids.len() as Cents;
    for expense in expenses {
        *paid.entry(expense.paid_by_user_id).or_insert(0) += expense.amount_cents;

        let share = expense.amount_cents / member_count;
        let remainder = expense.amount_cents % member_count;
        for (position, member) in member_ids.iter().enumerate() {
            let extra_cent = ((position as Cents) < remainder) as Cents;
            *owed.entry(*member).or_insert(0) += share + extra_cent;
        }
    }

    Ok(member_ids
        .iter()
        .map(|id| {
            let total_paid = paid[id];
            let total_owed = owed[id];
            MemberBalance {
                user_id: *id,
                total_paid,
                total_owed,
                net_balance: total_paid - total_owed,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn expense(group_id: ObjectId, payer: ObjectId, amount_cents: Cents) -> Expense {
        Expense {
            id: ObjectId::new(),
            group_id,
            paid_by_user_id: payer,
            amount_cents,
            description: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn splits_a_single_expense_between_two_members() {
        let group = ObjectId::new();
        let a = ObjectId::new();
        let b = ObjectId::new();

        let report = compute_balances(&[a, b], &[expense(group, a, 10000)]).unwrap();

        assert_eq!(
            report,
            vec![
                MemberBalance {
                    user_id: a,
                    total_paid: 10000,
                    total_owed: 5000,
                    net_balance: 5000,
                },
                MemberBalance {
                    user_id: b,
                    total_paid: 0,
                    total_owed: 5000,
                    net_balance: -5000,
                },
            ]
        );
    }

    #[test]
    fn splits_two_expenses_between_three_members() {
        let group = ObjectId::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();

        let expenses = vec![expense(group, a, 10000), expense(group, b, 5000)];
        let report = compute_balances(&[a, b, c], &expenses).unwrap();

        assert_eq!(report[0].total_paid, 10000);
        assert_eq!(report[0].total_owed, 5000);
        assert_eq!(report[0].net_balance, 5000);
        assert_eq!(report[1].total_paid, 5000);
        assert_eq!(report[1].net_balance, 0);
        assert_eq!(report[2].total_paid, 0);
        assert_eq!(report[2].net_balance, -5000);
    }

    #[test]
    fn members_with_no_expenses_still_appear() {
        let a = ObjectId::new();
        let b = ObjectId::new();

        let report = compute_balances(&[a, b], &[]).unwrap();

        assert_eq!(report.len(), 2);
        assert!(report
            .iter()
            .all(|m| m.total_paid == 0 && m.total_owed == 0 && m.net_balance == 0));
    }

    #[test]
    fn uneven_amounts_give_leftover_cents_to_earliest_members() {
        let group = ObjectId::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();

        let report = compute_balances(&[a, b, c], &[expense(group, a, 100)]).unwrap();

        assert_eq!(report[0].total_owed, 34);
        assert_eq!(report[1].total_owed, 33);
        assert_eq!(report[2].total_owed, 33);
    }

    #[test]
    fn totals_are_conserved_exactly() {
        let group = ObjectId::new();
        let members: Vec<ObjectId> = (0..7).map(|_| ObjectId::new()).collect();
        let expenses: Vec<Expense> = [101, 9999, 35, 1, 777777, 42]
            .iter()
            .enumerate()
            .map(|(i, amount)| expense(group, members[i % members.len()], *amount))
            .collect();
        let total: Cents = expenses.iter().map(|e| e.amount_cents).sum();

        let report = compute_balances(&members, &expenses).unwrap();

        assert_eq!(report.iter().map(|m| m.total_paid).sum::<Cents>(), total);
        assert_eq!(report.iter().map(|m| m.total_owed).sum::<Cents>(), total);
        assert_eq!(report.iter().map(|m| m.net_balance).sum::<Cents>(), 0);
    }

    #[test]
    fn report_does_not_depend_on_expense_order() {
        let group = ObjectId::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        let c = ObjectId::new();

        let mut expenses = vec![
            expense(group, a, 100),
            expense(group, b, 205),
            expense(group, c, 5001),
        ];
        let forward = compute_balances(&[a, b, c], &expenses).unwrap();
        expenses.reverse();
        let backward = compute_balances(&[a, b, c], &expenses).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let group = ObjectId::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        let expenses = vec![expense(group, a, 12345)];

        let first = compute_balances(&[a, b], &expenses).unwrap();
        let second = compute_balances(&[a, b], &expenses).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn rejects_an_empty_membership_set() {
        assert_eq!(compute_balances(&[], &[]), Err(BalanceError::EmptyGroup));
    }
}
