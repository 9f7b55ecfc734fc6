use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Cents;

/// Stored user document. Only the profile fields (email, username,
/// full_name) change after signup.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Join document relating one user to one group. (group_id, user_id) is
/// unique; duplicates are rejected as a conflict.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Membership {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub group_id: ObjectId,
    pub user_id: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
}

/// A single payment made by one member on behalf of the group. Immutable
/// once inserted; the amount is kept in integer cents.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub group_id: ObjectId,
    pub paid_by_user_id: ObjectId,
    pub amount_cents: Cents,
    pub description: Option<String>,
    pub metadata: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Insert payloads. The store assigns id and the creation timestamp.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: ObjectId,
}

#[derive(Clone, Debug)]
pub struct NewMembership {
    pub group_id: ObjectId,
    pub user_id: ObjectId,
}

#[derive(Clone, Debug)]
pub struct NewExpense {
    pub group_id: ObjectId,
    pub paid_by_user_id: ObjectId,
    pub amount_cents: Cents,
    pub description: Option<String>,
    pub metadata: Option<String>,
}
