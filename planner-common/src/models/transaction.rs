use chrono::NaiveDate;
use diesel::{Insertable, Queryable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::models::transaction_type::TransactionType;
use crate::models::user::User;
use crate::schema::transactions;

#[derive(Clone, Debug, Serialize, Deserialize, Associations, Identifiable, Queryable)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub created_timestamp: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTransaction<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: &'a str,
    pub date: NaiveDate,
    pub created_timestamp: SystemTime,
}
