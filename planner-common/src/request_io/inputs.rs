use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validators;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialPair {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputRegistration {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl InputRegistration {
    pub fn validate_email_address(&self) -> validators::Validity {
        validators::validate_email_address(self.email.as_deref().unwrap_or_default().trim())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputCategory {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputTransaction {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputBudgetGoal {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputContactMessage {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputTransactionFilter {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputReportYear {
    pub year: Option<i32>,
}
