use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::budget_goal::BudgetGoal;
use crate::models::category::Category;
use crate::models::transaction::Transaction;
use crate::models::transaction_type::TransactionType;
use crate::models::user::User;
use crate::validators::FormErrors;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ErrorType {
    IncorrectlyFormed,
    InvalidForm,
    ConflictWithExisting,

    IncorrectCredential,
    TokenExpired,
    TokenMissing,
    WrongTokenType,

    UserDoesNotExist,
    CategoryDoesNotExist,
    TransactionDoesNotExist,
    BudgetGoalDoesNotExist,

    InternalError,
    ExternalServiceFailure,
    ServiceNotConfigured,
}

/// Body of every error response.
#[derive(Clone, Debug, Serialize)]
pub struct ServerErrorResponse {
    pub err_type: ErrorType,
    pub err_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FormErrors>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for OutputUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputSignin {
    pub user: OutputUser,
    pub tokens: TokenPair,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputChoice {
    pub value: String,
    pub label: String,
}

impl OutputChoice {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Vec<OutputChoice> {
        pairs
            .iter()
            .map(|(value, label)| OutputChoice {
                value: String::from(*value),
                label: String::from(*label),
            })
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputCategoryChoices {
    pub types: Vec<OutputChoice>,
    pub icons: Vec<OutputChoice>,
    pub colors: Vec<OutputChoice>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputCategory {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub icon: String,
    pub color: String,
}

impl From<Category> for OutputCategory {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            category_type: category.category_type,
            icon: category.icon,
            color: category.color,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputCategoryList {
    pub categories: Vec<OutputCategory>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputTransaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category: Option<OutputCategory>,
}

impl OutputTransaction {
    pub fn new(transaction: Transaction, category: Option<Category>) -> Self {
        Self {
            id: transaction.id,
            transaction_type: transaction.transaction_type,
            amount: transaction.amount,
            description: transaction.description,
            date: transaction.date,
            category: category.map(OutputCategory::from),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputTransactionList {
    pub transactions: Vec<OutputTransaction>,
    pub categories: Vec<OutputCategory>,
    pub selected_type: Option<TransactionType>,
    pub selected_category: Option<Uuid>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputBudgetGoal {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_color: String,
    pub amount: Decimal,
    pub month: i32,
    pub year: i32,
    pub spent: Decimal,
    pub progress: Decimal,
}

impl OutputBudgetGoal {
    pub fn new(goal: BudgetGoal, category: &Category, spent: Decimal) -> Self {
        Self {
            id: goal.id,
            category_id: goal.category_id,
            category_name: category.name.clone(),
            category_color: category.color.clone(),
            amount: goal.amount,
            month: goal.month,
            year: goal.year,
            progress: goal.progress(spent),
            spent,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputBudgetGoalList {
    pub period_title: String,
    pub month: u32,
    pub year: i32,
    pub goals: Vec<OutputBudgetGoal>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlowTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl FlowTotals {
    pub fn balance(&self) -> Decimal {
        self.income - self.expense
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputCategoryTotal {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub total: Decimal,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputTrendPoint {
    pub label: String,
    pub month: u32,
    pub year: i32,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputDashboard {
    pub period_title: String,
    pub monthly_income: Decimal,
    pub monthly_expense: Decimal,
    pub balance: Decimal,
    pub recent_transactions: Vec<OutputTransaction>,
    pub budget_goals: Vec<OutputBudgetGoal>,
    pub expense_by_category: Vec<OutputCategoryTotal>,
    pub monthly_trend: Vec<OutputTrendPoint>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputMonthBreakdown {
    pub label: String,
    pub month: u32,
    pub income: Decimal,
    pub expense: Decimal,
    pub savings: Decimal,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OutputReport {
    pub year: i32,
    pub years: Vec<i32>,
    pub yearly_income: Decimal,
    pub yearly_expense: Decimal,
    pub yearly_savings: Decimal,
    pub monthly_breakdown: Vec<OutputMonthBreakdown>,
    pub category_breakdown: Vec<OutputCategoryTotal>,
}
