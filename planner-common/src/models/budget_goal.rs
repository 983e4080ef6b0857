use diesel::{Insertable, Queryable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::user::User;
use crate::schema::budget_goals;

#[derive(Clone, Debug, Serialize, Deserialize, Associations, Identifiable, Queryable)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(belongs_to(Category, foreign_key = category_id))]
#[diesel(table_name = budget_goals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BudgetGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub month: i32,
    pub year: i32,
    pub created_timestamp: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = budget_goals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewBudgetGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub month: i32,
    pub year: i32,
    pub created_timestamp: SystemTime,
}

impl BudgetGoal {
    pub fn progress(&self, spent: Decimal) -> Decimal {
        progress_percent(spent, self.amount)
    }
}

/// Share of `target` consumed by `spent`, as a percentage rounded to one decimal place
/// (half to even) and capped at 100. A non-positive target yields 0.
pub fn progress_percent(spent: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let Some(ratio) = spent.checked_div(target) else {
        return Decimal::ZERO;
    };

    let percent = (ratio * Decimal::ONE_HUNDRED).round_dp(1);
    percent.min(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(dec("40"), dec("100")), dec("40.0"));
        assert_eq!(progress_percent(dec("0"), dec("100")), Decimal::ZERO);
        assert_eq!(progress_percent(dec("33.33"), dec("100.00")), dec("33.3"));
        assert_eq!(progress_percent(dec("1"), dec("3")), dec("33.3"));
        assert_eq!(progress_percent(dec("2"), dec("3")), dec("66.7"));
    }

    #[test]
    fn test_progress_percent_zero_target() {
        assert_eq!(progress_percent(dec("50"), dec("0")), Decimal::ZERO);
        assert_eq!(progress_percent(dec("50"), dec("0.00")), Decimal::ZERO);
        assert_eq!(progress_percent(dec("50"), dec("-10")), Decimal::ZERO);
    }

    #[test]
    fn test_progress_percent_capped() {
        assert_eq!(progress_percent(dec("250"), dec("100")), Decimal::ONE_HUNDRED);
        assert_eq!(progress_percent(dec("100.01"), dec("100")), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_progress_rounds_half_to_even() {
        // 0.25% and 0.35% of the way
        assert_eq!(progress_percent(dec("0.25"), dec("100")), dec("0.2"));
        assert_eq!(progress_percent(dec("0.35"), dec("100")), dec("0.4"));
    }
}
