use chrono::{Datelike, NaiveDate};
use diesel::pg::PgConnection;
use diesel::{dsl, ExpressionMethods, QueryDsl, RunQueryDsl};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::budget_goal::goals_for_period;
use crate::db::transaction::{load_transactions, TransactionFilter};
use crate::db::{DaoError, DbThreadPool};
use crate::models::category::Category;
use crate::models::transaction_type::TransactionType;
use crate::period::{self, MonthPeriod};
use crate::request_io::{
    FlowTotals, OutputBudgetGoal, OutputCategoryTotal, OutputDashboard, OutputMonthBreakdown,
    OutputReport, OutputTransaction, OutputTrendPoint,
};
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::transactions as transaction_fields;
use crate::schema::transactions::dsl::transactions;

pub const RECENT_TRANSACTION_COUNT: i64 = 5;
pub const TREND_MONTH_COUNT: usize = 6;
pub const FIRST_PICKER_YEAR: i32 = 2020;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Summary of the month containing `today`. All queries share one read-only snapshot.
    pub fn dashboard(&self, user_id: Uuid, today: NaiveDate) -> Result<OutputDashboard, DaoError> {
        let period = MonthPeriod::containing(today);
        let trend_periods = period.trailing(TREND_MONTH_COUNT);

        let mut conn = self.db_thread_pool.get()?;
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DaoError, _>(|conn| {
                let (start, end) = period.date_range();
                let totals = flow_totals(conn, user_id, start, end)?;

                let recent_transactions = load_transactions(
                    conn,
                    user_id,
                    TransactionFilter {
                        limit: Some(RECENT_TRANSACTION_COUNT),
                        ..Default::default()
                    },
                )?
                .into_iter()
                .map(|(transaction, category)| OutputTransaction::new(transaction, category))
                .collect();

                let budget_goals = goals_for_period(conn, user_id, period)?
                    .into_iter()
                    .map(|g| OutputBudgetGoal::new(g.goal, &g.category, g.spent))
                    .collect();

                let expense_by_category = expense_by_category(conn, user_id, start, end)?;

                let trend_start = trend_periods
                    .first()
                    .map(|p| p.first_day())
                    .unwrap_or(start);
                let daily = daily_flows(conn, user_id, trend_start, end)?;
                let monthly_trend = bucket_by_month(&daily, &trend_periods)
                    .into_iter()
                    .map(|(p, flows)| OutputTrendPoint {
                        label: p.short_label(),
                        month: p.month(),
                        year: p.year(),
                        income: flows.income,
                        expense: flows.expense,
                    })
                    .collect();

                Ok(OutputDashboard {
                    period_title: period.title(),
                    monthly_income: totals.income,
                    monthly_expense: totals.expense,
                    balance: totals.balance(),
                    recent_transactions,
                    budget_goals,
                    expense_by_category,
                    monthly_trend,
                })
            })
    }

    /// Totals for `year` with a January to December breakdown. `current_year` only
    /// determines the years offered for selection.
    pub fn yearly_report(
        &self,
        user_id: Uuid,
        year: i32,
        current_year: i32,
    ) -> Result<OutputReport, DaoError> {
        let (start, end) = period::year_range(year);
        let months = MonthPeriod::months_of_year(year);

        let mut conn = self.db_thread_pool.get()?;
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DaoError, _>(|conn| {
                let totals = flow_totals(conn, user_id, start, end)?;
                let daily = daily_flows(conn, user_id, start, end)?;

                let monthly_breakdown = bucket_by_month(&daily, &months)
                    .into_iter()
                    .map(|(p, flows)| OutputMonthBreakdown {
                        label: p.long_label(),
                        month: p.month(),
                        income: flows.income,
                        expense: flows.expense,
                        savings: flows.balance(),
                    })
                    .collect();

                let category_breakdown = expense_by_category(conn, user_id, start, end)?;

                Ok(OutputReport {
                    year,
                    years: selectable_years(current_year),
                    yearly_income: totals.income,
                    yearly_expense: totals.expense,
                    yearly_savings: totals.balance(),
                    monthly_breakdown,
                    category_breakdown,
                })
            })
    }
}

pub fn selectable_years(current_year: i32) -> Vec<i32> {
    (FIRST_PICKER_YEAR..=current_year + 1).collect()
}

fn flow_totals(
    conn: &mut PgConnection,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<FlowTotals, DaoError> {
    let rows = transactions
        .filter(transaction_fields::user_id.eq(user_id))
        .filter(transaction_fields::date.ge(start))
        .filter(transaction_fields::date.lt(end))
        .group_by(transaction_fields::transaction_type)
        .select((
            transaction_fields::transaction_type,
            dsl::sum(transaction_fields::amount),
        ))
        .load::<(TransactionType, Option<Decimal>)>(conn)?;

    Ok(fold_flows(rows))
}

fn daily_flows(
    conn: &mut PgConnection,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(NaiveDate, TransactionType, Option<Decimal>)>, DaoError> {
    Ok(transactions
        .filter(transaction_fields::user_id.eq(user_id))
        .filter(transaction_fields::date.ge(start))
        .filter(transaction_fields::date.lt(end))
        .group_by((
            transaction_fields::date,
            transaction_fields::transaction_type,
        ))
        .select((
            transaction_fields::date,
            transaction_fields::transaction_type,
            dsl::sum(transaction_fields::amount),
        ))
        .load::<(NaiveDate, TransactionType, Option<Decimal>)>(conn)?)
}

fn expense_by_category(
    conn: &mut PgConnection,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<OutputCategoryTotal>, DaoError> {
    let sums = transactions
        .filter(transaction_fields::user_id.eq(user_id))
        .filter(transaction_fields::transaction_type.eq(TransactionType::Expense))
        .filter(transaction_fields::date.ge(start))
        .filter(transaction_fields::date.lt(end))
        .group_by(transaction_fields::category_id)
        .select((
            transaction_fields::category_id,
            dsl::sum(transaction_fields::amount),
        ))
        .load::<(Option<Uuid>, Option<Decimal>)>(conn)?;

    let user_categories = categories
        .filter(category_fields::user_id.eq(user_id))
        .load::<Category>(conn)?;

    Ok(label_category_totals(sums, &user_categories))
}

fn fold_flows<I>(rows: I) -> FlowTotals
where
    I: IntoIterator<Item = (TransactionType, Option<Decimal>)>,
{
    let mut totals = FlowTotals::default();

    for (transaction_type, sum) in rows {
        let sum = sum.unwrap_or_default();
        match transaction_type {
            TransactionType::Income => totals.income += sum,
            TransactionType::Expense => totals.expense += sum,
        }
    }

    totals
}

/// One entry per period in the given order. Periods without rows get zero totals.
fn bucket_by_month(
    rows: &[(NaiveDate, TransactionType, Option<Decimal>)],
    periods: &[MonthPeriod],
) -> Vec<(MonthPeriod, FlowTotals)> {
    let mut by_month: HashMap<(i32, u32), FlowTotals> = HashMap::new();

    for (date, transaction_type, sum) in rows {
        let entry = by_month.entry((date.year(), date.month())).or_default();
        let sum = sum.unwrap_or_default();
        match transaction_type {
            TransactionType::Income => entry.income += sum,
            TransactionType::Expense => entry.expense += sum,
        }
    }

    periods
        .iter()
        .map(|p| {
            let flows = by_month
                .get(&(p.year(), p.month()))
                .copied()
                .unwrap_or_default();
            (*p, flows)
        })
        .collect()
}

/// Attaches names and colors to per-category sums and orders them by total, largest
/// first. Uncategorized expenses keep a null category.
fn label_category_totals(
    sums: Vec<(Option<Uuid>, Option<Decimal>)>,
    user_categories: &[Category],
) -> Vec<OutputCategoryTotal> {
    let by_id: HashMap<Uuid, &Category> = user_categories.iter().map(|c| (c.id, c)).collect();

    let mut totals: Vec<OutputCategoryTotal> = sums
        .into_iter()
        .map(|(category_id, total)| {
            let category = category_id.and_then(|id| by_id.get(&id));

            OutputCategoryTotal {
                category_id,
                name: category.map(|c| c.name.clone()),
                color: category.map(|c| c.color.clone()),
                total: total.unwrap_or_default(),
            }
        })
        .collect();

    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;
    use std::time::SystemTime;

    use crate::db::{test_utils, transaction};
    use crate::validators::forms::TransactionFields;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn category(name: &str, color: &str) -> Category {
        Category {
            id: Uuid::now_v7(),
            user_id: Uuid::nil(),
            name: String::from(name),
            category_type: TransactionType::Expense,
            icon: String::from("bi-cart"),
            color: String::from(color),
            created_timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn test_fold_flows() {
        let totals = fold_flows(vec![
            (TransactionType::Income, Some(dec("1500.00"))),
            (TransactionType::Expense, Some(dec("420.50"))),
            (TransactionType::Expense, None),
        ]);

        assert_eq!(totals.income, dec("1500.00"));
        assert_eq!(totals.expense, dec("420.50"));
        assert_eq!(totals.balance(), dec("1079.50"));

        assert_eq!(fold_flows(Vec::new()), FlowTotals::default());
    }

    #[test]
    fn test_bucket_by_month_wraps_year() {
        let periods = MonthPeriod::new(2026, 1).unwrap().trailing(TREND_MONTH_COUNT);
        let rows = vec![
            (date(2025, 8, 3), TransactionType::Income, Some(dec("100"))),
            (date(2025, 8, 20), TransactionType::Income, Some(dec("50"))),
            (date(2025, 12, 31), TransactionType::Expense, Some(dec("30"))),
            (date(2026, 1, 1), TransactionType::Expense, Some(dec("10"))),
        ];

        let buckets = bucket_by_month(&rows, &periods);
        let labels: Vec<(i32, u32)> = buckets.iter().map(|(p, _)| (p.year(), p.month())).collect();

        assert_eq!(
            labels,
            vec![
                (2025, 8),
                (2025, 9),
                (2025, 10),
                (2025, 11),
                (2025, 12),
                (2026, 1)
            ]
        );
        assert_eq!(buckets[0].1.income, dec("150"));
        assert_eq!(buckets[1].1, FlowTotals::default());
        assert_eq!(buckets[4].1.expense, dec("30"));
        assert_eq!(buckets[5].1.expense, dec("10"));
    }

    #[test]
    fn test_empty_year_has_twelve_zero_months() {
        let months = MonthPeriod::months_of_year(2021);
        let buckets = bucket_by_month(&[], &months);

        assert_eq!(buckets.len(), 12);
        assert!(buckets.iter().all(|(_, f)| *f == FlowTotals::default()));
        assert_eq!(buckets[0].0.long_label(), "January");
        assert_eq!(buckets[11].0.long_label(), "December");
    }

    #[test]
    fn test_label_category_totals() {
        let food = category("Food", "warning");
        let rent = category("Rent", "secondary");

        let totals = label_category_totals(
            vec![
                (Some(food.id), Some(dec("80"))),
                (None, Some(dec("15"))),
                (Some(rent.id), Some(dec("900"))),
                (Some(Uuid::now_v7()), None),
            ],
            &[food.clone(), rent.clone()],
        );

        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0].name.as_deref(), Some("Rent"));
        assert_eq!(totals[0].color.as_deref(), Some("secondary"));
        assert_eq!(totals[1].category_id, Some(food.id));
        assert_eq!(totals[2].category_id, None);
        assert_eq!(totals[2].name, None);
        assert_eq!(totals[3].total, Decimal::ZERO);
        assert_eq!(totals[3].name, None);
    }

    #[test]
    fn test_selectable_years() {
        assert_eq!(selectable_years(2022), vec![2020, 2021, 2022, 2023]);
        assert_eq!(selectable_years(2020).last(), Some(&2021));
    }

    #[test]
    fn test_report_for_year_without_transactions() {
        let dao = Dao::new(test_utils::db_pool());
        let user_id = test_utils::create_user();

        let report = dao.yearly_report(user_id, 2021, 2026).unwrap();

        assert_eq!(report.year, 2021);
        assert_eq!(report.yearly_income, Decimal::ZERO);
        assert_eq!(report.yearly_expense, Decimal::ZERO);
        assert_eq!(report.yearly_savings, Decimal::ZERO);
        assert_eq!(report.monthly_breakdown.len(), 12);
        assert_eq!(report.monthly_breakdown[1].label, "February");
        assert!(report
            .monthly_breakdown
            .iter()
            .all(|m| m.income.is_zero() && m.expense.is_zero() && m.savings.is_zero()));
        assert!(report.category_breakdown.is_empty());
        assert_eq!(report.years.first(), Some(&2020));
        assert_eq!(report.years.last(), Some(&2027));

        test_utils::delete_user(user_id);
    }

    #[test]
    fn test_dashboard_totals_and_trend() {
        let dao = Dao::new(test_utils::db_pool());
        let transaction_dao = transaction::Dao::new(test_utils::db_pool());
        let user_id = test_utils::create_user();
        let today = date(2026, 1, 15);

        let add = |transaction_type, cents, on| {
            transaction_dao
                .create_transaction(
                    user_id,
                    &TransactionFields {
                        transaction_type,
                        category_id: None,
                        amount: Decimal::new(cents, 2),
                        description: String::new(),
                        date: on,
                    },
                )
                .unwrap();
        };

        add(TransactionType::Income, 300000, date(2026, 1, 2));
        add(TransactionType::Expense, 12050, date(2026, 1, 10));
        add(TransactionType::Expense, 5000, date(2025, 12, 24));
        add(TransactionType::Income, 1000, date(2025, 7, 31));

        let dashboard = dao.dashboard(user_id, today).unwrap();

        assert_eq!(dashboard.period_title, "January 2026");
        assert_eq!(dashboard.monthly_income, dec("3000.00"));
        assert_eq!(dashboard.monthly_expense, dec("120.50"));
        assert_eq!(dashboard.balance, dec("2879.50"));
        assert_eq!(dashboard.recent_transactions.len(), 4);
        assert_eq!(dashboard.expense_by_category.len(), 1);
        assert_eq!(dashboard.expense_by_category[0].category_id, None);

        let labels: Vec<&str> = dashboard
            .monthly_trend
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Aug", "Sep", "Oct", "Nov", "Dec", "Jan"]);
        assert_eq!(dashboard.monthly_trend[4].expense, dec("50.00"));
        assert_eq!(dashboard.monthly_trend[4].year, 2025);
        assert!(dashboard.monthly_trend.iter().all(|p| p.income != dec("10.00")));

        test_utils::delete_user(user_id);
    }
}
