use diesel::pg::PgConnection;
use diesel::{dsl, BoolExpressionMethods, Connection, ExpressionMethods, QueryDsl, RunQueryDsl};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbThreadPool};
use crate::models::budget_goal::{BudgetGoal, NewBudgetGoal};
use crate::models::category::Category;
use crate::models::transaction_type::TransactionType;
use crate::period::MonthPeriod;
use crate::schema::budget_goals as budget_goal_fields;
use crate::schema::budget_goals::dsl::budget_goals;
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::transactions as transaction_fields;
use crate::schema::transactions::dsl::transactions;
use crate::validators::forms::BudgetGoalFields;

#[derive(Clone, Debug)]
pub struct GoalWithSpending {
    pub goal: BudgetGoal,
    pub category: Category,
    pub spent: Decimal,
}

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    /// Goals for the month, ordered by category name, each paired with what was spent
    /// in its category during that month.
    pub fn get_goals_for_period(
        &self,
        user_id: Uuid,
        period: MonthPeriod,
    ) -> Result<Vec<GoalWithSpending>, DaoError> {
        let mut conn = self.db_thread_pool.get()?;
        goals_for_period(&mut conn, user_id, period)
    }

    pub fn get_goal_with_spending(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
    ) -> Result<GoalWithSpending, DaoError> {
        let mut conn = self.db_thread_pool.get()?;

        let (goal, category) = budget_goals
            .inner_join(categories)
            .select((budget_goal_fields::all_columns, category_fields::all_columns))
            .filter(
                budget_goal_fields::id
                    .eq(goal_id)
                    .and(budget_goal_fields::user_id.eq(user_id)),
            )
            .get_result::<(BudgetGoal, Category)>(&mut conn)?;

        let spent = match MonthPeriod::new(goal.year, goal.month as u32) {
            Some(period) => spent_in_category(&mut conn, user_id, goal.category_id, period)?,
            None => Decimal::ZERO,
        };

        Ok(GoalWithSpending {
            goal,
            category,
            spent,
        })
    }

    pub fn create_goal(
        &self,
        user_id: Uuid,
        fields: &BudgetGoalFields,
    ) -> Result<BudgetGoal, DaoError> {
        let new_goal = NewBudgetGoal {
            id: Uuid::now_v7(),
            user_id,
            category_id: fields.category_id,
            amount: fields.amount,
            month: fields.month,
            year: fields.year,
            created_timestamp: SystemTime::now(),
        };

        let mut conn = self.db_thread_pool.get()?;
        conn.transaction::<_, DaoError, _>(|conn| {
            ensure_expense_category_is_owned(conn, fields.category_id, user_id)?;
            ensure_no_conflicting_goal(conn, user_id, fields, None)?;

            Ok(dsl::insert_into(budget_goals)
                .values(&new_goal)
                .get_result::<BudgetGoal>(conn)?)
        })
    }

    pub fn update_goal(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
        fields: &BudgetGoalFields,
    ) -> Result<BudgetGoal, DaoError> {
        let mut conn = self.db_thread_pool.get()?;
        conn.transaction::<_, DaoError, _>(|conn| {
            let existing_count = budget_goals
                .filter(
                    budget_goal_fields::id
                        .eq(goal_id)
                        .and(budget_goal_fields::user_id.eq(user_id)),
                )
                .count()
                .get_result::<i64>(conn)?;

            if existing_count == 0 {
                return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
            }

            ensure_expense_category_is_owned(conn, fields.category_id, user_id)?;
            ensure_no_conflicting_goal(conn, user_id, fields, Some(goal_id))?;

            Ok(dsl::update(budget_goals.find(goal_id))
                .set((
                    budget_goal_fields::category_id.eq(fields.category_id),
                    budget_goal_fields::amount.eq(fields.amount),
                    budget_goal_fields::month.eq(fields.month),
                    budget_goal_fields::year.eq(fields.year),
                ))
                .get_result::<BudgetGoal>(conn)?)
        })
    }

    pub fn delete_goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<(), DaoError> {
        let deleted_count = diesel::delete(
            budget_goals.filter(
                budget_goal_fields::id
                    .eq(goal_id)
                    .and(budget_goal_fields::user_id.eq(user_id)),
            ),
        )
        .execute(&mut self.db_thread_pool.get()?)?;

        if deleted_count == 0 {
            return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
        }

        Ok(())
    }
}

pub(crate) fn goals_for_period(
    conn: &mut PgConnection,
    user_id: Uuid,
    period: MonthPeriod,
) -> Result<Vec<GoalWithSpending>, DaoError> {
    let goals = budget_goals
        .inner_join(categories)
        .select((budget_goal_fields::all_columns, category_fields::all_columns))
        .filter(budget_goal_fields::user_id.eq(user_id))
        .filter(budget_goal_fields::month.eq(period.month() as i32))
        .filter(budget_goal_fields::year.eq(period.year()))
        .order(category_fields::name.asc())
        .load::<(BudgetGoal, Category)>(conn)?;

    if goals.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids: Vec<Uuid> = goals.iter().map(|(goal, _)| goal.category_id).collect();
    let (start, end) = period.date_range();

    let sums = transactions
        .filter(transaction_fields::user_id.eq(user_id))
        .filter(transaction_fields::transaction_type.eq(TransactionType::Expense))
        .filter(transaction_fields::category_id.eq_any(category_ids))
        .filter(transaction_fields::date.ge(start))
        .filter(transaction_fields::date.lt(end))
        .group_by(transaction_fields::category_id)
        .select((
            transaction_fields::category_id,
            dsl::sum(transaction_fields::amount),
        ))
        .load::<(Option<Uuid>, Option<Decimal>)>(conn)?;

    let spent_by_category: HashMap<Uuid, Decimal> = sums
        .into_iter()
        .filter_map(|(category_id, total)| Some((category_id?, total.unwrap_or_default())))
        .collect();

    Ok(goals
        .into_iter()
        .map(|(goal, category)| {
            let spent = spent_by_category
                .get(&goal.category_id)
                .copied()
                .unwrap_or_default();

            GoalWithSpending {
                goal,
                category,
                spent,
            }
        })
        .collect())
}

fn spent_in_category(
    conn: &mut PgConnection,
    user_id: Uuid,
    category_id: Uuid,
    period: MonthPeriod,
) -> Result<Decimal, DaoError> {
    let (start, end) = period.date_range();

    let total = transactions
        .filter(transaction_fields::user_id.eq(user_id))
        .filter(transaction_fields::transaction_type.eq(TransactionType::Expense))
        .filter(transaction_fields::category_id.eq(category_id))
        .filter(transaction_fields::date.ge(start))
        .filter(transaction_fields::date.lt(end))
        .select(dsl::sum(transaction_fields::amount))
        .get_result::<Option<Decimal>>(conn)?;

    Ok(total.unwrap_or_default())
}

fn ensure_expense_category_is_owned(
    conn: &mut PgConnection,
    category_id: Uuid,
    user_id: Uuid,
) -> Result<(), DaoError> {
    let owned_count = categories
        .filter(category_fields::id.eq(category_id))
        .filter(category_fields::user_id.eq(user_id))
        .filter(category_fields::category_type.eq(TransactionType::Expense))
        .count()
        .get_result::<i64>(conn)?;

    if owned_count == 0 {
        return Err(DaoError::InvalidReference);
    }

    Ok(())
}

fn ensure_no_conflicting_goal(
    conn: &mut PgConnection,
    user_id: Uuid,
    fields: &BudgetGoalFields,
    excluding_goal_id: Option<Uuid>,
) -> Result<(), DaoError> {
    let mut query = budget_goals
        .filter(budget_goal_fields::user_id.eq(user_id))
        .filter(budget_goal_fields::category_id.eq(fields.category_id))
        .filter(budget_goal_fields::month.eq(fields.month))
        .filter(budget_goal_fields::year.eq(fields.year))
        .into_boxed();

    if let Some(goal_id) = excluding_goal_id {
        query = query.filter(budget_goal_fields::id.ne(goal_id));
    }

    let conflicting_count = query.count().get_result::<i64>(conn)?;

    if conflicting_count > 0 {
        return Err(DaoError::AlreadyExists);
    }

    Ok(())
}
