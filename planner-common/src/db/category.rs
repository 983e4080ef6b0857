use diesel::{dsl, BoolExpressionMethods, Connection, ExpressionMethods, QueryDsl, RunQueryDsl};
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbThreadPool};
use crate::models::category::{Category, NewCategory};
use crate::models::transaction_type::TransactionType;
use crate::schema::budget_goals as budget_goal_fields;
use crate::schema::budget_goals::dsl::budget_goals;
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::transactions as transaction_fields;
use crate::schema::transactions::dsl::transactions;
use crate::validators::forms::CategoryFields;

pub struct Dao {
    db_thread_pool: DbThreadPool,
}

impl Dao {
    pub fn new(db_thread_pool: &DbThreadPool) -> Self {
        Self {
            db_thread_pool: db_thread_pool.clone(),
        }
    }

    pub fn get_all_categories_for_user(&self, user_id: Uuid) -> Result<Vec<Category>, DaoError> {
        Ok(categories
            .filter(category_fields::user_id.eq(user_id))
            .order(category_fields::name.asc())
            .load::<Category>(&mut self.db_thread_pool.get()?)?)
    }

    #[cfg(test)]
    pub fn get_category(&self, category_id: Uuid, user_id: Uuid) -> Result<Category, DaoError> {
        Ok(categories
            .filter(
                category_fields::id
                    .eq(category_id)
                    .and(category_fields::user_id.eq(user_id)),
            )
            .get_result::<Category>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_category(
        &self,
        user_id: Uuid,
        fields: &CategoryFields,
    ) -> Result<Category, DaoError> {
        let new_category = NewCategory {
            id: Uuid::now_v7(),
            user_id,
            name: &fields.name,
            category_type: fields.category_type,
            icon: &fields.icon,
            color: &fields.color,
            created_timestamp: SystemTime::now(),
        };

        Ok(dsl::insert_into(categories)
            .values(&new_category)
            .get_result::<Category>(&mut self.db_thread_pool.get()?)?)
    }

    /// Budget goals only track expense categories, so a category with goals cannot
    /// become an income category.
    pub fn update_category(
        &self,
        category_id: Uuid,
        user_id: Uuid,
        fields: &CategoryFields,
    ) -> Result<Category, DaoError> {
        let mut conn = self.db_thread_pool.get()?;

        conn.transaction::<_, DaoError, _>(|conn| {
            if fields.category_type != TransactionType::Expense {
                let goal_count = budget_goals
                    .filter(
                        budget_goal_fields::category_id
                            .eq(category_id)
                            .and(budget_goal_fields::user_id.eq(user_id)),
                    )
                    .count()
                    .get_result::<i64>(conn)?;

                if goal_count > 0 {
                    return Err(DaoError::StillReferenced);
                }
            }

            Ok(dsl::update(
                categories.filter(
                    category_fields::id
                        .eq(category_id)
                        .and(category_fields::user_id.eq(user_id)),
                ),
            )
            .set((
                category_fields::name.eq(&fields.name),
                category_fields::category_type.eq(fields.category_type),
                category_fields::icon.eq(&fields.icon),
                category_fields::color.eq(&fields.color),
            ))
            .get_result::<Category>(conn)?)
        })
    }

    /// Deletes the category along with its budget goals. Transactions that referenced
    /// it are kept and lose their category.
    pub fn delete_category(&self, category_id: Uuid, user_id: Uuid) -> Result<(), DaoError> {
        let mut conn = self.db_thread_pool.get()?;

        conn.transaction::<_, DaoError, _>(|conn| {
            let owned_category_count = categories
                .filter(
                    category_fields::id
                        .eq(category_id)
                        .and(category_fields::user_id.eq(user_id)),
                )
                .count()
                .get_result::<i64>(conn)?;

            if owned_category_count == 0 {
                return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
            }

            dsl::update(transactions.filter(transaction_fields::category_id.eq(category_id)))
                .set(transaction_fields::category_id.eq(None::<Uuid>))
                .execute(conn)?;

            diesel::delete(budget_goals.filter(budget_goal_fields::category_id.eq(category_id)))
                .execute(conn)?;

            diesel::delete(categories.find(category_id)).execute(conn)?;

            Ok(())
        })
    }
}
