use diesel::pg::PgConnection;
use diesel::{
    dsl, BoolExpressionMethods, Connection, ExpressionMethods, NullableExpressionMethods,
    QueryDsl, RunQueryDsl,
};
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbThreadPool};
use crate::models::category::Category;
use crate::models::transaction::{NewTransaction, Transaction};
use crate::models::transaction_type::TransactionType;
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::transactions as transaction_fields;
use crate::schema::transactions::dsl::transactions;
use crate::validators::forms::TransactionFields;

#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<Uuid>,
    pub limit: Option<i64>,
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

    /// Newest first. Ties on date are broken by creation time.
    pub fn get_transactions_for_user(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<(Transaction, Option<Category>)>, DaoError> {
        let mut conn = self.db_thread_pool.get()?;
        load_transactions(&mut conn, user_id, filter)
    }

    pub fn get_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Transaction, Option<Category>), DaoError> {
        Ok(transactions
            .left_join(categories)
            .select((
                transaction_fields::all_columns,
                category_fields::all_columns.nullable(),
            ))
            .filter(
                transaction_fields::id
                    .eq(transaction_id)
                    .and(transaction_fields::user_id.eq(user_id)),
            )
            .get_result::<(Transaction, Option<Category>)>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn create_transaction(
        &self,
        user_id: Uuid,
        fields: &TransactionFields,
    ) -> Result<Transaction, DaoError> {
        let new_transaction = NewTransaction {
            id: Uuid::now_v7(),
            user_id,
            category_id: fields.category_id,
            transaction_type: fields.transaction_type,
            amount: fields.amount,
            description: &fields.description,
            date: fields.date,
            created_timestamp: SystemTime::now(),
        };

        let mut conn = self.db_thread_pool.get()?;
        conn.transaction::<_, DaoError, _>(|conn| {
            ensure_category_is_owned(conn, fields.category_id, user_id)?;

            Ok(dsl::insert_into(transactions)
                .values(&new_transaction)
                .get_result::<Transaction>(conn)?)
        })
    }

    pub fn update_transaction(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
        fields: &TransactionFields,
    ) -> Result<Transaction, DaoError> {
        let mut conn = self.db_thread_pool.get()?;
        conn.transaction::<_, DaoError, _>(|conn| {
            ensure_category_is_owned(conn, fields.category_id, user_id)?;

            Ok(dsl::update(
                transactions.filter(
                    transaction_fields::id
                        .eq(transaction_id)
                        .and(transaction_fields::user_id.eq(user_id)),
                ),
            )
            .set((
                transaction_fields::transaction_type.eq(fields.transaction_type),
                transaction_fields::category_id.eq(fields.category_id),
                transaction_fields::amount.eq(fields.amount),
                transaction_fields::description.eq(&fields.description),
                transaction_fields::date.eq(fields.date),
            ))
            .get_result::<Transaction>(conn)?)
        })
    }

    pub fn delete_transaction(&self, transaction_id: Uuid, user_id: Uuid) -> Result<(), DaoError> {
        let deleted_count = diesel::delete(
            transactions.filter(
                transaction_fields::id
                    .eq(transaction_id)
                    .and(transaction_fields::user_id.eq(user_id)),
            ),
        )
        .execute(&mut self.db_thread_pool.get()?)?;

        if deleted_count == 0 {
            return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
        }

        Ok(())
    }
}

pub(crate) fn load_transactions(
    conn: &mut PgConnection,
    user_id: Uuid,
    filter: TransactionFilter,
) -> Result<Vec<(Transaction, Option<Category>)>, DaoError> {
    let mut query = transactions
        .left_join(categories)
        .select((
            transaction_fields::all_columns,
            category_fields::all_columns.nullable(),
        ))
        .filter(transaction_fields::user_id.eq(user_id))
        .order((
            transaction_fields::date.desc(),
            transaction_fields::created_timestamp.desc(),
        ))
        .into_boxed();

    if let Some(transaction_type) = filter.transaction_type {
        query = query.filter(transaction_fields::transaction_type.eq(transaction_type));
    }

    if let Some(category_id) = filter.category_id {
        query = query.filter(transaction_fields::category_id.eq(category_id));
    }

    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    Ok(query.load::<(Transaction, Option<Category>)>(conn)?)
}

fn ensure_category_is_owned(
    conn: &mut PgConnection,
    category_id: Option<Uuid>,
    user_id: Uuid,
) -> Result<(), DaoError> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    let owned_count = categories
        .filter(
            category_fields::id
                .eq(category_id)
                .and(category_fields::user_id.eq(user_id)),
        )
        .count()
        .get_result::<i64>(conn)?;

    if owned_count == 0 {
        return Err(DaoError::InvalidReference);
    }

    Ok(())
}
