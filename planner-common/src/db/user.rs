use diesel::pg::PgConnection;
use diesel::{dsl, Connection, ExpressionMethods, QueryDsl, RunQueryDsl};
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbThreadPool};
use crate::models::category::{NewCategory, DEFAULT_CATEGORIES};
use crate::models::user::{NewUser, User};
use crate::schema::categories as category_fields;
use crate::schema::categories::dsl::categories;
use crate::schema::users as user_fields;
use crate::schema::users::dsl::users;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub users_seeded: usize,
    pub categories_created: usize,
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

    /// Creates the account and its default categories in one database transaction.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DaoError> {
        let now = SystemTime::now();

        let new_user = NewUser {
            id: Uuid::now_v7(),
            username,
            email,
            password_hash,
            created_timestamp: now,
        };

        let mut conn = self.db_thread_pool.get()?;
        conn.transaction::<_, DaoError, _>(|conn| {
            let user = dsl::insert_into(users)
                .values(&new_user)
                .get_result::<User>(conn)?;

            seed_default_categories(conn, user.id, now)?;

            Ok(user)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User, DaoError> {
        Ok(users
            .filter(user_fields::username.eq(username))
            .get_result::<User>(&mut self.db_thread_pool.get()?)?)
    }

    pub fn delete_user(&self, user_id: Uuid) -> Result<(), DaoError> {
        let deleted_count =
            diesel::delete(users.find(user_id)).execute(&mut self.db_thread_pool.get()?)?;

        if deleted_count == 0 {
            return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
        }

        Ok(())
    }

    /// Inserts whichever default categories the user is missing. Returns the number
    /// of categories created.
    pub fn seed_default_categories(&self, user_id: Uuid) -> Result<usize, DaoError> {
        let mut conn = self.db_thread_pool.get()?;
        Ok(seed_default_categories(
            &mut conn,
            user_id,
            SystemTime::now(),
        )?)
    }

    pub fn get_ids_of_users_without_categories(&self) -> Result<Vec<Uuid>, DaoError> {
        Ok(users
            .select(user_fields::id)
            .filter(user_fields::id.ne_all(categories.select(category_fields::user_id)))
            .order(user_fields::created_timestamp.asc())
            .load::<Uuid>(&mut self.db_thread_pool.get()?)?)
    }

    /// Seeds default categories for every account that has none. Running it again
    /// creates nothing new.
    pub fn backfill_default_categories(&self) -> Result<BackfillSummary, DaoError> {
        let user_ids = self.get_ids_of_users_without_categories()?;
        let mut summary = BackfillSummary::default();

        let mut conn = self.db_thread_pool.get()?;

        for user_id in user_ids {
            let created = seed_default_categories(&mut conn, user_id, SystemTime::now())?;

            if created > 0 {
                log::info!("Created {created} default categories for user {user_id}");
                summary.users_seeded += 1;
                summary.categories_created += created;
            }
        }

        Ok(summary)
    }
}

fn seed_default_categories(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: SystemTime,
) -> Result<usize, diesel::result::Error> {
    let new_categories = DEFAULT_CATEGORIES
        .iter()
        .map(|default| NewCategory::from_default(user_id, default, now))
        .collect::<Vec<_>>();

    dsl::insert_into(categories)
        .values(&new_categories)
        .on_conflict((category_fields::user_id, category_fields::name))
        .do_nothing()
        .execute(conn)
}
