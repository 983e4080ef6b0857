use planner_common::db::transaction::TransactionFilter;
use planner_common::db::{self, DaoError, DbThreadPool};
use planner_common::period;
use planner_common::request_io::{
    InputTransaction, InputTransactionFilter, OutputCategory, OutputTransaction,
    OutputTransactionList,
};
use planner_common::validators::forms::{self, INVALID_CATEGORY_MSG};
use planner_common::validators::FormErrors;

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::error::{DoesNotExistType, HttpErrorResponse};
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn list(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    filter: web::Query<InputTransactionFilter>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let filter = TransactionFilter {
        transaction_type: forms::parse_type_filter(filter.transaction_type.as_deref()),
        category_id: forms::parse_category_filter(filter.category.as_deref())?,
        limit: None,
    };
    let user_id = user_access_token.claims.user_id;

    let (transactions, categories) = match web::block(move || {
        let transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        let category_dao = db::category::Dao::new(&db_thread_pool);

        let transactions = transaction_dao.get_transactions_for_user(user_id, filter)?;
        let categories = category_dao.get_all_categories_for_user(user_id)?;

        Ok::<_, DaoError>((transactions, categories))
    })
    .await?
    {
        Ok(t) => t,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to get transactions",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputTransactionList {
        transactions: transactions
            .into_iter()
            .map(|(transaction, category)| OutputTransaction::new(transaction, category))
            .collect(),
        categories: categories.into_iter().map(OutputCategory::from).collect(),
        selected_type: filter.transaction_type,
        selected_category: filter.category_id,
    }))
}

pub async fn create(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    new_transaction: web::Json<InputTransaction>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_transaction(&new_transaction, period::today())?;
    let user_id = user_access_token.claims.user_id;

    let (transaction, category) = match web::block(move || {
        let transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        let transaction = transaction_dao.create_transaction(user_id, &fields)?;
        transaction_dao.get_transaction(transaction.id, user_id)
    })
    .await?
    {
        Ok(t) => t,
        Err(DaoError::InvalidReference) => return Err(invalid_category()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create transaction",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputTransaction::new(transaction, category)))
}

pub async fn edit(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    transaction_id: web::Path<Uuid>,
    transaction_data: web::Json<InputTransaction>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_transaction(&transaction_data, period::today())?;
    let user_id = user_access_token.claims.user_id;
    let transaction_id = transaction_id.into_inner();

    let (transaction, category) = match web::block(move || {
        let transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.update_transaction(transaction_id, user_id, &fields)?;
        transaction_dao.get_transaction(transaction_id, user_id)
    })
    .await?
    {
        Ok(t) => t,
        Err(e) if e.is_not_found() => return Err(transaction_not_found()),
        Err(DaoError::InvalidReference) => return Err(invalid_category()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update transaction",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputTransaction::new(transaction, category)))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    transaction_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;
    let transaction_id = transaction_id.into_inner();

    match web::block(move || {
        let transaction_dao = db::transaction::Dao::new(&db_thread_pool);
        transaction_dao.delete_transaction(transaction_id, user_id)
    })
    .await?
    {
        Ok(_) => (),
        Err(e) if e.is_not_found() => return Err(transaction_not_found()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to delete transaction",
            )));
        }
    };

    Ok(HttpResponse::Ok().finish())
}

fn transaction_not_found() -> HttpErrorResponse {
    HttpErrorResponse::DoesNotExist(
        String::from("Transaction not found"),
        DoesNotExistType::Transaction,
    )
}

fn invalid_category() -> HttpErrorResponse {
    HttpErrorResponse::InvalidForm(FormErrors::single("category", INVALID_CATEGORY_MSG))
}
