use planner_common::db::{self, DaoError, DbThreadPool};
use planner_common::models::category::{COLOR_CHOICES, ICON_CHOICES};
use planner_common::models::transaction_type::TransactionType;
use planner_common::request_io::{
    InputCategory, OutputCategory, OutputCategoryChoices, OutputCategoryList, OutputChoice,
};
use planner_common::validators::{forms, FormErrors};

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::error::{DoesNotExistType, HttpErrorResponse};
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn list(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;

    let categories = match web::block(move || {
        let category_dao = db::category::Dao::new(&db_thread_pool);
        category_dao.get_all_categories_for_user(user_id)
    })
    .await?
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to get categories",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputCategoryList {
        categories: categories.into_iter().map(OutputCategory::from).collect(),
    }))
}

pub async fn choices(
    _user_access_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let types = TransactionType::CHOICES
        .iter()
        .map(|(t, label)| (t.as_str(), *label))
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(OutputCategoryChoices {
        types: OutputChoice::from_pairs(&types),
        icons: OutputChoice::from_pairs(&ICON_CHOICES),
        colors: OutputChoice::from_pairs(&COLOR_CHOICES),
    }))
}

pub async fn create(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    new_category: web::Json<InputCategory>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_category(&new_category)?;
    let user_id = user_access_token.claims.user_id;

    let category = match web::block(move || {
        let category_dao = db::category::Dao::new(&db_thread_pool);
        category_dao.create_category(user_id, &fields)
    })
    .await?
    {
        Ok(c) => c,
        Err(DaoError::AlreadyExists) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "A category with that name already exists",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create category",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputCategory::from(category)))
}

pub async fn edit(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    category_id: web::Path<Uuid>,
    category_data: web::Json<InputCategory>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_category(&category_data)?;
    let user_id = user_access_token.claims.user_id;
    let category_id = category_id.into_inner();

    let category = match web::block(move || {
        let category_dao = db::category::Dao::new(&db_thread_pool);
        category_dao.update_category(category_id, user_id, &fields)
    })
    .await?
    {
        Ok(c) => c,
        Err(e) if e.is_not_found() => return Err(category_not_found()),
        Err(DaoError::AlreadyExists) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "A category with that name already exists",
            )));
        }
        Err(DaoError::StillReferenced) => {
            return Err(HttpErrorResponse::InvalidForm(FormErrors::single(
                "type",
                "Delete this category's budget goals before making it an income category.",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update category",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputCategory::from(category)))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    category_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;
    let category_id = category_id.into_inner();

    match web::block(move || {
        let category_dao = db::category::Dao::new(&db_thread_pool);
        category_dao.delete_category(category_id, user_id)
    })
    .await?
    {
        Ok(_) => (),
        Err(e) if e.is_not_found() => return Err(category_not_found()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to delete category",
            )));
        }
    };

    Ok(HttpResponse::Ok().finish())
}

fn category_not_found() -> HttpErrorResponse {
    HttpErrorResponse::DoesNotExist(
        String::from("Category not found"),
        DoesNotExistType::Category,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::App;
    use planner_common::models::category::DEFAULT_CATEGORIES;
    use planner_common::request_io::{InputTransaction, OutputTransaction};
    use planner_common::token::auth_token::AuthTokenType;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    use crate::handlers::test_utils;

    #[actix_web::test]
    async fn test_requires_access_token() {
        let app = test::init_service(App::new().configure(test_utils::configure_offline_app)).await;

        let req = TestRequest::get().uri("/api/categories").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/delete", Uuid::now_v7()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_choices() {
        let app = test::init_service(App::new().configure(test_utils::configure_offline_app)).await;
        let token = test_utils::gen_token(Uuid::now_v7(), "chooser", AuthTokenType::Access);

        let req = TestRequest::get()
            .uri("/api/categories/choices")
            .insert_header(("AccessToken", token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let choices: OutputCategoryChoices = test::read_body_json(resp).await;
        assert_eq!(choices.types.len(), 2);
        assert_eq!(choices.icons.len(), ICON_CHOICES.len());
        assert_eq!(choices.colors.len(), COLOR_CHOICES.len());
        assert!(choices.icons.iter().any(|c| c.value == "bi-cash"));
    }

    #[actix_web::test]
    async fn test_create_rejects_invalid_form() {
        let app = test::init_service(App::new().configure(test_utils::configure_offline_app)).await;
        let token = test_utils::gen_token(Uuid::now_v7(), "creator", AuthTokenType::Access);

        let req = TestRequest::post()
            .uri("/api/categories/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "  ",
                "type": "transfer",
                "icon": "bi-rocket",
                "color": "success",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "InvalidForm");
        assert!(body["field_errors"]["name"].is_array());
        assert!(body["field_errors"]["type"].is_array());
        assert!(body["field_errors"]["icon"].is_array());
        assert!(body["field_errors"].get("color").is_none());
    }

    #[actix_web::test]
    async fn test_category_lifecycle() {
        let app = test::init_service(App::new().configure(test_utils::configure_db_app)).await;
        let user = test_utils::create_user();
        let token = test_utils::gen_access_token(&user);

        let req = TestRequest::get()
            .uri("/api/categories")
            .insert_header(("AccessToken", token.as_str()))
            .to_request();
        let list: OutputCategoryList = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list.categories.len(), DEFAULT_CATEGORIES.len());

        let req = TestRequest::post()
            .uri("/api/categories/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "Pets",
                "type": "expense",
                "icon": "bi-heart-pulse",
                "color": "warning",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let pets: OutputCategory = test::read_body_json(resp).await;
        assert_eq!(pets.name, "Pets");

        let req = TestRequest::post()
            .uri("/api/categories/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "Pets",
                "type": "expense",
                "icon": "bi-cart",
                "color": "danger",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "ConflictWithExisting");

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/edit", pets.id))
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "Pet Care",
                "type": "expense",
                "icon": "bi-heart-pulse",
                "color": "info",
            }))
            .to_request();
        let edited: OutputCategory = test::call_and_read_body_json(&app, req).await;
        assert_eq!(edited.name, "Pet Care");
        assert_eq!(edited.color, "info");

        let input = InputTransaction {
            transaction_type: Some(String::from("expense")),
            category: Some(pets.id.to_string()),
            amount: Some(Decimal::from_str("12.50").unwrap()),
            description: Some(String::from("Kibble")),
            date: None,
        };
        let req = TestRequest::post()
            .uri("/api/transactions/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(&input)
            .to_request();
        let transaction: OutputTransaction = test::call_and_read_body_json(&app, req).await;

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/delete", pets.id))
            .insert_header(("AccessToken", token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let (kept, category) = db::transaction::Dao::new(&crate::env::testing::DB_THREAD_POOL)
            .get_transaction(transaction.id, user.id)
            .unwrap();
        assert_eq!(kept.description, "Kibble");
        assert!(category.is_none());

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/delete", pets.id))
            .insert_header(("AccessToken", token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        test_utils::delete_user(&user);
    }

    #[actix_web::test]
    async fn test_category_with_goals_cannot_become_income() {
        let app = test::init_service(App::new().configure(test_utils::configure_db_app)).await;
        let user = test_utils::create_user();
        let token = test_utils::gen_access_token(&user);

        let req = TestRequest::post()
            .uri("/api/categories/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "Garden",
                "type": "expense",
                "icon": "bi-gift",
                "color": "success",
            }))
            .to_request();
        let garden: OutputCategory = test::call_and_read_body_json(&app, req).await;

        let req = TestRequest::post()
            .uri("/api/budget-goals/add")
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({ "category": garden.id, "amount": "80" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/edit", garden.id))
            .insert_header(("AccessToken", token.as_str()))
            .set_json(json!({
                "name": "Garden",
                "type": "income",
                "icon": "bi-gift",
                "color": "success",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "InvalidForm");
        assert!(body["field_errors"]["type"].is_array());

        test_utils::delete_user(&user);
    }

    #[actix_web::test]
    async fn test_cannot_touch_another_users_category() {
        let app = test::init_service(App::new().configure(test_utils::configure_db_app)).await;
        let owner = test_utils::create_user();
        let intruder = test_utils::create_user();
        let intruder_token = test_utils::gen_access_token(&intruder);

        let owner_category = db::category::Dao::new(&crate::env::testing::DB_THREAD_POOL)
            .get_all_categories_for_user(owner.id)
            .unwrap()
            .remove(0);

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/edit", owner_category.id))
            .insert_header(("AccessToken", intruder_token.as_str()))
            .set_json(json!({
                "name": "Hijacked",
                "type": "expense",
                "icon": "bi-cart",
                "color": "danger",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "CategoryDoesNotExist");

        let req = TestRequest::post()
            .uri(&format!("/api/categories/{}/delete", owner_category.id))
            .insert_header(("AccessToken", intruder_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        test_utils::delete_user(&owner);
        test_utils::delete_user(&intruder);
    }
}
