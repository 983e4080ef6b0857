use planner_common::db::budget_goal::GoalWithSpending;
use planner_common::db::{self, DaoError, DbThreadPool};
use planner_common::period::MonthPeriod;
use planner_common::request_io::{InputBudgetGoal, OutputBudgetGoal, OutputBudgetGoalList};
use planner_common::validators::forms::{self, INVALID_CATEGORY_MSG};
use planner_common::validators::FormErrors;

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::error::{DoesNotExistType, HttpErrorResponse};
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

const DUPLICATE_GOAL_MSG: &str = "A budget goal for this category and month already exists";

/// Goals for the current month only.
pub async fn list(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;
    let period = MonthPeriod::current();

    let goals = match web::block(move || {
        let budget_goal_dao = db::budget_goal::Dao::new(&db_thread_pool);
        budget_goal_dao.get_goals_for_period(user_id, period)
    })
    .await?
    {
        Ok(g) => g,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to get budget goals",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputBudgetGoalList {
        period_title: period.title(),
        month: period.month(),
        year: period.year(),
        goals: goals.into_iter().map(output_goal).collect(),
    }))
}

pub async fn create(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    new_goal: web::Json<InputBudgetGoal>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_budget_goal(&new_goal, MonthPeriod::current())?;
    let user_id = user_access_token.claims.user_id;

    let goal = match web::block(move || {
        let budget_goal_dao = db::budget_goal::Dao::new(&db_thread_pool);
        let goal = budget_goal_dao.create_goal(user_id, &fields)?;
        budget_goal_dao.get_goal_with_spending(goal.id, user_id)
    })
    .await?
    {
        Ok(g) => g,
        Err(DaoError::InvalidReference) => return Err(invalid_category()),
        Err(DaoError::AlreadyExists) => return Err(duplicate_goal()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create budget goal",
            )));
        }
    };

    Ok(HttpResponse::Created().json(output_goal(goal)))
}

pub async fn edit(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    goal_id: web::Path<Uuid>,
    goal_data: web::Json<InputBudgetGoal>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_budget_goal(&goal_data, MonthPeriod::current())?;
    let user_id = user_access_token.claims.user_id;
    let goal_id = goal_id.into_inner();

    let goal = match web::block(move || {
        let budget_goal_dao = db::budget_goal::Dao::new(&db_thread_pool);
        budget_goal_dao.update_goal(goal_id, user_id, &fields)?;
        budget_goal_dao.get_goal_with_spending(goal_id, user_id)
    })
    .await?
    {
        Ok(g) => g,
        Err(e) if e.is_not_found() => return Err(goal_not_found()),
        Err(DaoError::InvalidReference) => return Err(invalid_category()),
        Err(DaoError::AlreadyExists) => return Err(duplicate_goal()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to update budget goal",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(output_goal(goal)))
}

pub async fn delete(
    db_thread_pool: web::Data<DbThreadPool>,
    user_access_token: VerifiedToken<Access, FromHeader>,
    goal_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_id = user_access_token.claims.user_id;
    let goal_id = goal_id.into_inner();

    match web::block(move || {
        let budget_goal_dao = db::budget_goal::Dao::new(&db_thread_pool);
        budget_goal_dao.delete_goal(goal_id, user_id)
    })
    .await?
    {
        Ok(_) => (),
        Err(e) if e.is_not_found() => return Err(goal_not_found()),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to delete budget goal",
            )));
        }
    };

    Ok(HttpResponse::Ok().finish())
}

fn output_goal(goal: GoalWithSpending) -> OutputBudgetGoal {
    OutputBudgetGoal::new(goal.goal, &goal.category, goal.spent)
}

fn goal_not_found() -> HttpErrorResponse {
    HttpErrorResponse::DoesNotExist(
        String::from("Budget goal not found"),
        DoesNotExistType::BudgetGoal,
    )
}

fn invalid_category() -> HttpErrorResponse {
    HttpErrorResponse::InvalidForm(FormErrors::single("category", INVALID_CATEGORY_MSG))
}

fn duplicate_goal() -> HttpErrorResponse {
    HttpErrorResponse::ConflictWithExisting(String::from(DUPLICATE_GOAL_MSG))
}
