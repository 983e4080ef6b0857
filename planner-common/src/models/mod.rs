pub mod budget_goal;
pub mod category;
pub mod job_registry_item;
pub mod transaction;
pub mod transaction_type;
pub mod user;
