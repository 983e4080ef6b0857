use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::models::transaction_type::TransactionType;
use crate::models::user::User;
use crate::schema::categories;

pub const ICON_CHOICES: [(&str, &str); 12] = [
    ("bi-house", "House"),
    ("bi-car-front", "Car"),
    ("bi-cart", "Shopping"),
    ("bi-cup-hot", "Food & Drink"),
    ("bi-heart-pulse", "Health"),
    ("bi-mortarboard", "Education"),
    ("bi-controller", "Entertainment"),
    ("bi-briefcase", "Work"),
    ("bi-piggy-bank", "Savings"),
    ("bi-cash", "Salary"),
    ("bi-gift", "Gifts"),
    ("bi-three-dots", "Other"),
];

pub const COLOR_CHOICES: [(&str, &str); 7] = [
    ("primary", "Blue"),
    ("success", "Green"),
    ("danger", "Red"),
    ("warning", "Yellow"),
    ("info", "Cyan"),
    ("secondary", "Gray"),
    ("dark", "Dark"),
];

#[derive(Clone, Copy, Debug)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub category_type: TransactionType,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Categories every account starts with. Seeding skips names a user already has.
pub const DEFAULT_CATEGORIES: [DefaultCategory; 8] = [
    DefaultCategory {
        name: "Salary",
        category_type: TransactionType::Income,
        icon: "bi-cash",
        color: "success",
    },
    DefaultCategory {
        name: "Freelance",
        category_type: TransactionType::Income,
        icon: "bi-briefcase",
        color: "info",
    },
    DefaultCategory {
        name: "Food & Dining",
        category_type: TransactionType::Expense,
        icon: "bi-cup-hot",
        color: "warning",
    },
    DefaultCategory {
        name: "Transportation",
        category_type: TransactionType::Expense,
        icon: "bi-car-front",
        color: "primary",
    },
    DefaultCategory {
        name: "Shopping",
        category_type: TransactionType::Expense,
        icon: "bi-cart",
        color: "danger",
    },
    DefaultCategory {
        name: "Bills & Utilities",
        category_type: TransactionType::Expense,
        icon: "bi-house",
        color: "secondary",
    },
    DefaultCategory {
        name: "Entertainment",
        category_type: TransactionType::Expense,
        icon: "bi-controller",
        color: "info",
    },
    DefaultCategory {
        name: "Healthcare",
        category_type: TransactionType::Expense,
        icon: "bi-heart-pulse",
        color: "danger",
    },
];

#[derive(Clone, Debug, Serialize, Deserialize, Associations, Identifiable, Queryable)]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    pub icon: String,
    pub color: String,
    pub created_timestamp: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCategory<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub category_type: TransactionType,
    pub icon: &'a str,
    pub color: &'a str,
    pub created_timestamp: SystemTime,
}

impl<'a> NewCategory<'a> {
    pub fn from_default(user_id: Uuid, default: &DefaultCategory, now: SystemTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            name: default.name,
            category_type: default.category_type,
            icon: default.icon,
            color: default.color,
            created_timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn test_default_categories_use_known_choices() {
        let names: HashSet<_> = DEFAULT_CATEGORIES.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());

        for category in DEFAULT_CATEGORIES.iter() {
            assert!(ICON_CHOICES.iter().any(|(v, _)| *v == category.icon));
            assert!(COLOR_CHOICES.iter().any(|(v, _)| *v == category.color));
        }

        let income_count = DEFAULT_CATEGORIES
            .iter()
            .filter(|c| c.category_type == TransactionType::Income)
            .count();
        assert_eq!(income_count, 2);
    }
}
