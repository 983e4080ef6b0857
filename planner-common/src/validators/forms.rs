//! Normalization of submitted forms into the values that get persisted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::category::{COLOR_CHOICES, ICON_CHOICES};
use crate::models::transaction_type::TransactionType;
use crate::period::{MonthPeriod, MAX_YEAR, MIN_YEAR};
use crate::request_io::{
    InputBudgetGoal, InputCategory, InputContactMessage, InputRegistration, InputTransaction,
};
use crate::validators::{self, FormErrors, Validity, REQUIRED_MSG};

pub const INVALID_CATEGORY_MSG: &str = "Select a valid category";

const MAX_CATEGORY_NAME_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 255;
const MAX_AMOUNT_DECIMAL_PLACES: u32 = 2;
const MAX_AMOUNT_WHOLE_DIGITS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub category_type: TransactionType,
    pub icon: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionFields {
    pub transaction_type: TransactionType,
    pub category_id: Option<Uuid>,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetGoalFields {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub month: i32,
    pub year: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationFields {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

pub fn validate_category(input: &InputCategory) -> Result<CategoryFields, FormErrors> {
    let mut errors = FormErrors::new();

    let name = required_text(&mut errors, "name", input.name.as_deref());
    if let Some(name) = &name {
        errors.check("name", max_chars(name, MAX_CATEGORY_NAME_CHARS));
    }

    let category_type = transaction_type(&mut errors, "type", input.category_type.as_deref());
    let icon = choice(&mut errors, "icon", input.icon.as_deref(), &ICON_CHOICES);
    let color = choice(&mut errors, "color", input.color.as_deref(), &COLOR_CHOICES);

    match (name, category_type, icon, color) {
        (Some(name), Some(category_type), Some(icon), Some(color)) if errors.is_empty() => {
            Ok(CategoryFields {
                name,
                category_type,
                icon,
                color,
            })
        }
        _ => Err(errors),
    }
}

/// `today` fills in a missing date.
pub fn validate_transaction(
    input: &InputTransaction,
    today: NaiveDate,
) -> Result<TransactionFields, FormErrors> {
    let mut errors = FormErrors::new();

    let transaction_type =
        transaction_type(&mut errors, "type", input.transaction_type.as_deref());
    let category_id = optional_reference(&mut errors, "category", input.category.as_deref());
    let amount = amount(&mut errors, "amount", input.amount);

    let description = required_text(&mut errors, "description", input.description.as_deref());
    if let Some(description) = &description {
        errors.check("description", max_chars(description, MAX_DESCRIPTION_CHARS));
    }

    match (transaction_type, category_id, amount, description) {
        (Some(transaction_type), Some(category_id), Some(amount), Some(description))
            if errors.is_empty() =>
        {
            Ok(TransactionFields {
                transaction_type,
                category_id,
                amount,
                description,
                date: input.date.unwrap_or(today),
            })
        }
        _ => Err(errors),
    }
}

/// `current` fills in a missing month or year.
pub fn validate_budget_goal(
    input: &InputBudgetGoal,
    current: MonthPeriod,
) -> Result<BudgetGoalFields, FormErrors> {
    let mut errors = FormErrors::new();

    let category_id = match optional_reference(&mut errors, "category", input.category.as_deref())
    {
        Some(Some(id)) => Some(id),
        Some(None) => {
            errors.add("category", REQUIRED_MSG);
            None
        }
        None => None,
    };

    let amount = amount(&mut errors, "amount", input.amount);

    let month = input.month.unwrap_or(current.month() as i32);
    if !(1..=12).contains(&month) {
        errors.add(
            "month",
            format!("Select a valid choice. {month} is not one of the available choices."),
        );
    }

    let year = input.year.unwrap_or(current.year());
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        errors.add(
            "year",
            format!("Ensure this value is between {MIN_YEAR} and {MAX_YEAR}."),
        );
    }

    match (category_id, amount) {
        (Some(category_id), Some(amount)) if errors.is_empty() => Ok(BudgetGoalFields {
            category_id,
            amount,
            month,
            year,
        }),
        _ => Err(errors),
    }
}

pub fn validate_registration(input: &InputRegistration) -> Result<RegistrationFields, FormErrors> {
    let mut errors = FormErrors::new();

    let username = required_text(&mut errors, "username", input.username.as_deref());
    if let Some(username) = &username {
        errors.check("username", validators::validate_username(username));
    }

    let email = required_text(&mut errors, "email", input.email.as_deref());
    if email.is_some() {
        errors.check("email", input.validate_email_address());
    }

    let password1 = input.password1.as_deref().filter(|p| !p.is_empty());
    let password2 = input.password2.as_deref().filter(|p| !p.is_empty());

    if password1.is_none() {
        errors.add("password1", REQUIRED_MSG);
    }

    if password2.is_none() {
        errors.add("password2", REQUIRED_MSG);
    }

    if let (Some(password1), Some(password2)) = (password1, password2) {
        if password1 != password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            errors.check("password2", validators::validate_password(password1));
        }
    }

    match (username, email, password1) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => {
            Ok(RegistrationFields {
                username,
                email,
                password: String::from(password),
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_contact_message(
    input: &InputContactMessage,
) -> Result<ContactFields, FormErrors> {
    let mut errors = FormErrors::new();

    let name = required_text(&mut errors, "name", input.name.as_deref());
    let email = required_text(&mut errors, "email", input.email.as_deref());
    if let Some(email) = &email {
        errors.check("email", validators::validate_email_address(email));
    }
    let subject = required_text(&mut errors, "subject", input.subject.as_deref());
    let message = required_text(&mut errors, "message", input.message.as_deref());

    match (name, email, subject, message) {
        (Some(name), Some(email), Some(subject), Some(message)) if errors.is_empty() => {
            Ok(ContactFields {
                name,
                email,
                subject,
                message,
            })
        }
        _ => Err(errors),
    }
}

/// Parses the `type` query filter. Unknown values mean "no filter".
pub fn parse_type_filter(value: Option<&str>) -> Option<TransactionType> {
    value.and_then(|v| v.parse().ok())
}

/// Parses the `category` query filter. Blank means "no filter"; anything that is not a
/// UUID is an error.
pub fn parse_category_filter(value: Option<&str>) -> Result<Option<Uuid>, FormErrors> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Uuid::parse_str(v)
            .map(Some)
            .map_err(|_| FormErrors::single("category", INVALID_CATEGORY_MSG)),
    }
}

fn required_text(errors: &mut FormErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(String::from(v)),
        _ => {
            errors.add(field, REQUIRED_MSG);
            None
        }
    }
}

fn max_chars(value: &str, max: usize) -> Validity {
    let count = value.chars().count();

    if count > max {
        Validity::Invalid(format!(
            "Ensure this value has at most {max} characters (it has {count})."
        ))
    } else {
        Validity::Valid
    }
}

fn transaction_type(
    errors: &mut FormErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<TransactionType> {
    let value = required_text(errors, field, value)?;

    match value.parse() {
        Ok(t) => Some(t),
        Err(_) => {
            errors.add(field, invalid_choice_msg(&value));
            None
        }
    }
}

fn choice(
    errors: &mut FormErrors,
    field: &'static str,
    value: Option<&str>,
    choices: &[(&str, &str)],
) -> Option<String> {
    let value = required_text(errors, field, value)?;

    if choices.iter().any(|(v, _)| *v == value) {
        Some(value)
    } else {
        errors.add(field, invalid_choice_msg(&value));
        None
    }
}

/// `Some(None)` is a blank reference, `None` is an invalid one.
fn optional_reference(
    errors: &mut FormErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<Option<Uuid>> {
    match value.map(str::trim) {
        None | Some("") => Some(None),
        Some(v) => match Uuid::parse_str(v) {
            Ok(id) => Some(Some(id)),
            Err(_) => {
                errors.add(field, INVALID_CATEGORY_MSG);
                None
            }
        },
    }
}

fn amount(errors: &mut FormErrors, field: &'static str, value: Option<Decimal>) -> Option<Decimal> {
    let Some(value) = value else {
        errors.add(field, REQUIRED_MSG);
        return None;
    };

    let value = value.normalize();
    let mut is_valid = true;

    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        is_valid = false;
    }

    if value.scale() > MAX_AMOUNT_DECIMAL_PLACES {
        errors.add(
            field,
            format!("Ensure that there are no more than {MAX_AMOUNT_DECIMAL_PLACES} decimal places."),
        );
        is_valid = false;
    }

    let whole_digits = value.trunc().abs().to_string().trim_start_matches('0').len();
    if whole_digits > MAX_AMOUNT_WHOLE_DIGITS {
        errors.add(
            field,
            format!(
                "Ensure that there are no more than {MAX_AMOUNT_WHOLE_DIGITS} digits before the \
                 decimal point."
            ),
        );
        is_valid = false;
    }

    if is_valid {
        Some(value)
    } else {
        None
    }
}

fn invalid_choice_msg(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}
