//! Field validators
//!
//! Each field maps to exactly one validator through [`validator_for`]. A
//! validator sees the raw text and today's date and returns `None` when the
//! value is acceptable or the message to show next to the field. Age is
//! derived from the date of birth at validation time and never cached.
//!
//! A section is valid only when every one of its fields is; the wizard never
//! commits a partially valid section.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use domain_lending::{MAX_CREDIT_SCORE, MAX_TERM_MONTHS, MIN_CREDIT_SCORE};

use crate::sections::{Field, FinancialInfo, LoanDetails, PersonalInfo, Section};

/// Validates one field's raw value as of a given date
pub type FieldValidator = fn(Field, &str, NaiveDate) -> Option<String>;

/// Minimum applicant age in years
pub const MINIMUM_AGE: i32 = 18;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const POSITIVE_NUMBER: &str = "Must be a positive number";

/// Field errors for one section, keyed by field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    section: Section,
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            errors: BTreeMap::new(),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Records a message for a field, replacing any earlier one
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Errors in field order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<Field, String> {
        self.errors
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.section)?;
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", message, field.key())?;
            first = false;
        }
        Ok(())
    }
}

/// Section data that can be checked field by field
pub trait SectionData {
    const SECTION: Section;

    /// Raw value of a field in this section
    fn field_value(&self, field: Field) -> Option<&str>;

    /// Runs every field validator of the section
    fn validate_as_of(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new(Self::SECTION);
        for &field in Self::SECTION.fields() {
            let value = self.field_value(field).unwrap_or_default();
            if let Some(message) = validate_field(field, value, today) {
                errors.insert(field, message);
            }
        }
        errors.into_result()
    }
}

impl SectionData for PersonalInfo {
    const SECTION: Section = Section::PersonalInfo;

    fn field_value(&self, field: Field) -> Option<&str> {
        self.value(field)
    }
}

impl SectionData for FinancialInfo {
    const SECTION: Section = Section::FinancialInfo;

    fn field_value(&self, field: Field) -> Option<&str> {
        self.value(field)
    }
}

impl SectionData for LoanDetails {
    const SECTION: Section = Section::LoanDetails;

    fn field_value(&self, field: Field) -> Option<&str> {
        self.value(field)
    }
}

/// The validator responsible for a field
pub fn validator_for(field: Field) -> FieldValidator {
    use Field::*;
    match field {
        Email => validate_email,
        Phone => validate_phone,
        DateOfBirth => validate_date_of_birth,
        MonthlyIncome | OtherIncome | MonthlyExpenses | RentMortgage | OtherLoans => validate_currency,
        CreditScore => validate_credit_score,
        LoanAmount => validate_loan_amount,
        LoanTerm => validate_loan_term,
        InterestRate => validate_interest_rate,
        FirstName | LastName | Address | City | State | ZipCode | EmploymentStatus | EmployerName
        | LoanPurpose => validate_required,
    }
}

/// Validates a single field; `None` means valid
pub fn validate_field(field: Field, value: &str, today: NaiveDate) -> Option<String> {
    validator_for(field)(field, value, today)
}

/// Message shown when a field is left blank
pub fn required_message(field: Field) -> String {
    use Field::*;
    match field {
        MonthlyIncome | OtherIncome | MonthlyExpenses | RentMortgage | OtherLoans => {
            "This field is required".to_string()
        }
        _ => format!("{} is required", field.label()),
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

fn validate_required(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    blank(value).then(|| required_message(field))
}

fn validate_email(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    (!EMAIL.is_match(value.trim())).then(|| "Invalid email format".to_string())
}

fn validate_phone(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (digits != 10).then(|| "Phone number must be 10 digits".to_string())
}

fn validate_date_of_birth(field: Field, value: &str, today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    let Ok(born) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") else {
        return Some("Invalid date of birth".to_string());
    };
    // Year difference only; birthdays later in the year are not considered.
    let age = today.year() - born.year();
    (age < MINIMUM_AGE).then(|| "Must be at least 18 years old".to_string())
}

fn validate_currency(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    match decimal(value) {
        Some(amount) if amount >= Decimal::ZERO => None,
        _ => Some(POSITIVE_NUMBER.to_string()),
    }
}

fn validate_credit_score(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    match value.trim().parse::<i32>() {
        Ok(score) if (MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) => None,
        _ => Some("Credit score must be between 300 and 850".to_string()),
    }
}

fn validate_loan_amount(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    match decimal(value) {
        Some(amount) if amount > Decimal::ZERO => None,
        _ => Some(POSITIVE_NUMBER.to_string()),
    }
}

fn validate_loan_term(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    match decimal(value) {
        Some(months) if months <= Decimal::ZERO => Some(POSITIVE_NUMBER.to_string()),
        Some(months) if !months.fract().is_zero() => Some("Must be a whole number of months".to_string()),
        Some(months) if months > Decimal::from(MAX_TERM_MONTHS) => {
            Some(format!("Loan term cannot exceed {MAX_TERM_MONTHS} months"))
        }
        Some(_) if value.trim().parse::<u32>().is_err() => Some("Must be a whole number of months".to_string()),
        Some(_) => None,
        None => Some(POSITIVE_NUMBER.to_string()),
    }
}

fn validate_interest_rate(field: Field, value: &str, _today: NaiveDate) -> Option<String> {
    if blank(value) {
        return Some(required_message(field));
    }
    match decimal(value) {
        Some(rate) if rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED => None,
        _ => Some("Must be between 0 and 100".to_string()),
    }
}
