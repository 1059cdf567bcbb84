//! Wizard sections and their fields
//!
//! Sections hold the raw text the applicant typed. Values are interpreted
//! (parsed into dates and decimals) only by the validators and by the typed
//! accessors, so a draft can always be round-tripped exactly as entered.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three data-entry sections of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    PersonalInfo,
    FinancialInfo,
    LoanDetails,
}

impl Section {
    /// Fields belonging to this section, in form order
    pub fn fields(&self) -> &'static [Field] {
        match self {
            Section::PersonalInfo => PersonalInfo::FIELDS,
            Section::FinancialInfo => FinancialInfo::FIELDS,
            Section::LoanDetails => LoanDetails::FIELDS,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::PersonalInfo => "personal info",
            Section::FinancialInfo => "financial info",
            Section::LoanDetails => "loan details",
        };
        f.write_str(name)
    }
}

/// Every field the wizard collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    // Personal
    FirstName,
    LastName,
    Email,
    Phone,
    DateOfBirth,
    Address,
    City,
    State,
    ZipCode,
    // Financial
    EmploymentStatus,
    EmployerName,
    MonthlyIncome,
    OtherIncome,
    MonthlyExpenses,
    RentMortgage,
    OtherLoans,
    CreditScore,
    // Loan details
    LoanAmount,
    LoanPurpose,
    LoanTerm,
    InterestRate,
}

impl Field {
    /// The section this field belongs to
    pub fn section(&self) -> Section {
        use Field::*;
        match self {
            FirstName | LastName | Email | Phone | DateOfBirth | Address | City | State | ZipCode => {
                Section::PersonalInfo
            }
            EmploymentStatus | EmployerName | MonthlyIncome | OtherIncome | MonthlyExpenses
            | RentMortgage | OtherLoans | CreditScore => Section::FinancialInfo,
            LoanAmount | LoanPurpose | LoanTerm | InterestRate => Section::LoanDetails,
        }
    }

    /// The camelCase form key, as serialized
    pub fn key(&self) -> &'static str {
        use Field::*;
        match self {
            FirstName => "firstName",
            LastName => "lastName",
            Email => "email",
            Phone => "phone",
            DateOfBirth => "dateOfBirth",
            Address => "address",
            City => "city",
            State => "state",
            ZipCode => "zipCode",
            EmploymentStatus => "employmentStatus",
            EmployerName => "employerName",
            MonthlyIncome => "monthlyIncome",
            OtherIncome => "otherIncome",
            MonthlyExpenses => "monthlyExpenses",
            RentMortgage => "rentMortgage",
            OtherLoans => "otherLoans",
            CreditScore => "creditScore",
            LoanAmount => "loanAmount",
            LoanPurpose => "loanPurpose",
            LoanTerm => "loanTerm",
            InterestRate => "interestRate",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        use Field::*;
        match self {
            FirstName => "First name",
            LastName => "Last name",
            Email => "Email",
            Phone => "Phone number",
            DateOfBirth => "Date of birth",
            Address => "Address",
            City => "City",
            State => "State",
            ZipCode => "ZIP code",
            EmploymentStatus => "Employment status",
            EmployerName => "Employer name",
            MonthlyIncome => "Monthly income",
            OtherIncome => "Other income",
            MonthlyExpenses => "Monthly expenses",
            RentMortgage => "Rent or mortgage",
            OtherLoans => "Other loan payments",
            CreditScore => "Credit score",
            LoanAmount => "Loan amount",
            LoanPurpose => "Loan purpose",
            LoanTerm => "Loan term",
            InterestRate => "Interest rate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

/// Step 1: who the applicant is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// ISO date, `YYYY-MM-DD`
    pub date_of_birth: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl PersonalInfo {
    pub const FIELDS: &'static [Field] = &[
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Phone,
        Field::DateOfBirth,
        Field::Address,
        Field::City,
        Field::State,
        Field::ZipCode,
    ];

    /// Raw value of one of this section's fields
    pub fn value(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Address => &self.address,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::ZipCode => &self.zip_code,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Phone number reduced to its digits
    pub fn normalized_phone(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").ok()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Step 2: the applicant's finances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialInfo {
    pub employment_status: String,
    pub employer_name: String,
    pub monthly_income: String,
    pub other_income: String,
    pub monthly_expenses: String,
    pub rent_mortgage: String,
    pub other_loans: String,
    pub credit_score: String,
}

impl FinancialInfo {
    pub const FIELDS: &'static [Field] = &[
        Field::EmploymentStatus,
        Field::EmployerName,
        Field::MonthlyIncome,
        Field::OtherIncome,
        Field::MonthlyExpenses,
        Field::RentMortgage,
        Field::OtherLoans,
        Field::CreditScore,
    ];

    /// Raw value of one of this section's fields
    pub fn value(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::EmploymentStatus => &self.employment_status,
            Field::EmployerName => &self.employer_name,
            Field::MonthlyIncome => &self.monthly_income,
            Field::OtherIncome => &self.other_income,
            Field::MonthlyExpenses => &self.monthly_expenses,
            Field::RentMortgage => &self.rent_mortgage,
            Field::OtherLoans => &self.other_loans,
            Field::CreditScore => &self.credit_score,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn credit_score(&self) -> Option<i32> {
        self.credit_score.trim().parse().ok()
    }

    pub fn monthly_income(&self) -> Option<Decimal> {
        parse_decimal(&self.monthly_income)
    }
}

/// Step 3: what the applicant is asking for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoanDetails {
    pub loan_amount: String,
    pub loan_purpose: String,
    /// Months
    pub loan_term: String,
    /// Annual percent
    pub interest_rate: String,
}

impl LoanDetails {
    pub const FIELDS: &'static [Field] = &[
        Field::LoanAmount,
        Field::LoanPurpose,
        Field::LoanTerm,
        Field::InterestRate,
    ];

    /// Raw value of one of this section's fields
    pub fn value(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::LoanAmount => &self.loan_amount,
            Field::LoanPurpose => &self.loan_purpose,
            Field::LoanTerm => &self.loan_term,
            Field::InterestRate => &self.interest_rate,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn amount(&self) -> Option<Decimal> {
        parse_decimal(&self.loan_amount)
    }

    pub fn term_months(&self) -> Option<u32> {
        self.loan_term.trim().parse().ok()
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        parse_decimal(&self.interest_rate)
    }
}
