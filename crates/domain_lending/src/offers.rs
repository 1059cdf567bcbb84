//! Loan offer catalog and comparison
//!
//! An offer is a loan product with eligibility bounds and a base annual rate.
//! Comparison quotes every catalog entry for the applicant's amount, term and
//! credit score. Entries outside their bounds are flagged ineligible but still
//! quoted so they can be shown side by side.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, DomainPort, Money, PortError};

use crate::amortization::{check_term, out_of_range, round_for_display, LoanParameters};
use crate::error::{LendingError, LendingResult};
use crate::rate::{adjust_rate, CreditScore};

/// A candidate loan product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOffer {
    pub offer_id: String,
    pub name: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub min_term: u32,
    pub max_term: u32,
    /// Base annual rate in percent, before credit tier adjustment
    pub base_rate_percent: Decimal,
}

impl LoanOffer {
    /// Returns true when amount and term both sit inside this offer's bounds
    pub fn accepts(&self, principal: Decimal, term_months: u32) -> bool {
        (self.min_amount..=self.max_amount).contains(&principal)
            && (self.min_term..=self.max_term).contains(&term_months)
    }

    /// Checks the offer's own bounds and base rate
    pub fn validate(&self) -> LendingResult<()> {
        let invalid = |reason: String| LendingError::invalid("catalog", format!("offer '{}' {reason}", self.offer_id));
        if self.base_rate_percent < Decimal::ZERO || self.base_rate_percent > dec!(100) {
            return Err(invalid(format!("has base rate {} outside [0, 100]", self.base_rate_percent)));
        }
        if self.min_amount <= Decimal::ZERO || self.min_amount > self.max_amount {
            return Err(invalid(format!("has amount bounds {}..{}", self.min_amount, self.max_amount)));
        }
        if self.min_term == 0 || self.min_term > self.max_term {
            return Err(invalid(format!("has term bounds {}..{}", self.min_term, self.max_term)));
        }
        Ok(())
    }
}

/// A read-only list of offers
///
/// Deserializing validates every offer, so a catalog read from outside never
/// holds an entry the comparison would reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LoanOffer>", into = "Vec<LoanOffer>")]
pub struct OfferCatalog {
    offers: Vec<LoanOffer>,
}

impl OfferCatalog {
    /// Wraps an explicit list of offers
    pub fn new(offers: Vec<LoanOffer>) -> Self {
        Self { offers }
    }

    /// The built-in product line
    pub fn standard() -> Self {
        Self::new(vec![
            offer("personal", "Personal Loan", dec!(1000), dec!(50000), 12, 60, dec!(5.99)),
            offer("business", "Business Loan", dec!(10000), dec!(100000), 12, 84, dec!(6.99)),
            offer("mortgage", "Mortgage", dec!(50000), dec!(500000), 180, 360, dec!(4.99)),
            offer("auto", "Auto Loan", dec!(5000), dec!(75000), 24, 84, dec!(3.99)),
        ])
    }

    /// Parses a catalog from a JSON array of offers
    ///
    /// # Errors
    ///
    /// `InvalidInput` on malformed JSON or an offer failing
    /// [`LoanOffer::validate`].
    pub fn from_json(json: &str) -> LendingResult<Self> {
        let offers: Vec<LoanOffer> =
            serde_json::from_str(json).map_err(|e| LendingError::invalid("catalog", e.to_string()))?;
        Self::try_from(offers)
    }

    pub fn offers(&self) -> &[LoanOffer] {
        &self.offers
    }

    /// Looks up an offer by id
    pub fn get(&self, offer_id: &str) -> Option<&LoanOffer> {
        self.offers.iter().find(|o| o.offer_id == offer_id)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl TryFrom<Vec<LoanOffer>> for OfferCatalog {
    type Error = LendingError;

    fn try_from(offers: Vec<LoanOffer>) -> LendingResult<Self> {
        for offer in &offers {
            offer.validate()?;
        }
        Ok(Self::new(offers))
    }
}

impl From<OfferCatalog> for Vec<LoanOffer> {
    fn from(catalog: OfferCatalog) -> Self {
        catalog.offers
    }
}

fn offer(
    id: &str,
    name: &str,
    min_amount: Decimal,
    max_amount: Decimal,
    min_term: u32,
    max_term: u32,
    base_rate_percent: Decimal,
) -> LoanOffer {
    LoanOffer {
        offer_id: id.to_string(),
        name: name.to_string(),
        min_amount,
        max_amount,
        min_term,
        max_term,
        base_rate_percent,
    }
}

/// A computed quote for one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferQuote {
    pub offer_id: String,
    pub name: String,
    /// Annual rate in percent after the credit tier adjustment
    pub adjusted_rate: Decimal,
    pub monthly_payment: Decimal,
    /// `monthly_payment * term_months`
    pub total_payment: Decimal,
    pub total_interest: Decimal,
    pub eligible: bool,
}

impl OfferQuote {
    /// Returns a copy with money figures rounded to cents
    pub fn rounded(&self) -> Self {
        Self {
            monthly_payment: round_for_display(self.monthly_payment),
            total_payment: round_for_display(self.total_payment),
            total_interest: round_for_display(self.total_interest),
            ..self.clone()
        }
    }

    /// The monthly payment as display money
    pub fn monthly_payment_money(&self, currency: Currency) -> Money {
        Money::new(self.monthly_payment, currency).round_to_currency()
    }
}

/// Quotes every offer for the applicant's figures
///
/// Order follows the catalog. Ineligible offers are returned with
/// `eligible = false` and a fully computed payment.
///
/// # Errors
///
/// `InvalidInput` for a non-positive principal, a term outside
/// [1, `MAX_TERM_MONTHS`], a credit score outside [300, 850], an offer whose
/// base rate is outside [0, 100], or figures too large for a `Decimal`.
pub fn compare_offers(
    principal: Decimal,
    term_months: u32,
    credit_score: i32,
    catalog: &[LoanOffer],
) -> LendingResult<Vec<OfferQuote>> {
    CreditScore::new(credit_score)?;
    if principal <= Decimal::ZERO {
        return Err(LendingError::invalid("principal", "must be greater than zero"));
    }
    check_term(term_months)?;

    let periods = Decimal::from(term_months);
    catalog
        .iter()
        .map(|offer| {
            let adjusted_rate = adjust_rate(offer.base_rate_percent, credit_score)?;
            let monthly_payment = LoanParameters::new(principal, adjusted_rate, term_months)?.monthly_payment()?;
            let total_payment = monthly_payment
                .checked_mul(periods)
                .ok_or_else(|| out_of_range("principal"))?;
            Ok(OfferQuote {
                offer_id: offer.offer_id.clone(),
                name: offer.name.clone(),
                adjusted_rate,
                monthly_payment,
                total_payment,
                total_interest: total_payment - principal,
                eligible: offer.accepts(principal, term_months),
            })
        })
        .collect()
}

/// Source of the offer catalog
#[async_trait]
pub trait OfferCatalogSource: DomainPort {
    /// Fetches the current catalog
    async fn fetch_catalog(&self) -> Result<OfferCatalog, PortError>;
}

/// Serves a fixed catalog
#[derive(Debug, Clone)]
pub struct StaticOfferCatalog {
    catalog: OfferCatalog,
}

impl StaticOfferCatalog {
    pub fn new(catalog: OfferCatalog) -> Self {
        Self { catalog }
    }
}

impl Default for StaticOfferCatalog {
    fn default() -> Self {
        Self::new(OfferCatalog::standard())
    }
}

impl DomainPort for StaticOfferCatalog {}

#[async_trait]
impl OfferCatalogSource for StaticOfferCatalog {
    async fn fetch_catalog(&self) -> Result<OfferCatalog, PortError> {
        Ok(self.catalog.clone())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn comparison_never_drops_offers(
            principal_cents in 1i64..100_000_000i64,
            term in 1u32..=400u32,
            score in 300i32..=850i32
        ) {
            let catalog = OfferCatalog::standard();
            let principal = Decimal::new(principal_cents, 2);
            let quotes = compare_offers(principal, term, score, catalog.offers()).unwrap();
            prop_assert_eq!(quotes.len(), catalog.len());
            for quote in &quotes {
                prop_assert!(quote.monthly_payment > Decimal::ZERO);
            }
        }
    }
}
