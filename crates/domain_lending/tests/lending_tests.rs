//! End-to-end tests for domain_lending

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, LoanId};
use domain_lending::{
    adjust_rate, build_schedule, compare_offers, monthly_payment, round_for_display,
    LendingError, LoanParameters, OfferCatalog, PaymentStatus, RepaymentPlan,
};

// ============================================================================
// Rate Tiering
// ============================================================================

mod rate_tests {
    use super::*;

    #[test]
    fn test_reference_adjustments() {
        assert_eq!(adjust_rate(dec!(5.99), 820).unwrap(), dec!(3.99));
        assert_eq!(adjust_rate(dec!(5.99), 550).unwrap(), dec!(7.99));
        assert_eq!(adjust_rate(dec!(5.99), 720).unwrap(), dec!(4.99));
        assert_eq!(adjust_rate(dec!(5.99), 650).unwrap(), dec!(5.99));
    }

    #[test]
    fn test_boundary_scores() {
        assert_eq!(adjust_rate(dec!(10), 300).unwrap(), dec!(12));
        assert_eq!(adjust_rate(dec!(10), 850).unwrap(), dec!(8));
    }

    #[test]
    fn test_invalid_base_rate() {
        let err = adjust_rate(dec!(-1), 700).unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput { ref field, .. } if field == "base_rate_percent"));
    }
}

// ============================================================================
// Amortization
// ============================================================================

mod amortization_tests {
    use super::*;

    #[test]
    fn test_reference_loan() {
        let payment = monthly_payment(dec!(10000), dec!(6), 36).unwrap();
        assert_eq!(round_for_display(payment), dec!(304.22));

        let params = LoanParameters::new(dec!(10000), dec!(6), 36).unwrap();
        let schedule = build_schedule(
            LoanId::new(),
            &params,
            payment,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        )
        .unwrap();

        assert_eq!(round_for_display(schedule[0].interest_portion), dec!(50.00));
        assert_eq!(round_for_display(schedule[0].principal_portion), dec!(254.22));
        assert_eq!(round_for_display(schedule[35].remaining_balance), dec!(0.00));
        assert!(schedule.iter().all(|e| e.status == PaymentStatus::Pending));
    }

    #[test]
    fn test_single_period_loan() {
        let params = LoanParameters::new(dec!(500), dec!(12), 1).unwrap();
        let schedule = params.schedule(LoanId::new(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].principal_portion, dec!(500));
        assert_eq!(schedule[0].interest_portion, dec!(5));
        assert_eq!(schedule[0].amount, dec!(505));
        assert_eq!(schedule[0].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_long_mortgage_closes() {
        let params = LoanParameters::new(dec!(350000), dec!(4.99), 360).unwrap();
        let schedule = params.schedule(LoanId::new(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        let repaid: Decimal = schedule.iter().map(|e| e.principal_portion).sum();
        assert!((repaid - dec!(350000)).abs() <= dec!(0.01));
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }
}

// ============================================================================
// Offer Comparison
// ============================================================================

mod comparison_tests {
    use super::*;

    #[test]
    fn test_excellent_credit_lowers_every_quote() {
        let catalog = OfferCatalog::standard();
        let fair = compare_offers(dec!(20000), 48, 650, catalog.offers()).unwrap();
        let excellent = compare_offers(dec!(20000), 48, 810, catalog.offers()).unwrap();

        for (f, e) in fair.iter().zip(&excellent) {
            assert_eq!(f.offer_id, e.offer_id);
            assert!(e.monthly_payment < f.monthly_payment);
            assert_eq!(e.adjusted_rate, f.adjusted_rate - dec!(2));
        }
    }

    #[test]
    fn test_ineligible_offer_still_has_payment() {
        let catalog = OfferCatalog::standard();
        let quotes = compare_offers(dec!(200), 6, 700, catalog.offers()).unwrap();
        assert!(quotes.iter().all(|q| !q.eligible));
        assert!(quotes.iter().all(|q| q.monthly_payment > Decimal::ZERO));
    }

    #[test]
    fn test_display_money() {
        let catalog = OfferCatalog::standard();
        let quotes = compare_offers(dec!(10000), 36, 650, catalog.offers()).unwrap();
        assert_eq!(quotes[0].monthly_payment_money(Currency::USD).to_string(), "$304.17");
    }
}

// ============================================================================
// Repayment Tracking
// ============================================================================

mod repayment_tests {
    use super::*;

    #[test]
    fn test_paying_whole_schedule_settles_loan() {
        let params = LoanParameters::new(dec!(10000), dec!(6), 36).unwrap();
        let mut plan = RepaymentPlan::new(
            LoanId::new(),
            params,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Currency::USD,
        )
        .unwrap();

        assert_eq!(plan.monthly_payment().amount(), dec!(304.22));
        for n in 1..=36 {
            plan.mark_paid(n, Utc::now()).unwrap();
        }
        assert!(plan.is_settled());
        assert!(plan.outstanding_balance().is_zero());
        let expected_total = plan.entries().iter().map(|e| e.amount).sum::<Decimal>();
        assert_eq!(plan.total_paid().amount(), round_for_display(expected_total));
    }
}
