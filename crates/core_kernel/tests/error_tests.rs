//! Tests for core error types

use core_kernel::{CoreError, Currency, Money, MoneyError, PortError};
use rust_decimal_macros::dec;

#[test]
fn test_money_error_converts_into_core_error() {
    let usd = Money::new(dec!(5), Currency::USD);
    let gbp = Money::new(dec!(5), Currency::GBP);

    let err: CoreError = usd.checked_add(&gbp).unwrap_err().into();
    assert!(matches!(
        err,
        CoreError::Money(MoneyError::CurrencyMismatch(Currency::USD, Currency::GBP))
    ));
    assert_eq!(err.to_string(), "Money error: Cannot combine USD with GBP");
}

#[test]
fn test_configuration_error_message() {
    let err = CoreError::configuration("missing LOANAPP_CURRENCY");
    assert_eq!(err.to_string(), "Configuration error: missing LOANAPP_CURRENCY");
}

#[test]
fn test_port_error_display() {
    let err = PortError::UnsupportedType {
        mime_type: "text/plain".to_string(),
    };
    assert_eq!(err.to_string(), "Unsupported type: text/plain");
    assert!(!err.is_transient());
}
