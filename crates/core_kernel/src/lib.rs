//! Core Kernel - shared building blocks for the lending crates
//!
//! - [`Money`], [`Currency`] and [`Rate`] over `rust_decimal`
//! - Typed identifiers for loans, applications, users and sessions
//! - [`PortError`] and the [`DomainPort`] marker for external collaborators

pub mod money;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{LoanId, ApplicationId, UserId, SessionKey};
pub use ports::{PortError, DomainPort};
pub use error::CoreError;
