//! # Checkout Wizard
//!
//! The three-step checkout flow as a small state machine.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐ submit_address ┌─────────┐ submit_payment ┌─────────┐    │
//! │   │ Address │ ──────────────►│ Payment │ ──────────────►│ Review  │    │
//! │   └─────────┘                └─────────┘                └─────────┘    │
//! │        ▲                          ▲  │                       │         │
//! │        │         back_to          │  │       back_to         │         │
//! │        └──────────────────────────┴──┴───────────────────────┘         │
//! │                                                                         │
//! │   Forward moves only through the current step's form. No skipping.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is persisted. Placing the order (medmart-store) consumes the
//! [`OrderDraft`] produced by [`CheckoutWizard::review`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_card_number, validate_cvc, validate_expiry, validate_optional, validate_required,
};

// =============================================================================
// Steps
// =============================================================================

/// Position in the checkout flow. Ordered: `Address < Payment < Review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CheckoutStep {
    Address,
    Payment,
    Review,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Address => "address",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Review => "review",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Raw shipping address form, as typed by the buyer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AddressForm {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// A validated, trimmed shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressForm {
    /// Validates every field; all but `line2` are required.
    pub fn validate(&self) -> Result<ShippingAddress, ValidationError> {
        Ok(ShippingAddress {
            full_name: validate_required("full name", &self.full_name, 120)?,
            line1: validate_required("address line 1", &self.line1, 200)?,
            line2: validate_optional("address line 2", self.line2.as_deref(), 200)?,
            city: validate_required("city", &self.city, 100)?,
            region: validate_required("region", &self.region, 100)?,
            postal_code: validate_required("postal code", &self.postal_code, 20)?,
            country: validate_required("country", &self.country, 60)?,
        })
    }
}

/// Raw payment form. The full card number never leaves this struct.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentForm {
    pub cardholder_name: String,
    pub card_number: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvc: String,
}

// Keep card data out of logs.
impl fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentForm")
            .field("cardholder_name", &self.cardholder_name)
            .field("card_number", &"****")
            .field("expiry", &self.expiry)
            .field("cvc", &"***")
            .finish()
    }
}

/// Card network, detected from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Other,
}

impl CardBrand {
    /// Detects the brand from a digits-only card number.
    pub fn detect(digits: &str) -> Self {
        let prefix2: u32 = digits.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
        let prefix4: u32 = digits.get(..4).and_then(|p| p.parse().ok()).unwrap_or(0);

        if digits.starts_with('4') {
            CardBrand::Visa
        } else if (51..=55).contains(&prefix2) || (2221..=2720).contains(&prefix4) {
            CardBrand::Mastercard
        } else if prefix2 == 34 || prefix2 == 37 {
            CardBrand::Amex
        } else if prefix4 == 6011 || prefix2 == 65 {
            CardBrand::Discover
        } else {
            CardBrand::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Other => "other",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What survives of the payment form after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentSummary {
    pub cardholder_name: String,
    pub brand: CardBrand,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
}

impl PaymentForm {
    /// Validates the form against `today` and reduces it to a summary.
    pub fn validate(&self, today: NaiveDate) -> Result<PaymentSummary, ValidationError> {
        let cardholder_name = validate_required("cardholder name", &self.cardholder_name, 120)?;
        let digits = validate_card_number(&self.card_number)?;
        let (exp_month, exp_year) = validate_expiry(&self.expiry, today)?;
        validate_cvc(&self.cvc)?;

        Ok(PaymentSummary {
            cardholder_name,
            brand: CardBrand::detect(&digits),
            last4: digits[digits.len() - 4..].to_string(),
            exp_month,
            exp_year,
        })
    }
}

// =============================================================================
// Wizard
// =============================================================================

/// Everything needed to place an order, produced at the review step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDraft {
    pub address: ShippingAddress,
    pub payment: PaymentSummary,
}

/// The checkout state machine.
///
/// ## Invariants
/// - `step == Payment` implies an address has been accepted
/// - `step == Review` implies address and payment have been accepted
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    address: Option<ShippingAddress>,
    payment: Option<PaymentSummary>,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    pub fn new() -> Self {
        CheckoutWizard {
            step: CheckoutStep::Address,
            address: None,
            payment: None,
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The last accepted address, kept when moving back so forms can be prefilled.
    pub fn address(&self) -> Option<&ShippingAddress> {
        self.address.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentSummary> {
        self.payment.as_ref()
    }

    fn require(&self, step: CheckoutStep, action: &str) -> CoreResult<()> {
        if self.step != step {
            return Err(CoreError::InvalidCheckoutStep {
                current: self.step,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// Accepts the address form and advances to `Payment`.
    ///
    /// ## Errors
    /// - `InvalidCheckoutStep` unless at `Address`
    /// - `Validation` if any required field is blank; the step does not change
    pub fn submit_address(&mut self, form: &AddressForm) -> CoreResult<()> {
        self.require(CheckoutStep::Address, "submit address")?;
        self.address = Some(form.validate()?);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Accepts the payment form and advances to `Review`.
    pub fn submit_payment(&mut self, form: &PaymentForm, today: NaiveDate) -> CoreResult<()> {
        self.require(CheckoutStep::Payment, "submit payment")?;
        self.payment = Some(form.validate(today)?);
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Returns to an earlier step. Moving forward or staying put is rejected.
    pub fn back_to(&mut self, step: CheckoutStep) -> CoreResult<()> {
        if step >= self.step {
            return Err(CoreError::InvalidCheckoutStep {
                current: self.step,
                action: format!("go back to {}", step),
            });
        }
        self.step = step;
        Ok(())
    }

    /// The order draft, available only at `Review`.
    pub fn review(&self) -> CoreResult<OrderDraft> {
        self.require(CheckoutStep::Review, "review order")?;

        match (&self.address, &self.payment) {
            (Some(address), Some(payment)) => Ok(OrderDraft {
                address: address.clone(),
                payment: payment.clone(),
            }),
            // unreachable while the invariants hold
            _ => Err(CoreError::InvalidCheckoutStep {
                current: self.step,
                action: "review order".to_string(),
            }),
        }
    }

    /// Starts over, discarding all entered data.
    pub fn reset(&mut self) {
        *self = CheckoutWizard::new();
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub flat_cents: i64,
    /// Subtotals at or above this ship free.
    pub free_threshold_cents: i64,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        ShippingPolicy {
            flat_cents: 999,
            free_threshold_cents: 10_000,
        }
    }
}

impl ShippingPolicy {
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal.cents() >= self.free_threshold_cents {
            Money::zero()
        } else {
            Money::from_cents(self.flat_cents)
        }
    }

    pub fn quote(&self, cart: &Cart) -> OrderQuote {
        let subtotal = cart.subtotal();
        let shipping = self.shipping_for(subtotal);
        OrderQuote {
            subtotal_cents: subtotal.cents(),
            shipping_cents: shipping.cents(),
            total_cents: (subtotal + shipping).cents(),
        }
    }
}

/// Price breakdown shown on the review step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderQuote {
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
