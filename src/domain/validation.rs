//! Order Validator - Boundary Validation
//!
//! Every request passes through here before the engine assigns it a
//! sequence number or touches a book. A rejected request leaves no trace in
//! engine state.
//!
//! ## Validation Rules
//! - Side must be `buy` or `sell`
//! - Price must be finite and positive, within the configured range
//! - Amount must be positive and not exceed the configured maximum
//! - Asset and user id must not be empty; asset must be allowed when a list is configured
//!
//! ## Usage
//! ```rust
//! use auction_engine::domain::validation::OrderValidator;
//! use auction_engine::protocol::NewOrderRequest;
//!
//! let validator = OrderValidator::new();
//! let request = NewOrderRequest::buy("alice", "BTC", 100.0, 5);
//! assert!(validator.validate(&request).is_ok());
//! ```

use crate::domain::order::Order;
use crate::protocol::{NewOrderRequest, Side};
use std::sync::Arc;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Side is neither buy nor sell
    #[error("Unknown order side: {0:?}")]
    UnknownSide(String),

    /// Price is zero, negative, NaN or infinite
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Asset is empty or not tradable
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Submitter id is empty
    #[error("Invalid user id: {0}")]
    InvalidUser(String),

    #[error("Price out of range: {0}")]
    PriceOutOfRange(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),
}

impl ValidationError {
    /// Stable label for metrics and rejection messages.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::UnknownSide(_) => "unknown_side",
            ValidationError::InvalidPrice(_) => "invalid_price",
            ValidationError::InvalidAmount(_) => "invalid_amount",
            ValidationError::InvalidAsset(_) => "invalid_asset",
            ValidationError::InvalidUser(_) => "invalid_user",
            ValidationError::PriceOutOfRange(_) => "price_out_of_range",
            ValidationError::AmountOutOfRange(_) => "amount_out_of_range",
        }
    }
}

/// Order validation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Minimum price (inclusive); prices must be > 0 regardless
    pub min_price: f64,

    /// Maximum price (inclusive)
    pub max_price: f64,

    /// Maximum amount (inclusive)
    pub max_amount: u64,

    /// Allowed assets (empty means all assets allowed)
    pub allowed_assets: Vec<Arc<str>>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_price: 0.0,
            max_price: f64::MAX,
            max_amount: u64::MAX,
            allowed_assets: Vec::new(),
        }
    }
}

/// A request that passed validation but has not been sequenced yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub user_id: Arc<str>,
    pub asset: String,
    pub side: Side,
    pub price: f64,
    pub amount: u64,
}

impl ValidatedOrder {
    /// Binds the order to its book's asset key and arrival sequence.
    pub fn into_order(self, asset: Arc<str>, sequence: u64) -> Order {
        debug_assert_eq!(asset.as_ref(), self.asset);
        Order::new(self.user_id, asset, self.side, self.price, self.amount, sequence)
    }
}

/// Order validator
#[derive(Debug, Clone, Default)]
pub struct OrderValidator {
    config: ValidationConfig,
}

impl OrderValidator {
    /// Creates a new validator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new validator with custom configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validates an order request
    ///
    /// # Returns
    /// * `Ok(ValidatedOrder)` if the order is valid
    /// * `Err(ValidationError)` for the first rule it breaks
    pub fn validate(&self, request: &NewOrderRequest) -> Result<ValidatedOrder, ValidationError> {
        let side: Side = request.order_type.parse()?;
        self.validate_price(request.price)?;
        let amount = self.validate_amount(request.amount)?;
        self.validate_asset(&request.asset)?;

        if request.user_id.is_empty() {
            return Err(ValidationError::InvalidUser(
                "User id cannot be empty".to_string(),
            ));
        }

        Ok(ValidatedOrder {
            user_id: Arc::from(request.user_id.as_str()),
            asset: request.asset.clone(),
            side,
            price: request.price,
            amount,
        })
    }

    fn validate_price(&self, price: f64) -> Result<(), ValidationError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(ValidationError::InvalidPrice(format!(
                "Price must be a positive finite number, got {}",
                price
            )));
        }

        if price < self.config.min_price {
            return Err(ValidationError::PriceOutOfRange(format!(
                "Price {} is below minimum {}",
                price, self.config.min_price
            )));
        }

        if price > self.config.max_price {
            return Err(ValidationError::PriceOutOfRange(format!(
                "Price {} exceeds maximum {}",
                price, self.config.max_price
            )));
        }

        Ok(())
    }

    fn validate_amount(&self, amount: i64) -> Result<u64, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::InvalidAmount(format!(
                "Amount must be greater than zero, got {}",
                amount
            )));
        }

        let amount = amount as u64;
        if amount > self.config.max_amount {
            return Err(ValidationError::AmountOutOfRange(format!(
                "Amount {} exceeds maximum {}",
                amount, self.config.max_amount
            )));
        }

        Ok(amount)
    }

    fn validate_asset(&self, asset: &str) -> Result<(), ValidationError> {
        if asset.is_empty() {
            return Err(ValidationError::InvalidAsset(
                "Asset cannot be empty".to_string(),
            ));
        }

        if !self.config.allowed_assets.is_empty()
            && !self.config.allowed_assets.iter().any(|a| a.as_ref() == asset)
        {
            return Err(ValidationError::InvalidAsset(format!(
                "Asset '{}' is not in allowed list",
                asset
            )));
        }

        Ok(())
    }
}
