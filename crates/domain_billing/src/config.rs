//! Billing configuration

use serde::Deserialize;

use crate::allocation::{PaymentAllocator, DEFAULT_AMOUNT_SCALE};
use crate::error::BillingError;
use crate::reconcile::PaymentReconciler;
use crate::validation::{validate_usage, MAX_USAGE_DAYS};

/// Billing configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Usage given to a member who has no usage recorded yet
    pub default_usage_days: u32,
    /// Decimal places shares are rounded to
    pub amount_scale: u32,
    /// Split the total as soon as a bill is created
    pub allocate_on_create: bool,
    /// Resolve every user before changing any payment
    pub staged_reconciliation: bool,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_usage_days: MAX_USAGE_DAYS,
            amount_scale: DEFAULT_AMOUNT_SCALE,
            allocate_on_create: false,
            staged_reconciliation: false,
        }
    }
}

impl BillingConfig {
    /// Loads configuration from `BILLING_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(config::Environment::with_prefix("BILLING"))
    }

    fn load(environment: config::Environment) -> Result<Self, config::ConfigError> {
        let loaded: Self = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        loaded
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(loaded)
    }

    /// Checks values the domain constrains
    pub fn validate(&self) -> Result<(), BillingError> {
        validate_usage(self.default_usage_days)
    }

    /// Allocator rounding to the configured scale
    pub fn allocator(&self) -> PaymentAllocator {
        PaymentAllocator::with_scale(self.amount_scale)
    }

    /// Reconciler inserting the configured default usage
    pub fn reconciler(&self) -> Result<PaymentReconciler, BillingError> {
        PaymentReconciler::with_default_usage(self.default_usage_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        config::Environment::with_prefix("BILLING").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.default_usage_days, 31);
        assert_eq!(config.amount_scale, 2);
        assert!(!config.allocate_on_create);
        assert!(!config.staged_reconciliation);
        assert_eq!(config.allocator().scale(), 2);
        assert_eq!(config.reconciler().unwrap().default_usage_days(), 31);
    }

    #[test]
    fn test_partial_source_keeps_defaults() {
        let config = BillingConfig::load(environment(&[("BILLING_AMOUNT_SCALE", "3")])).unwrap();

        assert_eq!(config.amount_scale, 3);
        assert_eq!(config.default_usage_days, 31);
    }

    #[test]
    fn test_default_usage_out_of_range_is_rejected() {
        let result = BillingConfig::load(environment(&[("BILLING_DEFAULT_USAGE_DAYS", "400")]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("between 0 and 31, got 400"));

        let config = BillingConfig {
            default_usage_days: 32,
            ..BillingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BillingError::UsageOutOfRange { value: 32, max: 31 })
        ));
        assert!(config.reconciler().is_err());
    }
}
