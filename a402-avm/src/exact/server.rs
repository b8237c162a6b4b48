//! Server role of the AVM exact scheme.
//!
//! Turns route prices into atomic USDC amounts and enriches payment
//! requirements with the data clients need: token decimals, the
//! facilitator's optional fee payer, and the genesis binding of the network.

use rust_decimal::Decimal;
use serde_json::Value;

use a402::scheme::{AssetAmount, Price, SchemeError, SchemeId, SchemeServer};
use a402_proto::{PaymentRequirements, SupportedKind};

use crate::constants::{DEFAULT_DECIMALS, SCHEME_EXACT};
use crate::networks;
use crate::utils::{parse_money_to_decimal, to_atomic_amount};

/// Custom money parser: converts a decimal amount on a network into an
/// [`AssetAmount`], or passes (`None`) to the next parser in the chain.
pub type MoneyParser = Box<dyn Fn(Decimal, &str) -> Option<AssetAmount> + Send + Sync>;

/// Server role of the AVM exact scheme.
///
/// Money prices resolve through a parser chain in registration order; the
/// first parser that returns an amount wins. With no custom parsers, prices
/// are read as USD and converted to USDC at six decimals. Explicit
/// [`Price::Amount`] values pass through with the network's USDC deployment
/// as the default asset.
#[derive(Default)]
pub struct ExactAvmServer {
    money_parsers: Vec<MoneyParser>,
}

impl std::fmt::Debug for ExactAvmServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactAvmServer")
            .field("money_parsers", &self.money_parsers.len())
            .finish()
    }
}

impl ExactAvmServer {
    /// Creates the server role with an empty parser chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a custom money parser to the chain.
    #[must_use]
    pub fn with_money_parser(mut self, parser: MoneyParser) -> Self {
        self.money_parsers.push(parser);
        self
    }

    fn default_money_conversion(
        amount: Decimal,
        network: &str,
    ) -> Result<AssetAmount, SchemeError> {
        let asa_id = networks::usdc_asa_id(network)?;
        let atomic = to_atomic_amount(amount, DEFAULT_DECIMALS)?;

        Ok(AssetAmount {
            amount: atomic.to_string(),
            asset: asa_id.to_string(),
            extra: Some(serde_json::json!({"decimals": DEFAULT_DECIMALS})),
        })
    }
}

impl SchemeId for ExactAvmServer {
    fn scheme(&self) -> &str {
        SCHEME_EXACT
    }

    fn caip_family(&self) -> &str {
        "algorand:*"
    }
}

impl SchemeServer for ExactAvmServer {
    fn parse_price(&self, price: &Price, network: &str) -> Result<AssetAmount, SchemeError> {
        let money = match price {
            Price::Amount { amount, asset, extra } => {
                let asset = match asset {
                    Some(asset) => asset.clone(),
                    None => networks::usdc_asa_id(network)?.to_string(),
                };
                return Ok(AssetAmount {
                    amount: amount.clone(),
                    asset,
                    extra: extra
                        .clone()
                        .or_else(|| Some(serde_json::json!({"decimals": DEFAULT_DECIMALS}))),
                });
            }
            Price::Money(value) => value,
        };

        let decimal_amount = parse_money_to_decimal(money)?;

        for parser in &self.money_parsers {
            if let Some(result) = parser(decimal_amount, network) {
                return Ok(result);
            }
        }

        Self::default_money_conversion(decimal_amount, network)
    }

    fn enhance_payment_requirements(
        &self,
        mut requirements: PaymentRequirements,
        supported_kind: &SupportedKind,
        _extension_keys: &[String],
    ) -> PaymentRequirements {
        let mut extra = match requirements.extra.take() {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        if !extra.contains_key("decimals") {
            extra.insert("decimals".into(), DEFAULT_DECIMALS.into());
        }

        // Fee abstraction is optional on AVM: propagate the facilitator's
        // fee payer only when it advertises one.
        if let Some(fee_payer) = supported_kind
            .extra
            .as_ref()
            .and_then(|e| e.get("feePayer"))
            .and_then(Value::as_str)
        {
            extra.insert("feePayer".into(), fee_payer.into());
        }

        if let Ok(config) = networks::network_config(&requirements.network) {
            if !extra.contains_key("genesisHash") {
                extra.insert("genesisHash".into(), config.genesis_hash.into());
            }
            if !extra.contains_key("genesisId") {
                extra.insert("genesisId".into(), config.genesis_id.into());
            }
        }

        requirements.extra = Some(Value::Object(extra));
        requirements
    }
}
