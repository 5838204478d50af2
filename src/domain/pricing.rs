use crate::protocol::Side;
use std::fmt;
use std::str::FromStr;

/// Execution price rule for a crossed pair of orders.
///
/// The matching loop asks `trade_price` for every match and never looks at
/// the variant itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingPolicy {
    /// Always trade at the best ask, whichever side arrived last.
    #[default]
    SellSide,
    /// Trade at the resting (maker) order's price.
    Maker,
}

impl PricingPolicy {
    #[inline]
    pub fn trade_price(self, aggressor: Side, best_bid: f64, best_ask: f64) -> f64 {
        match self {
            PricingPolicy::SellSide => best_ask,
            PricingPolicy::Maker => match aggressor {
                Side::Buy => best_ask,
                Side::Sell => best_bid,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PricingPolicy::SellSide => "sell-side",
            PricingPolicy::Maker => "maker",
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sell-side" => Ok(PricingPolicy::SellSide),
            "maker" => Ok(PricingPolicy::Maker),
            other => Err(format!("unknown pricing policy '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_side_ignores_aggressor() {
        let policy = PricingPolicy::SellSide;
        assert_eq!(policy.trade_price(Side::Buy, 105.0, 100.0), 100.0);
        assert_eq!(policy.trade_price(Side::Sell, 105.0, 100.0), 100.0);
    }

    #[test]
    fn test_maker_uses_resting_side() {
        let policy = PricingPolicy::Maker;
        assert_eq!(policy.trade_price(Side::Buy, 105.0, 100.0), 100.0);
        assert_eq!(policy.trade_price(Side::Sell, 105.0, 100.0), 105.0);
    }

    #[test]
    fn test_parse_round_trip() {
        for policy in [PricingPolicy::SellSide, PricingPolicy::Maker] {
            assert_eq!(policy.as_str().parse::<PricingPolicy>(), Ok(policy));
        }
        assert!("taker".parse::<PricingPolicy>().is_err());
    }
}
