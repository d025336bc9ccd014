//! Distance-banded shipping and installation pricing.
//!
//! | Zone     | Distance       | Base                         |
//! |----------|----------------|------------------------------|
//! | LOCAL    | ≤ 10 km        | 15 €                         |
//! | REGIONAL | ≤ 30 km        | 30 €                         |
//! | EXTENDED | ≤ 50 km        | 50 €                         |
//! | CUSTOM   | > 50 km        | 1.50 € × km                  |
//!
//! The base is floored at `minimum_shipping_cost`, or at
//! `minimum_with_installation` when the crew also installs. Per-product
//! shipping (or installation) costs are added on top of the floored base.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PricingError;
use crate::types::{ShippingZone, round_money};

/// Largest distance an order can store (`NUMERIC(8,2)`).
pub const MAX_DISTANCE_KM: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, PricingError> {
    a.checked_mul(b).ok_or(PricingError::AmountOverflow)
}

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, PricingError> {
    a.checked_add(b).ok_or(PricingError::AmountOverflow)
}

/// Reject negative distances and distances an order row cannot hold.
///
/// # Errors
///
/// Returns `PricingError::InvalidDistance` outside `0..=MAX_DISTANCE_KM`.
pub fn check_distance(distance_km: Decimal) -> Result<(), PricingError> {
    let negative = distance_km.is_sign_negative() && !distance_km.is_zero();
    if negative || distance_km > MAX_DISTANCE_KM {
        return Err(PricingError::InvalidDistance(distance_km));
    }
    Ok(())
}

/// Tunable shipping bands and floors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Upper bound (km, inclusive) of the local band.
    pub local_zone_max: Decimal,
    /// Flat rate of the local band.
    pub local_zone_rate: Decimal,
    /// Upper bound (km, inclusive) of the regional band.
    pub regional_zone_max: Decimal,
    /// Flat rate of the regional band.
    pub regional_zone_rate: Decimal,
    /// Upper bound (km, inclusive) of the extended band.
    pub extended_zone_max: Decimal,
    /// Flat rate of the extended band.
    pub extended_zone_rate: Decimal,
    /// Per-km rate beyond the extended band.
    pub custom_zone_rate_per_km: Decimal,
    /// Floor for delivery without installation.
    pub minimum_shipping_cost: Decimal,
    /// Floor for delivery with installation.
    pub minimum_with_installation: Decimal,
    /// Address distances are measured from.
    pub base_address: String,
    /// Added for urgent (same/next day) deliveries.
    pub urgent_surcharge: Decimal,
    /// Added for night deliveries or pickups.
    pub night_surcharge: Decimal,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            local_zone_max: Decimal::from(10),
            local_zone_rate: Decimal::from(15),
            regional_zone_max: Decimal::from(30),
            regional_zone_rate: Decimal::from(30),
            extended_zone_max: Decimal::from(50),
            extended_zone_rate: Decimal::from(50),
            custom_zone_rate_per_km: Decimal::new(15, 1),
            minimum_shipping_cost: Decimal::from(20),
            minimum_with_installation: Decimal::from(50),
            base_address: "Valencia, España".to_owned(),
            urgent_surcharge: Decimal::from(50),
            night_surcharge: Decimal::from(30),
        }
    }
}

impl ShippingConfig {
    /// Check that the bands produce prices that never drop as distance grows.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::InvalidConfig` naming the first broken rule.
    pub fn validate(&self) -> Result<(), PricingError> {
        let amounts = [
            ("local_zone_max", self.local_zone_max),
            ("local_zone_rate", self.local_zone_rate),
            ("regional_zone_rate", self.regional_zone_rate),
            ("extended_zone_rate", self.extended_zone_rate),
            ("custom_zone_rate_per_km", self.custom_zone_rate_per_km),
            ("minimum_shipping_cost", self.minimum_shipping_cost),
            ("minimum_with_installation", self.minimum_with_installation),
            ("urgent_surcharge", self.urgent_surcharge),
            ("night_surcharge", self.night_surcharge),
        ];
        if let Some((name, _)) = amounts.iter().find(|(_, v)| v.is_sign_negative()) {
            return Err(PricingError::InvalidConfig(format!("{name} cannot be negative")));
        }

        if !(self.local_zone_max < self.regional_zone_max
            && self.regional_zone_max < self.extended_zone_max)
        {
            return Err(PricingError::InvalidConfig(
                "zone limits must be strictly ascending".to_owned(),
            ));
        }

        if !(self.local_zone_rate <= self.regional_zone_rate
            && self.regional_zone_rate <= self.extended_zone_rate)
        {
            return Err(PricingError::InvalidConfig(
                "zone rates must not decrease with distance".to_owned(),
            ));
        }

        let per_km_at_limit = self
            .custom_zone_rate_per_km
            .checked_mul(self.extended_zone_max)
            .ok_or_else(|| PricingError::InvalidConfig("per-km rate is too large".to_owned()))?;
        if per_km_at_limit < self.extended_zone_rate {
            return Err(PricingError::InvalidConfig(
                "per-km rate beyond the extended zone undercuts the extended rate".to_owned(),
            ));
        }

        Ok(())
    }

    /// Zone a distance falls into. Band limits are inclusive.
    #[must_use]
    pub fn zone_for(&self, distance_km: Decimal) -> ShippingZone {
        if distance_km <= self.local_zone_max {
            ShippingZone::Local
        } else if distance_km <= self.regional_zone_max {
            ShippingZone::Regional
        } else if distance_km <= self.extended_zone_max {
            ShippingZone::Extended
        } else {
            ShippingZone::Custom
        }
    }

    /// Unfloored base rate for a distance.
    ///
    /// # Errors
    ///
    /// Returns `PricingError::AmountOverflow` when the per-km product does
    /// not fit a decimal.
    pub fn base_rate(&self, distance_km: Decimal) -> Result<Decimal, PricingError> {
        Ok(match self.zone_for(distance_km) {
            ShippingZone::Local => self.local_zone_rate,
            ShippingZone::Regional => self.regional_zone_rate,
            ShippingZone::Extended => self.extended_zone_rate,
            ShippingZone::Custom => checked_mul(distance_km, self.custom_zone_rate_per_km)?,
        })
    }
}

/// Per-product logistics costs included in a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingCostLine {
    /// Product shipping cost per unit.
    pub shipping_cost: Decimal,
    /// Product installation cost per unit.
    pub installation_cost: Decimal,
    /// Units shipped.
    pub quantity: i32,
}

/// Quote request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingRequest {
    /// Driving distance from the warehouse.
    pub distance_km: Decimal,
    /// Whether the crew installs the equipment.
    #[serde(default)]
    pub include_installation: bool,
    /// Products being shipped.
    #[serde(default)]
    pub products: Vec<ShippingCostLine>,
    /// Urgent delivery.
    #[serde(default)]
    pub urgent: bool,
    /// Night delivery.
    #[serde(default)]
    pub night: bool,
}

/// Shipping quote breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    /// Distance quoted.
    pub distance_km: Decimal,
    /// Band the distance fell into.
    pub zone: ShippingZone,
    /// Band rate before any floor.
    pub base_rate: Decimal,
    /// Base after the floor that applies to this request.
    pub base_with_minimum: Decimal,
    /// Whether the floor raised the base.
    pub minimum_applied: bool,
    /// Σ product shipping cost × quantity.
    pub product_shipping_cost: Decimal,
    /// Σ product installation cost × quantity.
    pub product_installation_cost: Decimal,
    /// Delivery-only total.
    pub total_shipping_cost: Decimal,
    /// Delivery-with-installation total (zero when not requested).
    pub total_installation_cost: Decimal,
    /// Urgent and night surcharges.
    pub surcharges: Decimal,
    /// Amount charged.
    pub final_cost: Decimal,
    /// Echo of the request flag.
    pub include_installation: bool,
}

/// Price a delivery.
///
/// # Errors
///
/// Returns `PricingError::InvalidDistance` for negative or oversized
/// distances, `PricingError::InvalidQuantity` for product lines with a
/// quantity below 1 and `PricingError::AmountOverflow` when a cost does not
/// fit a decimal.
pub fn quote_shipping(
    config: &ShippingConfig,
    request: &ShippingRequest,
) -> Result<ShippingQuote, PricingError> {
    let distance = request.distance_km;
    check_distance(distance)?;
    if let Some(bad) = request.products.iter().find(|p| p.quantity < 1) {
        return Err(PricingError::InvalidQuantity(bad.quantity));
    }

    let zone = config.zone_for(distance);
    let base_rate = config.base_rate(distance)?;

    let mut product_shipping_cost = Decimal::ZERO;
    let mut product_installation_cost = Decimal::ZERO;
    for p in &request.products {
        let qty = Decimal::from(p.quantity);
        product_shipping_cost =
            checked_add(product_shipping_cost, checked_mul(p.shipping_cost, qty)?)?;
        product_installation_cost =
            checked_add(product_installation_cost, checked_mul(p.installation_cost, qty)?)?;
    }

    let shipping_base = base_rate.max(config.minimum_shipping_cost);
    let total_shipping_cost = checked_add(shipping_base, product_shipping_cost)?;

    let (base_with_minimum, total_installation_cost) = if request.include_installation {
        let install_base = base_rate.max(config.minimum_with_installation);
        (install_base, checked_add(install_base, product_installation_cost)?)
    } else {
        (shipping_base, Decimal::ZERO)
    };

    let mut surcharges = Decimal::ZERO;
    if request.urgent {
        surcharges = checked_add(surcharges, config.urgent_surcharge)?;
    }
    if request.night {
        surcharges = checked_add(surcharges, config.night_surcharge)?;
    }

    let final_cost = checked_add(
        if request.include_installation {
            total_installation_cost
        } else {
            total_shipping_cost
        },
        surcharges,
    )?;

    Ok(ShippingQuote {
        distance_km: distance,
        zone,
        base_rate: round_money(base_rate),
        base_with_minimum: round_money(base_with_minimum),
        minimum_applied: base_with_minimum > base_rate,
        product_shipping_cost: round_money(product_shipping_cost),
        product_installation_cost: round_money(product_installation_cost),
        total_shipping_cost: round_money(total_shipping_cost),
        total_installation_cost: round_money(total_installation_cost),
        surcharges: round_money(surcharges),
        final_cost: round_money(final_cost),
        include_installation: request.include_installation,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn quote(km: &str, install: bool) -> ShippingQuote {
        quote_shipping(
            &ShippingConfig::default(),
            &ShippingRequest {
                distance_km: dec(km),
                include_installation: install,
                ..ShippingRequest::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        ShippingConfig::default().validate().unwrap();
    }

    #[test]
    fn band_limits_are_inclusive() {
        let config = ShippingConfig::default();
        assert_eq!(config.zone_for(dec("0")), ShippingZone::Local);
        assert_eq!(config.zone_for(dec("10")), ShippingZone::Local);
        assert_eq!(config.zone_for(dec("10.01")), ShippingZone::Regional);
        assert_eq!(config.zone_for(dec("30")), ShippingZone::Regional);
        assert_eq!(config.zone_for(dec("50")), ShippingZone::Extended);
        assert_eq!(config.zone_for(dec("50.5")), ShippingZone::Custom);
    }

    #[test]
    fn local_delivery_is_raised_to_the_floor() {
        let q = quote("5", false);
        assert_eq!(q.zone, ShippingZone::Local);
        assert_eq!(q.base_rate, dec("15"));
        assert_eq!(q.base_with_minimum, dec("20"));
        assert!(q.minimum_applied);
        assert_eq!(q.final_cost, dec("20"));
    }

    #[test]
    fn installation_uses_the_higher_floor() {
        let q = quote("20", true);
        assert_eq!(q.base_rate, dec("30"));
        assert_eq!(q.base_with_minimum, dec("50"));
        assert_eq!(q.total_installation_cost, dec("50"));
        assert_eq!(q.final_cost, dec("50"));
        // delivery-only total is still reported
        assert_eq!(q.total_shipping_cost, dec("30"));
    }

    #[test]
    fn custom_zone_is_priced_per_km() {
        let q = quote("120", false);
        assert_eq!(q.zone, ShippingZone::Custom);
        assert_eq!(q.final_cost, dec("180"));
        assert!(!q.minimum_applied);
    }

    #[test]
    fn product_costs_and_surcharges_are_added() {
        let q = quote_shipping(
            &ShippingConfig::default(),
            &ShippingRequest {
                distance_km: dec("25"),
                include_installation: true,
                products: vec![
                    ShippingCostLine {
                        shipping_cost: dec("5"),
                        installation_cost: dec("12.5"),
                        quantity: 2,
                    },
                    ShippingCostLine {
                        shipping_cost: dec("3"),
                        installation_cost: dec("0"),
                        quantity: 1,
                    },
                ],
                urgent: true,
                night: true,
            },
        )
        .unwrap();
        assert_eq!(q.product_shipping_cost, dec("13"));
        assert_eq!(q.product_installation_cost, dec("25"));
        assert_eq!(q.total_shipping_cost, dec("43"));
        assert_eq!(q.total_installation_cost, dec("75"));
        assert_eq!(q.surcharges, dec("80"));
        assert_eq!(q.final_cost, dec("155"));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let err = quote_shipping(
            &ShippingConfig::default(),
            &ShippingRequest {
                distance_km: dec("-1"),
                ..ShippingRequest::default()
            },
        )
        .unwrap_err();
        assert_eq!(err, PricingError::InvalidDistance(dec("-1")));
    }

    #[test]
    fn distance_beyond_column_range_is_rejected() {
        let request = |km: &str| ShippingRequest {
            distance_km: dec(km),
            ..ShippingRequest::default()
        };
        let config = ShippingConfig::default();

        let q = quote_shipping(&config, &request("999999.99")).unwrap();
        assert_eq!(q.final_cost, dec("1499999.99"));

        assert_eq!(
            quote_shipping(&config, &request("1000000")).unwrap_err(),
            PricingError::InvalidDistance(dec("1000000"))
        );
        assert_eq!(
            quote_shipping(&config, &request("79228162514264337593543950335")).unwrap_err(),
            PricingError::InvalidDistance(Decimal::MAX)
        );
    }

    #[test]
    fn huge_rates_and_quantities_fail_instead_of_panicking() {
        let config = ShippingConfig {
            custom_zone_rate_per_km: Decimal::MAX,
            ..ShippingConfig::default()
        };
        let far = ShippingRequest {
            distance_km: dec("100"),
            ..ShippingRequest::default()
        };
        assert_eq!(quote_shipping(&config, &far).unwrap_err(), PricingError::AmountOverflow);

        let bulky = ShippingRequest {
            distance_km: dec("5"),
            products: vec![ShippingCostLine {
                shipping_cost: Decimal::MAX,
                installation_cost: Decimal::ZERO,
                quantity: i32::MAX,
            }],
            ..ShippingRequest::default()
        };
        assert_eq!(
            quote_shipping(&ShippingConfig::default(), &bulky).unwrap_err(),
            PricingError::AmountOverflow
        );
    }

    #[test]
    fn validate_rejects_overflowing_per_km_rate() {
        let config = ShippingConfig {
            custom_zone_rate_per_km: Decimal::MAX,
            ..ShippingConfig::default()
        };
        assert!(matches!(config.validate(), Err(PricingError::InvalidConfig(_))));
    }

    #[test]
    fn cost_never_decreases_with_distance() {
        for install in [false, true] {
            let mut previous = Decimal::ZERO;
            // 0.0 .. 200.0 km in 0.5 km steps
            for step in 0..=400 {
                let km = Decimal::new(step * 5, 1);
                let cost = quote_shipping(
                    &ShippingConfig::default(),
                    &ShippingRequest {
                        distance_km: km,
                        include_installation: install,
                        ..ShippingRequest::default()
                    },
                )
                .unwrap()
                .final_cost;
                assert!(cost >= previous, "cost dropped at {km} km");
                previous = cost;
            }
        }
    }

    #[test]
    fn validate_rejects_per_km_undercut() {
        let config = ShippingConfig {
            custom_zone_rate_per_km: dec("0.5"),
            ..ShippingConfig::default()
        };
        assert!(matches!(config.validate(), Err(PricingError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_unordered_bands() {
        let config = ShippingConfig {
            regional_zone_max: dec("60"),
            ..ShippingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ShippingConfig {
            regional_zone_rate: dec("10"),
            ..ShippingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
