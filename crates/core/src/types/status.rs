//! Status and classification enums.
//!
//! Each enum serializes as `SCREAMING_SNAKE_CASE` (the values the frontend and
//! the database share) and, with the `postgres` feature, maps to a Postgres
//! enum type of the same name as in the migrations.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `Display` and `FromStr` from one variant/string table.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire/database representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }
    };
}

/// Customer tier. VIP tiers get rental discounts and never pay a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_level", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserLevel {
    #[default]
    Standard,
    Vip,
    VipPlus,
}

string_enum!(UserLevel {
    Standard => "STANDARD",
    Vip => "VIP",
    VipPlus => "VIP_PLUS",
});

impl UserLevel {
    /// Whether this tier is exempt from deposits.
    #[must_use]
    pub const fn is_vip(self) -> bool {
        matches!(self, Self::Vip | Self::VipPlus)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Client,
    Commercial,
    Admin,
    Superadmin,
}

string_enum!(UserRole {
    Client => "CLIENT",
    Commercial => "COMMERCIAL",
    Admin => "ADMIN",
    Superadmin => "SUPERADMIN",
});

/// Order lifecycle status. Transitions are defined in [`crate::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
    Returned,
}

string_enum!(OrderStatus {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Preparing => "PREPARING",
    Ready => "READY",
    InTransit => "IN_TRANSIT",
    Delivered => "DELIVERED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Returned => "RETURNED",
});

/// Deposit (fianza) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "deposit_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    #[default]
    Pending,
    Held,
    Released,
    Waived,
}

string_enum!(DepositStatus {
    Pending => "PENDING",
    Held => "HELD",
    Released => "RELEASED",
    Waived => "WAIVED",
});

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    PartiallyPaid,
    Paid,
    Refunded,
}

string_enum!(PaymentStatus {
    Pending => "PENDING",
    PartiallyPaid => "PARTIALLY_PAID",
    Paid => "PAID",
    Refunded => "REFUNDED",
});

/// Pack category enum. `Montaje` marks installation/transport add-ons and
/// must agree with the pack's category reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "pack_category", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackCategory {
    #[default]
    Eventos,
    Bodas,
    Fiestas,
    Conferencias,
    Montaje,
    Otros,
}

string_enum!(PackCategory {
    Eventos => "EVENTOS",
    Bodas => "BODAS",
    Fiestas => "FIESTAS",
    Conferencias => "CONFERENCIAS",
    Montaje => "MONTAJE",
    Otros => "OTROS",
});

/// Whether a product is held in stock or sourced per booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "stock_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    #[default]
    InStock,
    OnDemand,
}

string_enum!(StockStatus {
    InStock => "IN_STOCK",
    OnDemand => "ON_DEMAND",
});

/// Product availability status derived from stock movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Available,
    OutOfStock,
    Maintenance,
    Discontinued,
}

string_enum!(ProductStatus {
    Available => "AVAILABLE",
    OutOfStock => "OUT_OF_STOCK",
    Maintenance => "MAINTENANCE",
    Discontinued => "DISCONTINUED",
});

/// Shipping distance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingZone {
    Local,
    Regional,
    Extended,
    Custom,
}

string_enum!(ShippingZone {
    Local => "LOCAL",
    Regional => "REGIONAL",
    Extended => "EXTENDED",
    Custom => "CUSTOM",
});

/// How the customer receives the equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    #[default]
    Pickup,
    Delivery,
}

string_enum!(DeliveryType {
    Pickup => "PICKUP",
    Delivery => "DELIVERY",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        for level in UserLevel::ALL {
            assert_eq!(level.to_string().parse::<UserLevel>().unwrap(), *level);
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("vip_plus".parse::<UserLevel>().unwrap(), UserLevel::VipPlus);
        assert_eq!(" montaje ".parse::<PackCategory>().unwrap(), PackCategory::Montaje);
        assert!("GOLD".parse::<UserLevel>().is_err());
    }

    #[test]
    fn serde_matches_string_forms() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"IN_TRANSIT\"");
        let level: UserLevel = serde_json::from_str("\"VIP_PLUS\"").unwrap();
        assert_eq!(level, UserLevel::VipPlus);
    }

    #[test]
    fn only_vip_tiers_are_vip() {
        assert!(UserLevel::Vip.is_vip());
        assert!(UserLevel::VipPlus.is_vip());
        assert!(!UserLevel::Standard.is_vip());
    }
}
