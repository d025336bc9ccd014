//! Business conventions the schema does not enforce.
//!
//! Each check inspects one row's worth of data and returns the violations it
//! finds. The operator CLI reports these and its repair passes fix exactly
//! what they describe.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{PackPricingInput, PricingError, calculate_pack_price};
use crate::stock::{StockFix, StockLevels};
use crate::types::{CategoryId, OrderId, PackCategory, PackId, ProductId, UserLevel};

/// A broken convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A VIP customer's order carries a deposit.
    VipDeposit {
        order_id: OrderId,
        level: UserLevel,
        deposit_amount: Decimal,
    },
    /// `real_stock` is null.
    NullRealStock { product_id: ProductId, stock: i32 },
    /// `available_stock` is negative or above the physical count.
    AvailableOutOfRange {
        product_id: ProductId,
        available_stock: i32,
        physical: i32,
    },
    /// Pack category enum disagrees with its category reference.
    MontajeMismatch {
        pack_id: PackId,
        category: PackCategory,
        category_ref: Option<CategoryId>,
        montaje_category: CategoryId,
    },
    /// Stored final price differs from the recomputed one.
    PackPriceDrift {
        pack_id: PackId,
        stored: Decimal,
        computed: Decimal,
    },
}

impl Violation {
    /// Short machine-friendly label, used to group report lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::VipDeposit { .. } => "vip_deposit",
            Self::NullRealStock { .. } => "null_real_stock",
            Self::AvailableOutOfRange { .. } => "available_out_of_range",
            Self::MontajeMismatch { .. } => "montaje_mismatch",
            Self::PackPriceDrift { .. } => "pack_price_drift",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VipDeposit {
                order_id,
                level,
                deposit_amount,
            } => write!(f, "order {order_id} ({level}) has deposit {deposit_amount}, expected 0"),
            Self::NullRealStock { product_id, stock } => {
                write!(f, "product {product_id} has no real_stock (stock = {stock})")
            }
            Self::AvailableOutOfRange {
                product_id,
                available_stock,
                physical,
            } => write!(
                f,
                "product {product_id} has available_stock {available_stock} outside 0..={physical}"
            ),
            Self::MontajeMismatch {
                pack_id,
                category,
                category_ref,
                montaje_category,
            } => {
                let reference = category_ref.map_or_else(|| "none".to_owned(), |c| c.to_string());
                write!(
                    f,
                    "pack {pack_id} is {category} but references category {reference} \
                     (Montaje is {montaje_category})"
                )
            }
            Self::PackPriceDrift {
                pack_id,
                stored,
                computed,
            } => write!(f, "pack {pack_id} stores {stored}, recomputed {computed}"),
        }
    }
}

/// VIP orders never carry a deposit.
#[must_use]
pub fn check_order_deposit(
    order_id: OrderId,
    level: UserLevel,
    deposit_amount: Decimal,
) -> Option<Violation> {
    (level.is_vip() && !deposit_amount.is_zero()).then_some(Violation::VipDeposit {
        order_id,
        level,
        deposit_amount,
    })
}

/// Stock counters must be backfilled and in range.
#[must_use]
pub fn check_product_stock(product_id: ProductId, levels: &StockLevels) -> Vec<Violation> {
    levels
        .problems()
        .into_iter()
        .map(|fix| match fix {
            StockFix::BackfilledRealStock { .. } => Violation::NullRealStock {
                product_id,
                stock: levels.stock,
            },
            StockFix::ClampedAvailable { from, .. } => Violation::AvailableOutOfRange {
                product_id,
                available_stock: from,
                physical: levels.physical(),
            },
        })
        .collect()
}

/// Change that brings a pack's category fields back in agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "set", rename_all = "snake_case")]
pub enum MontajeFix {
    /// The pack references Montaje; set the enum.
    Category(PackCategory),
    /// The enum says Montaje; point the reference at the Montaje category.
    CategoryRef(CategoryId),
}

/// A pack references the Montaje category if and only if its enum is
/// `MONTAJE`. The reference is authoritative when both are set.
#[must_use]
pub fn montaje_fix(
    category: PackCategory,
    category_ref: Option<CategoryId>,
    montaje_category: CategoryId,
) -> Option<MontajeFix> {
    let references_montaje = category_ref == Some(montaje_category);
    let is_montaje = category == PackCategory::Montaje;
    match (references_montaje, is_montaje) {
        (true, false) => Some(MontajeFix::Category(PackCategory::Montaje)),
        (false, true) => Some(MontajeFix::CategoryRef(montaje_category)),
        _ => None,
    }
}

#[must_use]
pub fn check_pack_category(
    pack_id: PackId,
    category: PackCategory,
    category_ref: Option<CategoryId>,
    montaje_category: CategoryId,
) -> Option<Violation> {
    montaje_fix(category, category_ref, montaje_category).map(|_| Violation::MontajeMismatch {
        pack_id,
        category,
        category_ref,
        montaje_category,
    })
}

/// Auto-calculated packs without a custom price must store the price the
/// composition rule yields.
///
/// # Errors
///
/// Propagates `PricingError` from the composition rule.
pub fn check_pack_price(
    pack_id: PackId,
    auto_calculate: bool,
    stored_final_price: Decimal,
    input: &PackPricingInput,
) -> Result<Option<Violation>, PricingError> {
    if !auto_calculate || input.custom_price_enabled {
        return Ok(None);
    }
    let computed = calculate_pack_price(input)?.final_price;
    Ok((computed != stored_final_price).then_some(Violation::PackPriceDrift {
        pack_id,
        stored: stored_final_price,
        computed,
    }))
}
