use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Whether a product can be ordered right now.
///
/// Untracked inventory is always in stock.
pub fn is_in_stock(track_inventory: bool, stock_quantity: i32) -> bool {
    !track_inventory || stock_quantity > 0
}

/// Whole-percent discount of `price` against `compare_price`, rounded down.
///
/// Zero when there is no compare price or it does not exceed `price`.
pub fn discount_percentage(price: Decimal, compare_price: Option<Decimal>) -> u32 {
    match compare_price {
        Some(compare) if compare > price && compare > Decimal::ZERO => {
            ((compare - price) * Decimal::ONE_HUNDRED / compare)
                .floor()
                .to_u32()
                .unwrap_or(0)
        }
        _ => 0,
    }
}
