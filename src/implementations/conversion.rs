use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

pub const QUANTITY_DISPLAY_DP: u32 = 6;
pub const PRICE_DISPLAY_DP: u32 = 4;

/// Token quantity bought by `usd_amount` at `unit_price`.
///
/// `None` when there is no usable price or the amount is empty, unparseable or not positive.
/// The result is not rounded; rounding happens only in the `format_*` helpers.
pub fn convert(usd_amount: &str, unit_price: Option<Decimal>) -> Option<Decimal> {
    let price = unit_price.filter(|price| !price.is_zero())?;
    let amount = parse_usd_amount(usd_amount)?;
    if amount <= Decimal::ZERO {
        return None;
    }
    amount.checked_div(price)
}

pub fn parse_usd_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Input filter for the USD field: empty, or a plain non-negative decimal without sign or
/// exponent. Anything else leaves the previous value in place.
pub fn sanitize_usd_input(previous: &str, next: &str) -> String {
    if next.is_empty() {
        return String::new();
    }

    let mut dots = 0;
    let plain = next.chars().all(|ch| match ch {
        '0'..='9' => true,
        '.' => {
            dots += 1;
            dots == 1
        }
        _ => false,
    });

    if plain && next != "." && Decimal::from_str(next).is_ok() {
        next.to_string()
    } else {
        previous.to_string()
    }
}

pub fn format_quantity(quantity: Decimal) -> String {
    format_fixed(quantity, QUANTITY_DISPLAY_DP)
}

pub fn format_unit_price(price: Decimal) -> String {
    format_fixed(price, PRICE_DISPLAY_DP)
}

fn format_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}
