//! Utility functions and helpers

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a number with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;
    for c in s.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format a money amount as `$1,234.50`, negatives as `-$12.00`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded);
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if amount.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}${}.{}", sign, format_number(whole), cents)
}

/// Label shown for an employee in selectors and rows
pub fn employee_label(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name).trim().to_string()
}

/// Checkbox marker for an approval flag
pub fn approval_marker(approved: bool) -> &'static str {
    if approved { "[x]" } else { "[ ]" }
}
