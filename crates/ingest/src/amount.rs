//! Amount formatting.

/// Stroops per lumen (and per unit of any asset).
const ONE: i64 = 10_000_000;

/// Renders a stroop amount with seven decimal places, e.g. `1.5000000`.
pub fn format_amount(stroops: i64) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let one = ONE as u64;
    format!("{}{}.{:07}", sign, abs / one, abs % one)
}
