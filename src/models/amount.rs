use crate::error::ProcessingError;

/// Raw units per display unit (1 XRB = 10^30 raw)
pub const RAW_PER_XRB: f64 = 1.0e30;

/// Convert a raw amount string into display units.
///
/// A raw amount of exactly zero is returned as-is without scaling.
/// Exponent notation (`"2e30"`) is accepted alongside plain integers.
/// Raw amounts are whole non-negative numbers; anything else is rejected.
pub fn raw_to_display(raw: &str) -> Result<f64, ProcessingError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProcessingError::InvalidAmount(raw.to_string()))?;

    if !amount.is_finite() || amount.is_sign_negative() || amount.fract() != 0.0 {
        return Err(ProcessingError::InvalidAmount(raw.to_string()));
    }

    if amount != 0.0 {
        Ok(amount / RAW_PER_XRB)
    } else {
        Ok(amount)
    }
}

/// Format a display amount with exactly five decimals
pub fn format_nano(amount: f64) -> String {
    format!("{:.5}", amount)
}
