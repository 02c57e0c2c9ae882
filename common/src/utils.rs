use primitive_types::U256;

use crate::config::{ETHER, GWEI};

// Render `value / 10^decimals` with trailing zeros trimmed
fn format_units(value: U256, unit: U256) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction.is_zero() {
        return whole.to_string();
    }

    let width = unit.to_string().len() - 1;
    let fraction = format!("{:0>width$}", fraction.to_string(), width = width);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Format an amount of wei as coins
pub fn format_ether(value: U256) -> String {
    format_units(value, U256::from(ETHER))
}

/// Format an amount of wei as gwei
pub fn format_gwei(value: U256) -> String {
    format_units(value, U256::from(GWEI))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(U256::from(ETHER) * 3), "3");
        assert_eq!(format_ether(U256::from(ETHER / 2)), "0.5");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(format_ether(U256::zero()), "0");
    }

    #[test]
    fn test_format_gwei() {
        assert_eq!(format_gwei(U256::from(770_151_733_000u64)), "770.151733");
        assert_eq!(format_gwei(U256::from(GWEI)), "1");
    }
}
