/// Bytes per second in one decimal megabit per second (10^6 / 8).
pub const BYTES_PER_MEGABIT: f64 = 125_000.0;

/// Convert a byte rate into megabits per second with two decimal places.
///
/// Ties round away from zero, so `15_625` B/s (0.125 Mbps) reads `0.13`.
pub fn to_megabits(bytes_per_second: f64) -> String {
    let megabits = bytes_per_second / BYTES_PER_MEGABIT;

    format!("{:.2}", (megabits * 100.0).round() / 100.0)
}

/// Round to the nearest integer, ties away from zero.
pub fn whole(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_megabits_known_values() {
        assert_eq!(to_megabits(0.0), "0.00");
        assert_eq!(to_megabits(125_000.0), "1.00");
        assert_eq!(to_megabits(62_500.0), "0.50");
        assert_eq!(to_megabits(12_500_000.0), "100.00");
        assert_eq!(to_megabits(20_000_000.0), "160.00");
    }

    #[test]
    fn test_to_megabits_rounds_ties_up() {
        assert_eq!(to_megabits(15_625.0), "0.13");
    }

    #[test]
    fn test_whole() {
        assert_eq!(whole(12.4), 12);
        assert_eq!(whole(1.2), 1);
        assert_eq!(whole(0.5), 1);
        assert_eq!(whole(2.5), 3);
        assert_eq!(whole(0.0), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: the output always carries exactly two decimals and
        /// stays within half a hundredth of the exact quotient.
        #[test]
        fn prop_to_megabits_precision(bytes in 0.0f64..1e12) {
            let formatted = to_megabits(bytes);

            let dot_pos = formatted.find('.');
            prop_assert!(dot_pos.is_some(), "No decimal point in {}", formatted);
            prop_assert_eq!(formatted.len() - dot_pos.unwrap() - 1, 2);

            let parsed: f64 = formatted.parse().unwrap();
            let exact = bytes / BYTES_PER_MEGABIT;
            prop_assert!(
                (parsed - exact).abs() <= 0.005 + 1e-6 * exact.max(1.0),
                "{} is too far from {}",
                parsed,
                exact
            );
        }
    }
}
