//! Property tests for price normalization.
//!
//! The stripping rule has to survive arbitrary junk from retailer
//! payloads: whatever goes in, the output is either `None` or a plain
//! numeric string with at most one decimal point.

use proptest::prelude::*;
use shopscout::normalize::clean_price;

proptest! {
    #[test]
    fn clean_price_output_is_always_numeric(input in ".{0,64}") {
        if let Some(out) = clean_price(&input) {
            prop_assert!(!out.is_empty());
            prop_assert!(out.chars().next().unwrap().is_ascii_digit());
            prop_assert!(out.chars().all(|c| c.is_ascii_digit() || c == '.'));
            prop_assert!(out.matches('.').count() <= 1);
            prop_assert!(!out.ends_with('.'));
            prop_assert!(out.parse::<f64>().is_ok());
        }
    }

    #[test]
    fn inputs_with_digits_always_normalize(amount in 1u64..10_000_000) {
        // Any plain integer amount survives currency dressing.
        for dressed in [
            format!("₹{amount}"),
            format!("Rs. {amount}"),
            format!("{amount} only"),
            format!("INR {amount}.00"),
        ] {
            let out = clean_price(&dressed).expect("digits present");
            prop_assert!(out.starts_with(&amount.to_string()));
        }
    }

    #[test]
    fn digit_free_inputs_never_normalize(input in "[^0-9]{0,32}") {
        prop_assert_eq!(clean_price(&input), None);
    }
}
