/// Edge length (mm) above which the 10% oversize surcharge applies.
pub const OVERSIZE_EDGE_MM: f64 = 350.0;
/// Edge length (mm) above which the flat long-edge surcharge applies.
pub const LONG_EDGE_MM: f64 = 990.0;
/// Flat surcharge added for a long edge.
pub const LONG_EDGE_SURCHARGE: f64 = 200.0;
/// Surcharge for every constituent beyond the first in a merged part.
pub const EXTRA_PART_SURCHARGE: f64 = 25.0;

/// Price of one cut part of `width_mm` x `height_mm`, optionally made of
/// `part_count` merged constituents.
///
/// Both size surcharges are judged on the raw dimensions. The multiplicative
/// oversize surcharge is applied before any flat addition.
pub fn price(width_mm: f64, height_mm: f64, part_count: u32) -> f64 {
    let mut base =
        (((width_mm * height_mm * 1.5 * 8.0) / 1_000_000.0) * 35.0 * 2.5 + 200.0) * 1.8 * 0.9166;

    if width_mm > OVERSIZE_EDGE_MM || height_mm > OVERSIZE_EDGE_MM {
        base *= 1.10;
    }

    if width_mm > LONG_EDGE_MM || height_mm > LONG_EDGE_MM {
        base += LONG_EDGE_SURCHARGE;
    }

    if part_count > 1 {
        base += f64::from(part_count - 1) * EXTRA_PART_SURCHARGE;
    }
    base
}

/// Finishes offered on the order form, as (name, swatch hex).
pub const FINISHES: [(&str, &str); 16] = [
    ("Black", "#000000"),
    ("Antique", "#bfa24a"),
    ("Yellow", "#f4c430"),
    ("Red", "#ff0000"),
    ("Metallic Blue", "#3f6fa0"),
    ("Metallic Brown", "#6b4f3f"),
    ("Cream", "#f5f0dc"),
    ("Orange", "#ff7a00"),
    ("Copper", "#a44413"),
    ("Grey", "#808080"),
    ("White", "#ffffff"),
    ("Gold Patina", "#bfa24a"),
    ("Silver Patina", "#bfc3c7"),
    ("Copper Patina", "#a44413"),
    ("Crackle Black", "#1c1c1c"),
    ("Crackle Cream", "#e6dcc8"),
];

/// Swatch for a catalog finish, matched case-insensitively.
pub fn finish_hex(name: &str) -> Option<&'static str> {
    let name = name.trim();
    FINISHES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, hex)| *hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base_formula(w: f64, h: f64) -> f64 {
        (((w * h * 1.5 * 8.0) / 1_000_000.0) * 35.0 * 2.5 + 200.0) * 1.8 * 0.9166
    }

    #[test]
    fn small_part_has_no_surcharge() {
        assert_eq!(price(50.0, 50.0, 1), base_formula(50.0, 50.0));
        assert_eq!(price(100.0, 200.0, 1), base_formula(100.0, 200.0));
    }

    #[test]
    fn oversize_boundary_is_exclusive() {
        assert_eq!(price(350.0, 100.0, 1), base_formula(350.0, 100.0));
        assert_eq!(price(100.0, 350.0, 1), base_formula(100.0, 350.0));
        assert_eq!(
            price(350.0001, 100.0, 1),
            base_formula(350.0001, 100.0) * 1.10
        );
        assert_eq!(
            price(100.0, 350.0001, 1),
            base_formula(100.0, 350.0001) * 1.10
        );
    }

    #[test]
    fn long_edge_adds_after_oversize() {
        assert_eq!(price(990.0, 10.0, 1), base_formula(990.0, 10.0) * 1.10);
        assert_eq!(
            price(990.5, 10.0, 1),
            base_formula(990.5, 10.0) * 1.10 + 200.0
        );
        assert_eq!(
            price(10.0, 1200.0, 1),
            base_formula(10.0, 1200.0) * 1.10 + 200.0
        );
    }

    #[test]
    fn extra_parts_are_flat() {
        assert_eq!(price(30.0, 30.0, 2), base_formula(30.0, 30.0) + 25.0);
        assert_eq!(
            price(1000.0, 10.0, 4),
            base_formula(1000.0, 10.0) * 1.10 + 200.0 + 75.0
        );
        // zero is treated like a single part
        assert_eq!(price(30.0, 30.0, 0), price(30.0, 30.0, 1));
    }

    #[test]
    fn finish_lookup() {
        assert_eq!(finish_hex("black"), Some("#000000"));
        assert_eq!(finish_hex("  Gold Patina "), Some("#bfa24a"));
        assert_eq!(finish_hex("Magenta"), None);
    }

    proptest! {
        #[test]
        fn extra_part_surcharge_is_additive(
            w in 1.0..2000.0f64,
            h in 1.0..2000.0f64,
            n in 2u32..40,
        ) {
            let single = price(w, h, 1);
            let many = price(w, h, n);
            let expected = single + f64::from(n - 1) * 25.0;
            prop_assert!((many - expected).abs() < 1e-9);
        }

        #[test]
        fn price_is_monotonic_in_area_below_oversize(
            w in 1.0..350.0f64,
            h in 1.0..349.0f64,
        ) {
            prop_assert!(price(w, h + 1.0, 1) >= price(w, h, 1));
        }
    }
}
