//! Pure field-level cleaning functions.

/// Clean a scraped numeric string and parse it as a float.
///
/// Strips the currency symbol and thousands separators, drops one trailing
/// magnitude suffix (`T`/`B`/`M`) without expanding it to its numeric
/// scale, then discards any remaining character that is not a digit or a
/// dot. An empty or non-numeric remainder yields `None`, never an error.
pub fn clean_numeric(raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    let mut value: String = raw.replace('$', "").replace(',', "").trim().to_string();

    if value.ends_with(['T', 'B', 'M']) {
        value.pop();
    }

    let value: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if value.is_empty() {
        return None;
    }

    value.parse().ok()
}

/// Apply the sign indicated by a directional icon marker to a percentage.
///
/// A marker containing `Caret-down` makes the value negative; any other
/// marker, including a malformed or absent one, is treated as "not down"
/// and leaves the value unchanged. Total over its domain: a `None` value
/// stays `None` regardless of the marker.
pub fn adjust_percentage(value: Option<f64>, icon: Option<&str>) -> Option<f64> {
    match icon {
        Some(class) if class.contains("Caret-down") => value.map(|v| -v.abs()),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_numeric_strips_decoration() {
        assert_eq!(clean_numeric(Some("$42,123.50")), Some(42123.5));
        assert_eq!(clean_numeric(Some("42123.50")), Some(42123.5));
        assert_eq!(clean_numeric(Some("  $1,000  ")), Some(1000.0));
        assert_eq!(clean_numeric(Some("1.2%")), Some(1.2));
    }

    #[test]
    fn test_clean_numeric_matches_bare_digits() {
        // Decorated and pre-stripped inputs must agree.
        for (decorated, bare) in [
            ("$800,123.25", "800123.25"),
            ("$19,700,000", "19700000"),
            ("0.0452%", "0.0452"),
        ] {
            assert_eq!(clean_numeric(Some(decorated)), clean_numeric(Some(bare)));
        }
    }

    #[test]
    fn test_clean_numeric_drops_magnitude_suffix_without_expanding() {
        assert_eq!(clean_numeric(Some("$800.5B")), Some(800.5));
        assert_eq!(clean_numeric(Some("3.1T")), Some(3.1));
        assert_eq!(clean_numeric(Some("19.7M")), Some(19.7));
    }

    #[test]
    fn test_clean_numeric_rejects_garbage() {
        assert_eq!(clean_numeric(None), None);
        assert_eq!(clean_numeric(Some("")), None);
        assert_eq!(clean_numeric(Some("abc")), None);
        assert_eq!(clean_numeric(Some("--")), None);
        assert_eq!(clean_numeric(Some("1.2.3")), None);
    }

    #[test]
    fn test_adjust_percentage_sign_table() {
        assert_eq!(
            adjust_percentage(Some(5.0), Some("icon-Caret-down")),
            Some(-5.0)
        );
        assert_eq!(
            adjust_percentage(Some(5.0), Some("icon-Caret-up")),
            Some(5.0)
        );
        assert_eq!(adjust_percentage(Some(5.0), None), Some(5.0));
        assert_eq!(adjust_percentage(None, Some("icon-Caret-down")), None);
        assert_eq!(adjust_percentage(None, None), None);
    }

    #[test]
    fn test_adjust_percentage_tolerates_malformed_markers() {
        // Anything that is not a down marker means "not down".
        assert_eq!(adjust_percentage(Some(2.5), Some("garbage")), Some(2.5));
        assert_eq!(adjust_percentage(Some(2.5), Some("")), Some(2.5));
    }

    #[test]
    fn test_adjust_percentage_negates_absolute_value() {
        // Sign of the input magnitude is ignored on the way down.
        assert_eq!(
            adjust_percentage(Some(-3.0), Some("icon-Caret-down")),
            Some(-3.0)
        );
    }
}
