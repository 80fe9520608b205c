//! Numeric sanitizer
//!
//! Keeps digits and the first decimal point, drops everything else:
//! `"120mm"` → `"120"`, `"£0.25"` → `"0.25"`. Total and idempotent.

pub fn sanitize_numeric(raw: &str) -> String {
    let mut seen_point = false;
    raw.chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_units_and_currency() {
        assert_eq!(sanitize_numeric("120mm"), "120");
        assert_eq!(sanitize_numeric("£0.25"), "0.25");
        assert_eq!(sanitize_numeric("1,250.50 /job"), "1250.50");
        assert_eq!(sanitize_numeric(""), "");
        assert_eq!(sanitize_numeric("n/a"), "");
    }

    #[test]
    fn keeps_only_first_decimal_point() {
        assert_eq!(sanitize_numeric("1.2.3"), "1.23");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["120mm", "£0.25", "", "1.2.3", "..5", "SOS 12 (1B) 50,000/shift", "  7 "] {
            let once = sanitize_numeric(raw);
            assert_eq!(sanitize_numeric(&once), once, "input {:?}", raw);
        }
    }
}
