/// Format an amount as rupiah with dot thousands separators: Rp1.234.500
/// Fractions are shown only when present, with a comma: Rp1.234,50
pub fn rupiah(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if negative && fixed != "0.00" { "-" } else { "" };
    if dec_part == "00" {
        format!("{sign}Rp{grouped}")
    } else {
        format!("{sign}Rp{grouped},{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupiah_formatting() {
        assert_eq!(rupiah(170000.0), "Rp170.000");
        assert_eq!(rupiah(-500.0), "-Rp500");
        assert_eq!(rupiah(0.0), "Rp0");
        assert_eq!(rupiah(1234567.5), "Rp1.234.567,50");
        assert_eq!(rupiah(999.0), "Rp999");
    }

    #[test]
    fn test_rupiah_negative_zero() {
        assert_eq!(rupiah(-0.001), "Rp0");
    }
}
