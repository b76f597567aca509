fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// en-US number rendering: thousands separators and at most three
/// fraction digits, trailing zeros dropped. 1234.5 → "1,234.5".
pub fn grouped(val: f64) -> String {
    if val.is_nan() {
        return "NaN".to_string();
    }
    if val.is_infinite() {
        return if val > 0.0 { "∞".to_string() } else { "-∞".to_string() };
    }

    let rounded = format!("{:.3}", val.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();

    let mut out = String::new();
    if val < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_formatting() {
        assert_eq!(grouped(1234.5), "1,234.5");
        assert_eq!(grouped(-500.0), "-500");
        assert_eq!(grouped(0.0), "0");
        assert_eq!(grouped(1000000.99), "1,000,000.99");
        assert_eq!(grouped(0.12345), "0.123");
        assert_eq!(grouped(15.0), "15");
        assert_eq!(grouped(-0.0001), "0");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
