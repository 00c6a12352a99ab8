const PREFIXES_UP: [&str; 6] = ["k", "M", "G", "T", "P", "E"];
const PREFIXES_DOWN: [&str; 6] = ["m", "µ", "n", "p", "f", "a"];

/// Formats `value` with a metric prefix in front of `unit`, e.g. `1.5kV`.
pub fn format_number(value: f64, unit: &str) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{}{unit}", significant(value));
    }

    let mut scaled = value;
    let mut exponent = 0i32;

    while scaled.abs() >= 1000.0 {
        scaled /= 1000.0;
        exponent += 3;
    }
    while scaled.abs() < 1.0 {
        scaled *= 1000.0;
        exponent -= 3;
    }

    format!("{}{}{unit}", significant(scaled), metric_prefix(exponent))
}

/// Prefix for a power of ten that is a multiple of three.
pub fn metric_prefix(exponent: i32) -> String {
    let step = exponent / 3;
    let prefix = match step.signum() {
        0 => Some(""),
        1 => PREFIXES_UP.get(step as usize - 1).copied(),
        _ => PREFIXES_DOWN.get(step.unsigned_abs() as usize - 1).copied(),
    };

    prefix.map_or_else(|| format!("e{exponent:+}"), str::to_string)
}

/// Formats seconds as `1d2h3m4.5s`. Once a larger unit is printed the
/// smaller ones are printed too, even when zero.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return format!("{}s", significant(seconds));
    }

    let mut out = String::new();
    let mut rest = seconds;
    if rest < 0.0 {
        out.push('-');
        rest = -rest;
    }

    let mut printed = false;
    for (unit, span) in [("d", 86_400.0), ("h", 3_600.0), ("m", 60.0)] {
        let whole = (rest / span).floor();
        if whole >= 1.0 || printed {
            out.push_str(&format!("{whole}{unit}"));
            rest -= whole * span;
            printed = true;
        }
    }

    out.push_str(&format!("{}s", significant(rest)));
    out
}

/// Six significant digits with trailing zeros removed.
fn significant(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return format!("{value}");
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (5 - magnitude).clamp(0, 12) as usize;
    let text = format!("{value:.decimals$}");

    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_prefixes() {
        assert_eq!(format_number(1500.0, "V"), "1.5kV");
        assert_eq!(format_number(0.002, "A"), "2mA");
        assert_eq!(format_number(-2_500_000.0, ""), "-2.5M");
        assert_eq!(format_number(12.0, "W"), "12W");
        assert_eq!(format_number(0.0, "V"), "0V");
    }

    #[test]
    fn prefix_out_of_table_falls_back_to_exponent() {
        assert_eq!(metric_prefix(0), "");
        assert_eq!(metric_prefix(-6), "µ");
        assert_eq!(metric_prefix(18), "E");
        assert_eq!(metric_prefix(21), "e+21");
        assert_eq!(metric_prefix(-21), "e-21");
    }

    #[test]
    fn non_finite_does_not_loop() {
        assert_eq!(format_number(f64::INFINITY, "V"), "infV");
        assert_eq!(format_number(f64::NAN, ""), "NaN");
    }

    #[test]
    fn time_units_cascade() {
        assert_eq!(format_time(1.5), "1.5s");
        assert_eq!(format_time(90.0), "1m30s");
        assert_eq!(format_time(3_600.0), "1h0m0s");
        assert_eq!(format_time(90_061.0), "1d1h1m1s");
        assert_eq!(format_time(-2.0), "-2s");
    }
}
