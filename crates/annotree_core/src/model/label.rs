//! Display labels for annotation records.
//!
//! A label is the first non-blank line of `text`, or a compact summary of
//! `position` when there is no text.

use super::annotation::AnnotationRecord;

const SUMMARY_DIGITS: usize = 3;
const REGION_DIGITS: usize = 2;
const MAX_LISTED_VALUES: usize = 3;
const ELLIPSIS: &str = "...";
const VREGION: &str = "vregion";

/// Returns the single-line label of `record`; empty when there is neither
/// text nor position data.
pub fn annotation_label(record: &AnnotationRecord) -> String {
    if let Some(line) = first_text_line(record) {
        return line.to_string();
    }

    let entries = record.position.entries();
    if record.kind.eq_ignore_ascii_case(VREGION) {
        if let [(dim, value)] = entries.as_slice() {
            if let [lower, upper] = value.values() {
                return format!(
                    "{dim}: ({}, {})",
                    format_general(*lower, REGION_DIGITS),
                    format_general(*upper, REGION_DIGITS)
                );
            }
        }
    }

    entries
        .iter()
        .map(|(dim, value)| format!("{dim}: ({})", summarize(value.values())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats `value` with `digits` significant digits, `%g` style.
///
/// Trailing zeros are dropped; exponents below -4 or at/above `digits`
/// switch to scientific notation (`1.23e+04`).
pub fn format_general(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn first_text_line(record: &AnnotationRecord) -> Option<&str> {
    record
        .text
        .as_deref()?
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn summarize(values: &[f64]) -> String {
    let labels: Vec<String> = values
        .iter()
        .map(|value| format_general(*value, SUMMARY_DIGITS))
        .collect();
    match (labels.first(), labels.last()) {
        (Some(first), Some(last)) if labels.len() > MAX_LISTED_VALUES => {
            format!("{first}, {ELLIPSIS}, {last}")
        }
        _ => labels.join(", "),
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{annotation_label, format_general};
    use crate::model::{AnnotationRecord, Dimensions, Position, PositionValue};

    fn named(entries: &[(&str, PositionValue)]) -> Position {
        let mut dims = Dimensions::new();
        for (name, value) in entries {
            dims.insert(*name, value.clone());
        }
        Position::Named(dims)
    }

    #[test]
    fn format_general_matches_percent_g() {
        assert_eq!(format_general(1.0, 3), "1");
        assert_eq!(format_general(2.5, 3), "2.5");
        assert_eq!(format_general(100.0, 3), "100");
        assert_eq!(format_general(1234.5, 3), "1.23e+03");
        assert_eq!(format_general(0.0001234, 3), "0.000123");
        assert_eq!(format_general(0.00001234, 3), "1.23e-05");
        assert_eq!(format_general(-0.5, 3), "-0.5");
        assert_eq!(format_general(9.996, 3), "10");
        assert_eq!(format_general(0.0, 3), "0");
        assert_eq!(format_general(0.126, 2), "0.13");
        assert_eq!(format_general(f64::NAN, 3), "nan");
        assert_eq!(format_general(f64::NEG_INFINITY, 3), "-inf");
    }

    #[test]
    fn text_first_line_wins() {
        let record = AnnotationRecord::new("point", named(&[("x", 1.0.into())]))
            .with_text("  Peak A  \nsecond line");
        assert_eq!(annotation_label(&record), "Peak A");
    }

    #[test]
    fn blank_text_falls_back_to_position_summary() {
        let record = AnnotationRecord::new(
            "region",
            named(&[
                ("lat", vec![4.0, 5.0].into()),
                ("lon", vec![6.0, 7.5].into()),
            ]),
        )
        .with_text("   ");
        assert_eq!(annotation_label(&record), "lat: (4, 5), lon: (6, 7.5)");
    }

    #[test]
    fn long_series_keep_first_and_last() {
        let record = AnnotationRecord::new(
            "polyline",
            named(&[("time", vec![10.0, 20.0, 30.0, 40.0].into())]),
        );
        assert_eq!(annotation_label(&record), "time: (10, ..., 40)");

        let three = AnnotationRecord::new(
            "polyline",
            named(&[("time", vec![10.0, 20.0, 30.0].into())]),
        );
        assert_eq!(annotation_label(&three), "time: (10, 20, 30)");
    }

    #[test]
    fn vregion_uses_two_significant_digits() {
        let record = AnnotationRecord::new("VRegion", named(&[("t", vec![0.123, 4.567].into())]));
        assert_eq!(annotation_label(&record), "t: (0.12, 4.6)");

        let point = AnnotationRecord::new("point", named(&[("t", vec![0.123, 4.567].into())]));
        assert_eq!(annotation_label(&point), "t: (0.123, 4.57)");
    }

    #[test]
    fn positional_dimensions_are_labelled_by_index() {
        let record = AnnotationRecord::new(
            "point",
            Position::Positional(vec![15.0.into(), 35.0.into()]),
        );
        assert_eq!(annotation_label(&record), "0: (15), 1: (35)");
    }

    #[test]
    fn empty_position_yields_empty_label() {
        let record = AnnotationRecord::new("point", Position::default());
        assert_eq!(annotation_label(&record), "");
    }
}
