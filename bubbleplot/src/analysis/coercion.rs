use std::sync::LazyLock;

use polars::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

/// First signed decimal, optionally in scientific notation.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("number pattern is valid")
});

/// `k/n` overlap counts as written by clusterProfiler.
static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*/\s*\d+").expect("fraction pattern is valid"));

pub fn extract_number(text: &str) -> Option<f64> {
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Numeric view of a column. Numeric columns are cast, text columns go through
/// [`extract_number`] cell by cell. NaN and infinities count as missing.
pub fn coerce_numeric(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    if series.dtype() == &DataType::String {
        let ca = series.str()?;
        let fractions = fraction_cells(ca);
        if fractions > 0 {
            warn!(
                "Column `{}` has {} cells written as k/n; only the numerator is used",
                series.name(),
                fractions
            );
        }
        return Ok(ca
            .into_iter()
            .map(|cell| cell.and_then(extract_number))
            .collect());
    }

    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Number of cells holding a `k/n` fraction.
pub fn fraction_cells(ca: &StringChunked) -> usize {
    ca.into_iter()
        .flatten()
        .filter(|cell| FRACTION_RE.is_match(cell))
        .count()
}

/// Percentage to ratio, decided once for the whole column: when more than half
/// of the valid values exceed 1 every value is divided by 100.
///
/// A column mixing both conventions is normalised as a whole and therefore
/// partly wrong; the heuristic cannot tell the two apart per cell.
pub fn normalize_percent(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    if valid.is_empty() {
        return values;
    }

    let above_one = valid.iter().filter(|v| **v > 1.0).count();
    let fraction = above_one as f64 / valid.len() as f64;
    if fraction > 0.5 {
        debug!(
            "{}/{} values exceed 1, treating the column as percentages",
            above_one,
            valid.len()
        );
        values.into_iter().map(|v| v.map(|x| x / 100.0)).collect()
    } else {
        values
    }
}

pub fn coerce_percent_or_ratio(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    Ok(normalize_percent(coerce_numeric(series)?))
}

/// Term labels, trimmed; blank cells are missing.
pub fn coerce_term(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|cell| {
            cell.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            match (x, y) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-12, "{x} != {y}"),
                (None, None) => {}
                _ => panic!("{a:?} != {b:?}"),
            }
        }
    }

    #[test]
    fn percentages_are_divided_by_100() {
        let s = Series::new(PlSmallStr::from("%"), &[45.0, 60.0, 0.2]);
        let out = coerce_percent_or_ratio(&s).unwrap();
        approx(&out, &[Some(0.45), Some(0.60), Some(0.002)]);
    }

    #[test]
    fn ratios_are_left_alone() {
        let s = Series::new(PlSmallStr::from("ratio"), &[0.1, 0.3, 2.0, 0.05]);
        let out = coerce_percent_or_ratio(&s).unwrap();
        approx(&out, &[Some(0.1), Some(0.3), Some(2.0), Some(0.05)]);
    }

    #[test]
    fn exactly_half_above_one_is_not_a_percentage() {
        let out = normalize_percent(vec![Some(5.0), Some(0.5)]);
        approx(&out, &[Some(5.0), Some(0.5)]);
    }

    #[test]
    fn text_cells_yield_their_first_number() {
        let s = Series::new(
            PlSmallStr::from("%"),
            &[Some("45%"), Some("approx. 60.5 pct"), Some("n/a"), None, Some("-1.5e1")],
        );
        let out = coerce_numeric(&s).unwrap();
        approx(&out, &[Some(45.0), Some(60.5), None, None, Some(-15.0)]);
    }

    #[test]
    fn missing_values_stay_missing_after_normalisation() {
        let s = Series::new(PlSmallStr::from("%"), &[Some("12"), Some(""), Some("30")]);
        let out = coerce_percent_or_ratio(&s).unwrap();
        approx(&out, &[Some(0.12), None, Some(0.30)]);
    }

    #[test]
    fn nan_and_integers() {
        let s = Series::new(PlSmallStr::from("PValue"), &[Some(f64::NAN), Some(0.01), None]);
        approx(&coerce_numeric(&s).unwrap(), &[None, Some(0.01), None]);

        let s = Series::new(PlSmallStr::from("Count"), &[3i64, 7, 12]);
        approx(&coerce_numeric(&s).unwrap(), &[Some(3.0), Some(7.0), Some(12.0)]);
    }

    #[test]
    fn gene_ratio_fractions_are_counted_and_keep_the_numerator() {
        let s = Series::new(
            PlSmallStr::from("GeneRatio"),
            &[Some("12/150"), Some("8 / 150"), Some("n/a"), Some("0.2"), None],
        );
        assert_eq!(fraction_cells(s.str().unwrap()), 2);
        let out = coerce_numeric(&s).unwrap();
        approx(&out, &[Some(12.0), Some(8.0), None, Some(0.2), None]);
    }

    #[test]
    fn scientific_notation_is_extracted() {
        assert_eq!(extract_number("p = 1e-3"), Some(0.001));
        assert_eq!(extract_number("3.2E+2 genes"), Some(320.0));
        assert_eq!(extract_number(".5"), Some(0.5));
        assert_eq!(extract_number("none"), None);
    }

    #[test]
    fn terms_are_trimmed_and_blanks_dropped() {
        let s = Series::new(PlSmallStr::from("Term"), &[Some(" Glycolysis "), Some("   "), None]);
        let out = coerce_term(&s).unwrap();
        assert_eq!(out, vec![Some("Glycolysis".to_string()), None, None]);
    }
}
