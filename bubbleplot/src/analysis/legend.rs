use tracing::debug;

pub const DEFAULT_LEGEND_CANDIDATES: usize = 3;

const ROUND_TO: f64 = 10.0;

/// Nearest multiple of ten. An exact half resolves toward the inside of
/// `[min, max]`: up unless that would pass `max`.
fn round_to_ten(value: f64, max: f64) -> f64 {
    let down = (value / ROUND_TO).floor() * ROUND_TO;
    let up = down + ROUND_TO;
    let (to_down, to_up) = (value - down, up - value);
    if (to_down - to_up).abs() < 1e-9 {
        if up > max {
            down
        } else {
            up
        }
    } else if to_down < to_up {
        down
    } else {
        up
    }
}

/// Representative gene counts for the size legend.
///
/// `n_candidates` evenly spaced values over `[min, max]`, rounded to the
/// nearest ten, de-duplicated and ascending. Non-positive values are dropped.
/// Never empty.
pub fn legend_sizes(counts: &[f64], n_candidates: usize) -> Vec<u32> {
    let finite: Vec<f64> = counts.iter().copied().filter(|c| c.is_finite()).collect();
    let (min, max) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(*c), hi.max(*c)));
    if finite.is_empty() {
        return vec![1];
    }

    let steps = n_candidates.max(1);
    let mut sizes: Vec<u32> = (0..steps)
        .map(|i| {
            if steps == 1 {
                max
            } else {
                min + (max - min) * i as f64 / (steps - 1) as f64
            }
        })
        .map(|v| round_to_ten(v, max))
        .filter(|v| *v > 0.0)
        .map(|v| v as u32)
        .collect();
    sizes.sort_unstable();
    sizes.dedup();

    if sizes.is_empty() {
        let fallback = (max.round() as u32).max(1);
        debug!("Legend rounding left nothing, using {} as the only entry", fallback);
        sizes.push(fallback);
    }
    sizes
}
