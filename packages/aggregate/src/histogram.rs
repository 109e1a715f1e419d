//! Fixed-domain histograms.

use fyn_housing_aggregate_models::{Histogram, HistogramBin, HistogramConfig};

/// Counts `values` into the bins of `config`.
///
/// Values below `config.min` go to `underflow`, values above `config.max`
/// to `overflow`. Non-finite values are ignored.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn histogram(values: impl IntoIterator<Item = f64>, config: &HistogramConfig) -> Histogram {
    let bin_count = config.bin_count();
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| {
            let lower = (i as f64).mul_add(config.bin_width, config.min);
            HistogramBin {
                lower,
                upper: (lower + config.bin_width).min(config.max),
                count: 0,
            }
        })
        .collect();
    let mut underflow = 0;
    let mut overflow = 0;

    for value in values.into_iter().filter(|v| v.is_finite()) {
        if bin_count == 0 || value > config.max {
            overflow += 1;
        } else if value < config.min {
            underflow += 1;
        } else {
            let index = ((value - config.min) / config.bin_width).floor() as usize;
            bins[index.min(bin_count - 1)].count += 1;
        }
    }

    Histogram {
        bins,
        underflow,
        overflow,
    }
}
