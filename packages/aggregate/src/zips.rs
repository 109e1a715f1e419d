//! Per-zip-code aggregates.

use std::collections::{BTreeMap, BTreeSet};

use fyn_housing_aggregate_models::{
    Period, PricePoint, PriceSeries, ValueExtent, ZipCount, ZipExtents, ZipPeriodCount, ZipSeries,
};
use fyn_housing_dataset::DataContext;
use fyn_housing_sales_models::SaleRecord;

/// Sales per 1000 residences. Zero when the population is zero or unknown.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_1000(count: u64, residences: Option<u64>) -> f64 {
    match residences {
        Some(residences) if residences > 0 => count as f64 * 1000.0 / residences as f64,
        _ => 0.0,
    }
}

/// Sales per zip code for every zip named by the reference tables or the
/// filtered data, ordered by zip code.
#[must_use]
pub fn sales_by_zip(context: &DataContext, filtered: &[&SaleRecord]) -> Vec<ZipCount> {
    let mut counts: BTreeMap<u32, u64> = context
        .reference_zips()
        .into_iter()
        .map(|zip| (zip, 0))
        .collect();
    for record in filtered {
        *counts.entry(record.zip_code).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(zip_code, count)| {
            let residences = context.population(zip_code);
            ZipCount {
                zip_code,
                count,
                residences,
                per_1000: per_1000(count, residences),
            }
        })
        .collect()
}

/// Sales per period for each selected zip code, in selection order.
#[must_use]
pub fn selected_zip_series(
    context: &DataContext,
    filtered: &[&SaleRecord],
    selected_zips: &[u32],
    periods: &[Period],
) -> Vec<ZipSeries> {
    zip_series(context, filtered, selected_zips, periods)
}

/// Sales per period for every zip code named by the reference tables or
/// the filtered data, ordered by zip code. This is the zip by period count
/// matrix a map of one period is coloured from.
#[must_use]
pub fn sales_by_zip_and_period(
    context: &DataContext,
    filtered: &[&SaleRecord],
    periods: &[Period],
) -> Vec<ZipSeries> {
    let mut zips = context.reference_zips();
    zips.extend(filtered.iter().map(|r| r.zip_code));
    let zips: Vec<u32> = zips.into_iter().collect();

    zip_series(context, filtered, &zips, periods)
}

fn zip_series(
    context: &DataContext,
    filtered: &[&SaleRecord],
    zips: &[u32],
    periods: &[Period],
) -> Vec<ZipSeries> {
    let Some(granularity) = periods.first().map(|p| p.granularity()) else {
        return zips
            .iter()
            .map(|&zip_code| ZipSeries {
                zip_code,
                points: Vec::new(),
            })
            .collect();
    };

    let wanted: BTreeSet<u32> = zips.iter().copied().collect();
    let mut counts: BTreeMap<(u32, Period), u64> = BTreeMap::new();
    for record in filtered {
        if wanted.contains(&record.zip_code) {
            *counts
                .entry((
                    record.zip_code,
                    Period::containing(record.sale_date, granularity),
                ))
                .or_insert(0) += 1;
        }
    }

    zips.iter()
        .map(|&zip_code| {
            let residences = context.population(zip_code);
            ZipSeries {
                zip_code,
                points: periods
                    .iter()
                    .map(|&period| {
                        let count = counts.get(&(zip_code, period)).copied().unwrap_or(0);
                        ZipPeriodCount {
                            period,
                            count,
                            per_1000: per_1000(count, residences),
                        }
                    })
                    .collect(),
            }
        })
        .collect()
}

#[derive(Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    sales: u64,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.sales += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn point(self, period: Period) -> PricePoint {
        PricePoint {
            period,
            average_price_per_m2: (self.sales > 0).then(|| self.sum / self.sales as f64),
            sales: self.sales,
        }
    }
}

/// Average price per m² per period: the region-wide series and one series
/// per zip code (reference zips plus any in the filtered data, ordered by
/// zip code). Only sales with a known positive living area contribute.
#[must_use]
pub fn price_per_m2_series(
    context: &DataContext,
    filtered: &[&SaleRecord],
    periods: &[Period],
) -> (PriceSeries, Vec<PriceSeries>) {
    let mut zips: BTreeSet<u32> = context.reference_zips();
    zips.extend(filtered.iter().map(|r| r.zip_code));

    let mut region: BTreeMap<Period, Accumulator> = BTreeMap::new();
    let mut by_zip: BTreeMap<(u32, Period), Accumulator> = BTreeMap::new();

    if let Some(granularity) = periods.first().map(|p| p.granularity()) {
        for record in filtered {
            let Some(value) = record.price_per_m2() else {
                continue;
            };
            let period = Period::containing(record.sale_date, granularity);
            region.entry(period).or_default().add(value);
            by_zip
                .entry((record.zip_code, period))
                .or_default()
                .add(value);
        }
    }

    let region_series = PriceSeries {
        zip_code: None,
        points: periods
            .iter()
            .map(|&p| region.get(&p).copied().unwrap_or_default().point(p))
            .collect(),
    };

    let zip_series = zips
        .into_iter()
        .map(|zip_code| PriceSeries {
            zip_code: Some(zip_code),
            points: periods
                .iter()
                .map(|&p| {
                    by_zip
                        .get(&(zip_code, p))
                        .copied()
                        .unwrap_or_default()
                        .point(p)
                })
                .collect(),
        })
        .collect();

    (region_series, zip_series)
}

/// Observed price, living area and lot size extents of every sale in
/// `zip_code`, regardless of the filter. Slider spans on a single-zip page
/// follow these.
#[must_use]
pub fn zip_extents(context: &DataContext, zip_code: u32) -> ZipExtents {
    let sales: Vec<&SaleRecord> = context
        .records()
        .iter()
        .filter(|r| r.zip_code == zip_code)
        .collect();

    ZipExtents {
        zip_code,
        sales: sales.len(),
        price: extent(sales.iter().map(|r| r.price)),
        living_area: extent(sales.iter().filter_map(|r| r.living_area)),
        lot_size: extent(sales.iter().filter_map(|r| r.lot_size)),
    }
}

fn extent<T: PartialOrd + Copy>(values: impl Iterator<Item = T>) -> Option<ValueExtent<T>> {
    values.fold(None, |acc, value| {
        Some(match acc {
            None => ValueExtent {
                min: value,
                max: value,
            },
            Some(ValueExtent { min, max }) => ValueExtent {
                min: if value < min { value } else { min },
                max: if value > max { value } else { max },
            },
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate_periods;
    use crate::test_support::{context, sale};
    use fyn_housing_aggregate_models::TimeGranularity;

    #[test]
    fn rate_is_zero_without_population() {
        assert!(per_1000(5, None).abs() < f64::EPSILON);
        assert!(per_1000(5, Some(0)).abs() < f64::EPSILON);
        assert!((per_1000(5, Some(2500)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn counts_cover_reference_and_data_zips() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-01", 1),
                sale(1, 5000, "2020-01-02", 1),
                sale(2, 5250, "2020-01-03", 1),
            ],
            &[(5000, 40_000), (5700, 0)],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();
        let counts = sales_by_zip(&ctx, &filtered);

        let zips: Vec<u32> = counts.iter().map(|c| c.zip_code).collect();
        assert_eq!(zips, vec![5000, 5250, 5700]);
        assert_eq!(counts[0].count, 2);
        assert!((counts[0].per_1000 - 0.05).abs() < 1e-12);
        assert_eq!(counts[1].residences, None);
        assert_eq!(counts[2].count, 0);
        for c in &counts {
            assert!(c.per_1000.is_finite() && c.per_1000 >= 0.0);
        }
    }

    #[test]
    fn selected_series_follow_selection_order() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-15", 1),
                sale(1, 5700, "2020-02-15", 1),
                sale(2, 5700, "2020-02-20", 1),
            ],
            &[(5700, 2000)],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();
        let periods = enumerate_periods(
            "2020-01-01".parse().unwrap(),
            "2020-03-31".parse().unwrap(),
            TimeGranularity::Monthly,
        );

        let series = selected_zip_series(&ctx, &filtered, &[5700, 5000], &periods);
        assert_eq!(series[0].zip_code, 5700);
        let counts: Vec<u64> = series[0].points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![0, 2, 0]);
        assert!((series[0].points[1].per_1000 - 1.0).abs() < 1e-12);
        assert_eq!(series[1].points[0].count, 1);
        assert!(series[1].points[0].per_1000.abs() < f64::EPSILON);
    }

    #[test]
    fn period_matrix_covers_every_zip() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-15", 1),
                sale(1, 5700, "2020-04-15", 1),
                sale(2, 5700, "2020-05-20", 1),
                sale(3, 5250, "2020-02-01", 1),
            ],
            &[(5700, 1000), (5800, 300)],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();
        let periods = enumerate_periods(
            "2020-01-01".parse().unwrap(),
            "2020-06-30".parse().unwrap(),
            TimeGranularity::Quarterly,
        );

        let matrix = sales_by_zip_and_period(&ctx, &filtered, &periods);
        let zips: Vec<u32> = matrix.iter().map(|s| s.zip_code).collect();
        assert_eq!(zips, vec![5000, 5250, 5700, 5800]);
        for series in &matrix {
            assert_eq!(series.points.len(), 2);
        }

        let q2 = &matrix[2].points[1];
        assert_eq!(q2.period.to_string(), "2020-Q2");
        assert_eq!(q2.count, 2);
        assert!((q2.per_1000 - 2.0).abs() < 1e-12);
        assert_eq!(matrix[0].points[0].count, 1);
        assert_eq!(matrix[0].points[1].count, 0);
        assert_eq!(matrix[3].points[0].count, 0);
    }

    #[test]
    fn extents_span_all_sales_of_the_zip() {
        let mut small = sale(1, 5000, "2020-02-01", 800_000);
        small.living_area = Some(45.0);
        small.lot_size = Some(120.0);
        let mut unknown = sale(2, 5000, "2020-03-01", 4_000_000);
        unknown.living_area = None;
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-01", 2_500_000),
                small,
                unknown,
                sale(3, 5700, "2020-01-01", 9_000_000),
            ],
            &[],
        );

        let extents = zip_extents(&ctx, 5000);
        assert_eq!(extents.sales, 3);
        assert_eq!(
            extents.price,
            Some(ValueExtent {
                min: 800_000,
                max: 4_000_000
            })
        );
        assert_eq!(
            extents.living_area,
            Some(ValueExtent {
                min: 45.0,
                max: 100.0
            })
        );
        assert_eq!(
            extents.lot_size,
            Some(ValueExtent {
                min: 120.0,
                max: 120.0
            })
        );

        let empty = zip_extents(&ctx, 5999);
        assert_eq!(empty.sales, 0);
        assert_eq!(empty.price, None);
    }

    #[test]
    fn price_series_marks_periods_without_sales() {
        let mut unknown_area = sale(2, 5000, "2020-03-01", 9_000_000);
        unknown_area.living_area = None;
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-10", 2_000_000),
                sale(1, 5700, "2020-01-20", 3_000_000),
                unknown_area,
            ],
            &[],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();
        let periods = enumerate_periods(
            "2020-01-01".parse().unwrap(),
            "2020-03-31".parse().unwrap(),
            TimeGranularity::Monthly,
        );

        let (region, zips) = price_per_m2_series(&ctx, &filtered, &periods);
        assert_eq!(region.zip_code, None);
        assert_eq!(region.points.len(), 3);
        assert!((region.points[0].average_price_per_m2.unwrap() - 25_000.0).abs() < 1e-9);
        assert_eq!(region.points[0].sales, 2);
        assert_eq!(region.points[1].average_price_per_m2, None);
        assert_eq!(region.points[2].average_price_per_m2, None);

        assert_eq!(zips.len(), 2);
        assert_eq!(zips[0].zip_code, Some(5000));
        assert!((zips[0].points[0].average_price_per_m2.unwrap() - 20_000.0).abs() < 1e-9);
        assert_eq!(zips[1].points[1].average_price_per_m2, None);
    }
}
