#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation of a filtered sales subset into chart-ready data.
//!
//! Every function here is a pure function of its inputs. [`summarize`]
//! runs all derivations over the same subset and assembles an
//! [`AggregateView`].

mod histogram;
mod zips;

pub use histogram::histogram;
pub use zips::{
    per_1000, price_per_m2_series, sales_by_zip, sales_by_zip_and_period, selected_zip_series,
    zip_extents,
};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fyn_housing_aggregate_models::{
    AggregateConfig, AggregateView, MapPoint, Period, PeriodCount, SaleDetail, Selection,
    TimeGranularity,
};
use fyn_housing_dataset::DataContext;
use fyn_housing_sales_models::SaleRecord;
use fyn_housing_spatial::RecordIndex;

/// Every period of `granularity` from the one containing `first` through
/// the one containing `last`, in order.
#[must_use]
pub fn enumerate_periods(
    first: NaiveDate,
    last: NaiveDate,
    granularity: TimeGranularity,
) -> Vec<Period> {
    let (first, last) = if first > last { (last, first) } else { (first, last) };
    let end = Period::containing(last, granularity);

    let mut periods = Vec::new();
    let mut current = Period::containing(first, granularity);
    while current <= end {
        periods.push(current);
        current = current.next();
    }
    periods
}

/// The period list of a view: the configured range, or else the dataset's
/// own span. Empty when neither is known.
#[must_use]
pub fn view_periods(context: &DataContext, config: &AggregateConfig) -> Vec<Period> {
    config
        .period_range
        .or_else(|| context.date_span())
        .map(|(first, last)| enumerate_periods(first, last, config.granularity))
        .unwrap_or_default()
}

/// Sales per period. Every period in `periods` appears, with count 0 when
/// nothing sold; sales outside the list are not counted.
#[must_use]
pub fn sales_over_time(filtered: &[&SaleRecord], periods: &[Period]) -> Vec<PeriodCount> {
    let mut counts: BTreeMap<Period, u64> = periods.iter().map(|p| (*p, 0)).collect();
    if let Some(granularity) = periods.first().map(|p| p.granularity()) {
        for record in filtered {
            if let Some(count) = counts.get_mut(&Period::containing(record.sale_date, granularity))
            {
                *count += 1;
            }
        }
    }

    periods
        .iter()
        .map(|period| PeriodCount {
            period: *period,
            count: counts.get(period).copied().unwrap_or(0),
        })
        .collect()
}

/// Map markers for the filtered sales that have coordinates.
#[must_use]
pub fn map_points(filtered: &[&SaleRecord]) -> Vec<MapPoint> {
    filtered
        .iter()
        .filter_map(|record| {
            record.location.map(|loc| MapPoint {
                row: record.row,
                latitude: loc.latitude,
                longitude: loc.longitude,
                price: record.price,
            })
        })
        .collect()
}

/// Resolves the sale shown on the detail card.
///
/// A row selection shows that sale. A coordinate selection shows the
/// filtered sale nearest to it. No selection, an unknown row, or nothing
/// with coordinates to pick from all yield `None`.
#[must_use]
pub fn select(
    context: &DataContext,
    filtered: &[&SaleRecord],
    selection: Option<&Selection>,
) -> Option<SaleDetail> {
    let record = match selection? {
        Selection::Row { row } => context.record(*row)?,
        Selection::Nearest { point } => {
            let index = RecordIndex::build(filtered.iter().copied());
            let row = index.nearest_row(*point)?;
            context.record(row)?
        }
    };
    Some(SaleDetail::from(record))
}

/// Builds the complete view for one filtered subset.
///
/// `selected_zips` are the zip codes chosen by the user, in selection
/// order; they get their own volume series.
#[must_use]
pub fn summarize(
    context: &DataContext,
    filtered: &[&SaleRecord],
    config: &AggregateConfig,
    selected_zips: &[u32],
    selection: Option<&Selection>,
) -> AggregateView {
    let periods = view_periods(context, config);

    #[allow(clippy::cast_precision_loss)]
    let price_histogram = histogram(
        filtered.iter().map(|r| r.price as f64),
        &config.price_histogram,
    );
    let price_per_m2_histogram = histogram(
        filtered.iter().filter_map(|r| r.price_per_m2()),
        &config.price_per_m2_histogram,
    );

    let (region_price_series, zip_price_series) =
        price_per_m2_series(context, filtered, &periods);

    let view = AggregateView {
        result_count: filtered.len(),
        price_histogram,
        price_per_m2_histogram,
        sales_over_time: sales_over_time(filtered, &periods),
        sales_by_zip: sales_by_zip(context, filtered),
        selected_zip_series: selected_zip_series(context, filtered, selected_zips, &periods),
        sales_by_zip_and_period: sales_by_zip_and_period(context, filtered, &periods),
        region_price_series,
        zip_price_series,
        map_points: map_points(filtered),
        selection: select(context, filtered, selection),
    };

    log::debug!(
        "Summarized {} sales over {} periods",
        view.result_count,
        periods.len()
    );

    view
}


#[cfg(test)]
mod tests {
    use super::test_support::{context, sale};
    use super::*;
    use fyn_housing_sales_models::GeoPoint;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn enumerates_monthly_and_quarterly_periods() {
        let months = enumerate_periods(
            date("2019-07-01"),
            date("2021-11-30"),
            TimeGranularity::Monthly,
        );
        assert_eq!(months.len(), 29);
        assert_eq!(months[0].to_string(), "2019-07");
        assert_eq!(months[28].to_string(), "2021-11");

        let quarters = enumerate_periods(
            date("2019-07-01"),
            date("2021-11-30"),
            TimeGranularity::Quarterly,
        );
        let labels: Vec<String> = quarters.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            vec![
                "2019-Q3", "2019-Q4", "2020-Q1", "2020-Q2", "2020-Q3", "2020-Q4", "2021-Q1",
                "2021-Q2", "2021-Q3", "2021-Q4"
            ]
        );
    }

    #[test]
    fn time_series_has_every_period_even_without_rows() {
        let periods = enumerate_periods(
            date("2020-01-01"),
            date("2020-06-30"),
            TimeGranularity::Monthly,
        );
        let empty = sales_over_time(&[], &periods);
        assert_eq!(empty.len(), periods.len());
        assert!(empty.iter().all(|p| p.count == 0));

        let a = sale(0, 5000, "2020-02-10", 1);
        let b = sale(1, 5000, "2020-02-28", 1);
        let c = sale(2, 5000, "2020-05-01", 1);
        let outside = sale(3, 5000, "2021-01-01", 1);
        let series = sales_over_time(&[&a, &b, &c, &outside], &periods);
        let counts: Vec<u64> = series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![0, 2, 0, 0, 1, 0]);
    }

    #[test]
    fn view_periods_prefer_configured_range() {
        let ctx = context(vec![sale(0, 5000, "2020-03-01", 1)], &[]);
        let config = AggregateConfig {
            granularity: TimeGranularity::Quarterly,
            ..AggregateConfig::default()
        };
        assert_eq!(view_periods(&ctx, &config).len(), 1);

        let config = AggregateConfig {
            period_range: Some((date("2020-01-01"), date("2020-12-31"))),
            ..config
        };
        assert_eq!(view_periods(&ctx, &config).len(), 4);

        let empty = context(Vec::new(), &[]);
        assert!(view_periods(&empty, &AggregateConfig::default()).is_empty());
    }

    #[test]
    fn map_points_skip_unplaced_sales() {
        let placed = sale(0, 5000, "2020-01-01", 1_500_000);
        let mut unplaced = sale(1, 5000, "2020-01-01", 1);
        unplaced.location = None;
        let points = map_points(&[&placed, &unplaced]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].row, 0);
        assert_eq!(points[0].price, 1_500_000);
    }

    #[test]
    fn selection_by_row_and_by_nearest_point() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-01", 1),
                sale(1, 5000, "2020-01-01", 2),
                sale(2, 5000, "2020-01-01", 3),
            ],
            &[],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();

        assert!(select(&ctx, &filtered, None).is_none());
        assert_eq!(
            select(&ctx, &filtered, Some(&Selection::Row { row: 2 })).map(|d| d.record.row),
            Some(2)
        );
        assert!(select(&ctx, &filtered, Some(&Selection::Row { row: 99 })).is_none());

        let nearest = Selection::Nearest {
            point: GeoPoint::new(55.011, 10.0),
        };
        assert_eq!(
            select(&ctx, &filtered, Some(&nearest)).map(|d| d.record.row),
            Some(1)
        );
        assert!(select(&ctx, &[], Some(&nearest)).is_none());
    }

    #[test]
    fn summarize_empty_subset_is_zero_valued() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-01", 1),
                sale(1, 5700, "2020-03-01", 2),
            ],
            &[(5000, 1000)],
        );
        let view = summarize(&ctx, &[], &AggregateConfig::default(), &[5000], None);
        assert_eq!(view.result_count, 0);
        assert_eq!(view.price_histogram.total(), 0);
        assert_eq!(view.sales_over_time.len(), 3);
        assert!(view.sales_over_time.iter().all(|p| p.count == 0));
        assert!(view.sales_by_zip.iter().all(|z| z.count == 0));
        assert_eq!(view.selected_zip_series.len(), 1);
        assert!(view.map_points.is_empty());
        assert!(view.selection.is_none());
    }

    #[test]
    fn summarize_counts_every_filtered_sale() {
        let ctx = context(
            vec![
                sale(0, 5000, "2020-01-01", 2_000_000),
                sale(1, 5700, "2020-03-01", 12_000_000),
            ],
            &[],
        );
        let filtered: Vec<&SaleRecord> = ctx.records().iter().collect();
        let view = summarize(&ctx, &filtered, &AggregateConfig::default(), &[], None);
        assert_eq!(view.result_count, 2);
        assert_eq!(view.price_histogram.total(), 2);
        assert_eq!(view.price_histogram.overflow, 1);
        assert_eq!(view.sales_over_time.iter().map(|p| p.count).sum::<u64>(), 2);
        assert_eq!(view.map_points.len(), 2);
        assert_eq!(view.zip_price_series.len(), 2);
        assert_eq!(view.sales_by_zip_and_period.len(), 2);
        let march = &view.sales_by_zip_and_period[1].points[2];
        assert_eq!(march.period.to_string(), "2020-03");
        assert_eq!(march.count, 1);
    }
}
