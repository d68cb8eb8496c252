use crate::error::QueryError;
use crate::types::{
    BucketRow, ChartData, ChartKind, Column, ComparisonRow, Mode, Record, ScatterPoint,
    SeriesPoint, StatValue, SummaryStats, Table,
};
use crate::util::{finite_mean, finite_median};
use std::cmp::Ordering;

pub const DEFAULT_TOP_N: usize = 10;

/// Summary statistics for the table's mode. Empty for the map mode.
///
/// Mean and median skip non-finite derived values; threshold counts compare
/// the raw values, so `inf` counts as growth and `NaN` counts nowhere.
pub fn summarize(table: &Table) -> SummaryStats {
    let mut stats = SummaryStats::default();
    let records = table.records();
    let sum = |c: Column| -> f64 { records.iter().filter_map(|r| r.get(c)).sum() };
    let values = |c: Column| -> Vec<f64> { records.iter().filter_map(|r| r.get(c)).collect() };

    match table.mode() {
        Mode::YearOverYear => {
            let growth = values(Column::Growth);
            stats.push("Total Customers", StatValue::Count(records.len()));
            stats.push("Total Current Sales", StatValue::Amount(sum(Column::CurrentSales)));
            stats.push("Total Previous Sales", StatValue::Amount(sum(Column::PreviousSales)));
            stats.push("Average Growth", StatValue::Percent(finite_mean(&growth)));
            stats.push("Median Growth", StatValue::Percent(finite_median(&growth)));
            stats.push(
                "Customers with Positive Growth",
                StatValue::Count(growth.iter().filter(|g| **g > 0.0).count()),
            );
            stats.push(
                "Customers with Negative Growth",
                StatValue::Count(growth.iter().filter(|g| **g < 0.0).count()),
            );
        }
        Mode::TargetAchievement => {
            let achievement = values(Column::Achievement);
            let total_current = sum(Column::CurrentSales);
            let total_target = sum(Column::Target);
            stats.push("Total Customers", StatValue::Count(records.len()));
            stats.push("Total Current Sales", StatValue::Amount(total_current));
            stats.push("Total Target", StatValue::Amount(total_target));
            // ratio of sums, not the mean of per-row ratios
            stats.push(
                "Overall Achievement",
                StatValue::Percent(total_current / total_target * 100.0),
            );
            stats.push("Average Achievement", StatValue::Percent(finite_mean(&achievement)));
            stats.push(
                "Customers Above Target",
                StatValue::Count(achievement.iter().filter(|a| **a >= 100.0).count()),
            );
            stats.push(
                "Customers Below Target",
                StatValue::Count(achievement.iter().filter(|a| **a < 100.0).count()),
            );
        }
        Mode::Geographic => {}
    }
    stats
}

/// Lenient parse of the "top N" input; anything not a positive integer is 10.
pub fn parse_top_n(input: &str) -> usize {
    input
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_TOP_N)
}

fn ensure_numeric(table: &Table, column: Column) -> Result<(), QueryError> {
    if column == Column::Customer || !table.mode().has_column(column) {
        return Err(QueryError::ColumnNotInMode {
            column,
            mode: table.mode(),
        });
    }
    Ok(())
}

// NaN sorts after every number in both directions.
fn compare(a: f64, b: f64, descending: bool) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ if descending => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        _ => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Rows sorted by `column`. The sort is stable, so ties keep input order.
fn sorted_by(table: &Table, column: Column, descending: bool) -> Vec<&Record> {
    let key = |r: &Record| r.get(column).unwrap_or(f64::NAN);
    let mut rows: Vec<&Record> = table.records().iter().collect();
    rows.sort_by(|a, b| compare(key(a), key(b), descending));
    rows
}

/// The `n` rows with the largest `column` values, ties in input order.
/// `n == 0` means the default of 10.
pub fn top_n(table: &Table, n: usize, column: Column) -> Result<Table, QueryError> {
    ensure_numeric(table, column)?;
    let n = if n == 0 { DEFAULT_TOP_N } else { n };
    let records = sorted_by(table, column, true)
        .into_iter()
        .take(n)
        .cloned()
        .collect();
    Ok(table.with_records(records))
}

/// Bucket counts of the mode's derived column, in fixed bucket order.
///
/// Buckets cover `(lower, upper]`; the outermost ones are unbounded, so
/// `-inf` and `inf` land in them. `NaN` values are not counted.
pub fn bin_distribution(table: &Table, column: Column) -> Result<Vec<BucketRow>, QueryError> {
    let mode = table.mode();
    let buckets = mode.schema().buckets;
    if buckets.is_empty() {
        return Err(QueryError::NotAvailable {
            what: "distribution",
            mode,
        });
    }
    if mode.derived_column() != Some(column) {
        return Err(QueryError::ColumnNotInMode { column, mode });
    }

    let mut counts = vec![0usize; buckets.len()];
    for v in table.column(column)? {
        if let Some(i) = buckets.iter().position(|b| v <= b.upper) {
            counts[i] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    Ok(buckets
        .iter()
        .zip(counts)
        .map(|(b, customers)| BucketRow {
            bucket: b.label.to_string(),
            customers,
            share: if total == 0 {
                0.0
            } else {
                customers as f64 / total as f64 * 100.0
            },
        })
        .collect())
}

/// Top `n` customers by current sales, paired with previous sales or target.
pub fn comparison_rows(table: &Table, n: usize) -> Result<Vec<ComparisonRow>, QueryError> {
    let mode = table.mode();
    let compared = mode.schema().compared.ok_or(QueryError::NotAvailable {
        what: "comparison",
        mode,
    })?;
    let top = top_n(table, n, Column::CurrentSales)?;
    Ok(top
        .records()
        .iter()
        .enumerate()
        .map(|(idx, r)| ComparisonRow {
            rank: idx + 1,
            customer: r.customer.clone(),
            current: r.get(Column::CurrentSales).unwrap_or(f64::NAN),
            compared: r.get(compared).unwrap_or(f64::NAN),
        })
        .collect())
}

fn series(rows: Vec<&Record>, column: Column) -> Vec<SeriesPoint> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, r)| SeriesPoint {
            position: idx + 1,
            customer: r.customer.clone(),
            value: r.get(column).unwrap_or(f64::NAN),
        })
        .collect()
}

/// The data a chart of the given kind plots for this table.
pub fn chart_series(table: &Table, kind: ChartKind) -> Result<ChartData, QueryError> {
    let mode = table.mode();
    let not_available = QueryError::NotAvailable {
        what: "charts",
        mode,
    };
    let column = mode.derived_column().ok_or(not_available.clone())?;
    let compared = mode.schema().compared.ok_or(not_available)?;

    Ok(match kind {
        ChartKind::Bar => ChartData::Bar {
            column,
            points: series(sorted_by(table, column, true), column),
        },
        ChartKind::Line => ChartData::Line {
            column,
            points: series(sorted_by(table, column, false), column),
        },
        ChartKind::Scatter => {
            let points: Vec<ScatterPoint> = table
                .records()
                .iter()
                .map(|r| ScatterPoint {
                    customer: r.customer.clone(),
                    x: r.get(compared).unwrap_or(f64::NAN),
                    y: r.get(Column::CurrentSales).unwrap_or(f64::NAN),
                })
                .collect();
            let diagonal_max = points
                .iter()
                .flat_map(|p| [p.x, p.y])
                .fold(f64::NEG_INFINITY, f64::max);
            // no points at all
            let diagonal_max = if diagonal_max.is_finite() { diagonal_max } else { 0.0 };
            ChartData::Scatter {
                x: compared,
                y: Column::CurrentSales,
                points,
                diagonal_max,
            }
        }
        ChartKind::Pie => ChartData::Pie {
            column,
            buckets: bin_distribution(table, column)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::import_text;

    fn table(text: &str, mode: Mode) -> Table {
        import_text(text, mode).unwrap().0
    }

    #[test]
    fn overall_and_average_achievement_diverge() {
        let t = table("c,cur,target\nA,100,50\nB,10,100", Mode::TargetAchievement);
        let stats = summarize(&t);
        let overall = stats.get("Overall Achievement").unwrap().as_f64();
        let average = stats.get("Average Achievement").unwrap().as_f64();
        assert!((overall - 110.0 / 150.0 * 100.0).abs() < 1e-9);
        assert!((average - 105.0).abs() < 1e-9);
        assert_eq!(stats.get("Customers Above Target"), Some(StatValue::Count(1)));
        assert_eq!(stats.get("Customers Below Target"), Some(StatValue::Count(1)));
        assert_eq!(stats.get("Total Target"), Some(StatValue::Amount(150.0)));
    }

    #[test]
    fn yoy_summary_in_fixed_order() {
        let t = table(
            "c,cur,prev\nA,120,100\nB,80,100\nC,100,100\nD,300,200",
            Mode::YearOverYear,
        );
        let stats = summarize(&t);
        let names: Vec<&str> = stats.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "Total Customers",
                "Total Current Sales",
                "Total Previous Sales",
                "Average Growth",
                "Median Growth",
                "Customers with Positive Growth",
                "Customers with Negative Growth",
            ]
        );
        assert_eq!(stats.get("Total Customers"), Some(StatValue::Count(4)));
        assert_eq!(stats.get("Total Current Sales"), Some(StatValue::Amount(600.0)));
        // growth: 20, -20, 0, 50
        assert_eq!(stats.get("Average Growth"), Some(StatValue::Percent(12.5)));
        assert_eq!(stats.get("Median Growth"), Some(StatValue::Percent(10.0)));
        assert_eq!(stats.get("Customers with Positive Growth"), Some(StatValue::Count(2)));
        assert_eq!(stats.get("Customers with Negative Growth"), Some(StatValue::Count(1)));
    }

    #[test]
    fn summary_tolerates_zero_denominators() {
        let t = table("c,cur,prev\nA,50,0\nB,0,0\nC,110,100", Mode::YearOverYear);
        let stats = summarize(&t);
        // only the finite growth (10%) feeds mean and median
        assert_eq!(stats.get("Average Growth"), Some(StatValue::Percent(10.0)));
        assert_eq!(stats.get("Median Growth"), Some(StatValue::Percent(10.0)));
        assert_eq!(stats.get("Customers with Positive Growth"), Some(StatValue::Count(2)));
        assert_eq!(stats.get("Customers with Negative Growth"), Some(StatValue::Count(0)));
    }

    #[test]
    fn map_mode_has_no_summary() {
        let t = table("c,s,lat,lon\nA,10,1,2", Mode::Geographic);
        assert!(summarize(&t).is_empty());
    }

    #[test]
    fn top_n_is_stable_under_ties() {
        let t = table(
            "c,cur,prev\nA,50,1\nB,90,1\nC,50,1\nD,90,1\nE,10,1",
            Mode::YearOverYear,
        );
        let top = top_n(&t, 4, Column::CurrentSales).unwrap();
        let names: Vec<&str> = top.records().iter().map(|r| r.customer.as_str()).collect();
        assert_eq!(names, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn top_n_larger_than_table_returns_everything() {
        let t = table("c,cur,prev\nA,1,1\nB,2,1", Mode::YearOverYear);
        assert_eq!(top_n(&t, 10, Column::Growth).unwrap().len(), 2);
        assert_eq!(top_n(&t, 0, Column::Growth).unwrap().len(), 2);
        assert!(top_n(&t, 10, Column::Target).is_err());
    }

    #[test]
    fn top_n_input_is_lenient() {
        assert_eq!(parse_top_n("5"), 5);
        assert_eq!(parse_top_n(" 25 "), 25);
        assert_eq!(parse_top_n("0"), DEFAULT_TOP_N);
        assert_eq!(parse_top_n("-3"), DEFAULT_TOP_N);
        assert_eq!(parse_top_n("ten"), DEFAULT_TOP_N);
        assert_eq!(parse_top_n("2.5"), DEFAULT_TOP_N);
    }

    #[test]
    fn zero_growth_is_slight_growth() {
        let t = table(
            "c,cur,prev\nA,100,100\nB,95,100\nC,89,100\nD,111,100\nE,110,100",
            Mode::YearOverYear,
        );
        let dist = bin_distribution(&t, Column::Growth).unwrap();
        let counts: Vec<(&str, usize)> = dist.iter().map(|b| (b.bucket.as_str(), b.customers)).collect();
        assert_eq!(
            counts,
            vec![
                ("High Decline (<-10%)", 1),
                ("Slight Decline (-10-0%)", 1),
                ("Slight Growth (0-10%)", 2),
                ("High Growth (>10%)", 1),
            ]
        );
    }

    #[test]
    fn achievement_buckets_keep_order_when_empty() {
        let t = table("c,cur,target\nA,100,100\nB,50,0", Mode::TargetAchievement);
        let dist = bin_distribution(&t, Column::Achievement).unwrap();
        let labels: Vec<&str> = dist.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(labels, vec!["Below 80%", "80-90%", "90-100%", "100-110%", "Above 110%"]);
        let counts: Vec<usize> = dist.iter().map(|b| b.customers).collect();
        // 100% closes the 90-100 bucket, inf lands above 110
        assert_eq!(counts, vec![0, 0, 1, 0, 1]);
        assert_eq!(dist[2].share, 50.0);
    }

    #[test]
    fn distribution_needs_a_derived_column() {
        let t = table("c,s,lat,lon\nA,10,1,2", Mode::Geographic);
        assert!(matches!(
            bin_distribution(&t, Column::Sales),
            Err(QueryError::NotAvailable { .. })
        ));
        let t = table("c,cur,prev\nA,1,1", Mode::YearOverYear);
        assert!(matches!(
            bin_distribution(&t, Column::CurrentSales),
            Err(QueryError::ColumnNotInMode { .. })
        ));
    }

    #[test]
    fn chart_series_per_kind() {
        let t = table("c,cur,target\nA,90,100\nB,120,100\nC,50,40", Mode::TargetAchievement);

        match chart_series(&t, ChartKind::Bar).unwrap() {
            ChartData::Bar { column, points } => {
                assert_eq!(column, Column::Achievement);
                let names: Vec<&str> = points.iter().map(|p| p.customer.as_str()).collect();
                assert_eq!(names, vec!["C", "B", "A"]);
            }
            other => panic!("unexpected chart {other:?}"),
        }

        match chart_series(&t, ChartKind::Line).unwrap() {
            ChartData::Line { points, .. } => {
                assert_eq!(points[0].customer, "A");
                assert_eq!(points[0].position, 1);
            }
            other => panic!("unexpected chart {other:?}"),
        }

        match chart_series(&t, ChartKind::Scatter).unwrap() {
            ChartData::Scatter { x, points, diagonal_max, .. } => {
                assert_eq!(x, Column::Target);
                assert_eq!(points.len(), 3);
                assert_eq!(diagonal_max, 120.0);
            }
            other => panic!("unexpected chart {other:?}"),
        }

        assert!(matches!(chart_series(&t, ChartKind::Pie).unwrap(), ChartData::Pie { .. }));
    }

    #[test]
    fn non_finite_growth_ranks_last_and_bins_outermost() {
        // growth: A 0/0 = NaN, B -5/0 = -inf, C -95%
        let t = table("c,cur,prev\nA,0,0\nB,-5,0\nC,5,100", Mode::YearOverYear);

        let top = top_n(&t, 10, Column::Growth).unwrap();
        let names: Vec<&str> = top.records().iter().map(|r| r.customer.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        let counts: Vec<usize> = bin_distribution(&t, Column::Growth)
            .unwrap()
            .iter()
            .map(|b| b.customers)
            .collect();
        assert_eq!(counts, vec![2, 0, 0, 0]);

        match chart_series(&t, ChartKind::Bar).unwrap() {
            ChartData::Bar { points, .. } => {
                let names: Vec<&str> = points.iter().map(|p| p.customer.as_str()).collect();
                assert_eq!(names, vec!["C", "B", "A"]);
                assert!(points[2].value.is_nan());
            }
            other => panic!("unexpected chart {other:?}"),
        }

        match chart_series(&t, ChartKind::Line).unwrap() {
            ChartData::Line { points, .. } => {
                let names: Vec<&str> = points.iter().map(|p| p.customer.as_str()).collect();
                assert_eq!(names, vec!["B", "C", "A"]);
                assert_eq!(points[0].value, f64::NEG_INFINITY);
                assert!(points[2].value.is_nan());
            }
            other => panic!("unexpected chart {other:?}"),
        }
    }

    #[test]
    fn scatter_diagonal_follows_negative_data() {
        let t = table("c,cur,prev\nA,-50,-20\nB,-30,-10", Mode::YearOverYear);
        match chart_series(&t, ChartKind::Scatter).unwrap() {
            ChartData::Scatter { diagonal_max, .. } => assert_eq!(diagonal_max, -10.0),
            other => panic!("unexpected chart {other:?}"),
        }
    }

    #[test]
    fn comparison_pairs_current_with_target() {
        let t = table("c,cur,target\nA,90,100\nB,120,100\nC,50,40", Mode::TargetAchievement);
        let rows = comparison_rows(&t, 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer, "B");
        assert_eq!(rows[0].compared, 100.0);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].customer, "A");
    }

    #[test]
    fn map_mode_has_no_charts() {
        let t = table("c,s,lat,lon\nA,10,1,2", Mode::Geographic);
        assert!(chart_series(&t, ChartKind::Bar).is_err());
        assert!(comparison_rows(&t, 5).is_err());
    }
}
