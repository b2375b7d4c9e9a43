use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::{ratio, AggregateRow, ComparisonSummary, Record, Snapshot, TimeSeries, TopN};
use crate::normalize::normalize_text;

/// Per-year sums for one category over an ascending year axis.
///
/// `merged_per_year[i]` holds the records for `years[i]`; a year without
/// matching records contributes zeros rather than being skipped.
pub fn historical_series<R>(category_label: &str, years: &[String], merged_per_year: &[R]) -> TimeSeries
where
    R: Borrow<Vec<Record>>,
{
    let key = normalize_text(category_label);
    let mut series = TimeSeries {
        category_label: category_label.to_string(),
        years: years.to_vec(),
        offering: Vec::with_capacity(years.len()),
        enrolled: Vec::with_capacity(years.len()),
        graduated: Vec::with_capacity(years.len()),
        total_offering: 0.0,
        total_enrolled: 0.0,
        total_graduated: 0.0,
    };

    for index in 0..years.len() {
        let mut year_total = AggregateRow::new(&key, category_label);
        if let Some(records) = merged_per_year.get(index) {
            let records: &Vec<Record> = records.borrow();
            records
                .iter()
                .filter(|record| record.category_key == key)
                .for_each(|record| year_total.add(record));
        }

        series.offering.push(year_total.offering);
        series.enrolled.push(year_total.enrolled);
        series.graduated.push(year_total.graduated);
        series.total_offering += year_total.offering;
        series.total_enrolled += year_total.enrolled;
        series.total_graduated += year_total.graduated;
    }

    series
}

/// Offering desc, then enrolled desc, then graduated desc; key as last resort.
pub fn rank_order(a: &AggregateRow, b: &AggregateRow) -> Ordering {
    b.offering
        .total_cmp(&a.offering)
        .then_with(|| b.enrolled.total_cmp(&a.enrolled))
        .then_with(|| b.graduated.total_cmp(&a.graduated))
        .then_with(|| a.category_key.cmp(&b.category_key))
}

/// Groups one year's records by category and ranks the groups.
pub fn group_by_category(records: &[Record]) -> Vec<AggregateRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<AggregateRow> = Vec::new();

    for record in records {
        if record.category_key.is_empty() {
            continue;
        }
        let slot = *index.entry(record.category_key.as_str()).or_insert_with(|| {
            groups.push(AggregateRow::new(&record.category_key, &record.category_raw));
            groups.len() - 1
        });
        groups[slot].add(record);
    }

    groups.sort_by(rank_order);
    groups
}

/// Ranked cross-category comparison for a single year.
///
/// With a category filter only that group survives and the chart shows one
/// bar; otherwise the chart is capped at `top_n`.
pub fn snapshot_ranking(
    year: &str,
    records: &[Record],
    category_filter: Option<&str>,
    top_n: TopN,
) -> Snapshot {
    let mut rows = group_by_category(records);
    let filter = category_filter.filter(|label| !label.trim().is_empty());

    let chart_cap = if let Some(label) = filter {
        let key = normalize_text(label);
        rows.retain(|row| row.category_key == key);
        rows.len().min(1)
    } else {
        rows.len().min(top_n.value())
    };

    Snapshot {
        year: year.to_string(),
        rows,
        category_filter: filter.map(str::to_string),
        chart_cap,
    }
}

/// Totals over every record of one province/year pair.
pub fn year_summary(province: &str, year: &str, records: &[Record]) -> ComparisonSummary {
    let offering: f64 = records.iter().map(|record| record.offering).sum();
    let enrolled: f64 = records.iter().map(|record| record.enrolled).sum();
    let graduated: f64 = records.iter().map(|record| record.graduated).sum();

    ComparisonSummary {
        province: province.to_string(),
        year: year.to_string(),
        offering,
        enrolled,
        graduated,
        enrolled_per_offering: ratio(enrolled, offering),
        graduated_per_offering: ratio(graduated, offering),
    }
}
