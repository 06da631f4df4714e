// The canned reports. Every function is pure over an already validated
// dataset: required columns are checked by the engine beforehand.
use crate::aggregate::{
    counts, distinct, equals_mask, group_rows, mean, means, sort_by_calendar, sort_desc, sum, sums, Group,
};
use crate::types::{
    Breakdown, BreakdownEntry, Dataset, Leader, Leaders, Metric, Pivot, RankEntry, Ranking, ReportOptions,
    ReportResult, Unit, CITY, CUST_ID, MONTH, PRODUCTS_USED, QUARTER, SERVICES, STATE, T_AMT, T_DETAILS,
};
use crate::util::{median, quantile};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const OUTDOOR_RECREATION: &str = "Outdoor Recreation";
pub const TEAM_SPORTS: &str = "Team Sports";
pub const EXERCISE_FITNESS: &str = "Exercise & Fitness";
pub const CALIFORNIA: &str = "California";
pub const TEXAS: &str = "Texas";
pub const FITNESS_TOP: usize = 20;

fn ranking(key: &str, measure: &str, unit: Unit, headline: Option<&str>, entries: Vec<RankEntry>) -> ReportResult {
    ReportResult::Ranking(Ranking {
        key: key.to_string(),
        measure: measure.to_string(),
        unit,
        headline: headline.map(str::to_string),
        entries,
    })
}

fn grouped(ds: &Dataset, key: &str, opts: &ReportOptions) -> Vec<Group> {
    group_rows(&ds.keys(key), None, opts.missing_keys)
}

fn sum_by(ds: &Dataset, key: &str, opts: &ReportOptions) -> Vec<RankEntry> {
    let mut entries = sums(&grouped(ds, key, opts), &ds.amounts(T_AMT));
    sort_desc(&mut entries);
    entries
}

fn mean_by(ds: &Dataset, key: &str, opts: &ReportOptions) -> Vec<RankEntry> {
    let mut entries = means(&grouped(ds, key, opts), &ds.amounts(T_AMT));
    sort_desc(&mut entries);
    entries
}

fn count_by(ds: &Dataset, key: &str, opts: &ReportOptions) -> Vec<RankEntry> {
    let mut entries = counts(&grouped(ds, key, opts));
    sort_desc(&mut entries);
    entries
}

/// Sum of `t_amt` per `key` over rows where `filter_col == filter_value`.
fn filtered_sum_by(ds: &Dataset, filter_col: &str, filter_value: &str, key: &str, opts: &ReportOptions) -> Vec<RankEntry> {
    let mask = equals_mask(&ds.keys(filter_col), filter_value);
    let groups = group_rows(&ds.keys(key), Some(&mask), opts.missing_keys);
    sums(&groups, &ds.amounts(T_AMT))
}

pub fn total_sales(ds: &Dataset, _opts: &ReportOptions) -> ReportResult {
    let total: f64 = ds.amounts(T_AMT).into_iter().flatten().sum();
    ReportResult::Metric(Metric::new("Total Sales Amount", total, Unit::Currency))
}

pub fn month_with_highest_sales(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(MONTH, "total_t_amt", Unit::Currency, Some("Top month"), sum_by(ds, MONTH, opts))
}

pub fn avg_transaction_per_customer(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(CUST_ID, "avg_t_amt", Unit::Currency, None, mean_by(ds, CUST_ID, opts))
}

pub fn highest_single_transaction(ds: &Dataset, _opts: &ReportOptions) -> ReportResult {
    let highest = ds
        .amounts(T_AMT)
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(0.0);
    ReportResult::Metric(Metric::new("Highest Transaction", highest, Unit::Currency))
}

pub fn revenue_by_service(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(SERVICES, "total_t_amt", Unit::Currency, Some("Top service"), sum_by(ds, SERVICES, opts))
}

pub fn revenue_by_product(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(
        PRODUCTS_USED,
        "total_t_amt",
        Unit::Currency,
        Some("Top product"),
        sum_by(ds, PRODUCTS_USED, opts),
    )
}

pub fn avg_amount_per_service(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(SERVICES, "avg_t_amt", Unit::Currency, None, mean_by(ds, SERVICES, opts))
}

/// Distinct `cust_id` values; a missing id counts once.
pub fn unique_customers(ds: &Dataset, _opts: &ReportOptions) -> ReportResult {
    let distinct: HashSet<Option<String>> = ds.keys(CUST_ID).into_iter().collect();
    ReportResult::Metric(Metric::new("Unique Customers", distinct.len() as f64, Unit::Count))
}

pub fn top_customers_by_spend(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let mut entries = sum_by(ds, CUST_ID, opts);
    entries.truncate(opts.top_n);
    ranking(CUST_ID, "total_spend", Unit::Currency, None, entries)
}

pub fn avg_transactions_per_customer(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let per_customer: Vec<f64> = grouped(ds, CUST_ID, opts)
        .iter()
        .map(|g| g.rows.len() as f64)
        .collect();
    let avg = crate::util::average(&per_customer);
    ReportResult::Metric(Metric::new("Average Transactions per Customer", avg, Unit::Precise))
}

pub fn customers_with_multiple_services(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let services = ds.keys(SERVICES);
    let entries = grouped(ds, CUST_ID, opts)
        .iter()
        .map(|g| RankEntry {
            key: g.key.clone(),
            value: distinct(&g.rows, &services) as f64,
        })
        .filter(|e| e.value > 1.0)
        .collect();
    ranking(CUST_ID, "distinct_services", Unit::Count, None, entries)
}

pub fn repeat_buyer_percentage(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let groups = grouped(ds, CUST_ID, opts);
    let repeat = groups.iter().filter(|g| g.rows.len() > 1).count();
    let pct = if groups.is_empty() {
        0.0
    } else {
        repeat as f64 / groups.len() as f64 * 100.0
    };
    ReportResult::Metric(Metric::new("Repeat Buyers (%)", pct, Unit::Percent))
}

pub fn popular_services_by_count(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(SERVICES, "count", Unit::Count, None, count_by(ds, SERVICES, opts))
}

pub fn most_purchased_product_per_service(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let products = ds.keys(PRODUCTS_USED);
    let entries = grouped(ds, SERVICES, opts)
        .into_iter()
        .filter_map(|g| {
            let per_product = group_rows(
                &g.rows.iter().map(|&r| products.get(r).cloned().flatten()).collect::<Vec<_>>(),
                None,
                opts.missing_keys,
            );
            // Strictly greater keeps the first-seen product on ties.
            let best = per_product.into_iter().fold(None::<Group>, |best, candidate| match best {
                Some(b) if b.rows.len() >= candidate.rows.len() => Some(b),
                _ => Some(candidate),
            })?;
            Some(Leader {
                group: g.key,
                item: best.key,
                count: best.rows.len() as u64,
            })
        })
        .collect();
    ReportResult::Leaders(Leaders {
        group: SERVICES.to_string(),
        item: PRODUCTS_USED.to_string(),
        entries,
    })
}

pub fn avg_amount_per_product(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(PRODUCTS_USED, "avg_t_amt", Unit::Currency, None, mean_by(ds, PRODUCTS_USED, opts))
}

pub fn state_with_highest_sales(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(STATE, "total_t_amt", Unit::Currency, Some("Top state"), sum_by(ds, STATE, opts))
}

pub fn city_with_most_transactions(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(CITY, "count", Unit::Count, Some("Top city"), count_by(ds, CITY, opts))
}

pub fn avg_spending_per_state(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(STATE, "avg_t_amt", Unit::Currency, None, mean_by(ds, STATE, opts))
}

pub fn services_popularity_by_state(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let states = ds.keys(STATE);
    let services = ds.keys(SERVICES);
    let mut cells: HashMap<(String, String), u64> = HashMap::new();
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    for state_group in group_rows(&states, None, opts.missing_keys) {
        let svc: Vec<Option<String>> = state_group
            .rows
            .iter()
            .map(|&r| services.get(r).cloned().flatten())
            .collect();
        for svc_group in group_rows(&svc, None, opts.missing_keys) {
            rows.insert(state_group.key.clone());
            columns.insert(svc_group.key.clone());
            cells.insert((state_group.key.clone(), svc_group.key), svc_group.rows.len() as u64);
        }
    }
    let rows: Vec<String> = rows.into_iter().collect();
    let columns: Vec<String> = columns.into_iter().collect();
    let counts = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();
    ReportResult::Pivot(Pivot {
        row_key: STATE.to_string(),
        column_key: SERVICES.to_string(),
        rows,
        columns,
        counts,
    })
}

pub fn outdoor_recreation_revenue_by_state(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let mut entries = filtered_sum_by(ds, SERVICES, OUTDOOR_RECREATION, STATE, opts);
    sort_desc(&mut entries);
    ranking(STATE, "total_t_amt", Unit::Currency, None, entries)
}

pub fn california_vs_texas(ds: &Dataset, _opts: &ReportOptions) -> ReportResult {
    let states = ds.keys(STATE);
    let amounts = ds.amounts(T_AMT);
    let avg_for = |state: &str| {
        let rows: Vec<usize> = equals_mask(&states, state)
            .iter()
            .enumerate()
            .filter_map(|(i, hit)| hit.then_some(i))
            .collect();
        mean(&rows, &amounts).unwrap_or(0.0)
    };
    ReportResult::Metrics(vec![
        Metric::new("California Avg", avg_for(CALIFORNIA), Unit::Precise),
        Metric::new("Texas Avg", avg_for(TEXAS), Unit::Precise),
    ])
}

pub fn quarter_with_highest_sales(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(QUARTER, "total_t_amt", Unit::Currency, Some("Top quarter"), sum_by(ds, QUARTER, opts))
}

pub fn total_sales_by_month(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let mut entries = sums(&grouped(ds, MONTH, opts), &ds.amounts(T_AMT));
    sort_by_calendar(&mut entries);
    ranking(MONTH, "total_t_amt", Unit::Currency, None, entries)
}

pub fn team_sports_sales_by_month(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let mut entries = filtered_sum_by(ds, SERVICES, TEAM_SPORTS, MONTH, opts);
    sort_by_calendar(&mut entries);
    ranking(MONTH, "total_t_amt", Unit::Currency, None, entries)
}

/// Counts, revenue and averages for credit and cash payments. The payment
/// method is matched case-insensitively against the whole cell.
pub fn credit_vs_cash(ds: &Dataset, _opts: &ReportOptions) -> ReportResult {
    let details = ds.keys(T_DETAILS);
    let amounts = ds.amounts(T_AMT);
    let rows_for = |method: &str| -> Vec<usize> {
        details
            .iter()
            .enumerate()
            .filter(|(_, d)| d.as_deref().is_some_and(|d| d.to_lowercase() == method))
            .map(|(i, _)| i)
            .collect()
    };
    let credit = rows_for("credit");
    let cash = rows_for("cash");
    ReportResult::Metrics(vec![
        Metric::new("Credit Count", credit.len() as f64, Unit::Count),
        Metric::new("Credit Revenue", sum(&credit, &amounts), Unit::Currency),
        Metric::new("Avg Credit Amount", mean(&credit, &amounts).unwrap_or(0.0), Unit::Currency),
        Metric::new("Cash Count", cash.len() as f64, Unit::Count),
        Metric::new("Cash Revenue", sum(&cash, &amounts), Unit::Currency),
        Metric::new("Avg Cash Amount", mean(&cash, &amounts).unwrap_or(0.0), Unit::Currency),
    ])
}

pub fn cities_by_avg_transaction(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ranking(CITY, "avg_t_amt", Unit::Currency, None, mean_by(ds, CITY, opts))
}

pub fn exercise_fitness_top_products(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    let mut entries = filtered_sum_by(ds, SERVICES, EXERCISE_FITNESS, PRODUCTS_USED, opts);
    sort_desc(&mut entries);
    entries.truncate(FITNESS_TOP);
    ranking(PRODUCTS_USED, "total_t_amt", Unit::Currency, None, entries)
}

fn breakdown(ds: &Dataset, key: &str, opts: &ReportOptions) -> Vec<BreakdownEntry> {
    let amounts = ds.amounts(T_AMT);
    grouped(ds, key, opts)
        .iter()
        .map(|g| BreakdownEntry {
            key: g.key.clone(),
            total: sum(&g.rows, &amounts),
            average: mean(&g.rows, &amounts),
        })
        .collect()
}

fn median_average(entries: &[BreakdownEntry]) -> f64 {
    median(entries.iter().filter_map(|e| e.average).collect())
}

fn below_median_average(entry: &BreakdownEntry, median_avg: f64) -> bool {
    entry.average.is_some_and(|avg| avg <= median_avg)
}

/// Groups whose total is at or above the 75th percentile of totals and
/// whose mean is at or below the median mean, largest total first.
pub fn select_high_total_low_avg(entries: &[BreakdownEntry]) -> Vec<BreakdownEntry> {
    if entries.is_empty() {
        return Vec::new();
    }
    let threshold = quantile(entries.iter().map(|e| e.total).collect(), 0.75);
    let median_avg = median_average(entries);
    let mut picked: Vec<BreakdownEntry> = entries
        .iter()
        .filter(|e| e.total >= threshold && below_median_average(e, median_avg))
        .cloned()
        .collect();
    picked.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    picked
}

/// Groups whose total is at or below the 25th percentile of totals and
/// whose mean is at or below the median mean, smallest total first.
pub fn select_underperforming(entries: &[BreakdownEntry]) -> Vec<BreakdownEntry> {
    if entries.is_empty() {
        return Vec::new();
    }
    let threshold = quantile(entries.iter().map(|e| e.total).collect(), 0.25);
    let median_avg = median_average(entries);
    let mut picked: Vec<BreakdownEntry> = entries
        .iter()
        .filter(|e| e.total <= threshold && below_median_average(e, median_avg))
        .cloned()
        .collect();
    picked.sort_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(Ordering::Equal));
    picked
}

pub fn high_total_low_avg_products(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ReportResult::Breakdown(Breakdown {
        key: PRODUCTS_USED.to_string(),
        entries: select_high_total_low_avg(&breakdown(ds, PRODUCTS_USED, opts)),
    })
}

pub fn underperforming_services(ds: &Dataset, opts: &ReportOptions) -> ReportResult {
    ReportResult::Breakdown(Breakdown {
        key: SERVICES.to_string(),
        entries: select_underperforming(&breakdown(ds, SERVICES, opts)),
    })
}
