mod common;

use common::{dataset, report, report_with, SAMPLE};
use txn_report::engine::{self, Outcome, CATALOG};
use txn_report::reports::{select_high_total_low_avg, select_underperforming};
use txn_report::types::{BreakdownEntry, MissingKeys, ReportOptions, MISSING_LABEL};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn ranking_pairs(ds: &txn_report::types::Dataset, name: &str) -> Vec<(String, f64)> {
    let result = report(ds, name);
    let ranking = result.as_ranking().expect("ranking");
    ranking.entries.iter().map(|e| (e.key.clone(), e.value)).collect()
}

fn pairs(raw: &[(&str, f64)]) -> Vec<(String, f64)> {
    raw.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn total_sales_skips_non_numeric_amounts() {
    let ds = dataset(SAMPLE);
    let metric = report(&ds, "Total Sales");
    let metric = metric.as_metric().expect("metric");
    assert!(close(metric.value, 105.0));
    assert_eq!(metric.display_value(), "105.00");
}

#[test]
fn total_sales_reads_exponent_notation() {
    let ds = dataset("t_amt\n1e3\n2.5E2\nNaN\n10\n");
    let metric = report(&ds, "Total Sales");
    assert!(close(metric.as_metric().unwrap().value, 1260.0));
    assert_eq!(metric.as_metric().unwrap().display_value(), "1,260.00");
}

#[test]
fn duplicate_headers_still_load() {
    let ds = dataset("cust_id,t_amt,note,note\nA,10,x,y\nB,5,z,w\n");
    assert!(ds.has_column("note.1"));
    assert!(close(report(&ds, "Total Sales").as_metric().unwrap().value, 15.0));
}

#[test]
fn na_tokens_do_not_form_groups() {
    let ds = dataset("cust_id,services,t_amt\nA,Golf,10\nNA,N/A,5\nB,Golf,1\n");
    assert_eq!(ranking_pairs(&ds, "Popular Services By Count"), pairs(&[("Golf", 2.0)]));
    assert!(close(report(&ds, "Unique Customers").as_metric().unwrap().value, 3.0));
}

#[test]
fn large_amounts_keep_their_digits() {
    let ds = dataset("t_amt\n20000000000000000000\n");
    let metric = report(&ds, "Total Sales");
    assert_eq!(metric.as_metric().unwrap().display_value(), "20,000,000,000,000,000,000.00");
}

#[test]
fn highest_single_transaction() {
    let ds = dataset(SAMPLE);
    assert!(close(report(&ds, "Highest Single Transaction").as_metric().unwrap().value, 40.0));
}

#[test]
fn month_with_highest_sales_orders_descending() {
    let ds = dataset(SAMPLE);
    let result = report(&ds, "Month With Highest Sales");
    let ranking = result.as_ranking().unwrap();
    assert_eq!(ranking.keys(), vec!["January", "March", "February", "April"]);
    assert_eq!(txn_report::output::headline(&result).as_deref(), Some("Top month: January"));
}

#[test]
fn average_transaction_per_customer() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Average Transaction Amount Per Customer"),
        pairs(&[("C2", 30.0), ("C1", 20.0), ("C4", 5.0), ("C3", 0.0)])
    );
}

#[test]
fn revenue_by_service_and_product() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Revenue By Service"),
        pairs(&[("Outdoor Recreation", 60.0), ("Exercise & Fitness", 30.0), ("Team Sports", 15.0)])
    );
    let products = ranking_pairs(&ds, "Revenue By Product");
    assert_eq!(products[0], ("Kayak".to_string(), 40.0));
    assert_eq!(products.len(), 5);
}

#[test]
fn average_amount_per_service_keeps_ties_in_first_seen_order() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Average Amount Per Service"),
        pairs(&[("Outdoor Recreation", 30.0), ("Exercise & Fitness", 30.0), ("Team Sports", 7.5)])
    );
}

#[test]
fn average_amount_per_product() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Average Amount Per Product"),
        pairs(&[("Kayak", 40.0), ("Treadmill", 30.0), ("Tent", 20.0), ("Ball", 7.5), ("Bat", 0.0)])
    );
}

#[test]
fn customer_counts() {
    let ds = dataset(SAMPLE);
    assert!(close(report(&ds, "Unique Customers").as_metric().unwrap().value, 4.0));
    let avg = report(&ds, "Average Transactions Per Customer");
    assert_eq!(avg.as_metric().unwrap().display_value(), "1.500");
    let repeat = report(&ds, "Percentage Of Repeat Buyers");
    assert_eq!(repeat.as_metric().unwrap().display_value(), "50.00%");
    assert_eq!(
        ranking_pairs(&ds, "Customers Purchasing Multiple Services"),
        pairs(&[("C1", 2.0)])
    );
}

#[test]
fn top_customers_respects_top_n() {
    let mut csv = String::from("cust_id,t_amt\n");
    for i in 0..12 {
        csv.push_str(&format!("C{i},{}\n", i * 10));
    }
    let ds = dataset(&csv);
    let result = report(&ds, "Top Customers By Spend");
    let ranking = result.as_ranking().unwrap();
    assert_eq!(ranking.entries.len(), 10);
    assert_eq!(ranking.top().unwrap().key, "C11");

    let opts = ReportOptions::default().with_top_n(5).unwrap();
    let result = report_with(&ds, "Top Customers By Spend", &opts);
    assert_eq!(result.as_ranking().unwrap().keys(), vec!["C11", "C10", "C9", "C8", "C7"]);
}

#[test]
fn top_n_is_bounded() {
    assert!(ReportOptions::default().with_top_n(4).is_err());
    assert!(ReportOptions::default().with_top_n(51).is_err());
    assert_eq!(ReportOptions::default().with_top_n(50).unwrap().top_n, 50);
}

#[test]
fn service_popularity_and_leaders() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Popular Services By Count"),
        pairs(&[("Team Sports", 3.0), ("Outdoor Recreation", 2.0), ("Exercise & Fitness", 1.0)])
    );
    let result = report(&ds, "Most Purchased Product Per Service");
    let leaders = result.as_leaders().unwrap();
    let picked: Vec<(&str, &str, u64)> = leaders
        .entries
        .iter()
        .map(|l| (l.group.as_str(), l.item.as_str(), l.count))
        .collect();
    assert_eq!(
        picked,
        vec![
            ("Team Sports", "Ball", 2),
            ("Outdoor Recreation", "Tent", 1),
            ("Exercise & Fitness", "Treadmill", 1),
        ]
    );
}

#[test]
fn geography_reports() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "State With Highest Total Sales"),
        pairs(&[("California", 80.0), ("Texas", 20.0), ("Nevada", 5.0)])
    );
    let cities = report(&ds, "City With Highest Number Of Transactions");
    assert_eq!(
        cities.as_ranking().unwrap().keys(),
        vec!["Los Angeles", "Austin", "San Diego", "Reno"]
    );
    assert_eq!(
        txn_report::output::headline(&cities).as_deref(),
        Some("Top city: Los Angeles")
    );
    assert_eq!(
        ranking_pairs(&ds, "Cities By Average Transaction"),
        pairs(&[("San Diego", 30.0), ("Los Angeles", 25.0), ("Austin", 20.0), ("Reno", 5.0)])
    );
    let avg_state = ranking_pairs(&ds, "Average Spending Per State");
    assert_eq!(avg_state[0].0, "California");
    assert!(close(avg_state[0].1, 80.0 / 3.0));
}

#[test]
fn services_popularity_pivot_is_zero_filled() {
    let ds = dataset(SAMPLE);
    let result = report(&ds, "Services Popularity By State (Counts)");
    let pivot = result.as_pivot().unwrap();
    assert_eq!(pivot.rows, vec!["California", "Nevada", "Texas"]);
    assert_eq!(
        pivot.columns,
        vec!["Exercise & Fitness", "Outdoor Recreation", "Team Sports"]
    );
    assert_eq!(pivot.get("California", "Team Sports"), Some(1));
    assert_eq!(pivot.get("Texas", "Exercise & Fitness"), Some(0));
    assert_eq!(pivot.get("Nevada", "Team Sports"), Some(1));
}

#[test]
fn outdoor_recreation_revenue() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Outdoor Recreation Revenue By State"),
        pairs(&[("California", 40.0), ("Texas", 20.0)])
    );
}

#[test]
fn outdoor_recreation_without_matching_rows_is_empty() {
    let ds = dataset("services,state,t_amt\nGolf,Texas,10\n");
    let result = report(&ds, "Outdoor Recreation Revenue By State");
    assert!(result.as_ranking().unwrap().entries.is_empty());
}

#[test]
fn california_vs_texas_averages() {
    let ds = dataset(SAMPLE);
    let result = report(&ds, "Compare Average Spending: California vs Texas");
    let metrics = result.as_metrics().unwrap();
    assert_eq!(metrics[0].label, "California Avg");
    assert_eq!(metrics[0].display_value(), "26.667");
    assert_eq!(metrics[1].label, "Texas Avg");
    assert!(close(metrics[1].value, 20.0));
}

#[test]
fn quarter_and_month_series() {
    let ds = dataset(SAMPLE);
    assert_eq!(
        ranking_pairs(&ds, "Quarter With Highest Sales"),
        pairs(&[("2024Q1", 100.0), ("2024Q2", 0.0)])
    );
    assert_eq!(
        ranking_pairs(&ds, "Total Sales By Month"),
        pairs(&[("January", 40.0), ("February", 20.0), ("March", 40.0), ("April", 0.0)])
    );
    assert_eq!(
        ranking_pairs(&ds, "Team Sports Sales By Month"),
        pairs(&[("January", 10.0), ("April", 0.0)])
    );
}

#[test]
fn credit_and_cash_are_matched_case_insensitively() {
    let ds = dataset("t_details,t_amt\nCredit,10\nCASH,5\ncash,15\n");
    let result = report(&ds, "Credit vs Debit: Counts, Revenue, Averages");
    let metrics = result.as_metrics().unwrap();
    let value = |label: &str| metrics.iter().find(|m| m.label == label).unwrap().value;
    assert!(close(value("Credit Count"), 1.0));
    assert!(close(value("Credit Revenue"), 10.0));
    assert!(close(value("Avg Credit Amount"), 10.0));
    assert!(close(value("Cash Count"), 2.0));
    assert!(close(value("Cash Revenue"), 20.0));
    assert!(close(value("Avg Cash Amount"), 10.0));
}

#[test]
fn exercise_fitness_top_products_keeps_twenty() {
    let mut csv = String::from("services,products_used,t_amt\n");
    for i in 0..25 {
        csv.push_str(&format!("Exercise & Fitness,P{i},{}\n", 100 + i));
    }
    csv.push_str("Team Sports,Ball,10000\n");
    let ds = dataset(&csv);
    let result = report(&ds, "Exercise & Fitness: Top Products");
    let ranking = result.as_ranking().unwrap();
    assert_eq!(ranking.entries.len(), 20);
    assert_eq!(ranking.top().unwrap().key, "P24");
    assert!(ranking.get("Ball").is_none());
}

fn entry(key: &str, total: f64, average: f64) -> BreakdownEntry {
    BreakdownEntry {
        key: key.to_string(),
        total,
        average: Some(average),
    }
}

#[test]
fn high_total_low_avg_requires_both_conditions() {
    let entries = vec![
        entry("A", 100.0, 1.0),
        entry("B", 90.0, 50.0),
        entry("C", 10.0, 1.0),
        entry("D", 5.0, 50.0),
    ];
    // 75th percentile of totals is 92.5, median mean is 25.5.
    let picked = select_high_total_low_avg(&entries);
    let keys: Vec<&str> = picked.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["A"]);
}

#[test]
fn high_total_low_avg_products_from_rows() {
    // Totals 100, 90, 10, 5; means 1, 45, 1, 5.
    let mut csv = String::from("products_used,t_amt\n");
    for _ in 0..100 {
        csv.push_str("A,1\n");
    }
    csv.push_str("B,40\nB,50\n");
    for _ in 0..10 {
        csv.push_str("C,1\n");
    }
    csv.push_str("D,5\n");
    let ds = dataset(&csv);
    let result = report(&ds, "High Total, Low Avg Products");
    let entries = &result.as_breakdown().unwrap().entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, "A");
    assert!(close(entries[0].total, 100.0));
    assert_eq!(entries[0].average, Some(1.0));
}

#[test]
fn quantile_boundaries_are_inclusive() {
    let entries = vec![entry("A", 10.0, 5.0), entry("B", 10.0, 5.0)];
    assert_eq!(select_high_total_low_avg(&entries).len(), 2);
    assert_eq!(select_underperforming(&entries).len(), 2);
}

#[test]
fn underperforming_services_sorted_ascending() {
    let entries = vec![
        entry("A", 5.0, 1.0),
        entry("B", 1.0, 1.0),
        entry("C", 100.0, 50.0),
        entry("D", 200.0, 60.0),
        entry("E", 2.0, 90.0),
    ];
    // 25th percentile of totals is 2, median mean is 50.
    let picked = select_underperforming(&entries);
    let keys: Vec<&str> = picked.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["B"]);

    let ds = dataset(SAMPLE);
    let result = report(&ds, "Underperforming Services");
    let breakdown = result.as_breakdown().unwrap();
    assert_eq!(breakdown.entries.len(), 1);
    assert_eq!(breakdown.entries[0].key, "Team Sports");
    assert_eq!(breakdown.entries[0].average, Some(7.5));
}

#[test]
fn groups_without_numeric_amounts_are_not_low_average_candidates() {
    let ds = dataset("products_used,t_amt\nA,x\nB,10\nC,20\n");
    let result = report(&ds, "High Total, Low Avg Products");
    assert!(result
        .as_breakdown()
        .unwrap()
        .entries
        .iter()
        .all(|e| e.key != "A"));
}

#[test]
fn state_scenario_from_three_rows() {
    let ds = dataset("t_amt,state\n10,California\n20,Texas\n30,California\n");
    assert_eq!(
        ranking_pairs(&ds, "State With Highest Total Sales"),
        pairs(&[("California", 40.0), ("Texas", 20.0)])
    );
}

#[test]
fn repeat_buyers_scenario() {
    let ds = dataset("cust_id\nA\nA\nB\n");
    let result = report(&ds, "Percentage Of Repeat Buyers");
    assert!(close(result.as_metric().unwrap().value, 50.0));
}

#[test]
fn unique_customers_counts_missing_id_once() {
    let ds = dataset("cust_id,t_amt\nA,1\n,2\nB,3\n,4\n");
    assert!(close(report(&ds, "Unique Customers").as_metric().unwrap().value, 3.0));
}

#[test]
fn missing_keys_policy_controls_grouping() {
    let ds = dataset("services,t_amt\nGolf,10\n,5\nGolf,1\n");
    assert_eq!(ranking_pairs(&ds, "Revenue By Service"), pairs(&[("Golf", 11.0)]));

    let opts = ReportOptions::default().with_missing_keys(MissingKeys::Bucket);
    let result = report_with(&ds, "Revenue By Service", &opts);
    assert_eq!(result.as_ranking().unwrap().get(MISSING_LABEL), Some(5.0));
}

#[test]
fn every_report_degrades_on_empty_dataset() {
    let header = "cust_id,t_amt,t_date,services,products_used,state,city,t_details\n";
    let ds = dataset(header);
    assert!(ds.is_empty());
    for def in CATALOG.iter() {
        let outcome = engine::compute(&ds, def.name, &ReportOptions::default()).unwrap();
        let result = match outcome {
            Outcome::Ready(result) => result,
            other => panic!("'{}' was not computed: {other:?}", def.name),
        };
        if let Some(m) = result.as_metric() {
            assert_eq!(m.value, 0.0, "{}", def.name);
        }
        if let Some(metrics) = result.as_metrics() {
            assert!(metrics.iter().all(|m| m.value == 0.0), "{}", def.name);
        }
        if let Some(r) = result.as_ranking() {
            assert!(r.entries.is_empty(), "{}", def.name);
        }
        if let Some(p) = result.as_pivot() {
            assert!(p.rows.is_empty() && p.columns.is_empty());
        }
    }
}

#[test]
fn missing_columns_skip_without_failing() {
    let ds = dataset("cust_id\nA\n");
    let outcome = engine::compute(&ds, "Revenue By Service", &ReportOptions::default()).unwrap();
    match outcome {
        Outcome::Skipped(missing) => {
            assert_eq!(missing.0, vec!["services", "t_amt"]);
        }
        other => panic!("expected skip, got {other:?}"),
    }
}
