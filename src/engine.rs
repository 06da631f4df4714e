// Report catalog and dispatch.
//
// Every selectable report name maps to exactly one entry of `CATALOG`;
// the engine checks the entry's required columns before calling it.
use crate::error::{ReportError, Result};
use crate::reports;
use crate::types::{
    Dataset, ReportOptions, ReportResult, CITY, CUST_ID, MONTH, PRODUCTS_USED, QUARTER, SERVICES, STATE, T_AMT,
    T_DETAILS,
};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Placeholder entry of the selection list; choosing it computes nothing.
pub const SELECT_REPORT: &str = "Select Report";

pub type Handler = fn(&Dataset, &ReportOptions) -> ReportResult;

#[derive(Clone, Copy)]
pub struct ReportDef {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub uses_top_n: bool,
    pub run: Handler,
}

impl fmt::Debug for ReportDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportDef")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish()
    }
}

const fn entry(name: &'static str, required: &'static [&'static str], run: Handler) -> ReportDef {
    ReportDef {
        name,
        required,
        uses_top_n: false,
        run,
    }
}

pub static CATALOG: [ReportDef; 29] = [
    entry("Total Sales", &[T_AMT], reports::total_sales),
    entry("Month With Highest Sales", &[T_AMT, MONTH], reports::month_with_highest_sales),
    entry(
        "Average Transaction Amount Per Customer",
        &[CUST_ID, T_AMT],
        reports::avg_transaction_per_customer,
    ),
    entry("Highest Single Transaction", &[T_AMT], reports::highest_single_transaction),
    entry("Revenue By Service", &[SERVICES, T_AMT], reports::revenue_by_service),
    entry("Revenue By Product", &[PRODUCTS_USED, T_AMT], reports::revenue_by_product),
    entry("Average Amount Per Service", &[SERVICES, T_AMT], reports::avg_amount_per_service),
    entry("Unique Customers", &[CUST_ID], reports::unique_customers),
    ReportDef {
        name: "Top Customers By Spend",
        required: &[CUST_ID, T_AMT],
        uses_top_n: true,
        run: reports::top_customers_by_spend,
    },
    entry("Average Transactions Per Customer", &[CUST_ID], reports::avg_transactions_per_customer),
    entry(
        "Customers Purchasing Multiple Services",
        &[CUST_ID, SERVICES],
        reports::customers_with_multiple_services,
    ),
    entry("Percentage Of Repeat Buyers", &[CUST_ID], reports::repeat_buyer_percentage),
    entry("Popular Services By Count", &[SERVICES], reports::popular_services_by_count),
    entry(
        "Most Purchased Product Per Service",
        &[SERVICES, PRODUCTS_USED],
        reports::most_purchased_product_per_service,
    ),
    entry("Average Amount Per Product", &[PRODUCTS_USED, T_AMT], reports::avg_amount_per_product),
    entry("State With Highest Total Sales", &[STATE, T_AMT], reports::state_with_highest_sales),
    entry(
        "City With Highest Number Of Transactions",
        &[CITY],
        reports::city_with_most_transactions,
    ),
    entry("Average Spending Per State", &[STATE, T_AMT], reports::avg_spending_per_state),
    entry(
        "Services Popularity By State (Counts)",
        &[STATE, SERVICES],
        reports::services_popularity_by_state,
    ),
    entry(
        "Outdoor Recreation Revenue By State",
        &[SERVICES, STATE, T_AMT],
        reports::outdoor_recreation_revenue_by_state,
    ),
    entry(
        "Compare Average Spending: California vs Texas",
        &[STATE, T_AMT],
        reports::california_vs_texas,
    ),
    entry("Quarter With Highest Sales", &[QUARTER, T_AMT], reports::quarter_with_highest_sales),
    entry("Total Sales By Month", &[MONTH, T_AMT], reports::total_sales_by_month),
    entry(
        "Team Sports Sales By Month",
        &[SERVICES, MONTH, T_AMT],
        reports::team_sports_sales_by_month,
    ),
    entry(
        "Credit vs Debit: Counts, Revenue, Averages",
        &[T_DETAILS, T_AMT],
        reports::credit_vs_cash,
    ),
    entry("Cities By Average Transaction", &[CITY, T_AMT], reports::cities_by_avg_transaction),
    entry(
        "Exercise & Fitness: Top Products",
        &[SERVICES, PRODUCTS_USED, T_AMT],
        reports::exercise_fitness_top_products,
    ),
    entry(
        "High Total, Low Avg Products",
        &[PRODUCTS_USED, T_AMT],
        reports::high_total_low_avg_products,
    ),
    entry("Underperforming Services", &[SERVICES, T_AMT], reports::underperforming_services),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static ReportDef>> =
    Lazy::new(|| CATALOG.iter().map(|s| (s.name, s)).collect());

/// The full selection list as shown to the user, sentinel first.
pub fn selection_names() -> Vec<&'static str> {
    std::iter::once(SELECT_REPORT)
        .chain(CATALOG.iter().map(|s| s.name))
        .collect()
}

pub fn find(name: &str) -> Option<&'static ReportDef> {
    BY_NAME.get(name.trim()).copied()
}

/// Required columns absent from `ds`, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns(pub Vec<String>);

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing required columns: {}", self.0.join(", "))
    }
}

pub fn missing_columns(ds: &Dataset, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|c| !ds.has_column(c))
        .map(|c| c.to_string())
        .collect()
}

/// Column guard: `true` when every column is present. Absent columns are
/// reported through the log rather than as an error.
pub fn require(ds: &Dataset, required: &[&str]) -> bool {
    let missing = missing_columns(ds, required);
    if missing.is_empty() {
        return true;
    }
    warn!("{}", MissingColumns(missing));
    false
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing chosen yet.
    Idle,
    Skipped(MissingColumns),
    Ready(ReportResult),
}

/// Compute the report selected by name. Only names outside the selection
/// list are errors; missing columns yield `Outcome::Skipped`.
pub fn compute(ds: &Dataset, name: &str, opts: &ReportOptions) -> Result<Outcome> {
    if name.trim() == SELECT_REPORT {
        return Ok(Outcome::Idle);
    }
    let def = find(name).ok_or_else(|| ReportError::UnknownReport(name.to_string()))?;
    Ok(compute_report(ds, def, opts))
}

pub fn compute_report(ds: &Dataset, def: &ReportDef, opts: &ReportOptions) -> Outcome {
    let missing = missing_columns(ds, def.required);
    if !missing.is_empty() {
        let missing = MissingColumns(missing);
        warn!("Skipping '{}': {}", def.name, missing);
        return Outcome::Skipped(missing);
    }
    debug!("Computing '{}' over {} rows", def.name, ds.len());
    Outcome::Ready((def.run)(ds, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_selection_has_exactly_one_handler() {
        let names = selection_names();
        assert_eq!(names.len(), 30);
        assert_eq!(names[0], SELECT_REPORT);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        for name in &names[1..] {
            assert_eq!(find(name).map(|s| s.name), Some(*name));
        }
        assert!(find(SELECT_REPORT).is_none());
    }

    #[test]
    fn sentinel_computes_nothing() {
        let ds = Dataset::default();
        assert_eq!(compute(&ds, SELECT_REPORT, &ReportOptions::default()).unwrap(), Outcome::Idle);
    }

    #[test]
    fn unknown_names_are_errors() {
        let ds = Dataset::default();
        let err = compute(&ds, "Weekly Churn", &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::UnknownReport(n) if n == "Weekly Churn"));
    }

    #[test]
    fn missing_columns_skip_the_report() {
        let ds = Dataset::new(vec!["state".into()], Vec::new());
        let outcome = compute(&ds, "Outdoor Recreation Revenue By State", &ReportOptions::default()).unwrap();
        let missing = match outcome {
            Outcome::Skipped(missing) => missing,
            other => panic!("expected skip, got {other:?}"),
        };
        assert_eq!(missing.to_string(), "Missing required columns: services, t_amt");
        assert!(!require(&ds, &[T_AMT]));
        assert!(require(&ds, &[STATE]));
    }
}
