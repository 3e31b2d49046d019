//! # Dashboard Metrics
//!
//! Pure computation of period metrics from already-loaded records.
//!
//! ## Pipeline
//! ```text
//! ┌───────────────────┐
//! │ sales in window   │──┐
//! ├───────────────────┤  │     ┌──────────────────────────┐
//! │ expenses in window│──┼────►│ compute()  (one pass per │────► DashboardMetrics
//! ├───────────────────┤  │     │ record kind, no I/O)     │
//! │ critical products │──┘     └──────────────────────────┘
//! └───────────────────┘
//! ```
//!
//! The caller is responsible for loading the three inputs from one
//! consistent snapshot. Records outside the window are ignored here, so the
//! result depends only on the window and the data, never on the caller's
//! query shape. No wall-clock value is embedded in the result: computing the
//! same window twice over unchanged data yields equal metrics.
//!
//! ## Tie-breaking
//! - top product: most units, then lowest product code
//! - top sale: highest total, then earliest `created_at`, then lowest id
//! - top expense: highest amount, then earliest date, then earliest
//!   `created_at`, then lowest id

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Expense, Product, Sale};
use crate::window::{first_of_month, AggregationWindow, MAX_DAILY_BUCKET_DAYS};

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Products at or below this quantity are critical.
    pub critical_stock_threshold: i64,

    /// Length of the `top_products` ranking.
    pub top_products_limit: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            critical_stock_threshold: crate::DEFAULT_CRITICAL_STOCK_THRESHOLD,
            top_products_limit: crate::DEFAULT_TOP_PRODUCTS_LIMIT,
        }
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// Units and revenue sold for one product within the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_code: String,

    /// Name as recorded on the most recent sale in the window.
    pub product_name: String,

    pub units: i64,
    pub revenue: Money,
}

/// A product at or below the critical threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CriticalProduct {
    pub code: String,
    pub name: String,
    pub quantity_on_hand: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Granularity {
    Day,
    Month,
}

/// Revenue and expenses for one day or month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeriesBucket {
    /// First calendar day of the bucket.
    #[ts(as = "String")]
    pub period_start: NaiveDate,

    pub revenue: Money,
    pub expenses: Money,
}

/// Informational dashboard alerts. Never block a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum DashboardAlert {
    /// `count` products are at or below the critical threshold.
    CriticalStock { count: usize },

    /// Exactly one unit left.
    LastUnit { code: String, name: String },

    /// Expenses exceed half of revenue.
    ExpensesAboveHalfRevenue { expenses: Money, revenue: Money },

    /// Profit is zero or negative while there was activity.
    OperatingAtLoss { profit: Money },
}

impl DashboardAlert {
    pub fn message(&self) -> String {
        match self {
            DashboardAlert::CriticalStock { count: 1 } => {
                "1 product is at critical stock".to_string()
            }
            DashboardAlert::CriticalStock { count } => {
                format!("{count} products are at critical stock")
            }
            DashboardAlert::LastUnit { name, .. } => format!("{name} has only 1 unit left"),
            DashboardAlert::ExpensesAboveHalfRevenue { .. } => {
                "Expenses exceed 50% of revenue".to_string()
            }
            DashboardAlert::OperatingAtLoss { .. } => "Operating at a loss".to_string(),
        }
    }
}

/// Everything the dashboard shows for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardMetrics {
    pub window: AggregationWindow,

    /// Σ sale totals.
    pub revenue: Money,

    /// Σ quantity × purchase-price snapshot.
    pub cost_of_goods: Money,

    pub expenses_total: Money,

    /// `revenue − cost_of_goods − expenses_total`
    pub profit: Money,

    pub sale_count: usize,
    pub units_sold: i64,

    pub top_product: Option<ProductSales>,
    pub top_products: Vec<ProductSales>,
    pub top_sale: Option<Sale>,
    pub top_expense: Option<Expense>,

    /// Current stock state, independent of the window.
    pub critical_stock: Vec<CriticalProduct>,

    pub granularity: Granularity,
    pub series: Vec<SeriesBucket>,
    pub alerts: Vec<DashboardAlert>,
}

// =============================================================================
// Computation
// =============================================================================

/// Computes dashboard metrics for `window`.
///
/// `products` may be the full catalog or a pre-filtered critical list; only
/// products at or below the threshold are reported either way.
pub fn compute(
    window: AggregationWindow,
    sales: &[Sale],
    expenses: &[Expense],
    products: &[Product],
    settings: &MetricsSettings,
) -> DashboardMetrics {
    let mut revenue = Money::zero();
    let mut cost_of_goods = Money::zero();
    let mut sale_count = 0usize;
    let mut units_sold = 0i64;
    let mut top_sale: Option<&Sale> = None;
    let mut by_product: HashMap<&str, ProductTally<'_>> = HashMap::new();
    let mut revenue_by_day: BTreeMap<NaiveDate, Money> = BTreeMap::new();

    for sale in sales.iter().filter(|s| window.contains(s.created_at)) {
        revenue = revenue.saturating_add(sale.total);
        sale_count += 1;
        let day = revenue_by_day.entry(sale.created_at.date_naive()).or_default();
        *day = day.saturating_add(sale.total);

        for item in &sale.items {
            units_sold = units_sold.saturating_add(item.quantity);
            cost_of_goods = cost_of_goods.saturating_add(item.cost());

            let tally = by_product
                .entry(item.product_code.as_str())
                .or_insert_with(|| ProductTally::new(&item.product_name, sale));
            tally.units = tally.units.saturating_add(item.quantity);
            tally.revenue = tally.revenue.saturating_add(item.line_total);
            tally.observe_name(&item.product_name, sale);
        }

        if top_sale.map_or(true, |best| sale_ranks_above(sale, best)) {
            top_sale = Some(sale);
        }
    }

    let mut expenses_total = Money::zero();
    let mut top_expense: Option<&Expense> = None;
    let mut expenses_by_day: BTreeMap<NaiveDate, Money> = BTreeMap::new();

    for expense in expenses.iter().filter(|e| window.contains_date(e.date)) {
        expenses_total = expenses_total.saturating_add(expense.amount);
        let day = expenses_by_day.entry(expense.date).or_default();
        *day = day.saturating_add(expense.amount);

        if top_expense.map_or(true, |best| expense_ranks_above(expense, best)) {
            top_expense = Some(expense);
        }
    }

    let profit = revenue
        .saturating_sub(cost_of_goods)
        .saturating_sub(expenses_total);

    let mut ranking: Vec<ProductSales> = by_product
        .into_iter()
        .map(|(code, tally)| ProductSales {
            product_code: code.to_string(),
            product_name: tally.name.to_string(),
            units: tally.units,
            revenue: tally.revenue,
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.units
            .cmp(&a.units)
            .then_with(|| a.product_code.cmp(&b.product_code))
    });
    let top_product = ranking.first().cloned();
    ranking.truncate(settings.top_products_limit);

    let critical_stock = critical_products(products, settings.critical_stock_threshold);

    let (granularity, series) = build_series(&window, &revenue_by_day, &expenses_by_day);

    let alerts = build_alerts(&critical_stock, revenue, expenses_total, profit);

    DashboardMetrics {
        window,
        revenue,
        cost_of_goods,
        expenses_total,
        profit,
        sale_count,
        units_sold,
        top_product,
        top_products: ranking,
        top_sale: top_sale.cloned(),
        top_expense: top_expense.cloned(),
        critical_stock,
        granularity,
        series,
        alerts,
    }
}

/// Products at or below `threshold`, lowest quantity first, then by code.
pub fn critical_products(products: &[Product], threshold: i64) -> Vec<CriticalProduct> {
    let mut critical: Vec<CriticalProduct> = products
        .iter()
        .filter(|p| p.is_critical(threshold))
        .map(|p| CriticalProduct {
            code: p.code.clone(),
            name: p.name.clone(),
            quantity_on_hand: p.quantity_on_hand,
        })
        .collect();
    critical.sort_by(|a, b| {
        a.quantity_on_hand
            .cmp(&b.quantity_on_hand)
            .then_with(|| a.code.cmp(&b.code))
    });
    critical
}

// =============================================================================
// Helpers
// =============================================================================

struct ProductTally<'a> {
    name: &'a str,
    name_seen_at: (DateTime<Utc>, &'a str),
    units: i64,
    revenue: Money,
}

impl<'a> ProductTally<'a> {
    fn new(name: &'a str, sale: &'a Sale) -> Self {
        Self {
            name,
            name_seen_at: (sale.created_at, sale.id.as_str()),
            units: 0,
            revenue: Money::zero(),
        }
    }

    /// Keeps the name from the latest sale so input order never matters.
    fn observe_name(&mut self, name: &'a str, sale: &'a Sale) {
        let seen = (sale.created_at, sale.id.as_str());
        if seen > self.name_seen_at {
            self.name = name;
            self.name_seen_at = seen;
        }
    }
}

fn sale_ranks_above(candidate: &Sale, best: &Sale) -> bool {
    let ordering = candidate
        .total
        .cmp(&best.total)
        .then_with(|| best.created_at.cmp(&candidate.created_at))
        .then_with(|| best.id.cmp(&candidate.id));
    ordering == Ordering::Greater
}

fn expense_ranks_above(candidate: &Expense, best: &Expense) -> bool {
    let ordering = candidate
        .amount
        .cmp(&best.amount)
        .then_with(|| best.date.cmp(&candidate.date))
        .then_with(|| best.created_at.cmp(&candidate.created_at))
        .then_with(|| best.id.cmp(&candidate.id));
    ordering == Ordering::Greater
}

fn build_series(
    window: &AggregationWindow,
    revenue_by_day: &BTreeMap<NaiveDate, Money>,
    expenses_by_day: &BTreeMap<NaiveDate, Money>,
) -> (Granularity, Vec<SeriesBucket>) {
    if window.span_days() <= MAX_DAILY_BUCKET_DAYS {
        let series = window
            .dates()
            .map(|day| SeriesBucket {
                period_start: day,
                revenue: revenue_by_day.get(&day).copied().unwrap_or_default(),
                expenses: expenses_by_day.get(&day).copied().unwrap_or_default(),
            })
            .collect();
        return (Granularity::Day, series);
    }

    let mut months: BTreeMap<NaiveDate, (Money, Money)> = BTreeMap::new();
    for (day, amount) in revenue_by_day {
        let month = months.entry(first_of_month(*day)).or_default();
        month.0 = month.0.saturating_add(*amount);
    }
    for (day, amount) in expenses_by_day {
        let month = months.entry(first_of_month(*day)).or_default();
        month.1 = month.1.saturating_add(*amount);
    }

    let (first, last) = match (months.keys().next(), months.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return (Granularity::Month, Vec::new()),
    };

    let series = month_starts(first, last)
        .map(|month| {
            let (revenue, expenses) = months.get(&month).copied().unwrap_or_default();
            SeriesBucket {
                period_start: month,
                revenue,
                expenses,
            }
        })
        .collect();
    (Granularity::Month, series)
}

fn month_starts(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(first), |m| m.checked_add_months(chrono::Months::new(1)))
        .take_while(move |m| *m <= last)
}

fn build_alerts(
    critical: &[CriticalProduct],
    revenue: Money,
    expenses: Money,
    profit: Money,
) -> Vec<DashboardAlert> {
    let mut alerts = Vec::new();

    if !critical.is_empty() {
        alerts.push(DashboardAlert::CriticalStock {
            count: critical.len(),
        });
    }
    alerts.extend(
        critical
            .iter()
            .filter(|p| p.quantity_on_hand == 1)
            .map(|p| DashboardAlert::LastUnit {
                code: p.code.clone(),
                name: p.name.clone(),
            }),
    );

    // expenses > 50% of revenue, in integer cents
    if revenue.is_positive() && expenses.cents() as i128 * 2 > revenue.cents() as i128 {
        alerts.push(DashboardAlert::ExpensesAboveHalfRevenue { expenses, revenue });
    }
    if !profit.is_positive() && (revenue.is_positive() || expenses.is_positive()) {
        alerts.push(DashboardAlert::OperatingAtLoss { profit });
    }

    alerts
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;
    use crate::window::WindowPreset;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 0, 0).unwrap()
    }

    fn sale(id: &str, at: DateTime<Utc>, lines: &[(&str, i64, i64, i64)]) -> Sale {
        let items = lines
            .iter()
            .map(|(code, qty, price, cost)| {
                SaleItem::new(*code, *code, *qty, Money::from_cents(*price), Money::from_cents(*cost))
                    .unwrap()
            })
            .collect();
        Sale::from_items(id, items, at).unwrap()
    }

    fn expense(id: &str, date: NaiveDate, amount: i64) -> Expense {
        Expense {
            id: id.to_string(),
            date,
            description: format!("expense {id}"),
            category: String::new(),
            amount: Money::from_cents(amount),
            created_at: now(),
        }
    }

    fn product(code: &str, qty: i64) -> Product {
        Product {
            code: code.to_string(),
            name: format!("Product {code}"),
            purchase_price: Money::from_cents(100),
            sale_price: Money::from_cents(200),
            quantity_on_hand: qty,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn today() -> AggregationWindow {
        WindowPreset::Today.resolve(now())
    }

    #[test]
    fn test_empty_window_yields_zeros() {
        let metrics = compute(today(), &[], &[], &[], &MetricsSettings::default());

        assert_eq!(metrics.revenue, Money::zero());
        assert_eq!(metrics.expenses_total, Money::zero());
        assert_eq!(metrics.profit, Money::zero());
        assert_eq!(metrics.sale_count, 0);
        assert_eq!(metrics.units_sold, 0);
        assert!(metrics.top_product.is_none());
        assert!(metrics.top_products.is_empty());
        assert!(metrics.top_sale.is_none());
        assert!(metrics.top_expense.is_none());
        assert!(metrics.alerts.is_empty());
        assert_eq!(metrics.granularity, Granularity::Day);
        assert_eq!(metrics.series.len(), 1);
        assert_eq!(metrics.series[0].revenue, Money::zero());
    }

    #[test]
    fn test_revenue_expenses_and_top_sale() {
        let t = now();
        let sales = [
            sale("s1", t - Duration::hours(2), &[("A", 1, 5000, 0)]),
            sale("s2", t - Duration::hours(1), &[("B", 1, 3000, 0)]),
        ];
        let expenses = [expense("e1", t.date_naive(), 2000)];

        let metrics = compute(today(), &sales, &expenses, &[], &MetricsSettings::default());

        assert_eq!(metrics.revenue.cents(), 8000);
        assert_eq!(metrics.expenses_total.cents(), 2000);
        assert_eq!(metrics.profit.cents(), 6000);
        assert_eq!(metrics.sale_count, 2);
        assert_eq!(metrics.top_sale.as_ref().map(|s| s.total.cents()), Some(5000));
        assert_eq!(metrics.top_expense.as_ref().map(|e| e.id.as_str()), Some("e1"));
    }

    #[test]
    fn test_extreme_totals_saturate() {
        let t = now();
        let half = i64::MAX / 2 + 1;
        let sales = [
            sale("s1", t - Duration::hours(2), &[("A", 1, half, half)]),
            sale("s2", t - Duration::hours(1), &[("A", 1, half, half)]),
        ];
        let expenses = [expense("e1", t.date_naive(), i64::MAX)];

        let metrics = compute(today(), &sales, &expenses, &[], &MetricsSettings::default());

        assert_eq!(metrics.revenue.cents(), i64::MAX);
        assert_eq!(metrics.cost_of_goods.cents(), i64::MAX);
        assert_eq!(metrics.profit.cents(), -i64::MAX);
        assert_eq!(metrics.top_product.map(|p| p.revenue.cents()), Some(i64::MAX));
        assert_eq!(metrics.series[0].revenue.cents(), i64::MAX);
        assert!(metrics
            .alerts
            .iter()
            .any(|a| matches!(a, DashboardAlert::OperatingAtLoss { .. })));

        let all = compute(
            WindowPreset::AllTime.resolve(t),
            &sales,
            &expenses,
            &[],
            &MetricsSettings::default(),
        );
        assert_eq!(all.granularity, Granularity::Month);
        assert_eq!(all.series[0].revenue.cents(), i64::MAX);
    }

    #[test]
    fn test_profit_subtracts_cost_of_goods() {
        let sales = [sale("s1", now(), &[("A", 2, 300, 120), ("B", 1, 700, 500)])];
        let expenses = [expense("e1", now().date_naive(), 100)];

        let metrics = compute(today(), &sales, &expenses, &[], &MetricsSettings::default());

        assert_eq!(metrics.revenue.cents(), 1300);
        assert_eq!(metrics.cost_of_goods.cents(), 740);
        assert_eq!(metrics.profit.cents(), 1300 - 740 - 100);
        assert_eq!(metrics.units_sold, 3);
    }

    #[test]
    fn test_records_outside_window_are_ignored() {
        let yesterday = now() - Duration::days(1);
        let sales = [sale("old", yesterday, &[("A", 1, 999, 0)])];
        let expenses = [expense("old", yesterday.date_naive(), 999)];

        let metrics = compute(today(), &sales, &expenses, &[], &MetricsSettings::default());

        assert_eq!(metrics.revenue, Money::zero());
        assert_eq!(metrics.expenses_total, Money::zero());
    }

    #[test]
    fn test_top_product_ties_break_on_lowest_code() {
        let sales = [
            sale("s1", now(), &[("B", 3, 100, 0)]),
            sale("s2", now(), &[("A", 2, 100, 0), ("C", 1, 100, 0)]),
            sale("s3", now(), &[("A", 1, 100, 0)]),
        ];

        let metrics = compute(today(), &sales, &[], &[], &MetricsSettings::default());

        let top = metrics.top_product.unwrap();
        assert_eq!(top.product_code, "A");
        assert_eq!(top.units, 3);
        let order: Vec<_> = metrics.top_products.iter().map(|p| p.product_code.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_top_products_limit() {
        let codes = ["P0", "P1", "P2", "P3", "P4", "P5", "P6", "P7"];
        let sales: Vec<Sale> = codes
            .iter()
            .enumerate()
            .map(|(i, code)| sale(&format!("s{i}"), now(), &[(*code, i as i64 + 1, 100, 0)]))
            .collect();

        let metrics = compute(today(), &sales, &[], &[], &MetricsSettings::default());

        assert_eq!(metrics.top_products.len(), 5);
        assert_eq!(metrics.top_products[0].product_code, "P7");
    }

    #[test]
    fn test_top_sale_ties_break_on_earliest() {
        let t = now();
        let sales = [
            sale("late", t, &[("A", 1, 500, 0)]),
            sale("early", t - Duration::hours(3), &[("B", 1, 500, 0)]),
        ];

        let metrics = compute(today(), &sales, &[], &[], &MetricsSettings::default());
        assert_eq!(metrics.top_sale.unwrap().id, "early");
    }

    #[test]
    fn test_top_expense_ties_break_on_earliest_date() {
        let window = WindowPreset::Last7Days.resolve(now());
        let day = now().date_naive();
        let expenses = [
            expense("newer", day, 700),
            expense("older", day - Duration::days(2), 700),
        ];

        let metrics = compute(window, &[], &expenses, &[], &MetricsSettings::default());
        assert_eq!(metrics.top_expense.unwrap().id, "older");
    }

    #[test]
    fn test_compute_is_order_independent() {
        let t = now();
        let mut sales = vec![
            sale("s1", t - Duration::hours(1), &[("A", 1, 100, 0)]),
            sale("s2", t, &[("A", 1, 100, 0), ("B", 4, 50, 0)]),
        ];
        let a = compute(today(), &sales, &[], &[], &MetricsSettings::default());
        sales.reverse();
        let b = compute(today(), &sales, &[], &[], &MetricsSettings::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_daily_series_is_zero_filled() {
        let window = WindowPreset::Last7Days.resolve(now());
        let sales = [sale("s1", now() - Duration::days(2), &[("A", 1, 400, 0)])];
        let expenses = [expense("e1", now().date_naive(), 150)];

        let metrics = compute(window, &sales, &expenses, &[], &MetricsSettings::default());

        assert_eq!(metrics.series.len(), 7);
        let revenue: Vec<i64> = metrics.series.iter().map(|b| b.revenue.cents()).collect();
        assert_eq!(revenue, vec![0, 0, 0, 0, 400, 0, 0]);
        assert_eq!(metrics.series[6].expenses.cents(), 150);
    }

    #[test]
    fn test_all_time_series_is_monthly_between_first_and_last_activity() {
        let window = WindowPreset::AllTime.resolve(now());
        let jan = Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap();
        let sales = [sale("s1", jan, &[("A", 1, 400, 0)]), sale("s2", now(), &[("A", 1, 100, 0)])];

        let metrics = compute(window, &sales, &[], &[], &MetricsSettings::default());

        assert_eq!(metrics.granularity, Granularity::Month);
        let months: Vec<(String, i64)> = metrics
            .series
            .iter()
            .map(|b| (b.period_start.to_string(), b.revenue.cents()))
            .collect();
        assert_eq!(
            months,
            vec![
                ("2024-01-01".to_string(), 400),
                ("2024-02-01".to_string(), 0),
                ("2024-03-01".to_string(), 100),
            ]
        );
    }

    #[test]
    fn test_critical_stock_and_alerts() {
        let products = [product("B", 1), product("A", 3), product("C", 9), product("D", 1)];

        let metrics = compute(today(), &[], &[], &products, &MetricsSettings::default());

        let codes: Vec<_> = metrics.critical_stock.iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "D", "A"]);
        assert_eq!(
            metrics.alerts,
            vec![
                DashboardAlert::CriticalStock { count: 3 },
                DashboardAlert::LastUnit {
                    code: "B".to_string(),
                    name: "Product B".to_string()
                },
                DashboardAlert::LastUnit {
                    code: "D".to_string(),
                    name: "Product D".to_string()
                },
            ]
        );
        assert_eq!(metrics.alerts[0].message(), "3 products are at critical stock");
    }

    #[test]
    fn test_financial_alerts() {
        let sales = [sale("s1", now(), &[("A", 1, 1000, 0)])];
        let expenses = [expense("e1", now().date_naive(), 1200)];

        let metrics = compute(today(), &sales, &expenses, &[], &MetricsSettings::default());

        assert!(metrics
            .alerts
            .contains(&DashboardAlert::ExpensesAboveHalfRevenue {
                expenses: Money::from_cents(1200),
                revenue: Money::from_cents(1000),
            }));
        assert!(metrics.alerts.contains(&DashboardAlert::OperatingAtLoss {
            profit: Money::from_cents(-200),
        }));
    }
}
