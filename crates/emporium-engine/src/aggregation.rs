//! # Aggregation Engine
//!
//! Dashboard figures for a time window.
//!
//! ```text
//! compute(window)
//!      │
//!      ▼
//! ReadSnapshot ─┬─ sales_in(window)          (with items)
//!               ├─ expenses_in(window)
//!               └─ products_at_or_below(threshold)
//!      │
//!      ▼
//! emporium_core::metrics::compute   (pure, no I/O)
//!      │
//!      ▼
//! DashboardMetrics
//! ```
//!
//! All three reads share one transaction, so a sale committed mid-compute
//! shows up in every figure or in none.

use chrono::{DateTime, Days, Utc};
use tracing::debug;

use crate::error::EngineResult;
use emporium_core::metrics::{self, SeriesBucket};
use emporium_core::window::MAX_DAILY_BUCKET_DAYS;
use emporium_core::{AggregationWindow, DashboardMetrics, MetricsSettings, Sale, WindowPreset};
use emporium_db::Database;

#[derive(Debug, Clone)]
pub struct AggregationEngine {
    db: Database,
    settings: MetricsSettings,
}

impl AggregationEngine {
    /// `settings` usually comes from [`EngineConfig::metrics_settings`](crate::EngineConfig::metrics_settings).
    pub fn new(db: &Database, settings: MetricsSettings) -> Self {
        AggregationEngine {
            db: db.clone(),
            settings,
        }
    }

    /// Computes dashboard metrics for `window`.
    ///
    /// An empty window is not an error: sums are zero and tops are `None`.
    /// Fails only when the store does.
    pub async fn compute(&self, window: AggregationWindow) -> EngineResult<DashboardMetrics> {
        let settings = &self.settings;

        let mut snapshot = self.db.snapshot().await?;
        let sales = snapshot.sales_in(&window).await?;
        let expenses = snapshot.expenses_in(&window).await?;
        let critical = snapshot
            .products_at_or_below(settings.critical_stock_threshold)
            .await?;
        snapshot.finish().await?;

        debug!(
            %window,
            sales = sales.len(),
            expenses = expenses.len(),
            critical = critical.len(),
            "Computing dashboard metrics"
        );

        Ok(metrics::compute(
            window, &sales, &expenses, &critical, settings,
        ))
    }

    pub async fn compute_preset(&self, preset: WindowPreset) -> EngineResult<DashboardMetrics> {
        self.compute_preset_at(preset, Utc::now()).await
    }

    /// Like [`compute_preset`](Self::compute_preset) with an explicit clock.
    pub async fn compute_preset_at(
        &self,
        preset: WindowPreset,
        now: DateTime<Utc>,
    ) -> EngineResult<DashboardMetrics> {
        self.compute(preset.resolve(now)).await
    }

    /// Daily revenue and expenses for the last `days` days, today included.
    ///
    /// `days` is clamped to `1..=366`.
    pub async fn trend(&self, days: u32) -> EngineResult<Vec<SeriesBucket>> {
        let days = (days as i64).clamp(1, MAX_DAILY_BUCKET_DAYS);
        let today = Utc::now().date_naive();
        let first = today
            .checked_sub_days(Days::new(days as u64 - 1))
            .unwrap_or(today);

        let window = AggregationWindow::days(first, today)?;
        Ok(self.compute(window).await?.series)
    }

    /// Latest sales, newest first.
    pub async fn recent_sales(&self, limit: u32) -> EngineResult<Vec<Sale>> {
        Ok(self.db.sales().recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SaleSettings;
    use crate::{EngineConfig, SaleRecorder};
    use chrono::Duration;
    use emporium_core::metrics::Granularity;
    use emporium_core::{DashboardAlert, Money, NewExpense, NewProduct, SaleItem, SaleLine};
    use emporium_db::DbConfig;

    async fn setup() -> (Database, SaleRecorder, AggregationEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let recorder = SaleRecorder::new(&db, SaleSettings::default());
        let engine = AggregationEngine::new(&db, EngineConfig::default().metrics_settings());
        (db, recorder, engine)
    }

    async fn add_product(db: &Database, code: &str, price: i64, cost: i64, stock: i64) {
        db.products()
            .create(NewProduct {
                code: code.to_string(),
                name: format!("Product {}", code),
                purchase_price: Money::from_cents(cost),
                sale_price: Money::from_cents(price),
                quantity_on_hand: stock,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_day() {
        let (_db, _recorder, engine) = setup().await;

        let metrics = engine.compute_preset(WindowPreset::Today).await.unwrap();

        assert!(metrics.revenue.is_zero());
        assert!(metrics.expenses_total.is_zero());
        assert!(metrics.profit.is_zero());
        assert_eq!(metrics.sale_count, 0);
        assert_eq!(metrics.top_product, None);
        assert_eq!(metrics.top_sale, None);
        assert_eq!(metrics.top_expense, None);
        assert!(metrics.top_products.is_empty());
        assert!(metrics.critical_stock.is_empty());
        assert!(metrics.alerts.is_empty());
        assert_eq!(metrics.granularity, Granularity::Day);
        assert_eq!(metrics.series.len(), 1);
    }

    #[tokio::test]
    async fn test_sales_and_expense_totals() {
        let (db, recorder, engine) = setup().await;
        add_product(&db, "BIG", 5_000, 2_000, 10).await;
        add_product(&db, "MID", 3_000, 1_000, 10).await;

        recorder.record_sale(&[SaleLine::new("BIG", 1)]).await.unwrap();
        recorder.record_sale(&[SaleLine::new("MID", 1)]).await.unwrap();
        db.expenses()
            .add(NewExpense {
                date: Utc::now().date_naive(),
                description: "Rent share".into(),
                category: "rent".into(),
                amount: Money::from_cents(2_000),
            })
            .await
            .unwrap();

        let metrics = engine.compute_preset(WindowPreset::AllTime).await.unwrap();

        assert_eq!(metrics.revenue, Money::from_cents(8_000));
        assert_eq!(metrics.cost_of_goods, Money::from_cents(3_000));
        assert_eq!(metrics.expenses_total, Money::from_cents(2_000));
        assert_eq!(metrics.profit, Money::from_cents(3_000));
        assert_eq!(metrics.sale_count, 2);
        assert_eq!(metrics.units_sold, 2);
        assert_eq!(
            metrics.top_sale.map(|s| s.total),
            Some(Money::from_cents(5_000))
        );
        assert_eq!(
            metrics.top_expense.map(|e| e.amount),
            Some(Money::from_cents(2_000))
        );
        // One unit each: tie broken by code.
        assert_eq!(
            metrics.top_product.map(|p| p.product_code),
            Some("BIG".to_string())
        );
        assert!(metrics.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_compute_is_idempotent() {
        let (db, recorder, engine) = setup().await;
        add_product(&db, "A", 300, 100, 6).await;
        recorder.record_sale(&[SaleLine::new("A", 2)]).await.unwrap();

        let now = Utc::now();
        let first = engine
            .compute_preset_at(WindowPreset::Last7Days, now)
            .await
            .unwrap();
        let second = engine
            .compute_preset_at(WindowPreset::Last7Days, now)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.series.len(), 7);
    }

    #[tokio::test]
    async fn test_window_excludes_older_sales() {
        let (db, _recorder, engine) = setup().await;
        let item = SaleItem::new("A", "Apple", 1, Money::from_cents(400), Money::from_cents(100))
            .unwrap();
        let old = Sale::from_items("old", vec![item], Utc::now() - Duration::days(10)).unwrap();
        db.sales().insert(&old).await.unwrap();

        let today = engine.compute_preset(WindowPreset::Today).await.unwrap();
        assert!(today.revenue.is_zero());

        let quarter = engine
            .compute_preset(WindowPreset::Last3Months)
            .await
            .unwrap();
        assert_eq!(quarter.revenue, Money::from_cents(400));
        assert_eq!(quarter.sale_count, 1);
    }

    #[tokio::test]
    async fn test_critical_stock_and_alerts() {
        let (db, recorder, engine) = setup().await;
        add_product(&db, "A", 300, 100, 3).await;
        add_product(&db, "B", 300, 100, 50).await;
        add_product(&db, "C", 300, 100, 6).await;

        recorder.record_sale(&[SaleLine::new("A", 2)]).await.unwrap();

        let metrics = engine.compute_preset(WindowPreset::Today).await.unwrap();
        let codes: Vec<&str> = metrics
            .critical_stock
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        assert_eq!(codes, vec!["A"]);
        assert!(metrics
            .alerts
            .contains(&DashboardAlert::CriticalStock { count: 1 }));
        assert!(metrics.alerts.contains(&DashboardAlert::LastUnit {
            code: "A".into(),
            name: "Product A".into(),
        }));
    }

    #[tokio::test]
    async fn test_trend_has_one_bucket_per_day() {
        let (db, recorder, engine) = setup().await;
        add_product(&db, "A", 300, 100, 10).await;
        recorder.record_sale(&[SaleLine::new("A", 1)]).await.unwrap();

        let trend = engine.trend(7).await.unwrap();
        assert_eq!(trend.len(), 7);
        assert_eq!(trend.last().map(|b| b.revenue), Some(Money::from_cents(300)));
        assert!(trend[..6].iter().all(|b| b.revenue.is_zero()));

        assert_eq!(engine.trend(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_sales() {
        let (db, recorder, engine) = setup().await;
        add_product(&db, "A", 300, 100, 10).await;
        for _ in 0..3 {
            recorder.record_sale(&[SaleLine::new("A", 1)]).await.unwrap();
        }

        assert_eq!(engine.recent_sales(2).await.unwrap().len(), 2);
        assert_eq!(engine.recent_sales(10).await.unwrap().len(), 3);
    }
}
