//! # Sale Recorder
//!
//! Records a multi-line sale so that stock and sale records never disagree.
//!
//! ## Unit of Work
//! ```text
//! record_sale([(B,1), (A,2), (A,1)])
//!      │
//!      ▼
//! normalize ─────────────► [(B,1), (A,3)]   merged, first-appearance order
//!      │
//!      ▼  tokio::spawn (runs to completion even if the caller goes away)
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ pre-flight    get_many([B, A])  → every missing code / every shortfall │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │ reserve       A ──► B           ascending code order                   │
//! │      │            ✗ B refused                                           │
//! │      │            └──► release A, return InsufficientStock(B)          │
//! │      ▼                                                                  │
//! │ build Sale    uuid, snapshot prices, total, now                        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │ persist       one transaction, retried with backoff                    │
//! │               duplicate id on retry → earlier attempt committed        │
//! │               out of attempts       → PersistenceFailed                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reserving in a fixed order means two carts holding the same products
//! always contend for them in the same sequence.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SaleSettings;
use crate::error::{SaleError, SaleResult, Shortfall};
use emporium_core::validation::normalize_sale_request;
use emporium_core::{Product, Sale, SaleItem, SaleLine, ValidationErrors};
use emporium_db::{Database, DbError, ProductStore, Reservation, SaleRepository};

#[derive(Debug, Clone)]
pub struct SaleRecorder {
    products: ProductStore,
    sales: SaleRepository,
    settings: SaleSettings,
}

impl SaleRecorder {
    pub fn new(db: &Database, settings: SaleSettings) -> Self {
        SaleRecorder {
            products: db.products(),
            sales: db.sales(),
            settings,
        }
    }

    /// Records a sale of `lines`, all or nothing.
    ///
    /// On `Ok` the sale is stored and stock reflects it exactly. On error
    /// stock is unchanged, except for the operator-visible variants (see
    /// [`SaleError::is_operator_visible`]).
    ///
    /// Dropping the returned future does not stop the unit of work once it
    /// has started; it finishes on its own task.
    pub async fn record_sale(&self, lines: &[SaleLine]) -> SaleResult<Sale> {
        let lines = normalize_sale_request(lines)?;

        let recorder = self.clone();
        let handle = tokio::spawn(async move { recorder.run(lines).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Sale task did not complete");
                Err(SaleError::Aborted(e.to_string()))
            }
        }
    }

    async fn run(&self, lines: Vec<SaleLine>) -> SaleResult<Sale> {
        self.preflight(&lines).await?;

        let held = self.reserve_all(&lines).await?;

        let sale = match build_sale(&held) {
            Ok(sale) => sale,
            Err(errors) => {
                self.rollback(held).await?;
                return Err(SaleError::InvalidInput(errors));
            }
        };

        let sale = self.persist(sale).await?;

        info!(
            sale_id = %sale.id,
            lines = sale.items.len(),
            units = sale.units(),
            total = %sale.total,
            "Sale recorded"
        );
        Ok(sale)
    }

    // =========================================================================
    // Pre-flight
    // =========================================================================

    /// Reports every unknown code, or failing that every short line, before
    /// anything is written.
    async fn preflight(&self, lines: &[SaleLine]) -> SaleResult<()> {
        let codes: Vec<String> = lines.iter().map(|l| l.product_code.clone()).collect();
        let found = self.products.get_many(&codes).await?;
        let by_code: HashMap<&str, &Product> =
            found.iter().map(|p| (p.code.as_str(), p)).collect();

        let missing: Vec<String> = codes
            .iter()
            .filter(|code| !by_code.contains_key(code.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "Sale refused: unknown products");
            return Err(SaleError::NotFound { codes: missing });
        }

        let shortfalls: Vec<Shortfall> = lines
            .iter()
            .filter_map(|line| {
                let product = by_code.get(line.product_code.as_str())?;
                (!product.can_sell(line.quantity)).then(|| Shortfall {
                    code: line.product_code.clone(),
                    available: product.quantity_on_hand,
                    requested: line.quantity,
                })
            })
            .collect();
        if !shortfalls.is_empty() {
            debug!(?shortfalls, "Sale refused: insufficient stock");
            return Err(SaleError::InsufficientStock { shortfalls });
        }

        Ok(())
    }

    // =========================================================================
    // Reservation and Rollback
    // =========================================================================

    /// Reserves every line in ascending code order.
    ///
    /// Returns reservations tagged with their line index, in reservation
    /// order. If any line is refused, earlier reservations are released
    /// before the refusal is returned.
    async fn reserve_all(&self, lines: &[SaleLine]) -> SaleResult<Vec<(usize, Reservation)>> {
        let mut order: Vec<usize> = (0..lines.len()).collect();
        order.sort_by(|&a, &b| lines[a].product_code.cmp(&lines[b].product_code));

        let mut held: Vec<(usize, Reservation)> = Vec::with_capacity(lines.len());
        for index in order {
            let line = &lines[index];
            match self
                .products
                .reserve_and_decrement(&line.product_code, line.quantity)
                .await
            {
                Ok(reservation) => held.push((index, reservation)),
                Err(e) => {
                    warn!(
                        code = %line.product_code,
                        error = %e,
                        held = held.len(),
                        "Reservation refused, rolling back"
                    );
                    self.rollback(held).await?;
                    return Err(e.into());
                }
            }
        }

        Ok(held)
    }

    /// Releases `held` in reverse reservation order.
    ///
    /// Every reservation is attempted even if an earlier release fails; the
    /// ones that could not be given back are named in `RollbackFailed`.
    async fn rollback(&self, held: Vec<(usize, Reservation)>) -> SaleResult<()> {
        let mut stuck = Vec::new();
        let mut last_error = None;

        for (_, reservation) in held.iter().rev() {
            if let Err(e) = self.release_with_retry(reservation).await {
                error!(
                    code = %reservation.code,
                    quantity = reservation.quantity,
                    error = %e,
                    "Could not release reservation; stock must be corrected by hand"
                );
                stuck.push(reservation.code.clone());
                last_error = Some(e);
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) => Err(SaleError::RollbackFailed {
                codes: stuck,
                reason: e.to_string(),
            }),
        }
    }

    async fn release_with_retry(&self, reservation: &Reservation) -> Result<(), DbError> {
        let mut backoff = self.create_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.products.release(reservation).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.settings.persist_max_attempts => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.settings.max_backoff());
                    warn!(
                        code = %reservation.code,
                        attempt = attempt,
                        ?delay,
                        error = %e,
                        "Release failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    async fn persist(&self, sale: Sale) -> SaleResult<Sale> {
        let mut backoff = self.create_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.sales.insert(&sale).await {
                Ok(()) => return Ok(sale),

                // The previous attempt committed but its reply was lost.
                Err(DbError::UniqueViolation { .. }) if attempt > 1 => {
                    debug!(sale_id = %sale.id, attempt = attempt, "Sale already stored");
                    return Ok(sale);
                }

                Err(e) if e.is_retryable() && attempt < self.settings.persist_max_attempts => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.settings.max_backoff());
                    warn!(
                        sale_id = %sale.id,
                        attempt = attempt,
                        ?delay,
                        error = %e,
                        "Sale persistence failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }

                Err(e) => {
                    error!(
                        sale_id = %sale.id,
                        attempts = attempt,
                        total = %sale.total,
                        products = ?sale.items.iter().map(|i| &i.product_code).collect::<Vec<_>>(),
                        error = %e,
                        "Stock was taken but the sale was not recorded; reconcile manually"
                    );
                    return Err(SaleError::PersistenceFailed {
                        sale: Box::new(sale),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.settings.initial_backoff(),
            max_interval: self.settings.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by attempt count instead
            ..Default::default()
        }
    }
}

/// Builds the sale from reservations, items in request order.
fn build_sale(held: &[(usize, Reservation)]) -> Result<Sale, ValidationErrors> {
    let mut ordered: Vec<&(usize, Reservation)> = held.iter().collect();
    ordered.sort_by_key(|(index, _)| *index);

    let mut items = Vec::with_capacity(ordered.len());
    for (_, r) in ordered {
        items.push(SaleItem::new(
            &r.code,
            &r.name,
            r.quantity,
            r.unit_price,
            r.unit_cost,
        )?);
    }

    Ok(Sale::from_items(Uuid::new_v4().to_string(), items, Utc::now())?)
}

// =============================================================================
// Unit Tests
// =============================================================================
