use std::fmt::Debug;

use chrono::{SecondsFormat, Utc};
use explorer_tools::NormalizedTransaction;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::AdapterRegistry,
    cpe_api::errors::ReconcileError,
    db_types::{meta_keys, ExpectedPayment, Order, OrderId, OrderStatusType},
    events::{EventProducers, PaymentConfirmedEvent, PaymentDetectedEvent},
    matcher::{find_match, find_pinned_match, MatchResult},
    traits::{OrderStore, OrderStoreError},
};

pub const PAYMENT_CONFIRMED_MESSAGE: &str = "Payment confirmed!";
pub const PAYMENT_PENDING_MESSAGE: &str = "Payment still pending. Checking blockchain...";
pub const ORDER_CLOSED_MESSAGE: &str = "This order has been closed.";

/// What a single reconciliation did to an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The order is not pending, or its payment metadata is incomplete. Nothing was reconciled.
    Skipped,
    /// Nothing new was observed, or the explorer could not be reached.
    NoChange,
    /// A matching transaction is known, but it is not confirmed yet.
    Detected { tx_hash: String, confirmations: u64 },
    /// A matching transaction is confirmed. `finalized` is true only for the reconciliation that finalized the order.
    Confirmed { tx_hash: String, confirmations: u64, finalized: bool },
}

/// The result of a customer-initiated check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub message: String,
    pub outcome: ReconcileOutcome,
}

/// `ReconcileApi` drives pending orders through `AwaitingPayment -> PaymentDetected -> PaymentConfirmed` based on what
/// the chain adapters report.
///
/// Explorer failures never count against an order. They just mean that there is nothing new to report this time.
#[derive(Clone)]
pub struct ReconcileApi<B> {
    db: B,
    adapters: AdapterRegistry,
    producers: EventProducers,
}

impl<B> Debug for ReconcileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcileApi({:?})", self.adapters)
    }
}

impl<B> ReconcileApi<B> {
    pub fn new(db: B, adapters: AdapterRegistry, producers: EventProducers) -> Self {
        Self { db, adapters, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconcileApi<B>
where B: OrderStore
{
    /// Reconcile a single order against the chain.
    ///
    /// `order` only identifies the order. Its current state is read from the store, so a stale copy (from a sweep
    /// listing, say) cannot undo what a concurrent reconciliation has already done. Confirmed and closed orders are
    /// skipped without being touched. Every other order gets its last-checked timestamp updated, whatever the outcome.
    pub async fn reconcile_order(&self, order: &Order) -> Result<ReconcileOutcome, ReconcileError> {
        let current = self.fetch_current(&order.order_id).await?;
        self.reconcile_current(&current).await
    }

    async fn fetch_current(&self, order_id: &OrderId) -> Result<Order, ReconcileError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| ReconcileError::OrderNotFound(order_id.clone()))
    }

    async fn reconcile_current(&self, order: &Order) -> Result<ReconcileOutcome, ReconcileError> {
        let oid = &order.order_id;
        if !order.status.is_pending() {
            trace!("🔄️ Order {oid} is {}. Skipping reconciliation", order.status);
            return Ok(ReconcileOutcome::Skipped);
        }
        let checked_at = [(meta_keys::LAST_CHECKED_AT, Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))];
        let expected = match order.expected_payment() {
            Ok(e) => e,
            Err(e) => {
                warn!("🔄️ Order {oid} cannot be reconciled. {e}");
                self.db.save_order_metadata(oid, &checked_at).await?;
                return Ok(ReconcileOutcome::Skipped);
            },
        };
        let transactions = match self.adapters.get(expected.currency) {
            Ok(adapter) => adapter.fetch_transactions(&expected.address).await,
            Err(e) => Err(e),
        };
        self.db.save_order_metadata(oid, &checked_at).await?;
        let transactions = match transactions {
            Ok(txs) => txs,
            Err(e) => {
                info!("🔄️ No observation for order {oid} this time. {e}");
                return Ok(ReconcileOutcome::NoChange);
            },
        };
        let Some(m) = self.match_payment(order, &expected, &transactions) else {
            return Ok(ReconcileOutcome::NoChange);
        };
        if self.db.record_payment_observation(oid, &m.tx_hash, m.confirmations).await? {
            return self.apply_match(order, m).await;
        }
        // Someone else bound or closed the order in the meantime. Follow their binding.
        debug!("🔄️ Order {oid} changed while it was being reconciled. {} was not recorded", m.tx_hash);
        let order = self.fetch_current(oid).await?;
        if !order.status.is_pending() {
            return Ok(ReconcileOutcome::Skipped);
        }
        let Some(m) = self.match_payment(&order, &expected, &transactions) else {
            return Ok(ReconcileOutcome::NoChange);
        };
        if self.db.record_payment_observation(oid, &m.tx_hash, m.confirmations).await? {
            self.apply_match(&order, m).await
        } else {
            Ok(ReconcileOutcome::NoChange)
        }
    }

    /// The payment for `order` among `transactions`. An order that is bound to a transaction only matches that one.
    fn match_payment(
        &self,
        order: &Order,
        expected: &ExpectedPayment,
        transactions: &[NormalizedTransaction],
    ) -> Option<MatchResult> {
        let oid = &order.order_id;
        let pinned = order.observation().tx_hash;
        let matched = match &pinned {
            Some(hash) => find_pinned_match(transactions, expected.amount, hash),
            None => find_match(transactions, expected.amount),
        };
        if matched.is_none() {
            if let Some(hash) = pinned {
                warn!("🔄️ Order {oid} is bound to {hash}, but the explorer no longer reports it as a match");
            } else {
                debug!("🔄️ No payment for order {oid} yet ({} transactions checked)", transactions.len());
            }
        }
        matched
    }

    async fn apply_match(&self, order: &Order, m: MatchResult) -> Result<ReconcileOutcome, ReconcileError> {
        if m.confirmed {
            self.apply_confirmed(order, m).await
        } else {
            self.apply_detected(order, m).await
        }
    }

    /// Move the order to `status`. `None` means the order was closed or moved on by someone else in the meantime.
    async fn advance_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Option<Order>, ReconcileError> {
        match self.db.set_order_status(order_id, status).await {
            Ok(order) => Ok(Some(order)),
            Err(OrderStoreError::ForbiddenStatusChange { from, .. }) => {
                info!("🔄️ Order {order_id} became {from} while it was being reconciled. Leaving it alone");
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_detected(&self, order: &Order, m: MatchResult) -> Result<ReconcileOutcome, ReconcileError> {
        let MatchResult { tx_hash, confirmations, .. } = m;
        if order.status == OrderStatusType::AwaitingPayment {
            let Some(updated) = self.advance_status(&order.order_id, OrderStatusType::PaymentDetected).await? else {
                return Ok(ReconcileOutcome::Skipped);
            };
            info!("🔄️ Payment detected for order {} in {tx_hash}. Waiting for confirmation", order.order_id);
            let event = PaymentDetectedEvent::new(updated, tx_hash.clone(), confirmations);
            self.producers.publish_payment_detected(event);
        } else {
            trace!("🔄️ Order {} is still waiting for {tx_hash} to confirm", order.order_id);
        }
        Ok(ReconcileOutcome::Detected { tx_hash, confirmations })
    }

    /// The order is finalized before the status moves, so that a failed status change leaves a paid order pending,
    /// and the next reconciliation completes it. Only pending orders can be finalized.
    async fn apply_confirmed(&self, order: &Order, m: MatchResult) -> Result<ReconcileOutcome, ReconcileError> {
        let MatchResult { tx_hash, confirmations, .. } = m;
        let oid = &order.order_id;
        let finalized = self.db.finalize_order_payment(oid, &tx_hash).await?;
        let Some(updated) = self.advance_status(oid, OrderStatusType::PaymentConfirmed).await? else {
            return Ok(ReconcileOutcome::Skipped);
        };
        if finalized {
            info!("🔄️ Payment for order {oid} confirmed in {tx_hash}. The order has been finalized");
            let event = PaymentConfirmedEvent::new(updated, tx_hash.clone(), confirmations);
            self.producers.publish_payment_confirmed(event);
        } else {
            debug!("🔄️ Order {oid} was already finalized");
        }
        Ok(ReconcileOutcome::Confirmed { tx_hash, confirmations, finalized })
    }

    /// Run a single, on-demand reconciliation for the order. Callers must check that the requester owns the order.
    pub async fn check_order(&self, order_id: &OrderId) -> Result<CheckResult, ReconcileError> {
        let order = self.fetch_current(order_id).await?;
        let outcome = self.reconcile_current(&order).await?;
        let status = match &outcome {
            ReconcileOutcome::Confirmed { .. } => OrderStatusType::PaymentConfirmed,
            ReconcileOutcome::Detected { .. } => OrderStatusType::PaymentDetected,
            ReconcileOutcome::Skipped | ReconcileOutcome::NoChange if order.status.is_pending() => {
                self.fetch_current(order_id).await?.status
            },
            _ => order.status,
        };
        let message = match status {
            OrderStatusType::PaymentConfirmed => PAYMENT_CONFIRMED_MESSAGE,
            OrderStatusType::Cancelled => ORDER_CLOSED_MESSAGE,
            _ => PAYMENT_PENDING_MESSAGE,
        };
        debug!("🔄️ Manual check for order {order_id}: {status}");
        Ok(CheckResult { order_id: order_id.clone(), status, message: message.to_string(), outcome })
    }
}
