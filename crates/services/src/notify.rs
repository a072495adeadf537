//! Notification seam. Delivery (email, SMS, push) lives outside the core;
//! services only see this trait and treat every send as best-effort.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderStatus};

/// A notification delivery failure. Never propagated past the dispatch point.
#[derive(Debug, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound notifications triggered by order activity.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError>;

    async fn order_status_update(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), NotifyError>;

    async fn order_updated(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Production wiring: notifications are logged, nothing is sent.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            email = %order.billing.email,
            total = %order.summary.total,
            "order confirmation notification"
        );
        Ok(())
    }

    async fn order_status_update(
        &self,
        order: &Order,
        previous: OrderStatus,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %order.status,
            "order status notification"
        );
        Ok(())
    }

    async fn order_updated(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(order_id = %order.id, "order update notification");
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    Confirmation(OrderId),
    StatusUpdate(OrderId, OrderStatus),
    Updated(OrderId),
}

/// Test notifier that records every send and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn record(&self, notification: SentNotification) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError("recording notifier set to fail".to_string()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        self.record(SentNotification::Confirmation(order.id))
    }

    async fn order_status_update(
        &self,
        order: &Order,
        _previous: OrderStatus,
    ) -> Result<(), NotifyError> {
        self.record(SentNotification::StatusUpdate(order.id, order.status))
    }

    async fn order_updated(&self, order: &Order) -> Result<(), NotifyError> {
        self.record(SentNotification::Updated(order.id))
    }
}
