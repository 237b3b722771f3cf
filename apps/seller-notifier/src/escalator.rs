//! Escalating reminders for orders a seller has not acknowledged.
//!
//! Each tracked order moves `Pending -> Reminded -> Cleared`. `Reminded` is
//! re-entrant: an order keeps collecting reminders, one per cooldown, until
//! it is cleared by a status change, a view, or a dismiss. The escalator is
//! driven by a periodic [`Escalator::tick`] and never touches the network.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use market_common::protocol::{OrderNew, OrderStatusChanged};
use market_common::OrderStatus;

use crate::notifier::{DesktopNotifier, Permission};
use crate::store::{marker_key, MarkerStore};

/// How long an order may sit unacknowledged before the first reminder.
pub const REMIND_AFTER: Duration = Duration::minutes(3);
/// Minimum gap between two reminders for the same order.
pub const REMINDER_COOLDOWN: Duration = Duration::minutes(1);

const REMINDER_PREFIX: &str = "Reminder:";

/// How many cleared order ids are remembered to ignore a replayed `order:new`.
const CLEARED_HISTORY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Pending,
    Reminded,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Original,
    Reminder,
}

/// One card on the seller's dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub id: String,
    /// Base order id shared by the original and all its reminders.
    pub order_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

struct TrackedOrder {
    order_number: String,
    /// Local receipt time, not the server timestamp.
    received_at: DateTime<Utc>,
    state: ReminderState,
}

pub struct Escalator {
    markers: Arc<dyn MarkerStore>,
    notifier: Arc<dyn DesktopNotifier>,
    /// Orders still waiting for the seller.
    orders: BTreeMap<String, TrackedOrder>,
    /// Recently cleared ids, oldest first, mirrored in `cleared_ids`.
    cleared: VecDeque<String>,
    cleared_ids: HashSet<String>,
    /// Newest first.
    notifications: Vec<OrderNotification>,
}

impl Escalator {
    pub fn new(markers: Arc<dyn MarkerStore>, notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            markers,
            notifier,
            orders: BTreeMap::new(),
            cleared: VecDeque::new(),
            cleared_ids: HashSet::new(),
            notifications: Vec::new(),
        }
    }

    pub fn notifications(&self) -> &[OrderNotification] {
        &self.notifications
    }

    pub fn state(&self, order_id: &str) -> Option<ReminderState> {
        if self.cleared_ids.contains(order_id) {
            return Some(ReminderState::Cleared);
        }
        self.orders.get(order_id).map(|o| o.state)
    }

    /// Number of orders still being escalated.
    pub fn tracked(&self) -> usize {
        self.orders.len()
    }

    /// Start tracking a new order. A repeated `order:new` for an order that
    /// is already tracked (or was recently cleared) is ignored.
    pub fn on_order_new(&mut self, order: &OrderNew, now: DateTime<Utc>) {
        if self.orders.contains_key(&order.order_id) || self.cleared_ids.contains(&order.order_id)
        {
            return;
        }

        self.orders.insert(
            order.order_id.clone(),
            TrackedOrder {
                order_number: order.order_number.clone(),
                received_at: now,
                state: ReminderState::Pending,
            },
        );
        self.notifications.insert(
            0,
            OrderNotification {
                id: order.order_id.clone(),
                order_id: order.order_id.clone(),
                kind: NotificationKind::Original,
                message: order.message.clone(),
                created_at: now,
            },
        );
        tracing::debug!(order_id = %order.order_id, "tracking order");
    }

    /// Clear the order once it leaves `pending`. Returns whether it was cleared.
    pub async fn on_status_changed(&mut self, change: &OrderStatusChanged) -> bool {
        if change.status == OrderStatus::Pending {
            return false;
        }
        self.clear(&change.order_id).await
    }

    pub async fn view(&mut self, order_id: &str) -> bool {
        self.clear(order_id).await
    }

    pub async fn dismiss(&mut self, order_id: &str) -> bool {
        self.clear(order_id).await
    }

    /// Drop every card for `order_id`, stop tracking it and forget its marker.
    async fn clear(&mut self, order_id: &str) -> bool {
        if self.orders.remove(order_id).is_none() {
            return false;
        }
        self.remember_cleared(order_id);
        self.notifications.retain(|n| n.order_id != order_id);

        if let Err(e) = self.markers.del(&marker_key(order_id)).await {
            tracing::warn!(%order_id, error = %e, "failed to delete reminder marker");
        }
        tracing::debug!(%order_id, "order cleared");
        true
    }

    fn remember_cleared(&mut self, order_id: &str) {
        if self.cleared_ids.insert(order_id.to_string()) {
            self.cleared.push_back(order_id.to_string());
        }
        while self.cleared.len() > CLEARED_HISTORY {
            if let Some(oldest) = self.cleared.pop_front() {
                self.cleared_ids.remove(&oldest);
            }
        }
    }

    /// Raise reminders that are due at `now`. Returns the reminders raised.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Vec<OrderNotification> {
        let mut raised = Vec::new();

        for (order_id, order) in self.orders.iter_mut() {
            if now - order.received_at < REMIND_AFTER {
                continue;
            }

            let key = marker_key(order_id);
            let last_reminder = match self.markers.get(&key).await {
                Ok(marker) => marker
                    .and_then(|m| m.parse::<i64>().ok())
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .unwrap_or(order.received_at),
                Err(e) => {
                    // Skipping is safer than reminding twice inside the cooldown.
                    tracing::warn!(%order_id, error = %e, "failed to read reminder marker");
                    continue;
                }
            };
            if now - last_reminder < REMINDER_COOLDOWN {
                continue;
            }

            let minutes = (now - order.received_at).num_minutes();
            let reminder = OrderNotification {
                id: format!("{order_id}-reminder-{}", now.timestamp_millis()),
                order_id: order_id.clone(),
                kind: NotificationKind::Reminder,
                message: format!(
                    "{REMINDER_PREFIX} order #{} has been waiting {minutes} minutes",
                    order.order_number
                ),
                created_at: now,
            };

            if let Err(e) = self
                .markers
                .set(&key, &now.timestamp_millis().to_string())
                .await
            {
                tracing::warn!(%order_id, error = %e, "failed to persist reminder marker");
            }
            order.state = ReminderState::Reminded;

            if self.notifier.permission() == Permission::Granted {
                self.notifier.notify("Order waiting", &reminder.message);
            }
            tracing::info!(%order_id, minutes, "reminder raised");
            raised.push(reminder);
        }

        for reminder in raised.iter().rev() {
            self.notifications.insert(0, reminder.clone());
        }
        raised
    }
}
