//! Users, profiles and purchase orders.
//!
//! [`UserStateProvider`] is the read interface the profile cache depends
//! on. [`OrderLedger`] is the in-process implementation: it owns user
//! profiles and orders, and notifies every subscribed [`OrderObserver`]
//! after each order write.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::types::{Order, OrderId, OrderStatus, PurchaseState, UserId, UserProfile};

// ==============================================================================
// Traits
// ==============================================================================

/// Per-user state the profile cache reads.
#[async_trait]
pub trait UserStateProvider: Send + Sync {
    /// The user's profile, or `None` if the user has none yet.
    async fn profile(&self, user: UserId) -> Result<Option<UserProfile>, CoreError>;

    /// Return the user's profile, creating an empty one if missing.
    async fn ensure_profile(&self, user: UserId) -> Result<UserProfile, CoreError>;

    /// Purchase counters and latest completion time, or `None` when the
    /// user has no profile.
    async fn purchase_state(&self, user: UserId) -> Result<Option<PurchaseState>, CoreError>;
}

/// Hook run after every write of an order record.
#[async_trait]
pub trait OrderObserver: Send + Sync {
    async fn order_saved(&self, order: &Order);
}

// ==============================================================================
// Order Ledger
// ==============================================================================

#[derive(Default)]
struct LedgerState {
    users: HashSet<UserId>,
    profiles: HashMap<UserId, UserProfile>,
    orders: HashMap<OrderId, Order>,
}

pub struct OrderLedger {
    state: RwLock<LedgerState>,
    observers: RwLock<Vec<Arc<dyn OrderObserver>>>,
    next_order_id: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl Default for OrderLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            observers: RwLock::new(Vec::new()),
            next_order_id: AtomicU64::new(1),
            clock,
        }
    }

    pub async fn subscribe(&self, observer: Arc<dyn OrderObserver>) {
        self.observers.write().await.push(observer);
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Register a user account. Returns `false` if it already existed.
    /// New accounts start without a profile.
    pub async fn register_user(&self, user: UserId) -> bool {
        self.state.write().await.users.insert(user)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// The user's orders, newest first.
    pub async fn orders_for(&self, user: UserId) -> Vec<Order> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }

    /// Create a pending order for a registered user.
    pub async fn place_order(
        &self,
        user: UserId,
        quantity: u32,
        total_amount_cents: u64,
    ) -> Result<Order, CoreError> {
        if !self.state.read().await.users.contains(&user) {
            return Err(CoreError::UserNotFound(user));
        }

        let now = self.clock.now();
        let order = Order {
            id: OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed)),
            user_id: user,
            quantity,
            total_amount_cents,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.save_order(order).await
    }

    /// Persist `order`, stamping `updated_at`, then notify observers.
    ///
    /// Observers run after the ledger lock is released, so they may read
    /// the ledger (the profile cache does, to fingerprint the user).
    pub async fn save_order(&self, mut order: Order) -> Result<Order, CoreError> {
        order.updated_at = self.clock.now();
        {
            let mut state = self.state.write().await;
            if !state.users.contains(&order.user_id) {
                return Err(CoreError::UserNotFound(order.user_id));
            }
            state.orders.insert(order.id, order.clone());
        }
        self.notify_saved(&order).await;
        Ok(order)
    }

    async fn notify_saved(&self, order: &Order) {
        debug!(order.id = %order.id, user.id = %order.user_id, status = ?order.status, "order saved");
        let observers = self.observers.read().await.clone();
        for observer in observers {
            observer.order_saved(order).await;
        }
    }

    /// Move an order to `status`. Status transitions are not restricted;
    /// every call is a write and notifies observers.
    pub async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CoreError> {
        let mut order = self
            .order(order_id)
            .await
            .ok_or(CoreError::OrderNotFound(order_id))?;
        order.status = status;
        self.save_order(order).await
    }

    /// Mark an order paid: credit its licenses to the owner's profile and
    /// move it to `completed`. Completing an already completed order
    /// credits nothing but still counts as a write.
    pub async fn complete_order(&self, order_id: OrderId) -> Result<Order, CoreError> {
        // Status check, credit and save share one write lock so concurrent
        // completions of the same order credit it once.
        let order = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let order = state
                .orders
                .get_mut(&order_id)
                .ok_or(CoreError::OrderNotFound(order_id))?;

            if order.status != OrderStatus::Completed {
                let profile = state
                    .profiles
                    .entry(order.user_id)
                    .or_insert_with(|| new_profile(order.user_id));
                profile.total_licenses_purchased += u64::from(order.quantity);
                info!(
                    order.id = %order.id,
                    user.id = %order.user_id,
                    licenses = order.quantity,
                    "credited licenses for completed order"
                );
            }

            order.status = OrderStatus::Completed;
            order.updated_at = self.clock.now();
            order.clone()
        };

        self.notify_saved(&order).await;
        Ok(order)
    }
}

fn new_profile(user: UserId) -> UserProfile {
    UserProfile {
        user_id: user,
        uuid: uuid::Uuid::new_v4().to_string(),
        chauffecoins_balance: 0,
        total_licenses_purchased: 0,
    }
}

#[async_trait]
impl UserStateProvider for OrderLedger {
    async fn profile(&self, user: UserId) -> Result<Option<UserProfile>, CoreError> {
        let state = self.state.read().await;
        if !state.users.contains(&user) {
            return Err(CoreError::UserNotFound(user));
        }
        Ok(state.profiles.get(&user).cloned())
    }

    async fn ensure_profile(&self, user: UserId) -> Result<UserProfile, CoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains(&user) {
            return Err(CoreError::UserNotFound(user));
        }
        let profile = state.profiles.entry(user).or_insert_with(|| {
            debug!(user.id = %user, "created missing user profile");
            new_profile(user)
        });
        Ok(profile.clone())
    }

    async fn purchase_state(&self, user: UserId) -> Result<Option<PurchaseState>, CoreError> {
        let state = self.state.read().await;
        if !state.users.contains(&user) {
            return Err(CoreError::UserNotFound(user));
        }
        let Some(profile) = state.profiles.get(&user) else {
            return Ok(None);
        };

        let completed = state
            .orders
            .values()
            .filter(|order| order.user_id == user && order.status == OrderStatus::Completed);
        let mut completed_orders_count = 0;
        let mut last_completed_order = None;
        for order in completed {
            completed_orders_count += 1;
            if last_completed_order.map_or(true, |last| order.updated_at > last) {
                last_completed_order = Some(order.updated_at);
            }
        }

        Ok(Some(PurchaseState {
            total_licenses_purchased: profile.total_licenses_purchased,
            completed_orders_count,
            last_completed_order,
        }))
    }
}
