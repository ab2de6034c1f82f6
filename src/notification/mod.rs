//! Outbound reminder channel.
//!
//! The scheduler talks to the operating system's local-notification facility
//! only through [`NotificationChannel`]. The facility has a hard global
//! capacity and silently drops submissions beyond it, which is why every
//! submission is first admitted by [`crate::BudgetManager`].

mod local_notification_center;
mod payload;

pub use local_notification_center::*;
pub use payload::*;

#[cfg(test)]
mod local_notification_center_test;
#[cfg(test)]
mod payload_test;

use std::time::SystemTime;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::TimerKind;

/// Routing data carried alongside a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub owner_id: String,
    pub kind: TimerKind,
}

/// A scheduled reminder. `id` equals the timer's persistence key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Absolute delivery time (the timer's `end_time`)
    pub fire_at: SystemTime,
    pub category: String,
    pub user_info: UserInfo,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync + 'static {
    /// Schedules `payload` for delivery at `payload.fire_at`.
    ///
    /// Submitting an id that is already pending replaces it.
    async fn submit(
        &self,
        payload: NotificationPayload,
    ) -> Result<()>;

    /// Cancels a pending notification. Unknown ids are ignored.
    async fn cancel(
        &self,
        id: &str,
    ) -> Result<()>;

    /// Ids currently scheduled and not yet delivered.
    async fn list_pending(&self) -> Result<Vec<String>>;

    /// Ids delivered and still shown to the user.
    async fn list_delivered(&self) -> Result<Vec<String>>;

    /// Removes delivered notifications from the user's view.
    async fn clear_delivered(
        &self,
        ids: &[String],
    ) -> Result<()>;
}
