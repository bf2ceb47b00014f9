//! Alert dispatch and lifecycle.
//!
//! An alert row exists only under the manual mechanism and moves
//! PENDING -> {CONFIRMED, DISMISSED} exactly once. The transition is a
//! single conditional write in the store, so concurrent confirm/dismiss
//! calls cannot both succeed.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{
    Alert, AlertMechanism, AlertPolicy, AlertStatus, AlertType, Identity, NewAlert,
};
use crate::notify::Notifier;
use crate::store::{ResolveOutcome, Store};

/// What a low-signal dispatch did, reported back to the ping service.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Automatic mechanism: one notification sent, no alert row.
    Notified,
    /// Manual mechanism: one PENDING alert awaiting confirmation.
    Pending(Alert),
    /// No mode configured, unknown mode key, or no reachable recipient.
    Skipped,
}

pub struct AlertDispatcher;

impl AlertDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Entry point, invoked once per ping that evaluated as low-signal.
    pub async fn dispatch_low_signal<S, N>(
        &self,
        store: &S,
        notifier: &N,
        user_id: Uuid,
        device_id: Uuid,
        sample_id: Option<Uuid>,
        message: &str,
    ) -> CoreResult<DispatchOutcome>
    where
        S: Store + ?Sized,
        N: Notifier + ?Sized,
    {
        let mode = store.alert_mode(user_id).await?;
        let policy = AlertPolicy::from_mode_key(mode.as_ref().map(|m| m.key.as_str()));

        match policy {
            AlertPolicy::Automatic => {
                let contact_email = store
                    .first_emergency_contact(user_id)
                    .await?
                    .and_then(|c| c.email);
                let recipient = match contact_email {
                    Some(email) => email,
                    None => match store.user_email(user_id).await? {
                        Some(email) => email,
                        None => {
                            warn!(%user_id, "automatic alert has no reachable recipient");
                            return Ok(DispatchOutcome::Skipped);
                        }
                    },
                };
                notifier
                    .send_email(&recipient, "Connectivity alert", message)
                    .await?;
                info!(%user_id, %device_id, "automatic low-signal notification sent");
                Ok(DispatchOutcome::Notified)
            }
            AlertPolicy::Manual => {
                let alert = store
                    .insert_alert(NewAlert {
                        user_id,
                        device_id,
                        sample_id,
                        alert_type: AlertType::LowSignal,
                        message: message.to_string(),
                        mechanism: AlertMechanism::Manual,
                    })
                    .await?;
                info!(%user_id, alert_id = %alert.alert_id, "pending low-signal alert created");
                Ok(DispatchOutcome::Pending(alert))
            }
            AlertPolicy::Unconfigured => {
                info!(%user_id, "no alert mechanism configured, skipping");
                Ok(DispatchOutcome::Skipped)
            }
        }
    }

    /// Confirms a pending alert and emails its owner. The email happens
    /// after the transition committed; a delivery failure surfaces as an
    /// upstream error while the alert stays CONFIRMED.
    pub async fn confirm<S, N>(
        &self,
        store: &S,
        notifier: &N,
        identity: &Identity,
        alert_id: Uuid,
    ) -> CoreResult<Alert>
    where
        S: Store + ?Sized,
        N: Notifier + ?Sized,
    {
        let alert = self
            .transition(store, identity, alert_id, AlertStatus::Confirmed)
            .await?;

        if let Some(email) = store.user_email(alert.user_id).await? {
            notifier
                .send_email(&email, "Alert confirmed", &alert.message)
                .await?;
        }
        Ok(alert)
    }

    /// Dismisses a pending alert. No notification.
    pub async fn dismiss<S>(
        &self,
        store: &S,
        identity: &Identity,
        alert_id: Uuid,
    ) -> CoreResult<Alert>
    where
        S: Store + ?Sized,
    {
        self.transition(store, identity, alert_id, AlertStatus::Dismissed)
            .await
    }

    async fn transition<S: Store + ?Sized>(
        &self,
        store: &S,
        identity: &Identity,
        alert_id: Uuid,
        to: AlertStatus,
    ) -> CoreResult<Alert> {
        match store
            .resolve_alert(alert_id, identity.user_id, to, Utc::now())
            .await?
        {
            ResolveOutcome::Resolved(alert) => {
                info!(%alert_id, status = to.as_str(), "alert resolved");
                Ok(alert)
            }
            ResolveOutcome::AlreadyHandled => Err(CoreError::AlreadyHandled),
            ResolveOutcome::NotFound => Err(CoreError::NotFound("alert")),
        }
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
