//! Medication reminder service
//!
//! The caller constructs the service with a notification sender, starts it
//! with [`MedicationReminderService::initialize`] and stops it with
//! [`MedicationReminderService::shutdown`]. Each [`tick`] re-derives the
//! medication status and pushes a notification when the user enters the
//! fasting or take-now phase.
//!
//! [`tick`]: MedicationReminderService::tick

use crate::error::InsightsError;
use crate::medication::{classify, MedicationPhase, MedicationSchedule, MedicationStatus};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Payload handed to the push sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Collapses repeated notifications on the device
    pub tag: String,
}

/// Delivery channel for push notifications
pub trait NotificationSender {
    fn send(&self, notification: &PushNotification) -> Result<(), InsightsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceState {
    Created,
    Running,
    Stopped,
}

/// Reminder service owning its sender and last observed phase
pub struct MedicationReminderService<S: NotificationSender> {
    sender: S,
    state: ServiceState,
    last_phase: Option<MedicationPhase>,
}

impl<S: NotificationSender> MedicationReminderService<S> {
    pub fn new(sender: S) -> Self {
        Self {
            sender,
            state: ServiceState::Created,
            last_phase: None,
        }
    }

    /// Start the service; calling it again while running is a no-op
    pub fn initialize(&mut self) {
        if self.state != ServiceState::Running {
            info!("medication reminder service started");
            self.state = ServiceState::Running;
            self.last_phase = None;
        }
    }

    /// Stop the service and forget the last observed phase
    pub fn shutdown(&mut self) {
        if self.state == ServiceState::Running {
            info!("medication reminder service stopped");
        }
        self.state = ServiceState::Stopped;
        self.last_phase = None;
    }

    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Running
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Re-derive the status and notify on entering fasting or take-now
    ///
    /// Returns the notification that was sent, if any.
    pub fn tick(
        &mut self,
        schedule: &MedicationSchedule,
        now: NaiveTime,
    ) -> Result<Option<PushNotification>, InsightsError> {
        if !self.is_running() {
            return Err(InsightsError::ServiceNotInitialized);
        }

        let status = classify(schedule, now);
        if self.last_phase == Some(status.phase) {
            return Ok(None);
        }
        debug!(phase = ?status.phase, "medication phase changed");

        let notification = notification_for(&status);
        if let Some(notification) = &notification {
            // The phase is only recorded once delivered, so a failed send retries next tick
            self.sender.send(notification)?;
            info!(tag = %notification.tag, "sent medication reminder");
        }
        self.last_phase = Some(status.phase);
        Ok(notification)
    }
}

fn notification_for(status: &MedicationStatus) -> Option<PushNotification> {
    let (title, tag) = match status.phase {
        MedicationPhase::Fasting => ("Time to start fasting", "medication-fasting"),
        MedicationPhase::TakeNow => ("Take your medication", "medication-take-now"),
        _ => return None,
    };
    Some(PushNotification {
        title: title.to_string(),
        body: status.message.clone(),
        tag: tag.to_string(),
    })
}
