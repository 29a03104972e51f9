//! Access decisions shared by automatic detection and manual entry.

use serde::{Deserialize, Serialize};
use smartpark_core::{Identity, Plate};
use smartpark_hardware::TextCandidate;
use std::sync::Arc;

use crate::gate::{CommandGate, GateOutcome};
use crate::resolver::AuthorizationResolver;
use crate::status::{StatusBoard, StatusUpdate};
use crate::tasks::BackgroundTasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Ok,
    Denied,
    Error,
}

/// Outcome of one access evaluation, as reported to the serving layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
    pub status: AccessStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl AccessResult {
    fn granted(plate: &Plate, identity: &Identity, message: String) -> Self {
        Self {
            status: AccessStatus::Ok,
            message,
            plate: Some(plate.to_string()),
            identity: Some(identity.to_string()),
        }
    }

    fn denied(plate: Option<&Plate>, message: impl Into<String>) -> Self {
        Self {
            status: AccessStatus::Denied,
            message: message.into(),
            plate: plate.map(Plate::to_string),
            identity: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AccessStatus::Error,
            message: message.into(),
            plate: None,
            identity: None,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.status == AccessStatus::Ok
    }
}

/// Runs plates through the resolver and drives the gate.
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    resolver: Arc<AuthorizationResolver>,
    gate: Arc<CommandGate>,
    status: Arc<StatusBoard>,
    tasks: BackgroundTasks,
    min_confidence: f32,
}

impl AccessEvaluator {
    pub fn new(
        resolver: Arc<AuthorizationResolver>,
        gate: Arc<CommandGate>,
        status: Arc<StatusBoard>,
        tasks: BackgroundTasks,
        min_confidence: f32,
    ) -> Self {
        Self {
            resolver,
            gate,
            status,
            tasks,
            min_confidence,
        }
    }

    /// Check OCR candidates in order; the first authorized plate opens
    /// the gate, otherwise the vehicle is denied.
    pub async fn evaluate_candidates(&self, candidates: &[TextCandidate]) -> AccessResult {
        let mut last_checked = None;

        for candidate in candidates {
            let plate = Plate::normalize(&candidate.text);
            if plate.is_empty() {
                continue;
            }
            if !candidate.meets(self.min_confidence) {
                self.status.info(format!(
                    "Reading {plate} ignored, confidence {:.2} below {:.2}",
                    candidate.confidence, self.min_confidence
                ));
                continue;
            }
            self.status.info(format!(
                "Plate read: {plate} (confidence {:.2})",
                candidate.confidence
            ));
            self.status
                .update(StatusUpdate::new().last_plate(plate.as_str()));

            if let Some(identity) = self.resolver.resolve(&plate).await {
                return self.grant(&plate, identity).await;
            }
            last_checked = Some(plate);
        }

        let message = match &last_checked {
            Some(plate) => format!("Plate {plate} not authorized"),
            None => "No readable plate".to_string(),
        };
        self.deny(last_checked.as_ref(), message).await
    }

    /// Evaluate a plate typed by an operator.
    ///
    /// Text without any plate characters is an error and sends nothing.
    pub async fn evaluate_manual(&self, text: &str) -> AccessResult {
        let plate = Plate::normalize(text);
        if plate.is_empty() {
            self.status.warn("Manual entry without a plate");
            return AccessResult::error("Plate required");
        }
        self.status.info(format!("Manual entry: {plate}"));
        self.status
            .update(StatusUpdate::new().last_plate(plate.as_str()));

        match self.resolver.resolve(&plate).await {
            Some(identity) => self.grant(&plate, identity).await,
            None => {
                self.deny(Some(&plate), format!("Plate {plate} not authorized"))
                    .await
            }
        }
    }

    /// Deny without looking at any plate.
    pub async fn deny_unread(&self, reason: &str) -> AccessResult {
        self.deny(None, reason).await
    }

    async fn grant(&self, plate: &Plate, identity: Identity) -> AccessResult {
        let message = match self.gate.open().await {
            GateOutcome::Sent => format!("Access granted to {identity}"),
            GateOutcome::Suppressed => {
                format!("Access granted to {identity}, gate already opening")
            }
            GateOutcome::Unavailable | GateOutcome::Rejected => {
                format!("Access granted to {identity}, gate not reachable")
            }
        };
        self.status.info(message.clone());

        let resolver = Arc::clone(&self.resolver);
        let arrived = identity.clone();
        self.tasks.spawn("mark-arrival", async move {
            resolver.mark_arrival(&arrived).await;
        });

        AccessResult::granted(plate, &identity, message)
    }

    async fn deny(&self, plate: Option<&Plate>, message: impl Into<String>) -> AccessResult {
        let message = message.into();
        self.gate.deny().await;
        self.status.info(format!("Access denied: {message}"));
        AccessResult::denied(plate, message)
    }
}
