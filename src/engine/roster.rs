use tracing::info;
use uuid::Uuid;

use crate::engine::ledger::BinLedger;
use crate::error::AppError;
use crate::models::roster::{
    Collector, ConnectionRequest, ConnectionType, PartnerStatus, PartnershipAction,
    RecyclerPartner,
};
use crate::notify::{Notification, NotificationKind};
use crate::store::{WriteBatch, keys};

impl BinLedger {
    /// Puts a collector on a street. Streets are shared: assigning a second
    /// collector to a covered street adds coverage rather than replacing it.
    pub async fn assign_collector_to_street(
        &self,
        collector_name: &str,
        street: &str,
    ) -> Result<Collector, AppError> {
        let street = street.trim();
        if street.is_empty() {
            return Err(AppError::InvalidArgument("street must not be empty".to_string()));
        }

        let _guard = self.write_gate.lock().await;

        let mut collectors = self.records.collectors().await?.unwrap_or_default();

        let co_assigned: Vec<String> = collectors
            .iter()
            .filter(|c| c.name != collector_name && c.assigned_street.as_deref() == Some(street))
            .map(|c| c.name.clone())
            .collect();

        let collector = collectors
            .iter_mut()
            .find(|c| c.name == collector_name)
            .ok_or_else(|| AppError::NotFound(format!("collector {collector_name}")))?;

        collector.assigned_street = Some(street.to_string());
        collector.assigned_date = Some(self.clock.now());
        let assigned = collector.clone();

        let mut batch = WriteBatch::new();
        batch.put(keys::COLLECTORS, &collectors)?;
        self.records.commit(batch).await?;

        if co_assigned.is_empty() {
            info!(collector = %collector_name, street = %street, "collector assigned");
        } else {
            info!(
                collector = %collector_name,
                street = %street,
                shared_with = ?co_assigned,
                "collector assigned to shared street"
            );
        }

        Ok(assigned)
    }

    /// Approves or rejects a pending partnership. Decisions are final.
    pub async fn update_recycler_partnership(
        &self,
        partner_id: &str,
        action: PartnershipAction,
    ) -> Result<RecyclerPartner, AppError> {
        let _guard = self.write_gate.lock().await;

        let mut partners = self.records.recycler_partners().await?.unwrap_or_default();

        let partner = partners
            .iter_mut()
            .find(|p| p.id == partner_id)
            .ok_or_else(|| AppError::NotFound(format!("recycler partner {partner_id}")))?;

        if partner.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "partnership {partner_id} was already processed as {:?}",
                partner.status
            )));
        }

        partner.status = action.resulting_status();
        partner.processed_date = Some(self.clock.now());
        let processed = partner.clone();

        let mut batch = WriteBatch::new();
        batch.put(keys::RECYCLER_PARTNERS, &partners)?;
        self.records.commit(batch).await?;

        info!(partner_id = %partner_id, status = ?processed.status, "partnership processed");
        Ok(processed)
    }

    pub async fn send_connection_request(
        &self,
        requester_id: &str,
        target_id: &str,
        request_type: ConnectionType,
    ) -> Result<ConnectionRequest, AppError> {
        if requester_id.trim().is_empty() || target_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "requester and target ids must not be empty".to_string(),
            ));
        }

        let _guard = self.write_gate.lock().await;

        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            requester_id: requester_id.to_string(),
            target_id: target_id.to_string(),
            request_type,
            status: PartnerStatus::Pending,
            timestamp: self.clock.now(),
            processed_date: None,
        };

        let mut batch = WriteBatch::new();
        batch.put(keys::connection_request(&request.id), &request)?;
        self.records.commit(batch).await?;

        self.notifier.notify(Notification {
            kind: NotificationKind::ConnectionRequested,
            title: "Connection Request Sent".to_string(),
            body: "Your partnership request has been sent.".to_string(),
            bin_id: None,
            sent_at: request.timestamp,
        });

        info!(
            request_id = %request.id,
            requester_id = %requester_id,
            target_id = %target_id,
            request_type = ?request_type,
            "connection request sent"
        );
        Ok(request)
    }

    /// Accepts or declines a pending connection request. Decisions are final.
    pub async fn respond_to_connection_request(
        &self,
        request_id: Uuid,
        action: PartnershipAction,
    ) -> Result<ConnectionRequest, AppError> {
        let _guard = self.write_gate.lock().await;

        let mut request = self
            .records
            .connection_request(&request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("connection request {request_id}")))?;

        if request.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "connection request {request_id} was already processed as {:?}",
                request.status
            )));
        }

        request.status = action.resulting_status();
        request.processed_date = Some(self.clock.now());

        let mut batch = WriteBatch::new();
        batch.put(keys::connection_request(&request.id), &request)?;
        self.records.commit(batch).await?;

        info!(request_id = %request_id, status = ?request.status, "connection request processed");
        Ok(request)
    }
}
