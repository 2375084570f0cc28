use tracing::info;
use uuid::Uuid;

use crate::engine::ledger::BinLedger;
use crate::error::AppError;
use crate::models::complaint::{ComplaintAction, ComplaintStatus, SegregationComplaint};
use crate::store::{WriteBatch, keys};

impl BinLedger {
    /// Records a mixed-waste report against a bin and flags the bin.
    pub async fn file_segregation_complaint(
        &self,
        bin_id: &str,
        reported_by: &str,
        description: &str,
    ) -> Result<SegregationComplaint, AppError> {
        if reported_by.trim().is_empty() {
            return Err(AppError::InvalidArgument("reporter id must not be empty".to_string()));
        }

        let _guard = self.write_gate.lock().await;

        let mut bin = self
            .records
            .bin(bin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bin {bin_id}")))?;

        let complaint = SegregationComplaint {
            id: Uuid::new_v4(),
            bin_id: bin_id.to_string(),
            reported_by: reported_by.to_string(),
            description: description.trim().to_string(),
            status: ComplaintStatus::Pending,
            action: None,
            timestamp: self.clock.now(),
            processed_date: None,
        };

        let mut complaints = self.records.segregation_complaints().await?;
        complaints.push(complaint.clone());
        bin.segregation_error = true;

        let mut batch = WriteBatch::new();
        batch.put(keys::bin(bin_id), &bin)?;
        batch.put(keys::SEGREGATION_COMPLAINTS, &complaints)?;
        self.records.commit(batch).await?;

        info!(
            complaint_id = %complaint.id,
            bin_id = %bin_id,
            reported_by = %reported_by,
            "segregation complaint filed"
        );
        Ok(complaint)
    }

    /// Warns the household or resolves the complaint. A complaint is processed
    /// once. A warning leaves the bin flagged; resolving clears the flag unless
    /// another complaint against the bin is still pending.
    pub async fn process_segregation_complaint(
        &self,
        complaint_id: Uuid,
        action: ComplaintAction,
    ) -> Result<SegregationComplaint, AppError> {
        let _guard = self.write_gate.lock().await;

        let mut complaints = self.records.segregation_complaints().await?;
        let complaint = complaints
            .iter_mut()
            .find(|c| c.id == complaint_id)
            .ok_or_else(|| AppError::NotFound(format!("segregation complaint {complaint_id}")))?;

        if complaint.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "complaint {complaint_id} was already processed as {:?}",
                complaint.status
            )));
        }

        complaint.status = action.resulting_status();
        complaint.action = Some(action);
        complaint.processed_date = Some(self.clock.now());
        let processed = complaint.clone();

        let still_flagged = match action {
            ComplaintAction::Warning => true,
            ComplaintAction::Resolve => complaints
                .iter()
                .any(|c| c.bin_id == processed.bin_id && c.status == ComplaintStatus::Pending),
        };

        let mut batch = WriteBatch::new();
        batch.put(keys::SEGREGATION_COMPLAINTS, &complaints)?;
        let stale_bin = self
            .records
            .bin(&processed.bin_id)
            .await?
            .filter(|bin| bin.segregation_error != still_flagged);
        if let Some(mut bin) = stale_bin {
            bin.segregation_error = still_flagged;
            batch.put(keys::bin(&bin.bin_id), &bin)?;
        }
        self.records.commit(batch).await?;

        info!(
            complaint_id = %complaint_id,
            bin_id = %processed.bin_id,
            status = ?processed.status,
            "segregation complaint processed"
        );
        Ok(processed)
    }

    pub async fn segregation_complaints(&self) -> Result<Vec<SegregationComplaint>, AppError> {
        self.records.segregation_complaints().await
    }
}
