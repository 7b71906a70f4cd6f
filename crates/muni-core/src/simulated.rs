use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use muni_shared::{
  RecordDetails,
  RecordId,
  RecordStatus,
  StatusChanged
};
use tracing::info;

use crate::cancel::CancelToken;
use crate::error::ApiError;
use crate::platform::{
  RecordsApi,
  Scheduler
};

/// Stand-in collaborator used until the
/// records server exposes its API: waits
/// `latency`, then answers with
/// placeholder content. Status updates are
/// only logged.
pub struct SimulatedRecords {
  scheduler: Rc<dyn Scheduler>,
  latency:   Duration
}

impl SimulatedRecords {
  pub fn new(
    scheduler: Rc<dyn Scheduler>,
    latency: Duration
  ) -> Self {
    Self {
      scheduler,
      latency
    }
  }

  pub fn placeholder(
    id: &RecordId
  ) -> RecordDetails {
    RecordDetails {
      id:             id.clone(),
      digital_number: None,
      title:          format!(
        "Título del Expediente #{id}"
      ),
      description:    "Descripción del \
                       expediente..."
        .to_string(),
      department:     "Obras Públicas"
        .to_string(),
      status:         RecordStatus::Activo,
      updated_at:     None
    }
  }
}

#[async_trait(?Send)]
impl RecordsApi for SimulatedRecords {
  async fn fetch_record(
    &self,
    id: &RecordId,
    cancel: &CancelToken
  ) -> Result<RecordDetails, ApiError> {
    self.scheduler.delay(self.latency).await;
    if cancel.is_cancelled() {
      return Err(ApiError::Cancelled);
    }
    Ok(Self::placeholder(id))
  }

  async fn update_status(
    &self,
    id: &RecordId,
    status: RecordStatus
  ) -> Result<StatusChanged, ApiError> {
    info!(
      record = %id,
      %status,
      "simulated status update"
    );
    Ok(StatusChanged {
      id: id.clone(),
      status
    })
  }
}

#[cfg(test)]
mod tests {
  use futures::executor::block_on;

  use super::*;
  use crate::memory::ManualScheduler;

  #[test]
  fn status_update_echoes_request() {
    let records = SimulatedRecords::new(
      Rc::new(ManualScheduler::default()),
      Duration::ZERO
    );
    let changed = block_on(
      records.update_status(
        &RecordId::from("3"),
        RecordStatus::Urgente
      )
    )
    .unwrap();
    assert_eq!(
      changed.status,
      RecordStatus::Urgente
    );
  }

  #[test]
  fn cancelled_fetch_reports_cancelled() {
    let records = SimulatedRecords::new(
      Rc::new(ManualScheduler::default()),
      Duration::ZERO
    );
    let token = CancelToken::new();
    token.cancel();
    assert_eq!(
      block_on(records.fetch_record(
        &RecordId::from("3"),
        &token
      )),
      Err(ApiError::Cancelled)
    );
  }
}
