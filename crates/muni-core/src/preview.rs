use std::cell::{
  Cell,
  RefCell
};
use std::rc::Rc;

use muni_shared::RecordId;
use tracing::{
  debug,
  info,
  warn
};

use crate::cancel::CancelToken;
use crate::config::PreviewConfig;
use crate::dom::Dom;
use crate::error::ApiError;
use crate::markup;
use crate::platform::{
  Page,
  WidgetHandle,
  WidgetKind,
  WidgetOptions
};

struct InFlight {
  generation: u64,
  cancel:     CancelToken
}

/// Record preview modal. Only the most
/// recent request may write to the
/// container; opening a new preview
/// cancels the previous fetch.
pub struct RecordPreview<D: Dom> {
  page:       Page<D>,
  config:     PreviewConfig,
  generation: Cell<u64>,
  in_flight:  RefCell<Option<InFlight>>,
  modal:      RefCell<Option<Rc<dyn WidgetHandle>>>
}

impl<D: Dom + 'static> RecordPreview<D> {
  pub fn new(
    page: Page<D>,
    config: PreviewConfig
  ) -> Rc<Self> {
    Rc::new(Self {
      page,
      config,
      generation: Cell::new(0),
      in_flight: RefCell::new(None),
      modal: RefCell::new(None)
    })
  }

  /// Shows the loading state and the
  /// modal right away, then fills in the
  /// record once fetched.
  #[tracing::instrument(skip(self), fields(record = %id))]
  pub fn open(
    self: &Rc<Self>,
    id: RecordId
  ) {
    info!("previewing record {id}");
    let Some(container) = self
      .page
      .dom
      .by_id(&self.config.container_id)
    else {
      warn!(
        container = %self.config.container_id,
        "preview container missing"
      );
      return;
    };

    let generation = self.generation.get() + 1;
    self.generation.set(generation);
    let cancel = CancelToken::new();
    if let Some(previous) = self
      .in_flight
      .replace(Some(InFlight {
        generation,
        cancel: cancel.clone()
      }))
    {
      debug!(
        superseded = previous.generation,
        "cancelling earlier preview"
      );
      previous.cancel.cancel();
    }

    self
      .page
      .dom
      .set_html(&container, markup::loading());
    self.show_modal();

    let this = self.clone();
    self.page.spawn(async move {
      let outcome = this
        .page
        .records
        .fetch_record(&id, &cancel)
        .await;
      this.finish(generation, &cancel, &container, outcome);
    });
  }

  pub fn is_loading(&self) -> bool {
    self.in_flight.borrow().is_some()
  }

  /// Cancels a pending fetch without
  /// touching the container.
  pub fn cancel(&self) {
    if let Some(in_flight) =
      self.in_flight.take()
    {
      in_flight.cancel.cancel();
    }
  }

  fn finish(
    &self,
    generation: u64,
    cancel: &CancelToken,
    container: &D::Node,
    outcome: Result<
      muni_shared::RecordDetails,
      ApiError
    >
  ) {
    if cancel.is_cancelled()
      || self.generation.get() != generation
    {
      debug!(
        generation,
        "dropping stale preview result"
      );
      return;
    }
    self.in_flight.replace(None);

    let html = match outcome {
      | Ok(details) => {
        markup::record_details(&details)
      }
      | Err(ApiError::Cancelled) => return,
      | Err(error) => {
        warn!(
          %error,
          kind = error.kind(),
          "record preview failed"
        );
        markup::error_alert(&error)
      }
    };
    self.page.dom.set_html(container, &html);
  }

  fn show_modal(&self) {
    if let Some(modal) =
      self.modal.borrow().as_ref()
    {
      modal.show();
      return;
    }
    let Some(node) = self
      .page
      .dom
      .by_id(&self.config.modal_id)
    else {
      warn!(
        modal = %self.config.modal_id,
        "preview modal missing"
      );
      return;
    };
    match self.page.widgets.mount(
      &node,
      WidgetKind::Modal,
      &WidgetOptions::new()
    ) {
      | Ok(modal) => {
        modal.show();
        self.modal.replace(Some(modal));
      }
      | Err(error) => {
        warn!(%error, "cannot open preview modal");
      }
    }
  }
}

/// Opens the native print dialog for the
/// current page.
#[tracing::instrument(skip(page), fields(record = %id))]
pub fn print_record<D: Dom>(
  page: &Page<D>,
  id: &RecordId
) {
  info!("printing record {id}");
  page.navigator.print();
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use muni_shared::{
    RecordDetails,
    RecordStatus
  };

  use super::*;
  use crate::memory::{
    MemoryPage,
    NodeId
  };
  use crate::simulated::SimulatedRecords;

  fn preview_page(
    harness: &MemoryPage
  ) -> (NodeId, NodeId) {
    let dom = &harness.dom;
    let modal = dom.append_with(
      dom.root(),
      "div",
      &[("id", "recordPreviewModal")]
    );
    let body = dom.append_with(
      modal,
      "div",
      &[("id", "recordPreviewBody")]
    );
    (modal, body)
  }

  fn simulated(
    harness: &MemoryPage
  ) -> Rc<RecordPreview<crate::memory::MemoryDom>>
  {
    let records = Rc::new(
      SimulatedRecords::new(
        harness.scheduler.clone(),
        Duration::from_millis(1_000)
      )
    );
    RecordPreview::new(
      harness.page_with_records(records),
      PreviewConfig::default()
    )
  }

  #[test]
  fn loading_then_details() {
    let harness = MemoryPage::new();
    let (modal, body) = preview_page(&harness);
    let preview = simulated(&harness);

    preview.open(RecordId::from("42"));
    assert_eq!(
      harness.dom.html(body).as_deref(),
      Some(markup::loading())
    );
    assert_eq!(
      harness
        .widgets
        .nodes(WidgetKind::Modal, "show"),
      vec![modal]
    );

    harness.advance(Duration::from_millis(999));
    assert!(preview.is_loading());
    harness.advance(Duration::from_millis(1));

    let html = harness.dom.html(body).unwrap();
    assert!(html.contains(
      "Título del Expediente #42"
    ));
    assert!(html.contains("Obras Públicas"));
    assert!(!preview.is_loading());
  }

  #[test]
  fn newer_preview_wins_over_stale_one() {
    let harness = MemoryPage::new();
    let (_, body) = preview_page(&harness);
    let preview = simulated(&harness);

    preview.open(RecordId::from("42"));
    harness.advance(Duration::from_millis(500));
    preview.open(RecordId::from("7"));
    harness.advance(Duration::from_millis(500));

    assert_eq!(
      harness.dom.html(body).as_deref(),
      Some(markup::loading())
    );

    harness.advance(Duration::from_millis(500));
    let html = harness.dom.html(body).unwrap();
    assert!(html.contains("#7"));
    assert!(!html.contains("#42"));
    assert_eq!(
      harness
        .widgets
        .count(WidgetKind::Modal, "mount"),
      1
    );
  }

  #[test]
  fn superseded_response_is_dropped() {
    let harness = MemoryPage::new();
    let (_, body) = preview_page(&harness);
    harness.records.insert(RecordDetails {
      id:             RecordId::from("7"),
      digital_number: None,
      title:          "Expediente siete"
        .to_string(),
      description:    String::new(),
      department:     "Hacienda".to_string(),
      status:         RecordStatus::Pendiente,
      updated_at:     None
    });
    let preview = RecordPreview::new(
      harness.page(),
      PreviewConfig::default()
    );

    preview.open(RecordId::from("42"));
    preview.open(RecordId::from("7"));
    harness.settle();

    let html = harness.dom.html(body).unwrap();
    assert!(html.contains("Expediente siete"));
    assert!(html.contains("bg-warning"));
  }

  #[test]
  fn fetch_errors_render_distinct_states() {
    let harness = MemoryPage::new();
    let (_, body) = preview_page(&harness);
    harness.records.fail(
      "13",
      ApiError::Network("offline".into())
    );
    let preview = RecordPreview::new(
      harness.page(),
      PreviewConfig::default()
    );

    preview.open(RecordId::from("13"));
    harness.settle();
    let network = harness.dom.html(body).unwrap();
    assert!(network.contains(
      r#"data-error-kind="network""#
    ));

    preview.open(RecordId::from("404"));
    harness.settle();
    let missing = harness.dom.html(body).unwrap();
    assert!(missing.contains(
      r#"data-error-kind="not-found""#
    ));
    assert!(missing.contains("#404"));
  }

  #[test]
  fn explicit_cancel_keeps_loading_state() {
    let harness = MemoryPage::new();
    let (_, body) = preview_page(&harness);
    let preview = simulated(&harness);

    preview.open(RecordId::from("42"));
    preview.cancel();
    harness.advance(Duration::from_secs(2));

    assert_eq!(
      harness.dom.html(body).as_deref(),
      Some(markup::loading())
    );
  }

  #[test]
  fn print_opens_native_dialog() {
    let harness = MemoryPage::new();
    print_record(
      &harness.page(),
      &RecordId::from("42")
    );
    assert_eq!(harness.navigator.prints(), 1);
  }
}
