use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::task::{
  LocalSpawn,
  LocalSpawnExt
};
use muni_shared::{
  RecordDetails,
  RecordId,
  RecordStatus,
  StatusChanged
};
use serde_json::{
  Map,
  Value
};
use tracing::warn;

use crate::cancel::CancelToken;
use crate::dom::Dom;
use crate::error::{
  ApiError,
  StorageError,
  WidgetError
};

pub trait Navigator {
  /// Full page navigation.
  fn navigate(&self, url: &str);

  /// Opens the native print dialog.
  fn print(&self);
}

/// Client-local key/value persistence.
pub trait PreferenceStore {
  fn load(
    &self,
    key: &str
  ) -> Result<Option<String>, StorageError>;

  fn save(
    &self,
    key: &str,
    value: &str
  ) -> Result<(), StorageError>;
}

pub trait Scheduler {
  /// Resolves once `after` has elapsed.
  fn delay(
    &self,
    after: Duration
  ) -> LocalBoxFuture<'static, ()>;
}

/// Non-blocking confirmation prompt.
#[async_trait(?Send)]
pub trait Confirmer {
  async fn confirm(
    &self,
    message: &str
  ) -> bool;
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum WidgetKind {
  Tooltip,
  Popover,
  Alert,
  Modal
}

impl WidgetKind {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Tooltip => "Tooltip",
      | Self::Popover => "Popover",
      | Self::Alert => "Alert",
      | Self::Modal => "Modal"
    }
  }
}

/// Options handed to the toolkit
/// verbatim.
pub type WidgetOptions = Map<String, Value>;

pub trait WidgetHandle {
  fn show(&self);
  fn hide(&self);
  /// Dismisses a closable widget
  /// (alerts).
  fn close(&self);
  fn dispose(&self);
}

/// The UI toolkit behind tooltips,
/// popovers, alerts and modals.
pub trait WidgetToolkit<N> {
  fn mount(
    &self,
    node: &N,
    kind: WidgetKind,
    options: &WidgetOptions
  ) -> Result<Rc<dyn WidgetHandle>, WidgetError>;
}

/// Record collaborators. Real
/// implementations talk to the records
/// server; see `SimulatedRecords` for the
/// stand-in.
#[async_trait(?Send)]
pub trait RecordsApi {
  async fn fetch_record(
    &self,
    id: &RecordId,
    cancel: &CancelToken
  ) -> Result<RecordDetails, ApiError>;

  async fn update_status(
    &self,
    id: &RecordId,
    status: RecordStatus
  ) -> Result<StatusChanged, ApiError>;
}

/// Everything a page behavior may touch.
pub struct Page<D: Dom> {
  pub dom:       Rc<D>,
  pub navigator: Rc<dyn Navigator>,
  pub storage:   Rc<dyn PreferenceStore>,
  pub scheduler: Rc<dyn Scheduler>,
  pub widgets:   Rc<dyn WidgetToolkit<D::Node>>,
  pub confirm:   Rc<dyn Confirmer>,
  pub records:   Rc<dyn RecordsApi>,
  pub spawner:   Rc<dyn LocalSpawn>
}

impl<D: Dom> Clone for Page<D> {
  fn clone(&self) -> Self {
    Self {
      dom:       self.dom.clone(),
      navigator: self.navigator.clone(),
      storage:   self.storage.clone(),
      scheduler: self.scheduler.clone(),
      widgets:   self.widgets.clone(),
      confirm:   self.confirm.clone(),
      records:   self.records.clone(),
      spawner:   self.spawner.clone()
    }
  }
}

impl<D: Dom> Page<D> {
  pub(crate) fn spawn(
    &self,
    task: impl Future<Output = ()> + 'static
  ) {
    if let Err(error) =
      self.spawner.spawn_local(task)
    {
      warn!(
        %error,
        "executor refused page task"
      );
    }
  }
}
