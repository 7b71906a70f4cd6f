pub mod cancel;
pub mod config;
pub mod dom;
pub mod error;
pub mod filters;
pub mod markup;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod platform;
pub mod preview;
pub mod search;
pub mod simulated;
pub mod status;
pub mod theme;
pub mod validation;
pub mod widgets;

use std::rc::Rc;

use muni_shared::RecordId;
use tracing::{
  error,
  info
};

pub use crate::cancel::CancelToken;
pub use crate::config::PageConfig;
pub use crate::dom::{
  Dom,
  EventControl,
  EventKind,
  Subscription
};
pub use crate::error::{
  ApiError,
  SetupError,
  StorageError,
  WidgetError
};
pub use crate::platform::Page;
use crate::preview::RecordPreview;
use crate::theme::ThemeController;
use crate::widgets::MountedWidgets;

/// Handles to everything `init` wired.
/// Dropping it (or calling `dispose`)
/// removes every listener and widget.
pub struct Bootstrapped<D: Dom + 'static> {
  page:        Page<D>,
  listeners:   Vec<Subscription>,
  widgets:     Option<MountedWidgets>,
  pub theme:   Rc<ThemeController<D>>,
  pub preview: Rc<RecordPreview<D>>,
  pub issues:  Vec<SetupError>
}

impl<D: Dom + 'static> Bootstrapped<D> {
  pub fn listener_count(&self) -> usize {
    self.listeners.len()
  }

  pub fn preview_record(
    &self,
    id: impl Into<RecordId>
  ) {
    self.preview.open(id.into());
  }

  pub fn print_record(
    &self,
    id: impl Into<RecordId>
  ) {
    preview::print_record(
      &self.page,
      &id.into()
    );
  }

  pub fn dispose(mut self) {
    self.teardown();
  }

  fn teardown(&mut self) {
    self.preview.cancel();
    for listener in self.listeners.drain(..) {
      listener.dispose();
    }
    if let Some(widgets) = self.widgets.take()
    {
      widgets.dispose();
    }
  }
}

impl<D: Dom + 'static> Drop for Bootstrapped<D> {
  fn drop(&mut self) {
    self.teardown();
  }
}

/// Page-ready entry point: mounts widgets
/// and wires every handler whose markup
/// is present.
#[tracing::instrument(skip_all)]
pub fn init<D: Dom + 'static>(
  page: Page<D>,
  config: &PageConfig
) -> Bootstrapped<D> {
  let mut listeners = vec![];
  let mut issues = vec![];

  let widgets =
    widgets::bootstrap(&page, config);

  listeners.extend(
    filters::wire_department_filter(
      &page, config
    )
  );
  listeners.extend(
    filters::wire_status_filter(
      &page, config
    )
  );
  listeners.extend(
    status::wire_status_triggers(
      &page, config
    )
  );
  listeners.extend(
    validation::wire_validation_gates(
      &page, config
    )
  );
  match search::wire_search(&page, config) {
    | Ok(sub) => listeners.extend(sub),
    | Err(issue) => {
      error!(%issue, "search disabled");
      issues.push(issue);
    }
  }

  let theme = ThemeController::new(
    page.dom.clone(),
    page.storage.clone(),
    config.theme.clone()
  );
  listeners.extend(theme.wire());

  let preview = RecordPreview::new(
    page.clone(),
    config.preview.clone()
  );

  info!(
    listeners = listeners.len(),
    widgets = widgets.len(),
    issues = issues.len(),
    theme = theme.current().as_str(),
    "page behaviors ready"
  );

  Bootstrapped {
    page,
    listeners,
    widgets: Some(widgets),
    theme,
    preview,
    issues
  }
}
