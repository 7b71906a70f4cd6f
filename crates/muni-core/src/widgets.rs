use std::rc::Rc;

use futures::future::abortable;
use tracing::{
  debug,
  info,
  warn
};

use crate::config::PageConfig;
use crate::dom::{
  Dom,
  Subscription
};
use crate::platform::{
  Page,
  WidgetHandle,
  WidgetKind,
  WidgetOptions
};

/// Widgets mounted at page-ready plus the
/// pending alert dismissal.
pub struct MountedWidgets {
  handles:   Vec<Rc<dyn WidgetHandle>>,
  dismissal: Subscription
}

impl MountedWidgets {
  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handles.is_empty()
  }

  /// Disposes every mounted widget and
  /// cancels a dismissal still pending.
  pub fn dispose(self) {
    self.dismissal.dispose();
    for handle in self.handles {
      handle.dispose();
    }
  }
}

#[tracing::instrument(skip_all)]
pub fn bootstrap<D: Dom + 'static>(
  page: &Page<D>,
  config: &PageConfig
) -> MountedWidgets {
  let markers = &config.markers;
  let mut handles = vec![];
  for (selector, kind) in [
    (&markers.tooltip, WidgetKind::Tooltip),
    (&markers.popover, WidgetKind::Popover)
  ] {
    for node in page.dom.select_all(selector)
    {
      match page.widgets.mount(
        &node,
        kind,
        &WidgetOptions::new()
      ) {
        | Ok(handle) => handles.push(handle),
        | Err(error) => {
          warn!(
            %error,
            ?node,
            "skipping widget"
          );
        }
      }
    }
  }

  if let Some(main) = page
    .dom
    .select(&markers.transition_container)
  {
    page
      .dom
      .add_class(&main, &markers.transition_class);
  } else {
    debug!(
      selector = %markers.transition_container,
      "no transition container"
    );
  }

  let dismissal =
    schedule_alert_dismissal(page, config);

  info!(
    widgets = handles.len(),
    "widgets mounted"
  );
  MountedWidgets {
    handles,
    dismissal
  }
}

fn schedule_alert_dismissal<
  D: Dom + 'static
>(
  page: &Page<D>,
  config: &PageConfig
) -> Subscription {
  let delay = page
    .scheduler
    .delay(config.timing.alert_dismiss());
  let selector =
    config.markers.dismissible_alert.clone();
  let task_page = page.clone();
  let (task, abort) = abortable(async move {
    delay.await;
    dismiss_alerts(&task_page, &selector);
  });
  page.spawn(async move {
    let _ = task.await;
  });
  Subscription::new(move || abort.abort())
}

/// Closes every alert matching
/// `selector`. One failing alert does not
/// stop the rest.
pub fn dismiss_alerts<D: Dom>(
  page: &Page<D>,
  selector: &str
) -> usize {
  let mut closed = 0;
  for alert in page.dom.select_all(selector)
  {
    match page.widgets.mount(
      &alert,
      WidgetKind::Alert,
      &WidgetOptions::new()
    ) {
      | Ok(handle) => {
        handle.close();
        closed += 1;
      }
      | Err(error) => {
        warn!(
          %error,
          ?alert,
          "alert dismissal failed"
        );
      }
    }
  }
  debug!(closed, "alerts dismissed");
  closed
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::memory::MemoryPage;

  #[test]
  fn mounts_markers_and_marks_container() {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    let root = dom.root();
    let main = dom.append_with(root, "main", &[
      ("class", "container")
    ]);
    let tip = dom.append_with(main, "a", &[
      ("data-bs-toggle", "tooltip")
    ]);
    dom.append_with(main, "button", &[
      ("data-bs-toggle", "popover")
    ]);

    let mounted = bootstrap(
      &harness.page(),
      &PageConfig::default()
    );

    assert_eq!(mounted.len(), 2);
    assert_eq!(
      harness.widgets.nodes(
        WidgetKind::Tooltip,
        "mount"
      ),
      vec![tip]
    );
    assert!(dom.has_class(main, "fade-in"));

    mounted.dispose();
    assert_eq!(
      harness
        .widgets
        .count(WidgetKind::Popover, "dispose"),
      1
    );
  }

  #[test]
  fn missing_container_is_not_an_error() {
    let harness = MemoryPage::new();
    let mounted = bootstrap(
      &harness.page(),
      &PageConfig::default()
    );
    assert!(mounted.is_empty());
  }

  #[test]
  fn alerts_close_after_delay_skipping_permanent()
   {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    let root = dom.root();
    let flash = dom.append_with(root, "div", &[
      ("class", "alert alert-success")
    ]);
    let broken = dom.append_with(root, "div", &[
      ("class", "alert alert-warning")
    ]);
    let later = dom.append_with(root, "div", &[
      ("class", "alert alert-info")
    ]);
    dom.append_with(root, "div", &[
      ("class", "alert alert-permanent")
    ]);
    harness.widgets.fail_on(broken);

    let _mounted = bootstrap(
      &harness.page(),
      &PageConfig::default()
    );

    harness
      .advance(Duration::from_millis(4_999));
    assert_eq!(
      harness
        .widgets
        .count(WidgetKind::Alert, "close"),
      0
    );

    harness.advance(Duration::from_millis(1));
    assert_eq!(
      harness
        .widgets
        .nodes(WidgetKind::Alert, "close"),
      vec![flash, later]
    );
  }

  #[test]
  fn disposing_cancels_pending_dismissal()
  {
    let harness = MemoryPage::new();
    let root = harness.dom.root();
    harness.dom.append_with(root, "div", &[
      ("class", "alert")
    ]);

    let mounted = bootstrap(
      &harness.page(),
      &PageConfig::default()
    );
    mounted.dispose();

    harness.advance(Duration::from_secs(10));
    assert_eq!(
      harness
        .widgets
        .count(WidgetKind::Alert, "close"),
      0
    );
  }
}
