use muni_shared::{
  RecordId,
  RecordStatus
};
use tracing::{
  error,
  info,
  warn
};

use crate::config::PageConfig;
use crate::dom::{
  Dom,
  EventKind,
  Subscription
};
use crate::error::ApiError;
use crate::markup;
use crate::platform::Page;

pub fn confirmation_message(
  status: &str
) -> String {
  format!(
    "¿Está seguro que desea cambiar el \
     estado a \"{status}\"?"
  )
}

/// One listener per status-change
/// trigger.
#[tracing::instrument(skip_all)]
pub fn wire_status_triggers<
  D: Dom + 'static
>(
  page: &Page<D>,
  config: &PageConfig
) -> Vec<Subscription> {
  page
    .dom
    .select_all(&config.markers.status_trigger)
    .into_iter()
    .map(|trigger| {
      let handler_page = page.clone();
      let handler_config = config.clone();
      let node = trigger.clone();
      page.dom.listen(
        &trigger,
        EventKind::Click,
        Box::new(move |_| {
          on_trigger_click(
            &handler_page,
            &handler_config,
            &node
          );
        })
      )
    })
    .collect()
}

fn on_trigger_click<D: Dom + 'static>(
  page: &Page<D>,
  config: &PageConfig,
  trigger: &D::Node
) {
  let id = page
    .dom
    .attribute(trigger, "data-record-id")
    .map(RecordId::new)
    .filter(|id| !id.is_empty());
  let raw_status = page
    .dom
    .attribute(trigger, "data-status");
  let (Some(id), Some(raw_status)) =
    (id, raw_status)
  else {
    warn!(
      ?trigger,
      "status trigger lacks \
       data-record-id or data-status"
    );
    return;
  };
  let Some(status) =
    RecordStatus::parse(&raw_status)
  else {
    warn!(
      record = %id,
      status = %raw_status,
      "unknown record status"
    );
    return;
  };

  let task_page = page.clone();
  let config = config.clone();
  page.spawn(async move {
    change_status(
      &task_page,
      &config,
      id,
      status,
      &raw_status
    )
    .await;
  });
}

/// Asks for confirmation and, when
/// accepted, pushes the new status.
/// Declining leaves the page untouched.
#[tracing::instrument(
  skip_all,
  fields(record = %id, status = %status)
)]
pub async fn change_status<D: Dom>(
  page: &Page<D>,
  config: &PageConfig,
  id: RecordId,
  status: RecordStatus,
  shown_status: &str
) -> Option<Result<(), ApiError>> {
  let accepted = page
    .confirm
    .confirm(&confirmation_message(
      shown_status
    ))
    .await;
  if !accepted {
    info!("status change declined");
    return None;
  }

  info!(
    "changing status of record {id} to \
     {status}"
  );
  let outcome = page
    .records
    .update_status(&id, status)
    .await;
  match &outcome {
    | Ok(changed) => {
      clear_feedback(page, config);
      reflect_status(
        page,
        config,
        &changed.id,
        changed.status
      );
    }
    | Err(error) => {
      error!(
        %error,
        kind = error.kind(),
        "status update failed"
      );
      show_feedback(page, config, error);
    }
  }
  Some(outcome.map(|_| ()))
}

/// Rewrites every badge bound to the
/// record.
pub fn reflect_status<D: Dom>(
  page: &Page<D>,
  config: &PageConfig,
  id: &RecordId,
  status: RecordStatus
) -> usize {
  let attr = &config.markers.status_badge_attr;
  let badges: Vec<_> = page
    .dom
    .select_all(&format!("[{attr}]"))
    .into_iter()
    .filter(|badge| {
      page.dom.attribute(badge, attr).as_deref()
        == Some(id.as_str())
    })
    .collect();
  for badge in &badges {
    page.dom.set_text(badge, status.label());
    for stale in RecordStatus::ALL {
      page
        .dom
        .remove_class(badge, stale.badge_class());
    }
    page.dom.add_class(badge, "badge");
    page
      .dom
      .add_class(badge, status.badge_class());
  }
  badges.len()
}

fn clear_feedback<D: Dom>(
  page: &Page<D>,
  config: &PageConfig
) {
  if let Some(container) = page
    .dom
    .by_id(&config.markers.status_feedback_id)
  {
    page.dom.set_html(&container, "");
  }
}

fn show_feedback<D: Dom>(
  page: &Page<D>,
  config: &PageConfig,
  error: &ApiError
) {
  match page
    .dom
    .by_id(&config.markers.status_feedback_id)
  {
    | Some(container) => {
      page.dom.set_html(
        &container,
        &markup::error_alert(error)
      );
    }
    | None => {
      warn!(
        "no status feedback container; \
         error shown in log only"
      );
    }
  }
}
