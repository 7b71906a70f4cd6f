use tracing::{
  debug,
  info
};
use url::form_urlencoded;

use crate::config::PageConfig;
use crate::dom::{
  Dom,
  EventKind,
  Subscription
};
use crate::platform::Page;

/// Listing URL for a filter value. An
/// empty value means the unfiltered
/// listing.
pub fn listing_url(
  records_path: &str,
  param: &str,
  value: &str
) -> String {
  let value = value.trim();
  if value.is_empty() {
    return records_path.to_string();
  }
  let query =
    form_urlencoded::Serializer::new(
      String::new()
    )
    .append_pair(param, value)
    .finish();
  format!("{records_path}?{query}")
}

/// Wires a `<select>` that navigates to
/// the listing filtered by `param`.
/// Returns `None` when the control is not
/// on the page.
#[tracing::instrument(skip(page, records_path))]
pub fn wire_listing_filter<
  D: Dom + 'static
>(
  page: &Page<D>,
  control_id: &str,
  param: &'static str,
  records_path: &str
) -> Option<Subscription> {
  let Some(control) =
    page.dom.by_id(control_id)
  else {
    debug!("filter control absent");
    return None;
  };

  let dom = page.dom.clone();
  let navigator = page.navigator.clone();
  let node = control.clone();
  let records_path =
    records_path.to_string();
  Some(page.dom.listen(
    &control,
    EventKind::Change,
    Box::new(move |_| {
      let url = listing_url(
        &records_path,
        param,
        &dom.value(&node)
      );
      info!(%url, param, "filter changed");
      navigator.navigate(&url);
    })
  ))
}

pub fn wire_department_filter<
  D: Dom + 'static
>(
  page: &Page<D>,
  config: &PageConfig
) -> Option<Subscription> {
  wire_listing_filter(
    page,
    &config.markers.department_filter_id,
    "department",
    &config.routes.records_path
  )
}

pub fn wire_status_filter<
  D: Dom + 'static
>(
  page: &Page<D>,
  config: &PageConfig
) -> Option<Subscription> {
  wire_listing_filter(
    page,
    &config.markers.status_filter_id,
    "status",
    &config.routes.records_path
  )
}

#[cfg(test)]
mod tests {
  use url::Url;

  use super::*;
  use crate::memory::MemoryPage;

  #[test]
  fn department_value_round_trips_through_url()
   {
    let harness = MemoryPage::new();
    let root = harness.dom.root();
    let select = harness.dom.append_with(
      root,
      "select",
      &[("id", "department-filter")]
    );
    let _sub = wire_department_filter(
      &harness.page(),
      &PageConfig::default()
    )
    .expect("filter wired");

    harness
      .dom
      .choose(select, "Obras Públicas");

    let visited = harness
      .navigator
      .last_visit()
      .expect("navigated");
    let parsed = Url::parse(&format!(
      "https://muni.example{visited}"
    ))
    .unwrap();
    assert_eq!(parsed.path(), "/records");
    let pairs: Vec<_> =
      parsed.query_pairs().collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, "department");
    assert_eq!(pairs[0].1, "Obras Públicas");
  }

  #[test]
  fn cleared_filter_goes_to_plain_listing()
  {
    let harness = MemoryPage::new();
    let root = harness.dom.root();
    let select = harness.dom.append_with(
      root,
      "select",
      &[("id", "department-filter")]
    );
    let _sub = wire_department_filter(
      &harness.page(),
      &PageConfig::default()
    );

    harness.dom.choose(select, "");
    assert_eq!(
      harness.navigator.visits(),
      vec!["/records".to_string()]
    );
  }

  #[test]
  fn status_filter_uses_status_param() {
    let harness = MemoryPage::new();
    let root = harness.dom.root();
    let select = harness.dom.append_with(
      root,
      "select",
      &[("id", "status-filter")]
    );
    let _sub = wire_status_filter(
      &harness.page(),
      &PageConfig::default()
    );

    harness.dom.choose(select, "en progreso");
    assert_eq!(
      harness.navigator.last_visit(),
      Some(
        "/records?status=en+progreso"
          .to_string()
      )
    );
  }

  #[test]
  fn absent_control_is_skipped() {
    let harness = MemoryPage::new();
    assert!(
      wire_department_filter(
        &harness.page(),
        &PageConfig::default()
      )
      .is_none()
    );
  }

  #[test]
  fn reserved_characters_are_encoded() {
    assert_eq!(
      listing_url(
        "/records",
        "department",
        "A&B=C"
      ),
      "/records?department=A%26B%3DC"
    );
  }
}
