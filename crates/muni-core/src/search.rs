use tracing::{
  debug,
  trace
};

use crate::config::PageConfig;
use crate::dom::{
  Dom,
  EventKind,
  Subscription
};
use crate::error::SetupError;
use crate::platform::Page;

const TARGET_ATTR: &str =
  "data-search-target";
const ROWS: &str = "tbody tr";

/// Lowercased, trimmed search term.
pub fn normalize_term(raw: &str) -> String {
  raw.trim().to_lowercase()
}

pub fn row_matches(
  row_text: &str,
  term: &str
) -> bool {
  term.is_empty()
    || row_text.to_lowercase().contains(term)
}

/// Shows matching rows of `table`, hides
/// the rest. Returns how many stay
/// visible.
pub fn apply_filter<D: Dom>(
  dom: &D,
  table: &D::Node,
  raw_term: &str
) -> usize {
  let term = normalize_term(raw_term);
  let mut visible = 0;
  for row in dom.select_within(table, ROWS) {
    let shown =
      row_matches(&dom.text(&row), &term);
    dom.set_displayed(&row, shown);
    visible += usize::from(shown);
  }
  trace!(%term, visible, "rows filtered");
  visible
}

/// Picks the one table the search box
/// drives.
pub fn resolve_target<D: Dom>(
  dom: &D,
  input: &D::Node,
  config: &PageConfig
) -> Result<D::Node, SetupError> {
  let explicit = dom
    .attribute(input, TARGET_ATTR)
    .filter(|id| !id.trim().is_empty())
    .or_else(|| config.search.table_id.clone());
  if let Some(id) = explicit {
    return dom.by_id(id.trim()).ok_or(
      SetupError::MissingSearchTable(id)
    );
  }

  let mut tables = dom.select_all("table");
  match tables.len() {
    | 0 => Err(SetupError::MissingSearchTable(
      "table".to_string()
    )),
    | 1 => Ok(tables.remove(0)),
    | n => Err(
      SetupError::AmbiguousSearchTable(n)
    )
  }
}

/// Filters the target table on every
/// keystroke. `Ok(None)` when the page has
/// no search box.
#[tracing::instrument(skip_all)]
pub fn wire_search<D: Dom + 'static>(
  page: &Page<D>,
  config: &PageConfig
) -> Result<Option<Subscription>, SetupError>
{
  let Some(input) = page
    .dom
    .select(&config.markers.search_input)
  else {
    debug!("no search input");
    return Ok(None);
  };
  let table =
    resolve_target(&*page.dom, &input, config)?;

  let dom = page.dom.clone();
  let node = input.clone();
  Ok(Some(page.dom.listen(
    &input,
    EventKind::Input,
    Box::new(move |_| {
      apply_filter(
        &*dom,
        &table,
        &dom.value(&node)
      );
    })
  )))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::{
    MemoryDom,
    MemoryPage,
    NodeId
  };

  fn add_table(
    dom: &MemoryDom,
    id: &str,
    rows: &[&str]
  ) -> Vec<NodeId> {
    let table = dom.append_with(
      dom.root(),
      "table",
      &[("id", id)]
    );
    let thead = dom.append(table, "thead");
    let head = dom.append(thead, "tr");
    dom.set_text(&head, "Expediente Departamento");
    let tbody = dom.append(table, "tbody");
    rows
      .iter()
      .map(|text| {
        let tr = dom.append(tbody, "tr");
        for cell in text.split('|') {
          let td = dom.append(tr, "td");
          dom.set_text(&td, cell);
        }
        tr
      })
      .collect()
  }

  fn visible(
    dom: &MemoryDom,
    rows: &[NodeId]
  ) -> Vec<bool> {
    rows
      .iter()
      .map(|row| dom.is_displayed(*row))
      .collect()
  }

  #[test]
  fn keystrokes_filter_rows_case_insensitively()
   {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    let rows = add_table(dom, "records", &[
      "OP-001|Obras Públicas|Bacheo",
      "HA-002|Hacienda|Tasas",
      "OP-003|OBRAS PÚBLICAS|Veredas",
      "PR-004|Prensa|Comunicado",
      "GO-005|Gobierno|Decreto obras"
    ]);
    let input = dom.append_with(
      dom.root(),
      "input",
      &[("class", "form-control search-records")]
    );
    let _sub = wire_search(
      &harness.page(),
      &PageConfig::default()
    )
    .unwrap()
    .expect("search wired");

    dom.type_into(input, "obras");
    assert_eq!(
      visible(dom, &rows),
      vec![true, false, true, false, true]
    );

    dom.type_into(input, "ZZZ");
    assert_eq!(
      visible(dom, &rows),
      vec![false; 5]
    );

    dom.type_into(input, "");
    assert_eq!(
      visible(dom, &rows),
      vec![true; 5]
    );

    dom.type_into(input, "  públicas ");
    assert_eq!(
      visible(dom, &rows),
      vec![true, false, true, false, false]
    );
  }

  #[test]
  fn header_rows_are_never_hidden() {
    let dom = MemoryDom::new();
    add_table(&dom, "t", &["a"]);
    let table = dom.by_id("t").unwrap();
    assert_eq!(apply_filter(&dom, &table, "zzz"), 0);
    let head = dom.select("thead tr").unwrap();
    assert!(dom.is_displayed(head));
  }

  #[test]
  fn several_tables_need_an_explicit_target()
  {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    add_table(dom, "records", &["uno"]);
    add_table(dom, "history", &["dos"]);
    dom.append_with(dom.root(), "input", &[
      ("class", "search-records")
    ]);

    let err = wire_search(
      &harness.page(),
      &PageConfig::default()
    )
    .unwrap_err();
    assert_eq!(
      err,
      SetupError::AmbiguousSearchTable(2)
    );
  }

  #[test]
  fn explicit_target_scopes_filtering() {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    let records =
      add_table(dom, "records", &["uno"]);
    let history =
      add_table(dom, "history", &["dos"]);
    let input = dom.append_with(
      dom.root(),
      "input",
      &[
        ("class", "search-records"),
        ("data-search-target", "records")
      ]
    );
    let _sub = wire_search(
      &harness.page(),
      &PageConfig::default()
    )
    .unwrap();

    dom.type_into(input, "zzz");
    assert_eq!(visible(dom, &records), vec![false]);
    assert_eq!(visible(dom, &history), vec![true]);
  }

  #[test]
  fn missing_configured_table_is_reported()
  {
    let harness = MemoryPage::new();
    harness.dom.append_with(
      harness.dom.root(),
      "input",
      &[("class", "search-records")]
    );
    let mut config = PageConfig::default();
    config.search.table_id =
      Some("records-table".to_string());

    assert_eq!(
      wire_search(&harness.page(), &config)
        .unwrap_err(),
      SetupError::MissingSearchTable(
        "records-table".to_string()
      )
    );
  }

  #[test]
  fn page_without_search_box_is_fine() {
    let harness = MemoryPage::new();
    assert!(
      wire_search(
        &harness.page(),
        &PageConfig::default()
      )
      .unwrap()
      .is_none()
    );
  }
}
