use tracing::debug;

use crate::config::PageConfig;
use crate::dom::{
  Dom,
  EventKind,
  Subscription
};
use crate::platform::Page;

/// Gates submission of every marked form
/// on built-in constraint validation.
/// Forms are wired independently.
#[tracing::instrument(skip_all)]
pub fn wire_validation_gates<
  D: Dom + 'static
>(
  page: &Page<D>,
  config: &PageConfig
) -> Vec<Subscription> {
  let forms = page
    .dom
    .select_all(&config.markers.validated_form);
  debug!(forms = forms.len(), "gating forms");
  forms
    .into_iter()
    .map(|form| {
      let dom = page.dom.clone();
      let node = form.clone();
      let class =
        config.markers.validated_class.clone();
      page.dom.listen(
        &form,
        EventKind::Submit,
        Box::new(move |event| {
          if !dom.check_validity(&node) {
            debug!(form = ?node, "blocking invalid submit");
            event.prevent_default();
            event.stop_propagation();
          }
          dom.add_class(&node, &class);
        })
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::{
    MemoryPage,
    NodeId
  };

  fn form_with_required(
    harness: &MemoryPage
  ) -> (NodeId, NodeId) {
    let dom = &harness.dom;
    let form = dom.append_with(
      dom.root(),
      "form",
      &[("class", "needs-validation")]
    );
    let field = dom.append_with(form, "input", &[
      ("name", "full_name"),
      ("required", "")
    ]);
    (form, field)
  }

  #[test]
  fn invalid_form_is_blocked_and_marked() {
    let harness = MemoryPage::new();
    let (form, _field) =
      form_with_required(&harness);
    let _subs = wire_validation_gates(
      &harness.page(),
      &PageConfig::default()
    );

    let outcome = harness.dom.submit(form);
    assert!(outcome.default_prevented);
    assert!(outcome.propagation_stopped);
    assert!(
      harness
        .dom
        .has_class(form, "was-validated")
    );
  }

  #[test]
  fn valid_form_submits_and_is_marked() {
    let harness = MemoryPage::new();
    let (form, field) =
      form_with_required(&harness);
    harness.dom.set_value(field, "Ana Pérez");
    let _subs = wire_validation_gates(
      &harness.page(),
      &PageConfig::default()
    );

    let outcome = harness.dom.submit(form);
    assert!(!outcome.default_prevented);
    assert!(
      harness
        .dom
        .has_class(form, "was-validated")
    );
  }

  #[test]
  fn forms_do_not_affect_each_other() {
    let harness = MemoryPage::new();
    let (bad, _) =
      form_with_required(&harness);
    let (good, field) =
      form_with_required(&harness);
    harness.dom.set_value(field, "x");
    let subs = wire_validation_gates(
      &harness.page(),
      &PageConfig::default()
    );
    assert_eq!(subs.len(), 2);

    assert!(
      !harness.dom.submit(good).default_prevented
    );
    assert!(!harness.dom.has_class(bad, "was-validated"));
    assert!(
      harness.dom.submit(bad).default_prevented
    );
  }
}
