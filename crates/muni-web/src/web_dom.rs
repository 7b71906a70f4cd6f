use anyhow::Context;
use gloo::events::{
  EventListener,
  EventListenerOptions
};
use muni_core::dom::EventHandler;
use muni_core::{
  Dom,
  EventControl,
  EventKind,
  Subscription
};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::{
  Document,
  Element,
  Event,
  HtmlElement,
  HtmlFormElement,
  HtmlInputElement,
  HtmlSelectElement,
  HtmlTextAreaElement,
  NodeList
};

/// `Dom` over the live browser document.
pub struct WebDom {
  document: Document,
  root:     Element
}

impl WebDom {
  pub fn new(
    document: Document
  ) -> anyhow::Result<Self> {
    let root = document
      .document_element()
      .context("document has no root element")?;
    Ok(Self { document, root })
  }
}

struct WebEvent<'a>(&'a Event);

impl EventControl for WebEvent<'_> {
  fn prevent_default(&self) {
    self.0.prevent_default();
  }

  fn stop_propagation(&self) {
    self.0.stop_propagation();
  }
}

fn elements(list: NodeList) -> Vec<Element> {
  (0..list.length())
    .filter_map(|index| list.get(index))
    .filter_map(|node| {
      node.dyn_into::<Element>().ok()
    })
    .collect()
}

impl Dom for WebDom {
  type Node = Element;

  fn root(&self) -> Element {
    self.root.clone()
  }

  fn by_id(
    &self,
    id: &str
  ) -> Option<Element> {
    self.document.get_element_by_id(id)
  }

  fn select_all(
    &self,
    selector: &str
  ) -> Vec<Element> {
    match self
      .document
      .query_selector_all(selector)
    {
      | Ok(list) => elements(list),
      | Err(error) => {
        warn!(
          selector,
          ?error,
          "invalid selector"
        );
        vec![]
      }
    }
  }

  fn select_within(
    &self,
    scope: &Element,
    selector: &str
  ) -> Vec<Element> {
    scope
      .query_selector_all(selector)
      .map(elements)
      .unwrap_or_default()
  }

  fn attribute(
    &self,
    node: &Element,
    name: &str
  ) -> Option<String> {
    node.get_attribute(name)
  }

  fn set_attribute(
    &self,
    node: &Element,
    name: &str,
    value: &str
  ) {
    if let Err(error) =
      node.set_attribute(name, value)
    {
      warn!(name, ?error, "set_attribute failed");
    }
  }

  fn add_class(
    &self,
    node: &Element,
    class: &str
  ) {
    if let Err(error) =
      node.class_list().add_1(class)
    {
      warn!(class, ?error, "add_class failed");
    }
  }

  fn remove_class(
    &self,
    node: &Element,
    class: &str
  ) {
    if let Err(error) =
      node.class_list().remove_1(class)
    {
      warn!(class, ?error, "remove_class failed");
    }
  }

  fn text(&self, node: &Element) -> String {
    node.text_content().unwrap_or_default()
  }

  fn set_text(
    &self,
    node: &Element,
    text: &str
  ) {
    node.set_text_content(Some(text));
  }

  fn set_html(
    &self,
    node: &Element,
    html: &str
  ) {
    node.set_inner_html(html);
  }

  fn value(&self, node: &Element) -> String {
    if let Some(input) =
      node.dyn_ref::<HtmlInputElement>()
    {
      input.value()
    } else if let Some(select) =
      node.dyn_ref::<HtmlSelectElement>()
    {
      select.value()
    } else if let Some(area) =
      node.dyn_ref::<HtmlTextAreaElement>()
    {
      area.value()
    } else {
      String::new()
    }
  }

  fn set_displayed(
    &self,
    node: &Element,
    displayed: bool
  ) {
    let Some(element) =
      node.dyn_ref::<HtmlElement>()
    else {
      return;
    };
    let style = element.style();
    let result = if displayed {
      style
        .remove_property("display")
        .map(|_| ())
    } else {
      style.set_property("display", "none")
    };
    if let Err(error) = result {
      warn!(?error, "display toggle failed");
    }
  }

  fn check_validity(
    &self,
    form: &Element
  ) -> bool {
    form
      .dyn_ref::<HtmlFormElement>()
      .is_none_or(|form| form.check_validity())
  }

  fn listen(
    &self,
    node: &Element,
    event: EventKind,
    mut handler: EventHandler
  ) -> Subscription {
    let listener = EventListener::new_with_options(
      node,
      event.as_str(),
      EventListenerOptions::enable_prevent_default(),
      move |event| handler(&WebEvent(event))
    );
    Subscription::new(move || drop(listener))
  }
}
