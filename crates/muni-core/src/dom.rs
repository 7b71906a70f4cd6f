use std::fmt;

/// Events the page handlers subscribe
/// to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum EventKind {
  Click,
  Change,
  Input,
  Submit
}

impl EventKind {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Click => "click",
      | Self::Change => "change",
      | Self::Input => "input",
      | Self::Submit => "submit"
    }
  }
}

/// The slice of a DOM event a handler
/// may act on.
pub trait EventControl {
  fn prevent_default(&self);
  fn stop_propagation(&self);
}

pub type EventHandler =
  Box<dyn FnMut(&dyn EventControl)>;

/// Disposer for a registered listener,
/// timer or widget. Dropping it tears the
/// resource down; `detach` keeps it alive
/// for the rest of the page.
#[must_use = "dropping a Subscription \
              removes what it guards"]
pub struct Subscription {
  teardown: Option<Box<dyn FnOnce()>>
}

impl Subscription {
  pub fn new(
    teardown: impl FnOnce() + 'static
  ) -> Self {
    Self {
      teardown: Some(Box::new(teardown))
    }
  }

  pub fn noop() -> Self {
    Self {
      teardown: None
    }
  }

  pub fn dispose(mut self) {
    if let Some(teardown) =
      self.teardown.take()
    {
      teardown();
    }
  }

  pub fn detach(mut self) {
    self.teardown = None;
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(teardown) =
      self.teardown.take()
    {
      teardown();
    }
  }
}

impl fmt::Debug for Subscription {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Subscription")
      .field(
        "armed",
        &self.teardown.is_some()
      )
      .finish()
  }
}

/// Document operations the page
/// behaviors need. Selectors are plain
/// CSS selector strings.
pub trait Dom {
  type Node: Clone
    + PartialEq
    + fmt::Debug
    + 'static;

  /// The document element, carrier of
  /// the theme attribute.
  fn root(&self) -> Self::Node;

  fn by_id(
    &self,
    id: &str
  ) -> Option<Self::Node>;

  fn select_all(
    &self,
    selector: &str
  ) -> Vec<Self::Node>;

  fn select_within(
    &self,
    scope: &Self::Node,
    selector: &str
  ) -> Vec<Self::Node>;

  fn select(
    &self,
    selector: &str
  ) -> Option<Self::Node> {
    self
      .select_all(selector)
      .into_iter()
      .next()
  }

  fn attribute(
    &self,
    node: &Self::Node,
    name: &str
  ) -> Option<String>;

  fn set_attribute(
    &self,
    node: &Self::Node,
    name: &str,
    value: &str
  );

  fn add_class(
    &self,
    node: &Self::Node,
    class: &str
  );

  fn remove_class(
    &self,
    node: &Self::Node,
    class: &str
  );

  /// Full visible text of the node and
  /// its descendants.
  fn text(
    &self,
    node: &Self::Node
  ) -> String;

  fn set_text(
    &self,
    node: &Self::Node,
    text: &str
  );

  fn set_html(
    &self,
    node: &Self::Node,
    html: &str
  );

  /// Current value of a form control;
  /// empty for anything else.
  fn value(
    &self,
    node: &Self::Node
  ) -> String;

  fn set_displayed(
    &self,
    node: &Self::Node,
    displayed: bool
  );

  /// Built-in constraint validation of a
  /// form.
  fn check_validity(
    &self,
    form: &Self::Node
  ) -> bool;

  fn listen(
    &self,
    node: &Self::Node,
    event: EventKind,
    handler: EventHandler
  ) -> Subscription;
}
