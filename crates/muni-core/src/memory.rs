//! In-memory page: an arena DOM with a
//! small selector engine plus recording
//! doubles for every capability. Drives
//! the behaviors on the host, without a
//! browser.

use std::cell::{
  Cell,
  RefCell
};
use std::collections::{
  HashMap,
  VecDeque
};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::{
  LocalPool,
  LocalSpawner
};
use futures::future::LocalBoxFuture;
use muni_shared::{
  RecordDetails,
  RecordId,
  RecordStatus,
  StatusChanged
};
use tracing::warn;

use crate::cancel::CancelToken;
use crate::dom::{
  Dom,
  EventControl,
  EventHandler,
  EventKind,
  Subscription
};
use crate::error::{
  ApiError,
  StorageError,
  WidgetError
};
use crate::platform::{
  Confirmer,
  Navigator,
  Page,
  PreferenceStore,
  RecordsApi,
  Scheduler,
  WidgetHandle,
  WidgetKind,
  WidgetOptions,
  WidgetToolkit
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct MemoryNode {
  tag:       String,
  parent:    Option<NodeId>,
  children:  Vec<NodeId>,
  attrs:     Vec<(String, String)>,
  text:      String,
  html:      Option<String>,
  value:     String,
  displayed: bool
}

impl MemoryNode {
  fn new(
    tag: &str,
    parent: Option<NodeId>
  ) -> Self {
    Self {
      tag: tag.to_ascii_lowercase(),
      parent,
      children: vec![],
      attrs: vec![],
      text: String::new(),
      html: None,
      value: String::new(),
      displayed: true
    }
  }

  fn attr(
    &self,
    name: &str
  ) -> Option<&str> {
    self
      .attrs
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  fn has_class(
    &self,
    class: &str
  ) -> bool {
    self.attr("class").is_some_and(
      |classes| {
        classes
          .split_whitespace()
          .any(|c| c == class)
      }
    )
  }
}

struct Listener {
  id:      u64,
  node:    NodeId,
  event:   EventKind,
  handler: Rc<RefCell<EventHandler>>
}

/// Outcome of [`MemoryDom::dispatch`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct Dispatch {
  pub default_prevented:   bool,
  pub propagation_stopped: bool
}

#[derive(Default)]
struct MemoryEvent {
  default_prevented: Cell<bool>,
  stopped:           Cell<bool>
}

impl EventControl for MemoryEvent {
  fn prevent_default(&self) {
    self.default_prevented.set(true);
  }

  fn stop_propagation(&self) {
    self.stopped.set(true);
  }
}

pub struct MemoryDom {
  nodes:         RefCell<Vec<MemoryNode>>,
  listeners:     Rc<RefCell<Vec<Listener>>>,
  next_listener: Cell<u64>
}

impl Default for MemoryDom {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryDom {
  /// Empty document with an `<html>`
  /// root.
  pub fn new() -> Self {
    Self {
      nodes:         RefCell::new(vec![
        MemoryNode::new("html", None),
      ]),
      listeners:     Rc::default(),
      next_listener: Cell::new(0)
    }
  }

  pub fn append(
    &self,
    parent: NodeId,
    tag: &str
  ) -> NodeId {
    let mut nodes = self.nodes.borrow_mut();
    let id = NodeId(nodes.len());
    nodes.push(MemoryNode::new(
      tag,
      Some(parent)
    ));
    nodes[parent.0].children.push(id);
    id
  }

  pub fn append_with(
    &self,
    parent: NodeId,
    tag: &str,
    attrs: &[(&str, &str)]
  ) -> NodeId {
    let id = self.append(parent, tag);
    for (name, value) in attrs {
      self.set_attribute(&id, name, value);
    }
    id
  }

  pub fn set_value(
    &self,
    node: NodeId,
    value: &str
  ) {
    self.nodes.borrow_mut()[node.0].value =
      value.to_string();
  }

  pub fn html(
    &self,
    node: NodeId
  ) -> Option<String> {
    self.nodes.borrow()[node.0]
      .html
      .clone()
  }

  pub fn is_displayed(
    &self,
    node: NodeId
  ) -> bool {
    self.nodes.borrow()[node.0].displayed
  }

  pub fn has_class(
    &self,
    node: NodeId,
    class: &str
  ) -> bool {
    self.nodes.borrow()[node.0]
      .has_class(class)
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.borrow().len()
  }

  /// Fires `event` at `target` and
  /// bubbles it through the ancestors.
  pub fn dispatch(
    &self,
    target: NodeId,
    event: EventKind
  ) -> Dispatch {
    let control = MemoryEvent::default();
    let mut current = Some(target);
    while let Some(node) = current {
      let handlers: Vec<_> = self
        .listeners
        .borrow()
        .iter()
        .filter(|l| {
          l.node == node && l.event == event
        })
        .map(|l| l.handler.clone())
        .collect();
      for handler in handlers {
        (handler.borrow_mut())(&control);
      }
      if control.stopped.get() {
        break;
      }
      current = self.parent(node);
    }
    Dispatch {
      default_prevented:   control
        .default_prevented
        .get(),
      propagation_stopped: control
        .stopped
        .get()
    }
  }

  pub fn click(
    &self,
    node: NodeId
  ) -> Dispatch {
    self.dispatch(node, EventKind::Click)
  }

  pub fn submit(
    &self,
    form: NodeId
  ) -> Dispatch {
    self.dispatch(form, EventKind::Submit)
  }

  /// Sets the control value and fires
  /// `input`, as a keystroke would.
  pub fn type_into(
    &self,
    node: NodeId,
    value: &str
  ) {
    self.set_value(node, value);
    self.dispatch(node, EventKind::Input);
  }

  pub fn choose(
    &self,
    node: NodeId,
    value: &str
  ) {
    self.set_value(node, value);
    self.dispatch(node, EventKind::Change);
  }

  fn parent(
    &self,
    node: NodeId
  ) -> Option<NodeId> {
    self.nodes.borrow()[node.0].parent
  }

  fn descendants(
    &self,
    node: NodeId,
    out: &mut Vec<NodeId>
  ) {
    let children =
      self.nodes.borrow()[node.0]
        .children
        .clone();
    for child in children {
      out.push(child);
      self.descendants(child, out);
    }
  }

  fn matches_chain(
    &self,
    node: NodeId,
    chain: &[Compound]
  ) -> bool {
    let Some((last, rest)) =
      chain.split_last()
    else {
      return false;
    };
    if !self.matches_compound(node, last)
    {
      return false;
    }
    let mut current = self.parent(node);
    for compound in rest.iter().rev() {
      loop {
        let Some(ancestor) = current else {
          return false;
        };
        current = self.parent(ancestor);
        if self
          .matches_compound(ancestor, compound)
        {
          break;
        }
      }
    }
    true
  }

  fn matches_compound(
    &self,
    node: NodeId,
    compound: &Compound
  ) -> bool {
    if compound.unsupported {
      return false;
    }
    {
      let nodes = self.nodes.borrow();
      let n = &nodes[node.0];
      if let Some(tag) = &compound.tag
        && &n.tag != tag
      {
        return false;
      }
      if let Some(id) = &compound.id
        && n.attr("id") != Some(id.as_str())
      {
        return false;
      }
      if !compound
        .classes
        .iter()
        .all(|class| n.has_class(class))
      {
        return false;
      }
      for (name, expected) in
        &compound.attrs
      {
        match (n.attr(name), expected) {
          | (None, _) => return false,
          | (Some(actual), Some(want))
            if actual != want.as_str() =>
          {
            return false;
          }
          | _ => {}
        }
      }
    }
    !compound
      .not
      .iter()
      .any(|inner| {
        self.matches_compound(node, inner)
      })
  }

  fn select_from(
    &self,
    scope: NodeId,
    include_scope: bool,
    selector: &str
  ) -> Vec<NodeId> {
    let chain = parse_selector(selector);
    if chain.is_empty() {
      warn!(selector, "empty selector");
      return vec![];
    }
    let mut candidates = vec![];
    if include_scope {
      candidates.push(scope);
    }
    self.descendants(scope, &mut candidates);
    candidates
      .into_iter()
      .filter(|node| {
        self.matches_chain(*node, &chain)
      })
      .collect()
  }
}

impl Dom for MemoryDom {
  type Node = NodeId;

  fn root(&self) -> NodeId {
    NodeId(0)
  }

  fn by_id(
    &self,
    id: &str
  ) -> Option<NodeId> {
    let mut all = vec![NodeId(0)];
    self.descendants(NodeId(0), &mut all);
    let nodes = self.nodes.borrow();
    all.into_iter().find(|node| {
      nodes[node.0].attr("id") == Some(id)
    })
  }

  fn select_all(
    &self,
    selector: &str
  ) -> Vec<NodeId> {
    self.select_from(
      NodeId(0),
      true,
      selector
    )
  }

  fn select_within(
    &self,
    scope: &NodeId,
    selector: &str
  ) -> Vec<NodeId> {
    self.select_from(*scope, false, selector)
  }

  fn attribute(
    &self,
    node: &NodeId,
    name: &str
  ) -> Option<String> {
    self.nodes.borrow()[node.0]
      .attr(name)
      .map(str::to_string)
  }

  fn set_attribute(
    &self,
    node: &NodeId,
    name: &str,
    value: &str
  ) {
    let mut nodes = self.nodes.borrow_mut();
    let attrs = &mut nodes[node.0].attrs;
    if let Some(slot) = attrs
      .iter_mut()
      .find(|(key, _)| key == name)
    {
      slot.1 = value.to_string();
    } else {
      attrs.push((
        name.to_string(),
        value.to_string()
      ));
    }
  }

  fn add_class(
    &self,
    node: &NodeId,
    class: &str
  ) {
    if self.has_class(*node, class) {
      return;
    }
    let classes = match self
      .attribute(node, "class")
    {
      | Some(existing)
        if !existing.trim().is_empty() =>
      {
        format!("{} {class}", existing.trim())
      }
      | _ => class.to_string()
    };
    self.set_attribute(
      node, "class", &classes
    );
  }

  fn remove_class(
    &self,
    node: &NodeId,
    class: &str
  ) {
    let Some(existing) =
      self.attribute(node, "class")
    else {
      return;
    };
    let kept: Vec<_> = existing
      .split_whitespace()
      .filter(|c| *c != class)
      .collect();
    self.set_attribute(
      node,
      "class",
      &kept.join(" ")
    );
  }

  fn text(&self, node: &NodeId) -> String {
    let (own, html, children) = {
      let nodes = self.nodes.borrow();
      let n = &nodes[node.0];
      (
        n.text.clone(),
        n.html.clone(),
        n.children.clone()
      )
    };
    if let Some(html) = html {
      return strip_tags(&html);
    }
    let mut out = own;
    for child in children {
      out.push_str(&self.text(&child));
    }
    out
  }

  fn set_text(
    &self,
    node: &NodeId,
    text: &str
  ) {
    let mut nodes = self.nodes.borrow_mut();
    let n = &mut nodes[node.0];
    n.text = text.to_string();
    n.html = None;
    n.children.clear();
  }

  fn set_html(
    &self,
    node: &NodeId,
    html: &str
  ) {
    let mut nodes = self.nodes.borrow_mut();
    let n = &mut nodes[node.0];
    n.html = Some(html.to_string());
    n.text.clear();
    n.children.clear();
  }

  fn value(&self, node: &NodeId) -> String {
    self.nodes.borrow()[node.0]
      .value
      .clone()
  }

  fn set_displayed(
    &self,
    node: &NodeId,
    displayed: bool
  ) {
    self.nodes.borrow_mut()[node.0]
      .displayed = displayed;
  }

  fn check_validity(
    &self,
    form: &NodeId
  ) -> bool {
    let mut fields = vec![];
    self.descendants(*form, &mut fields);
    let nodes = self.nodes.borrow();
    fields.into_iter().all(|field| {
      let n = &nodes[field.0];
      n.attr("required").is_none()
        || !n.value.is_empty()
    })
  }

  fn listen(
    &self,
    node: &NodeId,
    event: EventKind,
    handler: EventHandler
  ) -> Subscription {
    let id = self.next_listener.get();
    self.next_listener.set(id + 1);
    self.listeners.borrow_mut().push(
      Listener {
        id,
        node: *node,
        event,
        handler: Rc::new(RefCell::new(
          handler
        ))
      }
    );
    let listeners = self.listeners.clone();
    Subscription::new(move || {
      listeners
        .borrow_mut()
        .retain(|l| l.id != id);
    })
  }
}

fn strip_tags(html: &str) -> String {
  let mut out = String::new();
  let mut in_tag = false;
  for ch in html.chars() {
    match ch {
      | '<' => in_tag = true,
      | '>' => in_tag = false,
      | other if !in_tag => out.push(other),
      | _ => {}
    }
  }
  out
}

#[derive(Debug, Clone, Default)]
struct Compound {
  tag:         Option<String>,
  id:          Option<String>,
  classes:     Vec<String>,
  attrs:       Vec<(String, Option<String>)>,
  not:         Vec<Compound>,
  unsupported: bool
}

/// Descendant chains of compound
/// selectors: tag, `#id`, `.class`,
/// `[attr]`, `[attr="v"]`, `:not(..)`.
fn parse_selector(
  selector: &str
) -> Vec<Compound> {
  split_top_level(selector)
    .iter()
    .map(|part| parse_compound(part))
    .collect()
}

fn split_top_level(
  selector: &str
) -> Vec<String> {
  let mut parts = vec![];
  let mut current = String::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  for ch in selector.chars() {
    match (quote, ch) {
      | (Some(q), c) if c == q => {
        quote = None;
        current.push(c);
      }
      | (Some(_), c) => current.push(c),
      | (None, '"' | '\'') => {
        quote = Some(ch);
        current.push(ch);
      }
      | (None, '[' | '(') => {
        depth += 1;
        current.push(ch);
      }
      | (None, ']' | ')') => {
        depth = depth.saturating_sub(1);
        current.push(ch);
      }
      | (None, c)
        if c.is_whitespace() && depth == 0 =>
      {
        if !current.is_empty() {
          parts.push(std::mem::take(
            &mut current
          ));
        }
      }
      | (None, c) => current.push(c)
    }
  }
  if !current.is_empty() {
    parts.push(current);
  }
  parts
}

fn is_ident(ch: char) -> bool {
  ch.is_alphanumeric()
    || ch == '-'
    || ch == '_'
}

fn parse_compound(raw: &str) -> Compound {
  let chars: Vec<char> =
    raw.chars().collect();
  let mut out = Compound::default();
  let mut i = 0;

  let take_ident =
    |start: usize| -> (String, usize) {
      let mut end = start;
      while end < chars.len()
        && is_ident(chars[end])
      {
        end += 1;
      }
      (
        chars[start..end].iter().collect(),
        end
      )
    };

  while i < chars.len() {
    match chars[i] {
      | '*' => i += 1,
      | '.' => {
        let (class, next) = take_ident(i + 1);
        out.classes.push(class);
        i = next;
      }
      | '#' => {
        let (id, next) = take_ident(i + 1);
        out.id = Some(id);
        i = next;
      }
      | '[' => {
        let Some(len) = chars[i..]
          .iter()
          .position(|c| *c == ']')
        else {
          out.unsupported = true;
          break;
        };
        let body: String =
          chars[i + 1..i + len].iter().collect();
        out.attrs.push(parse_attr(&body));
        i += len + 1;
      }
      | ':' => {
        let rest: String =
          chars[i..].iter().collect();
        if let Some(inner) = rest
          .strip_prefix(":not(")
          && let Some(close) = inner.find(')')
        {
          out.not.push(parse_compound(
            &inner[..close]
          ));
          i += ":not(".len()
            + inner[..close].chars().count()
            + 1;
        } else {
          warn!(
            selector = raw,
            "unsupported pseudo-class"
          );
          out.unsupported = true;
          break;
        }
      }
      | c if is_ident(c) => {
        let (tag, next) = take_ident(i);
        out.tag = Some(tag.to_ascii_lowercase());
        i = next;
      }
      | _ => {
        out.unsupported = true;
        break;
      }
    }
  }
  out
}

fn parse_attr(
  body: &str
) -> (String, Option<String>) {
  match body.split_once('=') {
    | Some((name, value)) => {
      let value = value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
      (
        name.trim().to_string(),
        Some(value.to_string())
      )
    }
    | None => (body.trim().to_string(), None)
  }
}

#[derive(Default)]
pub struct RecordingNavigator {
  visits: RefCell<Vec<String>>,
  prints: Cell<usize>
}

impl RecordingNavigator {
  pub fn visits(&self) -> Vec<String> {
    self.visits.borrow().clone()
  }

  pub fn last_visit(
    &self
  ) -> Option<String> {
    self.visits.borrow().last().cloned()
  }

  pub fn prints(&self) -> usize {
    self.prints.get()
  }
}

impl Navigator for RecordingNavigator {
  fn navigate(&self, url: &str) {
    self
      .visits
      .borrow_mut()
      .push(url.to_string());
  }

  fn print(&self) {
    self.prints.set(self.prints.get() + 1);
  }
}

#[derive(Default)]
pub struct MemoryStore {
  values:      RefCell<HashMap<String, String>>,
  fail_reads:  Cell<bool>,
  fail_writes: Cell<bool>
}

impl MemoryStore {
  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.values.borrow().get(key).cloned()
  }

  pub fn insert(
    &self,
    key: &str,
    value: &str
  ) {
    self.values.borrow_mut().insert(
      key.to_string(),
      value.to_string()
    );
  }

  pub fn fail_reads(&self, fail: bool) {
    self.fail_reads.set(fail);
  }

  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.set(fail);
  }
}

impl PreferenceStore for MemoryStore {
  fn load(
    &self,
    key: &str
  ) -> Result<Option<String>, StorageError>
  {
    if self.fail_reads.get() {
      return Err(StorageError::Unavailable);
    }
    Ok(self.get(key))
  }

  fn save(
    &self,
    key: &str,
    value: &str
  ) -> Result<(), StorageError> {
    if self.fail_writes.get() {
      return Err(StorageError::Write(
        "quota exceeded".to_string()
      ));
    }
    self.insert(key, value);
    Ok(())
  }
}

/// Clock that only moves on
/// [`ManualScheduler::advance`].
#[derive(Default)]
pub struct ManualScheduler {
  now:     Cell<Duration>,
  pending: RefCell<Vec<(Duration, oneshot::Sender<()>)>>
}

impl ManualScheduler {
  pub fn now(&self) -> Duration {
    self.now.get()
  }

  pub fn pending(&self) -> usize {
    self.pending.borrow().len()
  }

  /// Moves the clock and releases every
  /// timer that came due.
  pub fn advance(&self, by: Duration) {
    let now = self.now.get() + by;
    self.now.set(now);
    let due: Vec<_> = {
      let mut pending =
        self.pending.borrow_mut();
      let (due, keep): (Vec<_>, Vec<_>) =
        pending
        .drain(..)
        .partition(|(at, _)| *at <= now);
      *pending = keep;
      due
    };
    for (_, tx) in due {
      let _ = tx.send(());
    }
  }
}

impl Scheduler for ManualScheduler {
  fn delay(
    &self,
    after: Duration
  ) -> LocalBoxFuture<'static, ()> {
    if after.is_zero() {
      return Box::pin(futures::future::ready(()));
    }
    let (tx, rx) = oneshot::channel();
    self
      .pending
      .borrow_mut()
      .push((self.now.get() + after, tx));
    Box::pin(async move {
      let _ = rx.await;
    })
  }
}

/// Answers confirmations from a queue,
/// then with `fallback`.
#[derive(Default)]
pub struct ScriptedConfirmer {
  answers:  RefCell<VecDeque<bool>>,
  fallback: Cell<bool>,
  prompts:  RefCell<Vec<String>>
}

impl ScriptedConfirmer {
  pub fn answer(&self, accept: bool) {
    self
      .answers
      .borrow_mut()
      .push_back(accept);
  }

  pub fn always(&self, accept: bool) {
    self.fallback.set(accept);
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.borrow().clone()
  }
}

#[async_trait(?Send)]
impl Confirmer for ScriptedConfirmer {
  async fn confirm(
    &self,
    message: &str
  ) -> bool {
    self
      .prompts
      .borrow_mut()
      .push(message.to_string());
    self
      .answers
      .borrow_mut()
      .pop_front()
      .unwrap_or(self.fallback.get())
  }
}

type WidgetLog<N> =
  Rc<RefCell<Vec<(N, WidgetKind, &'static str)>>>;

/// Toolkit double that records every
/// mount and handle call.
pub struct RecordingWidgets<N> {
  log:     WidgetLog<N>,
  failing: RefCell<Vec<N>>
}

impl<N> Default for RecordingWidgets<N> {
  fn default() -> Self {
    Self {
      log:     Rc::default(),
      failing: RefCell::default()
    }
  }
}

impl<N: Clone + PartialEq> RecordingWidgets<N> {
  /// Makes mounting on `node` fail.
  pub fn fail_on(&self, node: N) {
    self.failing.borrow_mut().push(node);
  }

  /// Nodes that saw `action` on a widget
  /// of `kind`. Mounts log as `mount`.
  pub fn nodes(
    &self,
    kind: WidgetKind,
    action: &str
  ) -> Vec<N> {
    self
      .log
      .borrow()
      .iter()
      .filter(|(_, k, a)| {
        *k == kind && *a == action
      })
      .map(|(node, _, _)| node.clone())
      .collect()
  }

  pub fn count(
    &self,
    kind: WidgetKind,
    action: &str
  ) -> usize {
    self.nodes(kind, action).len()
  }
}

struct RecordedWidget<N> {
  node: N,
  kind: WidgetKind,
  log:  WidgetLog<N>
}

impl<N: Clone> RecordedWidget<N> {
  fn record(&self, action: &'static str) {
    self.log.borrow_mut().push((
      self.node.clone(),
      self.kind,
      action
    ));
  }
}

impl<N: Clone> WidgetHandle
  for RecordedWidget<N>
{
  fn show(&self) {
    self.record("show");
  }

  fn hide(&self) {
    self.record("hide");
  }

  fn close(&self) {
    self.record("close");
  }

  fn dispose(&self) {
    self.record("dispose");
  }
}

impl<N: Clone + PartialEq + 'static>
  WidgetToolkit<N> for RecordingWidgets<N>
{
  fn mount(
    &self,
    node: &N,
    kind: WidgetKind,
    _options: &WidgetOptions
  ) -> Result<Rc<dyn WidgetHandle>, WidgetError>
  {
    if self.failing.borrow().contains(node)
    {
      return Err(WidgetError::Mount {
        kind:   kind.as_str(),
        reason: "element detached".to_string()
      });
    }
    let widget = RecordedWidget {
      node: node.clone(),
      kind,
      log: self.log.clone()
    };
    widget.record("mount");
    Ok(Rc::new(widget))
  }
}

/// Records collaborator with scripted
/// answers and a scheduler-driven delay.
pub struct ScriptedRecords {
  scheduler: Rc<dyn Scheduler>,
  latency:   Duration,
  details:   RefCell<HashMap<RecordId, RecordDetails>>,
  failures:  RefCell<HashMap<RecordId, ApiError>>,
  updates:   RefCell<Vec<(RecordId, RecordStatus)>>
}

impl ScriptedRecords {
  pub fn new(
    scheduler: Rc<dyn Scheduler>,
    latency: Duration
  ) -> Self {
    Self {
      scheduler,
      latency,
      details: RefCell::default(),
      failures: RefCell::default(),
      updates: RefCell::default()
    }
  }

  pub fn insert(
    &self,
    details: RecordDetails
  ) {
    self
      .details
      .borrow_mut()
      .insert(details.id.clone(), details);
  }

  /// Every call touching `id` fails with
  /// `error`.
  pub fn fail(
    &self,
    id: &str,
    error: ApiError
  ) {
    self
      .failures
      .borrow_mut()
      .insert(RecordId::from(id), error);
  }

  /// Lifts a failure set with `fail`.
  pub fn recover(&self, id: &str) {
    self
      .failures
      .borrow_mut()
      .remove(&RecordId::from(id));
  }

  pub fn updates(
    &self
  ) -> Vec<(RecordId, RecordStatus)> {
    self.updates.borrow().clone()
  }
}

#[async_trait(?Send)]
impl RecordsApi for ScriptedRecords {
  async fn fetch_record(
    &self,
    id: &RecordId,
    cancel: &CancelToken
  ) -> Result<RecordDetails, ApiError> {
    self.scheduler.delay(self.latency).await;
    if cancel.is_cancelled() {
      return Err(ApiError::Cancelled);
    }
    if let Some(error) =
      self.failures.borrow().get(id)
    {
      return Err(error.clone());
    }
    self
      .details
      .borrow()
      .get(id)
      .cloned()
      .ok_or_else(|| {
        ApiError::NotFound(id.clone())
      })
  }

  async fn update_status(
    &self,
    id: &RecordId,
    status: RecordStatus
  ) -> Result<StatusChanged, ApiError> {
    self.scheduler.delay(self.latency).await;
    if let Some(error) =
      self.failures.borrow().get(id)
    {
      return Err(error.clone());
    }
    self
      .updates
      .borrow_mut()
      .push((id.clone(), status));
    Ok(StatusChanged {
      id: id.clone(),
      status
    })
  }
}

/// A complete in-memory page: DOM,
/// doubles and a local executor.
pub struct MemoryPage {
  pub dom:       Rc<MemoryDom>,
  pub navigator: Rc<RecordingNavigator>,
  pub storage:   Rc<MemoryStore>,
  pub scheduler: Rc<ManualScheduler>,
  pub widgets:   Rc<RecordingWidgets<NodeId>>,
  pub confirm:   Rc<ScriptedConfirmer>,
  pub records:   Rc<ScriptedRecords>,
  pool:          RefCell<LocalPool>,
  spawner:       LocalSpawner
}

impl Default for MemoryPage {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryPage {
  pub fn new() -> Self {
    let scheduler =
      Rc::new(ManualScheduler::default());
    let records =
      Rc::new(ScriptedRecords::new(
        scheduler.clone(),
        Duration::ZERO
      ));
    let pool = LocalPool::new();
    let spawner = pool.spawner();
    Self {
      dom: Rc::new(MemoryDom::new()),
      navigator: Rc::default(),
      storage: Rc::default(),
      scheduler,
      widgets: Rc::default(),
      confirm: Rc::default(),
      records,
      pool: RefCell::new(pool),
      spawner
    }
  }

  pub fn page(&self) -> Page<MemoryDom> {
    self.page_with_records(
      self.records.clone()
    )
  }

  pub fn page_with_records(
    &self,
    records: Rc<dyn RecordsApi>
  ) -> Page<MemoryDom> {
    Page {
      dom: self.dom.clone(),
      navigator: self.navigator.clone(),
      storage: self.storage.clone(),
      scheduler: self.scheduler.clone(),
      widgets: self.widgets.clone(),
      confirm: self.confirm.clone(),
      records,
      spawner: Rc::new(
        self.spawner.clone()
      )
    }
  }

  /// Runs spawned tasks until none can
  /// make progress.
  pub fn settle(&self) {
    self.pool.borrow_mut().run_until_stalled();
  }

  pub fn advance(&self, by: Duration) {
    self.settle();
    self.scheduler.advance(by);
    self.settle();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table_dom() -> (MemoryDom, NodeId) {
    let dom = MemoryDom::new();
    let root = dom.root();
    let main = dom.append_with(
      root,
      "main",
      &[("class", "container py-3")]
    );
    let table = dom.append_with(
      main,
      "table",
      &[("id", "records")]
    );
    let tbody = dom.append(table, "tbody");
    for label in ["uno", "dos"] {
      let tr = dom.append(tbody, "tr");
      let td = dom.append(tr, "td");
      dom.set_text(&td, label);
    }
    (dom, table)
  }

  #[test]
  fn selectors_cover_page_markers() {
    let (dom, table) = table_dom();
    let root = dom.root();
    dom.append_with(root, "div", &[
      ("class", "alert alert-info")
    ]);
    dom.append_with(root, "div", &[
      ("class", "alert alert-permanent")
    ]);
    dom.append_with(root, "span", &[
      ("data-bs-toggle", "tooltip")
    ]);

    assert_eq!(
      dom.select_all("main.container").len(),
      1
    );
    assert_eq!(
      dom
        .select_all(
          ".alert:not(.alert-permanent)"
        )
        .len(),
      1
    );
    assert_eq!(
      dom
        .select_all(
          r#"[data-bs-toggle="tooltip"]"#
        )
        .len(),
      1
    );
    assert_eq!(
      dom
        .select_within(&table, "tbody tr")
        .len(),
      2
    );
    assert_eq!(
      dom.select_all("table#records td").len(),
      2
    );
    assert!(dom.select(":hover").is_none());
  }

  #[test]
  fn text_concatenates_descendants() {
    let (dom, table) = table_dom();
    assert_eq!(dom.text(&table), "unodos");
    let td = dom.select_all("td")[0];
    dom.set_html(&td, "<b>tres</b>");
    assert_eq!(dom.text(&table), "tresdos");
  }

  #[test]
  fn dispatch_bubbles_until_stopped() {
    let dom = MemoryDom::new();
    let root = dom.root();
    let form = dom.append(root, "form");
    let hits = Rc::new(Cell::new(0));

    let counter = hits.clone();
    let _outer = dom.listen(
      &root,
      EventKind::Submit,
      Box::new(move |_| {
        counter.set(counter.get() + 1)
      })
    );
    assert!(
      !dom.submit(form).propagation_stopped
    );
    assert_eq!(hits.get(), 1);

    let inner = dom.listen(
      &form,
      EventKind::Submit,
      Box::new(|event| {
        event.stop_propagation()
      })
    );
    assert!(
      dom.submit(form).propagation_stopped
    );
    assert_eq!(hits.get(), 1);

    inner.dispose();
    assert_eq!(dom.listener_count(), 1);
  }

  #[test]
  fn manual_scheduler_releases_due_timers()
  {
    let page = MemoryPage::new();
    let fired = Rc::new(Cell::new(false));
    let flag = fired.clone();
    let wait = page
      .scheduler
      .delay(Duration::from_millis(10));
    page.page().spawn(async move {
      wait.await;
      flag.set(true);
    });

    page.advance(Duration::from_millis(9));
    assert!(!fired.get());
    page.advance(Duration::from_millis(1));
    assert!(fired.get());
    assert_eq!(page.scheduler.pending(), 0);
  }
}
