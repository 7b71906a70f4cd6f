use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use gloo::events::EventListener;
use muni_core::Dom;
use muni_core::platform::{
  Confirmer,
  WidgetKind,
  WidgetOptions,
  WidgetToolkit
};
use tracing::{
  debug,
  warn
};
use web_sys::Element;

use crate::web_dom::WebDom;

const CONFIRM_MODAL_ID: &str = "confirmModal";

/// The single prompt the modal may
/// answer. Opening a new one declines the
/// prompt it replaces.
#[derive(Default)]
struct PromptSlot {
  pending: RefCell<Option<oneshot::Sender<bool>>>
}

impl PromptSlot {
  fn begin(&self) -> oneshot::Receiver<bool> {
    let (tx, rx) = oneshot::channel();
    if let Some(previous) =
      self.pending.replace(Some(tx))
    {
      debug!("declining superseded prompt");
      let _ = previous.send(false);
    }
    rx
  }

  fn answer(&self, value: bool) {
    if let Some(tx) =
      self.pending.borrow_mut().take()
    {
      let _ = tx.send(value);
    }
  }
}

/// Confirmation through the page's
/// `#confirmModal` when present, the
/// native dialog otherwise.
pub struct ModalConfirmer {
  dom:     Rc<WebDom>,
  widgets: Rc<dyn WidgetToolkit<Element>>,
  prompt:  Rc<PromptSlot>
}

impl ModalConfirmer {
  pub fn new(
    dom: Rc<WebDom>,
    widgets: Rc<dyn WidgetToolkit<Element>>
  ) -> Self {
    Self {
      dom,
      widgets,
      prompt: Rc::default()
    }
  }

  async fn ask_modal(
    &self,
    modal: &Element,
    message: &str
  ) -> Option<bool> {
    let accept = self
      .dom
      .select_within(modal, "[data-confirm-accept]")
      .into_iter()
      .next()?;
    for body in self
      .dom
      .select_within(modal, "[data-confirm-message]")
    {
      self.dom.set_text(&body, message);
    }
    let handle = match self.widgets.mount(
      modal,
      WidgetKind::Modal,
      &WidgetOptions::new()
    ) {
      | Ok(handle) => handle,
      | Err(error) => {
        warn!(%error, "confirm modal unavailable");
        return None;
      }
    };

    let rx = self.prompt.begin();

    let _accepted = {
      let prompt = self.prompt.clone();
      let handle = handle.clone();
      EventListener::once(&accept, "click", move |_| {
        prompt.answer(true);
        handle.hide();
      })
    };
    let _dismissed = {
      let prompt = self.prompt.clone();
      EventListener::once(
        modal,
        "hidden.bs.modal",
        move |_| prompt.answer(false)
      )
    };

    handle.show();
    let confirmed = rx.await.unwrap_or(false);
    debug!(confirmed, "confirm modal answered");
    Some(confirmed)
  }
}

#[async_trait(?Send)]
impl Confirmer for ModalConfirmer {
  async fn confirm(&self, message: &str) -> bool {
    if let Some(modal) =
      self.dom.by_id(CONFIRM_MODAL_ID)
      && let Some(answer) =
        self.ask_modal(&modal, message).await
    {
      return answer;
    }
    gloo::dialogs::confirm(message)
  }
}
