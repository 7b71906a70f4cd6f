mod api;
mod bootstrap;
mod dialog;
mod platform;
mod web_dom;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use gloo::events::EventListener;
use muni_core::config::Backend;
use muni_core::platform::RecordsApi;
use muni_core::simulated::SimulatedRecords;
use muni_core::{
  Page,
  PageConfig
};
use tracing::{
  info,
  warn
};
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::Document;

use crate::api::HttpRecords;
use crate::bootstrap::BootstrapToolkit;
use crate::dialog::ModalConfirmer;
use crate::platform::{
  BrowserNavigator,
  BrowserSpawner,
  LocalPreferences,
  TimerScheduler
};
use crate::web_dom::WebDom;

const CONFIG_ELEMENT_ID: &str = "muni-config";

type App = muni_core::Bootstrapped<WebDom>;

thread_local! {
  static APP: RefCell<Option<App>> =
    const { RefCell::new(None) };
}

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  info!("starting records page behaviors");

  let Some(document) = web_sys::window()
    .and_then(|window| window.document())
  else {
    warn!("no document; nothing to wire");
    return;
  };

  if still_loading(&document.ready_state()) {
    EventListener::once(
      &document,
      "DOMContentLoaded",
      |_| start_logged()
    )
    .forget();
  } else {
    start_logged();
  }
}

/// `document.readyState` before the
/// markup is fully parsed.
fn still_loading(ready_state: &str) -> bool {
  ready_state == "loading"
}

fn start_logged() {
  if let Err(error) = start() {
    tracing::error!(
      "page behaviors not started: {error:#}"
    );
  }
}

fn start() -> anyhow::Result<()> {
  let window =
    web_sys::window().context("no window")?;
  let document = window
    .document()
    .context("window has no document")?;
  let config = load_config(&document);
  let dom = Rc::new(WebDom::new(document)?);

  let scheduler = Rc::new(TimerScheduler);
  let widgets = Rc::new(BootstrapToolkit);
  let records: Rc<dyn RecordsApi> =
    match config.backend {
      | Backend::Simulated => {
        Rc::new(SimulatedRecords::new(
          scheduler.clone(),
          config.timing.preview_latency()
        ))
      }
      | Backend::Http => Rc::new(
        HttpRecords::new(&config.routes.api_base)
      )
    };

  let page = Page {
    dom: dom.clone(),
    navigator: Rc::new(BrowserNavigator::new(
      window
    )),
    storage: Rc::new(LocalPreferences),
    scheduler,
    widgets: widgets.clone(),
    confirm: Rc::new(ModalConfirmer::new(
      dom, widgets
    )),
    records,
    spawner: Rc::new(BrowserSpawner)
  };

  let app = muni_core::init(page, &config);
  for issue in &app.issues {
    warn!(%issue, "page setup issue");
  }
  APP.with(|slot| {
    *slot.borrow_mut() = Some(app);
  });
  Ok(())
}

/// Reads the optional inline TOML block.
/// Anything unusable falls back to the
/// defaults.
fn load_config(document: &Document) -> PageConfig {
  let Some(text) = document
    .get_element_by_id(CONFIG_ELEMENT_ID)
    .and_then(|element| element.text_content())
  else {
    return PageConfig::default();
  };

  match PageConfig::from_toml_str(&text) {
    | Ok(config) => config,
    | Err(error) => {
      warn!(
        "ignoring #{CONFIG_ELEMENT_ID}: {error:#}"
      );
      PageConfig::default()
    }
  }
}

fn with_app(action: impl FnOnce(&App)) {
  APP.with(|slot| match slot.borrow().as_ref() {
    | Some(app) => action(app),
    | None => {
      warn!("page behaviors not started yet");
    }
  });
}

/// Opens the preview modal for a record.
#[wasm_bindgen(js_name = previewRecord)]
pub fn preview_record(id: &str) {
  with_app(|app| app.preview_record(id));
}

#[wasm_bindgen(js_name = printRecord)]
pub fn print_record(id: &str) {
  with_app(|app| app.print_record(id));
}
