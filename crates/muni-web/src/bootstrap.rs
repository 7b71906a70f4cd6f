use std::rc::Rc;

use js_sys::{
  Function,
  Reflect
};
use muni_core::WidgetError;
use muni_core::platform::{
  WidgetHandle,
  WidgetKind,
  WidgetOptions,
  WidgetToolkit
};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::{
  JsCast,
  JsValue
};
use web_sys::Element;

/// Bootstrap 5 components reached through
/// the global `bootstrap` namespace.
#[derive(Debug, Default)]
pub struct BootstrapToolkit;

fn lookup(
  target: &JsValue,
  key: &str
) -> Option<JsValue> {
  Reflect::get(target, &JsValue::from_str(key))
    .ok()
    .filter(|value| {
      !value.is_undefined() && !value.is_null()
    })
}

fn mount_error(
  kind: WidgetKind,
  reason: impl Into<String>
) -> WidgetError {
  WidgetError::Mount {
    kind:   kind.as_str(),
    reason: reason.into()
  }
}

impl WidgetToolkit<Element> for BootstrapToolkit {
  fn mount(
    &self,
    node: &Element,
    kind: WidgetKind,
    options: &WidgetOptions
  ) -> Result<Rc<dyn WidgetHandle>, WidgetError>
  {
    let namespace =
      lookup(&js_sys::global(), "bootstrap")
        .ok_or(WidgetError::ToolkitMissing)?;
    let component =
      lookup(&namespace, kind.as_str())
        .ok_or_else(|| {
          mount_error(kind, "component missing")
        })?;
    let factory: Function =
      lookup(&component, "getOrCreateInstance")
        .and_then(|f| f.dyn_into().ok())
        .ok_or_else(|| {
          mount_error(
            kind,
            "getOrCreateInstance missing"
          )
        })?;

    let serializer =
      serde_wasm_bindgen::Serializer::json_compatible();
    let config = options
      .serialize(&serializer)
      .map_err(|e| {
        mount_error(
          kind,
          format!("bad options: {e}")
        )
      })?;
    let instance = factory
      .call2(&component, node, &config)
      .map_err(|e| {
        mount_error(kind, format!("{e:?}"))
      })?;

    Ok(Rc::new(BootstrapWidget {
      kind,
      instance
    }))
  }
}

struct BootstrapWidget {
  kind:     WidgetKind,
  instance: JsValue
}

impl BootstrapWidget {
  fn call(&self, method: &str) {
    let result = lookup(&self.instance, method)
      .and_then(|f| f.dyn_into::<Function>().ok())
      .map(|f| f.call0(&self.instance));
    match result {
      | Some(Ok(_)) => {}
      | Some(Err(error)) => {
        warn!(
          kind = self.kind.as_str(),
          method,
          ?error,
          "widget call failed"
        );
      }
      | None => {
        warn!(
          kind = self.kind.as_str(),
          method,
          "widget has no such method"
        );
      }
    }
  }
}

impl WidgetHandle for BootstrapWidget {
  fn show(&self) {
    self.call("show");
  }

  fn hide(&self) {
    self.call("hide");
  }

  fn close(&self) {
    self.call("close");
  }

  fn dispose(&self) {
    self.call("dispose");
  }
}
