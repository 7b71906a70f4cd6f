use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::{
  LocalFutureObj,
  LocalSpawn,
  SpawnError
};
use gloo::timers::future::TimeoutFuture;
use muni_core::StorageError;
use muni_core::platform::{
  Navigator,
  PreferenceStore,
  Scheduler
};
use tracing::{
  info,
  warn
};
use web_sys::{
  Storage,
  Window
};

pub struct BrowserNavigator {
  window: Window
}

impl BrowserNavigator {
  pub fn new(window: Window) -> Self {
    Self { window }
  }
}

impl Navigator for BrowserNavigator {
  fn navigate(&self, url: &str) {
    info!(url, "navigating");
    if let Err(error) =
      self.window.location().set_href(url)
    {
      warn!(url, ?error, "navigation failed");
    }
  }

  fn print(&self) {
    if let Err(error) = self.window.print() {
      warn!(?error, "print dialog failed");
    }
  }
}

/// Preferences in `window.localStorage`.
#[derive(Debug, Default)]
pub struct LocalPreferences;

fn local_storage()
-> Result<Storage, StorageError> {
  web_sys::window()
    .and_then(|window| {
      window
        .local_storage()
        .ok()
        .flatten()
    })
    .ok_or(StorageError::Unavailable)
}

impl PreferenceStore for LocalPreferences {
  fn load(
    &self,
    key: &str
  ) -> Result<Option<String>, StorageError> {
    local_storage()?.get_item(key).map_err(
      |e| StorageError::Read(format!("{e:?}"))
    )
  }

  fn save(
    &self,
    key: &str,
    value: &str
  ) -> Result<(), StorageError> {
    local_storage()?
      .set_item(key, value)
      .map_err(|e| {
        StorageError::Write(format!("{e:?}"))
      })
  }
}

#[derive(Debug, Default)]
pub struct TimerScheduler;

impl Scheduler for TimerScheduler {
  fn delay(
    &self,
    after: Duration
  ) -> LocalBoxFuture<'static, ()> {
    let millis =
      u32::try_from(after.as_millis())
        .unwrap_or(u32::MAX);
    TimeoutFuture::new(millis).boxed_local()
  }
}

/// Runs page tasks on the browser's
/// microtask queue.
#[derive(Debug, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
  fn spawn_local_obj(
    &self,
    future: LocalFutureObj<'static, ()>
  ) -> Result<(), SpawnError> {
    wasm_bindgen_futures::spawn_local(future);
    Ok(())
  }
}
