use std::cell::Cell;
use std::rc::Rc;

use tracing::{
  debug,
  info,
  warn
};

use crate::config::ThemeConfig;
use crate::dom::{
  Dom,
  EventKind,
  Subscription
};
use crate::platform::PreferenceStore;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Theme {
  Light,
  Dark
}

impl Theme {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim() {
      | "light" => Some(Self::Light),
      | "dark" => Some(Self::Dark),
      | _ => None
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Light => "light",
      | Self::Dark => "dark"
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      | Self::Light => Self::Dark,
      | Self::Dark => Self::Light
    }
  }
}

/// Dark/light switch. The root attribute
/// and the stored preference are written
/// together on every toggle.
pub struct ThemeController<D: Dom> {
  dom:     Rc<D>,
  storage: Rc<dyn PreferenceStore>,
  config:  ThemeConfig,
  current: Cell<Theme>,
  toggle:  Option<D::Node>
}

impl<D: Dom + 'static> ThemeController<D> {
  /// Resolves the starting theme (stored
  /// preference, then root attribute,
  /// then light), applies it and syncs
  /// the toggle label.
  #[tracing::instrument(skip_all)]
  pub fn new(
    dom: Rc<D>,
    storage: Rc<dyn PreferenceStore>,
    config: ThemeConfig
  ) -> Rc<Self> {
    let root = dom.root();
    let from_attr = dom
      .attribute(&root, &config.attribute)
      .as_deref()
      .and_then(Theme::parse);
    let stored = match storage
      .load(&config.storage_key)
    {
      | Ok(value) => {
        value.as_deref().and_then(Theme::parse)
      }
      | Err(error) => {
        warn!(
          %error,
          "theme preference unreadable"
        );
        None
      }
    };
    let initial = stored
      .or(from_attr)
      .unwrap_or(Theme::Light);
    debug!(
      ?stored,
      ?from_attr,
      ?initial,
      "theme resolved"
    );

    dom.set_attribute(
      &root,
      &config.attribute,
      initial.as_str()
    );
    let toggle = dom.by_id(&config.toggle_id);
    let controller = Rc::new(Self {
      dom,
      storage,
      config,
      current: Cell::new(initial),
      toggle
    });
    controller.sync_label();
    controller
  }

  pub fn current(&self) -> Theme {
    self.current.get()
  }

  /// Flips whatever theme the root
  /// attribute holds right now. Storage
  /// failures are logged; the page still
  /// switches.
  pub fn toggle(&self) -> Theme {
    let shown = self
      .dom
      .attribute(
        &self.dom.root(),
        &self.config.attribute
      )
      .as_deref()
      .and_then(Theme::parse)
      .unwrap_or(self.current.get());
    let next = shown.toggled();
    self.apply(next);
    next
  }

  pub fn apply(&self, theme: Theme) {
    self.current.set(theme);
    self.dom.set_attribute(
      &self.dom.root(),
      &self.config.attribute,
      theme.as_str()
    );
    if let Err(error) = self.storage.save(
      &self.config.storage_key,
      theme.as_str()
    ) {
      warn!(
        %error,
        theme = theme.as_str(),
        "theme preference not persisted"
      );
    }
    self.sync_label();
    info!(theme = theme.as_str(), "theme applied");
  }

  pub fn label(&self) -> &str {
    match self.current.get() {
      | Theme::Dark => {
        self.config.dark_label.as_str()
      }
      | Theme::Light => {
        self.config.light_label.as_str()
      }
    }
  }

  fn sync_label(&self) {
    if let Some(toggle) = &self.toggle {
      self.dom.set_text(toggle, self.label());
    }
  }

  /// Click handling for the toggle
  /// control; `None` without one.
  pub fn wire(
    self: &Rc<Self>,
  ) -> Option<Subscription> {
    let Some(toggle) = self.toggle.clone()
    else {
      debug!(
        id = %self.config.toggle_id,
        "no theme toggle"
      );
      return None;
    };
    let this = self.clone();
    Some(self.dom.listen(
      &toggle,
      EventKind::Click,
      Box::new(move |_| {
        this.toggle();
      })
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::{
    MemoryPage,
    NodeId
  };

  fn themed_page(
    attr: Option<&str>
  ) -> (MemoryPage, NodeId) {
    let harness = MemoryPage::new();
    let dom = &harness.dom;
    let root = dom.root();
    if let Some(attr) = attr {
      dom.set_attribute(
        &root,
        "data-bs-theme",
        attr
      );
    }
    let button = dom.append_with(
      root,
      "button",
      &[("id", "themeToggleBtn")]
    );
    (harness, button)
  }

  fn controller(
    harness: &MemoryPage
  ) -> Rc<ThemeController<crate::memory::MemoryDom>>
  {
    ThemeController::new(
      harness.dom.clone(),
      harness.storage.clone(),
      ThemeConfig::default()
    )
  }

  fn root_theme(
    harness: &MemoryPage
  ) -> Option<String> {
    harness.dom.attribute(
      &harness.dom.root(),
      "data-bs-theme"
    )
  }

  #[test]
  fn label_synced_on_load() {
    let (harness, button) =
      themed_page(Some("dark"));
    let theme = controller(&harness);
    assert_eq!(theme.current(), Theme::Dark);
    assert_eq!(
      harness.dom.text(&button),
      "Modo Claro ☀️"
    );
  }

  #[test]
  fn two_clicks_return_to_light_keeping_storage_in_step()
   {
    let (harness, button) =
      themed_page(Some("light"));
    let theme = controller(&harness);
    let _sub = theme.wire().expect("wired");

    harness.dom.click(button);
    assert_eq!(
      root_theme(&harness).as_deref(),
      Some("dark")
    );
    assert_eq!(
      harness.storage.get("theme").as_deref(),
      Some("dark")
    );
    assert_eq!(
      harness.dom.text(&button),
      "Modo Claro ☀️"
    );

    harness.dom.click(button);
    assert_eq!(
      root_theme(&harness).as_deref(),
      Some("light")
    );
    assert_eq!(
      harness.storage.get("theme"),
      root_theme(&harness)
    );
    assert_eq!(
      harness.dom.text(&button),
      "Modo Oscuro 🌙"
    );
  }

  #[test]
  fn stored_preference_wins_over_attribute()
  {
    let (harness, _) =
      themed_page(Some("light"));
    harness.storage.insert("theme", "dark");
    let theme = controller(&harness);
    assert_eq!(theme.current(), Theme::Dark);
    assert_eq!(
      root_theme(&harness).as_deref(),
      Some("dark")
    );
  }

  #[test]
  fn garbage_in_storage_falls_back_to_attribute()
   {
    let (harness, _) =
      themed_page(Some("dark"));
    harness.storage.insert("theme", "sepia");
    assert_eq!(
      controller(&harness).current(),
      Theme::Dark
    );

    let (bare, _) = themed_page(None);
    bare.storage.fail_reads(true);
    assert_eq!(
      controller(&bare).current(),
      Theme::Light
    );
  }

  #[test]
  fn failing_storage_still_flips_attribute()
  {
    let (harness, button) =
      themed_page(Some("light"));
    harness.storage.fail_writes(true);
    let theme = controller(&harness);
    let _sub = theme.wire();

    harness.dom.click(button);
    assert_eq!(theme.current(), Theme::Dark);
    assert_eq!(
      root_theme(&harness).as_deref(),
      Some("dark")
    );
    assert_eq!(harness.storage.get("theme"), None);
  }

  #[test]
  fn toggle_follows_attribute_changed_elsewhere()
   {
    let (harness, button) =
      themed_page(Some("light"));
    let theme = controller(&harness);
    let _sub = theme.wire();

    harness.dom.set_attribute(
      &harness.dom.root(),
      "data-bs-theme",
      "dark"
    );
    harness.dom.click(button);

    assert_eq!(theme.current(), Theme::Light);
    assert_eq!(
      root_theme(&harness).as_deref(),
      Some("light")
    );
    assert_eq!(
      harness.storage.get("theme").as_deref(),
      Some("light")
    );
  }

  #[test]
  fn missing_toggle_skips_wiring() {
    let harness = MemoryPage::new();
    let theme = controller(&harness);
    assert!(theme.wire().is_none());
    assert_eq!(theme.toggle(), Theme::Dark);
  }
}
