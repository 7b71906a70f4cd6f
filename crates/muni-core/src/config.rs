use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  warn
};

const MAX_DELAY_MS: u64 = 60_000;

/// Page wiring configuration. Defaults
/// match the markup emitted by the
/// records templates.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(default)]
pub struct PageConfig {
  pub markers: Markers,
  pub theme:   ThemeConfig,
  pub timing:  Timing,
  pub routes:  Routes,
  pub preview: PreviewConfig,
  pub search:  SearchConfig,
  pub backend: Backend
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct Markers {
  pub tooltip:              String,
  pub popover:              String,
  pub transition_container: String,
  pub transition_class:     String,
  pub dismissible_alert:    String,
  pub department_filter_id: String,
  pub status_filter_id:     String,
  pub status_trigger:       String,
  pub status_badge_attr:    String,
  pub status_feedback_id:   String,
  pub validated_form:       String,
  pub validated_class:      String,
  pub search_input:         String
}

impl Default for Markers {
  fn default() -> Self {
    Self {
      tooltip: r#"[data-bs-toggle="tooltip"]"#
        .to_string(),
      popover: r#"[data-bs-toggle="popover"]"#
        .to_string(),
      transition_container:
        "main.container".to_string(),
      transition_class: "fade-in"
        .to_string(),
      dismissible_alert:
        ".alert:not(.alert-permanent)"
          .to_string(),
      department_filter_id:
        "department-filter".to_string(),
      status_filter_id: "status-filter"
        .to_string(),
      status_trigger:
        ".status-change-btn".to_string(),
      status_badge_attr:
        "data-status-badge".to_string(),
      status_feedback_id:
        "status-feedback".to_string(),
      validated_form: ".needs-validation"
        .to_string(),
      validated_class: "was-validated"
        .to_string(),
      search_input: ".search-records"
        .to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct ThemeConfig {
  pub storage_key: String,
  pub attribute:   String,
  pub toggle_id:   String,
  /// Label shown while dark, offering
  /// the light theme.
  pub dark_label:  String,
  pub light_label: String
}

impl Default for ThemeConfig {
  fn default() -> Self {
    Self {
      storage_key: "theme".to_string(),
      attribute:   "data-bs-theme"
        .to_string(),
      toggle_id:   "themeToggleBtn"
        .to_string(),
      dark_label:  "Modo Claro ☀️"
        .to_string(),
      light_label: "Modo Oscuro 🌙"
        .to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct Timing {
  pub alert_dismiss_ms:   u64,
  pub preview_latency_ms: u64
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      alert_dismiss_ms:   5_000,
      preview_latency_ms: 1_000
    }
  }
}

impl Timing {
  pub fn alert_dismiss(&self) -> Duration {
    Duration::from_millis(
      self.alert_dismiss_ms
    )
  }

  pub fn preview_latency(
    &self
  ) -> Duration {
    Duration::from_millis(
      self.preview_latency_ms
    )
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct Routes {
  pub records_path: String,
  pub api_base:     String
}

impl Default for Routes {
  fn default() -> Self {
    Self {
      records_path: "/records"
        .to_string(),
      api_base:     "/api".to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct PreviewConfig {
  pub container_id: String,
  pub modal_id:     String
}

impl Default for PreviewConfig {
  fn default() -> Self {
    Self {
      container_id: "recordPreviewBody"
        .to_string(),
      modal_id:     "recordPreviewModal"
        .to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(default)]
pub struct SearchConfig {
  /// Id of the table the search box
  /// filters when the input carries no
  /// `data-search-target`.
  pub table_id: Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Simulated,
  Http
}

impl PageConfig {
  #[tracing::instrument(skip_all)]
  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let parsed: PageConfig =
      toml::from_str(text).context(
        "failed to parse page \
         configuration"
      )?;
    parsed.normalized()
  }

  /// Clamps delays and checks paths.
  pub fn normalized(
    mut self
  ) -> anyhow::Result<Self> {
    let defaults = Timing::default();
    if self.timing.alert_dismiss_ms == 0
    {
      warn!(
        "alert_dismiss_ms of 0 would \
         hide alerts before render; \
         using default"
      );
      self.timing.alert_dismiss_ms =
        defaults.alert_dismiss_ms;
    }
    self.timing.alert_dismiss_ms = self
      .timing
      .alert_dismiss_ms
      .min(MAX_DELAY_MS);
    self.timing.preview_latency_ms = self
      .timing
      .preview_latency_ms
      .min(MAX_DELAY_MS);

    for (name, path) in [
      (
        "routes.records_path",
        &self.routes.records_path
      ),
      (
        "routes.api_base",
        &self.routes.api_base
      )
    ] {
      if !path.starts_with('/')
        && !path.starts_with("http://")
        && !path.starts_with("https://")
      {
        return Err(anyhow!(
          "{name} must be an absolute \
           path or URL, got `{path}`"
        ));
      }
    }

    self.routes.api_base = self
      .routes
      .api_base
      .trim_end_matches('/')
      .to_string();
    if let Some(table) =
      self.search.table_id.as_deref()
      && table.trim().is_empty()
    {
      self.search.table_id = None;
    }

    debug!(config = ?self, "page configuration ready");
    Ok(self)
  }
}
