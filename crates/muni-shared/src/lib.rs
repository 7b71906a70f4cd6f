use std::fmt;

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};

/// Display format used for record
/// timestamps across the records UI.
pub const DATETIME_DISPLAY_FORMAT: &str =
  "%d/%m/%Y %H:%M";

/// Opaque record identifier as found in
/// `data-record-id` attributes.
#[derive(
  Debug,
  Clone,
  Serialize,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
#[serde(transparent)]
pub struct RecordId(String);

/// Accepts both string ids and the
/// integer primary keys the server emits.
impl<'de> Deserialize<'de> for RecordId {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Text(String),
      Number(u64)
    }

    Ok(match Raw::deserialize(deserializer)? {
      | Raw::Text(text) => Self::new(text),
      | Raw::Number(number) => {
        Self::new(number.to_string())
      }
    })
  }
}

impl RecordId {
  pub fn new(
    raw: impl Into<String>
  ) -> Self {
    Self(raw.into().trim().to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for RecordId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RecordId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for RecordId {
  fn from(value: String) -> Self {
    Self::new(value)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
pub enum RecordStatus {
  #[serde(rename = "activo", alias = "active")]
  Activo,
  #[serde(
    rename = "pendiente",
    alias = "pending"
  )]
  Pendiente,
  #[serde(
    rename = "en progreso",
    alias = "in_progress",
    alias = "in progress"
  )]
  EnProgreso,
  #[serde(rename = "urgente", alias = "urgent")]
  Urgente
}

impl RecordStatus {
  pub const ALL: [RecordStatus; 4] = [
    RecordStatus::Activo,
    RecordStatus::Pendiente,
    RecordStatus::EnProgreso,
    RecordStatus::Urgente
  ];

  /// Accepts the canonical values plus
  /// the legacy english spellings still
  /// present in older markup.
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    match raw
      .trim()
      .to_lowercase()
      .as_str()
    {
      | "activo" | "active" => {
        Some(Self::Activo)
      }
      | "pendiente" | "pending" => {
        Some(Self::Pendiente)
      }
      | "en progreso"
      | "in_progress"
      | "in progress" => {
        Some(Self::EnProgreso)
      }
      | "urgente" | "urgent" => {
        Some(Self::Urgente)
      }
      | _ => None
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Activo => "activo",
      | Self::Pendiente => "pendiente",
      | Self::EnProgreso => {
        "en progreso"
      }
      | Self::Urgente => "urgente"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Activo => "Activo",
      | Self::Pendiente => "Pendiente",
      | Self::EnProgreso => {
        "En Progreso"
      }
      | Self::Urgente => "Urgente"
    }
  }

  pub fn badge_class(
    self
  ) -> &'static str {
    match self {
      | Self::Activo => "bg-success",
      | Self::Pendiente => "bg-warning",
      | Self::EnProgreso => "bg-info",
      | Self::Urgente => "bg-danger"
    }
  }
}

impl fmt::Display for RecordStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct RecordDetails {
  pub id:             RecordId,
  #[serde(default)]
  pub digital_number: Option<String>,
  pub title:          String,
  #[serde(default)]
  pub description:    String,
  pub department:     String,
  pub status:         RecordStatus,
  #[serde(default)]
  pub updated_at:
    Option<DateTime<Utc>>
}

impl RecordDetails {
  pub fn updated_at_display(
    &self
  ) -> Option<String> {
    self.updated_at.map(|at| {
      at.format(DATETIME_DISPLAY_FORMAT)
        .to_string()
    })
  }
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct StatusUpdate {
  pub status: RecordStatus
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct StatusChanged {
  pub id:     RecordId,
  pub status: RecordStatus
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct ApiErrorBody {
  pub error: String
}
