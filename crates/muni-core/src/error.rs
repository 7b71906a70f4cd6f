use muni_shared::RecordId;
use thiserror::Error;

/// Failures of the record-fetch and
/// record-update collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  #[error("network failure: {0}")]
  Network(String),
  #[error("record {0} not found")]
  NotFound(RecordId),
  #[error("request rejected: {0}")]
  Rejected(String),
  /// Superseded by a newer request.
  /// Never shown to the user.
  #[error("request cancelled")]
  Cancelled
}

impl ApiError {
  pub fn kind(&self) -> &'static str {
    match self {
      | Self::Network(_) => "network",
      | Self::NotFound(_) => "not-found",
      | Self::Rejected(_) => "rejected",
      | Self::Cancelled => "cancelled"
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
  #[error("storage unavailable")]
  Unavailable,
  #[error("storage write failed: {0}")]
  Write(String),
  #[error("storage read failed: {0}")]
  Read(String)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
  #[error("widget toolkit not loaded")]
  ToolkitMissing,
  #[error("failed to mount {kind}: {reason}")]
  Mount {
    kind:   &'static str,
    reason: String
  }
}

/// Problems found while wiring handlers
/// to the page. Reported from `init`,
/// the affected handler is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
  #[error(
    "search input present but table \
     `{0}` not found"
  )]
  MissingSearchTable(String),
  #[error(
    "search input present but {0} \
     tables on page; set \
     data-search-target"
  )]
  AmbiguousSearchTable(usize)
}
