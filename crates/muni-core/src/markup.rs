//! HTML fragments written into preview
//! and feedback containers. Every
//! interpolated value goes through
//! [`escape`].

use muni_shared::{
  RecordDetails,
  RecordStatus
};

use crate::error::ApiError;

pub fn escape(raw: &str) -> String {
  let mut out =
    String::with_capacity(raw.len());
  for ch in raw.chars() {
    match ch {
      | '&' => out.push_str("&amp;"),
      | '<' => out.push_str("&lt;"),
      | '>' => out.push_str("&gt;"),
      | '"' => out.push_str("&quot;"),
      | '\'' => out.push_str("&#39;"),
      | other => out.push(other)
    }
  }
  out
}

pub fn loading() -> &'static str {
  r#"<div class="text-center"><div class="spinner-border text-primary" role="status"><span class="visually-hidden">Cargando...</span></div></div>"#
}

pub fn status_badge(
  status: RecordStatus
) -> String {
  format!(
    r#"<span class="badge {}">{}</span>"#,
    status.badge_class(),
    status.label()
  )
}

pub fn record_details(
  details: &RecordDetails
) -> String {
  let mut html = format!(
    "<h5>{}</h5>",
    escape(&details.title)
  );
  if let Some(number) =
    details.digital_number.as_deref()
  {
    html.push_str(&format!(
      r#"<p class="text-muted">N.º {}</p>"#,
      escape(number)
    ));
  }
  html.push_str(&format!(
    "<p>{}</p>\
     <p><strong>Departamento:</strong> {}</p>\
     <p><strong>Estado:</strong> {}</p>",
    escape(&details.description),
    escape(&details.department),
    status_badge(details.status)
  ));
  if let Some(updated) =
    details.updated_at_display()
  {
    html.push_str(&format!(
      "<p><strong>Última actualización:</strong> {updated}</p>"
    ));
  }
  html
}

/// User-facing message for an API
/// failure. `Cancelled` never reaches the
/// page.
pub fn error_message(
  error: &ApiError
) -> String {
  match error {
    | ApiError::Network(_) => {
      "No se pudo contactar al \
       servidor. Verifique su conexión \
       e intente nuevamente."
        .to_string()
    }
    | ApiError::NotFound(id) => {
      format!(
        "El expediente #{} no existe o \
         fue eliminado.",
        escape(id.as_str())
      )
    }
    | ApiError::Rejected(reason) => {
      format!(
        "El servidor rechazó la \
         solicitud: {}",
        escape(reason)
      )
    }
    | ApiError::Cancelled => {
      "Solicitud cancelada.".to_string()
    }
  }
}

pub fn error_alert(
  error: &ApiError
) -> String {
  format!(
    r#"<div class="alert alert-danger alert-permanent" role="alert" data-error-kind="{}">{}</div>"#,
    error.kind(),
    error_message(error)
  )
}

#[cfg(test)]
mod tests {
  use muni_shared::RecordId;

  use super::*;

  #[test]
  fn escape_neutralizes_markup() {
    assert_eq!(
      escape(r#"<b a="1">&'"#),
      "&lt;b a=&quot;1&quot;&gt;&amp;&#39;"
    );
  }

  #[test]
  fn details_render_badge_and_escaped_fields()
   {
    let html =
      record_details(&RecordDetails {
        id:             RecordId::from("9"),
        digital_number: Some(
          "OP-0009".to_string()
        ),
        title:          "<script>".to_string(),
        description:    "d".to_string(),
        department:     "Obras Públicas"
          .to_string(),
        status:         RecordStatus::Urgente,
        updated_at:     None
      });

    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("OP-0009"));
    assert!(html.contains(
      r#"<span class="badge bg-danger">Urgente</span>"#
    ));
    assert!(!html.contains("Última"));
  }

  #[test]
  fn error_alerts_are_distinct_per_kind() {
    let network = error_alert(
      &ApiError::Network("x".into())
    );
    let missing = error_alert(
      &ApiError::NotFound(RecordId::from(
        "5"
      ))
    );
    let rejected = error_alert(
      &ApiError::Rejected(
        "estado inválido".into()
      )
    );

    assert!(network.contains(
      r#"data-error-kind="network""#
    ));
    assert!(missing.contains("#5"));
    assert!(rejected.contains(
      "estado inválido"
    ));
    assert_ne!(network, rejected);
  }
}
