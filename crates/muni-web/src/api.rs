use async_trait::async_trait;
use gloo::net::http::{
  Request,
  RequestBuilder,
  Response
};
use muni_core::{
  ApiError,
  CancelToken
};
use muni_core::platform::RecordsApi;
use muni_shared::{
  ApiErrorBody,
  RecordDetails,
  RecordId,
  RecordStatus,
  StatusChanged,
  StatusUpdate
};
use serde::de::DeserializeOwned;
use tracing::{
  debug,
  warn
};
use web_sys::AbortController;

/// Records collaborator backed by the
/// server's JSON endpoints under
/// `api_base`.
pub struct HttpRecords {
  api_base: String
}

impl HttpRecords {
  pub fn new(api_base: &str) -> Self {
    Self {
      api_base: api_base
        .trim_end_matches('/')
        .to_string()
    }
  }

  fn record_url(
    &self,
    id: &RecordId
  ) -> String {
    let segment: String =
      js_sys::encode_uri_component(
        id.as_str()
      )
      .into();
    format!(
      "{}/records/{segment}",
      self.api_base
    )
  }
}

/// Sends `request`, aborting it in the
/// browser once `cancel` fires.
async fn send_cancellable(
  request: RequestBuilder,
  cancel: &CancelToken
) -> Result<Response, ApiError> {
  let controller = AbortController::new()
    .map_err(|e| {
      ApiError::Network(format!(
        "abort controller: {e:?}"
      ))
    })?;
  let signal = controller.signal();
  cancel.on_cancel(move || {
    controller.abort();
  });

  request
    .abort_signal(Some(&signal))
    .send()
    .await
    .map_err(|e| {
      if cancel.is_cancelled() {
        ApiError::Cancelled
      } else {
        ApiError::Network(e.to_string())
      }
    })
}

async fn decode<T: DeserializeOwned>(
  response: Response,
  id: &RecordId
) -> Result<T, ApiError> {
  match response.status() {
    | 200..=299 => {
      response.json::<T>().await.map_err(
        |e| {
          ApiError::Network(format!(
            "decode error: {e}"
          ))
        }
      )
    }
    | 404 => Err(ApiError::NotFound(
      id.clone()
    )),
    | status @ (400 | 409 | 422) => {
      let message = match response
        .json::<ApiErrorBody>()
        .await
      {
        | Ok(body) => body.error,
        | Err(_) => {
          format!("HTTP {status}")
        }
      };
      Err(ApiError::Rejected(message))
    }
    | status => {
      warn!(
        status,
        record = %id,
        "records server failure"
      );
      Err(ApiError::Network(format!(
        "HTTP {status}"
      )))
    }
  }
}

#[async_trait(?Send)]
impl RecordsApi for HttpRecords {
  async fn fetch_record(
    &self,
    id: &RecordId,
    cancel: &CancelToken
  ) -> Result<RecordDetails, ApiError> {
    let url = self.record_url(id);
    debug!(%url, "fetching record");
    let response = send_cancellable(
      Request::get(&url),
      cancel
    )
    .await?;
    decode(response, id).await
  }

  async fn update_status(
    &self,
    id: &RecordId,
    status: RecordStatus
  ) -> Result<StatusChanged, ApiError> {
    let url =
      format!("{}/status", self.record_url(id));
    debug!(%url, %status, "updating status");
    let request = Request::post(&url)
      .json(&StatusUpdate { status })
      .map_err(|e| {
        ApiError::Network(format!(
          "failed to encode body: {e}"
        ))
      })?;
    let response = request
      .send()
      .await
      .map_err(|e| {
        ApiError::Network(e.to_string())
      })?;
    decode(response, id).await
  }
}
