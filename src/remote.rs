use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{Service, UpstreamError, remote_message};

/// Turns a remote response into `T`, or into an `UpstreamError` carrying the
/// remote error message when the status is not 2xx.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    service: Service,
    response: Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%service, %status, body = %body, "upstream error body");
        return Err(UpstreamError::Status {
            service,
            status,
            message: remote_message(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| UpstreamError::Decode { service, source })
}

pub(crate) fn transport(service: Service) -> impl FnOnce(reqwest::Error) -> UpstreamError {
    move |source| UpstreamError::Transport { service, source }
}
