use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use std::time::Instant;

/// Middleware that logs HTTP requests with method, path, status, duration, client IP
/// and the size of any `filter` parameter
pub struct RequestLogging;

impl<E: Endpoint> Middleware<E> for RequestLogging {
    type Output = RequestLoggingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestLoggingEndpoint { inner: ep }
    }
}

pub struct RequestLoggingEndpoint<E> {
    inner: E,
}

/// Length of the raw `filter` query parameter, 0 when absent.
fn filter_param_len(query: Option<&str>) -> usize {
    query
        .into_iter()
        .flat_map(|query| query.split('&'))
        .find_map(|pair| pair.strip_prefix("filter="))
        .map_or(0, str::len)
}

impl<E: Endpoint> Endpoint for RequestLoggingEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let filter_len = filter_param_len(req.uri().query());
        let client_ip = req
            .remote_addr()
            .as_socket_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let response = self.inner.call(req).await;
        let duration_ms = start.elapsed().as_millis();

        match response {
            Ok(resp) => {
                let resp = resp.into_response();
                let status = resp.status();

                if status.is_success() {
                    tracing::info!(
                        method = %method,
                        path = %path,
                        status = %status.as_u16(),
                        duration_ms = %duration_ms,
                        client_ip = %client_ip,
                        filter_len,
                        "request completed"
                    );
                } else if status.is_client_error() || status.is_server_error() {
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        status = %status.as_u16(),
                        duration_ms = %duration_ms,
                        client_ip = %client_ip,
                        filter_len,
                        "request failed"
                    );
                } else {
                    tracing::debug!(
                        method = %method,
                        path = %path,
                        status = %status.as_u16(),
                        duration_ms = %duration_ms,
                        client_ip = %client_ip,
                        "request completed"
                    );
                }

                Ok(resp)
            }
            Err(err) => {
                let status = err.status();
                tracing::error!(
                    method = %method,
                    path = %path,
                    status = %status.as_u16(),
                    duration_ms = %duration_ms,
                    client_ip = %client_ip,
                    error = %err,
                    "request error"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_param_len() {
        assert_eq!(filter_param_len(None), 0);
        assert_eq!(filter_param_len(Some("limit=5")), 0);
        assert_eq!(filter_param_len(Some("filter=e30%3D&limit=5")), 6);
        assert_eq!(filter_param_len(Some("limit=5&filter=abc")), 3);
    }
}
