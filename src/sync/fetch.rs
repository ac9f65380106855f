//! Browser `fetch` transport.

use async_trait::async_trait;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::{SyncError, Transport};

/// Issues requests through `window.fetch`. Only usable inside a browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn get(&self, url: &Url) -> Result<String, SyncError> {
        send("GET", url, None).await
    }

    async fn post_json(&self, url: &Url, body: &str) -> Result<String, SyncError> {
        send("POST", url, Some(body)).await
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

fn transport_error(endpoint: &str, err: JsValue) -> SyncError {
    SyncError::Transport {
        endpoint: endpoint.to_string(),
        message: describe(&err),
    }
}

async fn send(method: &str, url: &Url, body: Option<&str>) -> Result<String, SyncError> {
    let endpoint = url.path();

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request =
        Request::new_with_str_and_init(url.as_str(), &opts).map_err(|e| transport_error(endpoint, e))?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| transport_error(endpoint, e))?;
    }

    let window = web_sys::window().ok_or_else(|| SyncError::Transport {
        endpoint: endpoint.to_string(),
        message: "no global window".to_string(),
    })?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| transport_error(endpoint, e))?
        .dyn_into()
        .map_err(|e| transport_error(endpoint, e))?;

    if !response.ok() {
        return Err(SyncError::Rejected {
            endpoint: endpoint.to_string(),
            status: response.status(),
        });
    }

    let text = JsFuture::from(response.text().map_err(|e| transport_error(endpoint, e))?)
        .await
        .map_err(|e| transport_error(endpoint, e))?;

    text.as_string().ok_or_else(|| SyncError::MalformedResponse {
        endpoint: endpoint.to_string(),
        message: "response body is not text".to_string(),
    })
}
