//! Wallet Objects REST calls.

use std::sync::Arc;

use http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method, Request, Response, StatusCode,
};
use tracing::debug;
use url::Url;

use crate::{
    config::BaseUrl,
    core::util::{base_request, AsyncHttpClient},
    error::{WalletError, WalletResult},
};

use super::{credentials::TokenSource, object::WalletObject};

const API_PATH: &str = "walletobjects/v1/";

/// Authenticated access to the Wallet Objects API.
#[derive(Clone)]
pub struct WalletObjectsClient {
    base_url: BaseUrl,
    tokens: Arc<TokenSource>,
    http_client: Arc<dyn AsyncHttpClient + Send + Sync>,
}

impl WalletObjectsClient {
    pub fn new(
        base_url: BaseUrl,
        tokens: Arc<TokenSource>,
        http_client: Arc<dyn AsyncHttpClient + Send + Sync>,
    ) -> Self {
        Self {
            base_url,
            tokens,
            http_client,
        }
    }

    pub(crate) fn with_http_client(
        mut self,
        http_client: Arc<dyn AsyncHttpClient + Send + Sync>,
    ) -> Self {
        self.http_client = http_client;
        self
    }

    /// `GET {base}walletobjects/v1/{resource}/{id}`.
    ///
    /// # Errors
    /// [WalletError::NotFound] when the object does not exist.
    pub async fn get<T: WalletObject>(&self, id: &str) -> WalletResult<T> {
        let url = self.resource_url(T::RESOURCE, Some(id))?;
        let response = self.send(Method::GET, url, None).await?;
        check_status(&response, id)?;
        parse_body(&response)
    }

    /// `POST {base}walletobjects/v1/{resource}`, returning the object as stored by the API.
    ///
    /// # Errors
    /// [WalletError::UnexpectedResource] when the API answers with another object.
    pub async fn insert<T: WalletObject>(&self, object: &T) -> WalletResult<T> {
        let url = self.resource_url(T::RESOURCE, None)?;
        let body = serde_json::to_vec(object).map_err(|e| WalletError::InvalidResponse {
            message: format!("unable to serialize {}: {e}", T::RESOURCE),
        })?;
        let response = self.send(Method::POST, url, Some(body)).await?;
        check_status(&response, object.id())?;

        let created: T = parse_body(&response).map_err(|e| WalletError::UnexpectedResource {
            expected: T::RESOURCE.to_string(),
            actual: e.to_string(),
        })?;
        if created.id() != object.id() {
            return Err(WalletError::UnexpectedResource {
                expected: object.id().to_string(),
                actual: created.id().to_string(),
            });
        }
        Ok(created)
    }

    fn resource_url(&self, resource: &str, id: Option<&str>) -> WalletResult<Url> {
        let path = match id {
            Some(id) => format!("{API_PATH}{resource}/{id}"),
            None => format!("{API_PATH}{resource}"),
        };
        self.base_url
            .join(&path)
            .map_err(|e| WalletError::config(format!("invalid Wallet Objects url: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> WalletResult<Response<Vec<u8>>> {
        let token = self.tokens.token(self.http_client.as_ref()).await?;

        debug!(%method, %url, "calling Wallet Objects API");
        let mut builder = base_request()
            .method(method)
            .uri(url.as_str())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request: Request<Vec<u8>> =
            builder
                .body(body.unwrap_or_default())
                .map_err(|e| WalletError::Network {
                    message: format!("unable to build request: {e}"),
                })?;

        self.http_client
            .execute(request)
            .await
            .map_err(|e| WalletError::Network {
                message: format!("{url}: {e:#}"),
            })
    }
}

impl std::fmt::Debug for WalletObjectsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletObjectsClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn check_status(response: &Response<Vec<u8>>, id: &str) -> WalletResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let message = String::from_utf8_lossy(response.body()).into_owned();
    Err(match status {
        StatusCode::NOT_FOUND => WalletError::NotFound { id: id.to_string() },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WalletError::Unauthorized { message },
        status => WalletError::Remote { status, message },
    })
}

fn parse_body<T: WalletObject>(response: &Response<Vec<u8>>) -> WalletResult<T> {
    serde_json::from_slice(response.body()).map_err(|e| WalletError::InvalidResponse {
        message: format!("unable to parse {}: {e}", T::RESOURCE),
    })
}
