use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use http::{header::USER_AGENT, Request, Response};

/// Generic HTTP client.
///
/// A trait is used here so the Google Wallet transport can be swapped, e.g. for a mock in tests
/// or a client with custom TLS settings.
#[async_trait]
pub trait AsyncHttpClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>>;
}

pub(crate) fn base_request() -> http::request::Builder {
    Request::builder().header(
        USER_AGENT,
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
    )
}

#[derive(Debug)]
pub struct ReqwestClient(reqwest::Client);

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .context("unable to build http_client")
            .map(Self)
    }
}

#[async_trait]
impl AsyncHttpClient for ReqwestClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let response = self
            .0
            .execute(request.try_into().context("unable to convert request")?)
            .await
            .context("http request failed")?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());

        builder
            .headers_mut()
            .context("unable to set headers")?
            .extend(response.headers().clone());

        builder
            .body(
                response
                    .bytes()
                    .await
                    .context("failed to extract response body")?
                    .to_vec(),
            )
            .context("unable to construct response")
    }
}

#[cfg(test)]
mod test {
    use http::header::USER_AGENT;

    use super::base_request;

    #[test]
    fn base_request_identifies_crate() {
        let request = base_request().body(Vec::<u8>::new()).unwrap();
        let agent = request.headers()[USER_AGENT].to_str().unwrap();
        assert!(agent.starts_with("wallet-passes/"));
    }
}
