use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use http::{header::AUTHORIZATION, Method, Request, Response, StatusCode};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{json, Value as Json};
use wallet_passes::{
    config::WalletsConfig,
    core::util::AsyncHttpClient,
    google::{
        credentials::ServiceAccountKey,
        parameters::{Barcode, State},
        GenericObject, GoogleWallet, WalletObject,
    },
    WalletError,
};

const SERVICE_ACCOUNT: &[u8] = include_bytes!("examples/service_account.json");
const PUBLIC_KEY: &[u8] = include_bytes!("examples/service_account_pub.pem");
const OBJECTS_PATH: &str = "/walletobjects/v1/genericObject";

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

/// In-memory Wallet Objects API and token endpoint.
#[derive(Default)]
pub struct MockHttpClient {
    objects: Mutex<HashMap<String, Json>>,
    requests: Mutex<Vec<Recorded>>,
    lookup_status: Option<StatusCode>,
    created_id: Option<String>,
}

impl MockHttpClient {
    fn with_object(self, object: Json) -> Self {
        let id = object["id"].as_str().unwrap_or_default().to_string();
        self.objects.lock().unwrap().insert(id, object);
        self
    }

    fn api_requests(&self) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(OBJECTS_PATH))
            .cloned()
            .collect()
    }

    fn token_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == "/token")
            .count()
    }
}

fn json_response(status: StatusCode, body: &Json) -> Result<Response<Vec<u8>>> {
    Response::builder()
        .status(status)
        .body(serde_json::to_vec(body)?)
        .context("failed to build response")
}

#[async_trait]
impl AsyncHttpClient for MockHttpClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let path = request.uri().path().to_string();
        self.requests.lock().unwrap().push(Recorded {
            method: request.method().clone(),
            path: path.clone(),
            authorization: request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            body: request.body().clone(),
        });

        if path == "/token" {
            return json_response(
                StatusCode::OK,
                &json!({ "access_token": "ya29.mock", "expires_in": 3599, "token_type": "Bearer" }),
            );
        }

        match (request.method(), path.strip_prefix(OBJECTS_PATH)) {
            (&Method::GET, Some(id)) => {
                let id = id.trim_start_matches('/');
                if let Some(status) = self.lookup_status {
                    return json_response(status, &json!({ "error": { "code": status.as_u16() } }));
                }
                match self.objects.lock().unwrap().get(id) {
                    Some(object) => json_response(StatusCode::OK, object),
                    None => json_response(
                        StatusCode::NOT_FOUND,
                        &json!({ "error": { "code": 404, "message": format!("Resource not found: {id}") } }),
                    ),
                }
            }
            (&Method::POST, Some("")) => {
                let mut object: Json = serde_json::from_slice(request.body())?;
                if let Some(id) = &self.created_id {
                    object["id"] = json!(id);
                }
                object["kind"] = json!("walletobjects#genericObject");
                let id = object["id"].as_str().unwrap_or_default().to_string();

                let mut objects = self.objects.lock().unwrap();
                if objects.contains_key(&id) {
                    return json_response(StatusCode::CONFLICT, &json!({ "error": { "code": 409 } }));
                }
                objects.insert(id, object.clone());
                json_response(StatusCode::OK, &object)
            }
            _ => json_response(StatusCode::BAD_REQUEST, &json!({ "error": "unexpected request" })),
        }
    }
}

fn wallet(http_client: Arc<MockHttpClient>) -> GoogleWallet {
    let config = WalletsConfig::from_lookup(|key| match key {
        "GOOGLE_WALLET_ISSUER_ID" => Some("issuer1".to_string()),
        "APP_URL" => Some("https://events.example.com/tickets".to_string()),
        _ => None,
    })
    .unwrap();
    let key = ServiceAccountKey::from_slice(SERVICE_ACCOUNT).unwrap();
    GoogleWallet::with_key(&config, key, http_client).unwrap()
}

fn stored(id: &str, class_id: &str) -> Json {
    json!({
        "kind": "walletobjects#genericObject",
        "id": id,
        "classId": class_id,
        "state": "ACTIVE",
        "cardTitle": { "defaultValue": { "language": "en-EN", "value": "Stored" } }
    })
}

#[tokio::test]
async fn find_object_returns_stored_object() {
    let http_client = Arc::new(MockHttpClient::default().with_object(stored("issuer1.abc123", "issuer1.xyz")));
    let wallet = wallet(http_client.clone());

    let object = wallet.find_object("abc123").await.unwrap().unwrap();

    assert_eq!(object.id(), "issuer1.abc123");
    assert_eq!(object.class_id(), "issuer1.xyz");

    let requests = http_client.api_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/walletobjects/v1/genericObject/issuer1.abc123");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer ya29.mock"));
}

#[tokio::test]
async fn find_object_missing_is_none() {
    let wallet = wallet(Arc::new(MockHttpClient::default()));
    assert!(wallet.find_object("abc123").await.unwrap().is_none());
}

#[tokio::test]
async fn find_object_other_failures_are_errors() {
    let http_client = Arc::new(MockHttpClient {
        lookup_status: Some(StatusCode::INTERNAL_SERVER_ERROR),
        ..Default::default()
    });
    let err = wallet(http_client).find_object("abc123").await.unwrap_err();

    assert!(matches!(
        err,
        WalletError::Remote { status: StatusCode::INTERNAL_SERVER_ERROR, .. }
    ));
}

#[tokio::test]
async fn find_or_create_does_not_post_existing_object() {
    let http_client = Arc::new(MockHttpClient::default().with_object(stored("issuer1.abc123", "issuer1.xyz")));
    let wallet = wallet(http_client.clone());

    let object = wallet
        .build_object("abc123", "xyz")
        .with_card_title("Fresh")
        .find_or_create()
        .await
        .unwrap();

    assert_eq!(
        object.fields().get_raw("cardTitle").unwrap()["defaultValue"]["value"],
        "Stored"
    );
    assert!(http_client
        .api_requests()
        .iter()
        .all(|r| r.method == Method::GET));
}

#[tokio::test]
async fn find_or_create_posts_after_not_found() {
    let http_client = Arc::new(MockHttpClient::default());
    let wallet = wallet(http_client.clone());

    let object = wallet
        .build_object("abc123", "xyz")
        .with_card_title("Summer Festival")
        .with_barcode(Barcode::qr("abc123"))
        .find_or_create()
        .await
        .unwrap();

    assert_eq!(object.id(), "issuer1.abc123");

    let requests = http_client.api_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[1].method, Method::POST);
    assert_eq!(requests[1].path, OBJECTS_PATH);

    let posted: Json = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        posted,
        json!({
            "id": "issuer1.abc123",
            "classId": "issuer1.xyz",
            "state": "ACTIVE",
            "cardTitle": { "defaultValue": { "language": "en-EN", "value": "Summer Festival" } },
            "barcode": { "type": "QR_CODE", "value": "abc123" }
        })
    );

    // The access token is exchanged once and reused.
    assert_eq!(http_client.token_requests(), 1);
}

#[tokio::test]
async fn find_or_create_treats_lookup_failure_as_missing() {
    let http_client = Arc::new(MockHttpClient {
        lookup_status: Some(StatusCode::SERVICE_UNAVAILABLE),
        ..Default::default()
    });
    let wallet = wallet(http_client.clone());

    let object = wallet
        .build_object("abc123", "xyz")
        .find_or_create()
        .await
        .unwrap();

    assert_eq!(object.id(), "issuer1.abc123");
    assert_eq!(http_client.api_requests()[1].method, Method::POST);
}

#[tokio::test]
async fn create_existing_object_is_remote_error() {
    let http_client = Arc::new(MockHttpClient::default().with_object(stored("issuer1.abc123", "issuer1.xyz")));
    let err = wallet(http_client)
        .build_object("abc123", "xyz")
        .create()
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Remote { status: StatusCode::CONFLICT, .. }));
}

#[tokio::test]
async fn create_rejects_other_resource() {
    let http_client = Arc::new(MockHttpClient {
        created_id: Some("issuer1.someone-else".into()),
        ..Default::default()
    });
    let err = wallet(http_client)
        .build_object("abc123", "xyz")
        .create()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WalletError::UnexpectedResource { expected, actual }
            if expected == "issuer1.abc123" && actual == "issuer1.someone-else"
    ));
}

#[tokio::test]
async fn created_object_keeps_state() {
    let wallet = wallet(Arc::new(MockHttpClient::default()));
    let object: GenericObject = wallet
        .build_object("abc123", "xyz")
        .with_state("EXPIRED")
        .create()
        .await
        .unwrap();

    assert_eq!(object.get::<State>().unwrap().unwrap(), State::Expired);
}

fn decode_claims(link: &url::Url) -> (jsonwebtoken::Header, Json) {
    let token = link
        .as_str()
        .strip_prefix("https://pay.google.com/gp/v/save/")
        .unwrap();

    let header = jsonwebtoken::decode_header(token).unwrap();

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["google"]);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    let claims = jsonwebtoken::decode::<Json>(
        token,
        &DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap(),
        &validation,
    )
    .unwrap()
    .claims;

    // Payload segment as transmitted, independent of the verifier.
    let segment = token.split('.').nth(1).unwrap();
    let raw: Json = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap();
    assert_eq!(raw, claims);

    (header, claims)
}

#[test]
fn save_link_claims() {
    let wallet = wallet(Arc::new(MockHttpClient::default()));
    let link = wallet.save_link("issuer1.abc123", "issuer1.xyz").unwrap();

    let (header, claims) = decode_claims(&link);

    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(
        header.kid.as_deref(),
        Some("4f2c0e1d9b8a7c6d5e4f3a2b1c0d9e8f7a6b5c4d")
    );
    assert_eq!(
        claims,
        json!({
            "iss": "wallet-issuer@wallet-passes-test.iam.gserviceaccount.com",
            "aud": "google",
            "origins": ["https://events.example.com"],
            "typ": "savetowallet",
            "payload": {
                "genericObjects": [{ "id": "issuer1.abc123", "classId": "issuer1.xyz" }]
            }
        })
    );
}

#[test]
fn save_link_for_other_object_type() {
    let wallet = wallet(Arc::new(MockHttpClient::default()));
    let link = wallet
        .save_link_for("eventTicketObjects", "issuer1.t1", "issuer1.concert")
        .unwrap();

    let (_, claims) = decode_claims(&link);
    assert_eq!(claims["payload"]["eventTicketObjects"][0]["id"], "issuer1.t1");
    assert!(claims["payload"].get("genericObjects").is_none());
}

#[test]
fn builder_save_link_uses_builder_ids() {
    let wallet = wallet(Arc::new(MockHttpClient::default()));
    let link = wallet.build_object("abc123", "xyz").save_link().unwrap();

    let (_, claims) = decode_claims(&link);
    assert_eq!(
        claims["payload"]["genericObjects"][0],
        json!({ "id": "issuer1.abc123", "classId": "issuer1.xyz" })
    );
}
