use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, header},
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use storefront_orderservice::{
    core::{
        app_state::AppState,
        config::AuthConfig,
        middleware::{ADMIN_ROLE, Claims},
    },
    engine::domain::PaymentType,
    media::MediaGate,
    routes,
    store::{Landing, MemoryStore, PaymentAccount, Product},
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const BASE_URL: &str = "http://localhost:7677";
const BOUNDARY: &str = "storefront-test-boundary";

pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];

/// A router over an in-memory store with one seeded storefront that accepts
/// both payment types.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub media: MediaGate,
    pub owner: Uuid,
    pub account: Uuid,
    _uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("failed to create upload dir");
        let store = Arc::new(MemoryStore::new());
        let media = MediaGate::new(uploads.path(), BASE_URL);
        let owner = Uuid::new_v4();
        let account = Uuid::new_v4();

        store
            .put_landing(Landing {
                id: Uuid::new_v4(),
                owner_id: owner,
                store_name: "Corner Shop".into(),
                accept_payment_types: vec![PaymentType::Cod, PaymentType::Prepaid],
            })
            .await;
        store
            .put_payment_account(PaymentAccount {
                id: account,
                owner_id: owner,
                platform: "KBZPay".into(),
                platform_user_name: "corner-shop".into(),
                account_number: "09-555-0100".into(),
            })
            .await;

        let state = AppState {
            store: store.clone(),
            media: media.clone(),
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.into(),
            },
            max_upload_bytes: 1024 * 1024,
        };

        Self {
            router: routes::app(state),
            store,
            media,
            owner,
            account,
            _uploads: uploads,
        }
    }

    pub async fn seed_product(&self, name: &str, price: f64, discount: Option<f64>, stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .put_product(Product {
                id,
                owner_id: self.owner,
                name: name.into(),
                price,
                discount_price: discount,
                stock_count: stock,
                images: vec![format!("{}/uploads/{}.png", BASE_URL, name)],
            })
            .await;
        id
    }

    pub fn owner_token(&self) -> String {
        token(&self.owner.to_string(), ADMIN_ROLE)
    }

    /// Files currently in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.media.root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends `body` verbatim with the given content type.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: impl Into<Body>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }

        let request = builder.body(body.into()).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_as_owner(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let token = self.owner_token();
        self.request(method, uri, body, Some(&token)).await
    }

    /// Posts a multipart order form. Files are sent as `paymentScreenshot`.
    pub async fn place_order(&self, fields: &[(&str, String)], files: &[&[u8]]) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/orders")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields, files)))
            .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// A complete COD form for this app's store.
    pub fn cod_form(&self, products: Value) -> Vec<(&'static str, String)> {
        vec![
            ("orderName", "Birthday order".into()),
            ("products", products.to_string()),
            ("address", "12 Market St".into()),
            ("phonePrimary", "0911111111".into()),
            ("paymentType", "COD".into()),
            ("siteOwner", self.owner.to_string()),
        ]
    }

    pub fn prepaid_form(&self, products: Value) -> Vec<(&'static str, String)> {
        let mut form = self.cod_form(products);
        form.retain(|(name, _)| *name != "paymentType");
        form.push(("paymentType", "Prepaid".into()));
        form.push((
            "paymentDetails",
            serde_json::json!({
                "paymentPlatform": "KBZPay",
                "paymentPlatformUserName": "Aye Aye",
                "accountId": self.account,
            })
            .to_string(),
        ));
        form
    }
}

pub fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.into(),
        role: role.into(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode token")
}

pub async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not json")
}

fn multipart_body(fields: &[(&str, String)], files: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (i, bytes) in files.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"paymentScreenshot\"; filename=\"proof-{}.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, i
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
