//! HTTP commerce API client
//!
//! One client speaks for the remote store, the product catalog and the coupon
//! service. Every response is wrapped in a `{ success, data, message }`
//! envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use crate::{
    cache::{CollectionKind, UserId},
    collections::{RemoteEntry, RemoteError, RemoteStore},
    coupons::{Coupon, CouponService},
    products::ProductId,
    resolver::{CatalogError, CatalogProduct, ProductCatalog},
};

/// Header carrying the acting user's identity.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "succeeded")]
    success: bool,

    data: Option<T>,

    #[serde(default)]
    message: Option<String>,
}

fn succeeded() -> bool {
    true
}

/// Collection payloads arrive either as a bare list or wrapped in `items`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollectionBody {
    Wrapped { items: Vec<RemoteEntry> },
    List(Vec<RemoteEntry>),
}

impl From<CollectionBody> for Vec<RemoteEntry> {
    fn from(body: CollectionBody) -> Self {
        match body {
            CollectionBody::Wrapped { items } | CollectionBody::List(items) => items,
        }
    }
}

/// Client for the storefront's JSON API.
#[derive(Debug, Clone)]
pub struct HttpCommerceClient {
    base_url: Url,
    http: Client,
}

impl HttpCommerceClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Decode`] for an unusable base URL and
    /// [`RemoteError::Http`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RemoteError::Decode(format!("invalid API base URL {base_url}: {err}")))?;

        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Decode(format!(
                "API base URL {base_url} cannot have paths"
            )));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, http })
    }

    /// Root of the API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Decode`] if the base URL cannot take a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| RemoteError::Decode(format!("{} cannot have paths", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, RemoteError> {
        let response = request.send().await?;
        let status = response.status();

        debug!(url = %response.url(), %status, "commerce api response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);

            return Err(RemoteError::Rejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))?;

        if !envelope.success {
            return Err(RemoteError::Rejected {
                status: Some(status.as_u16()),
                message: envelope.message.unwrap_or_default(),
            });
        }

        Ok(envelope.data)
    }
}

fn as_user(request: RequestBuilder, user: &UserId) -> RequestBuilder {
    request.header(USER_HEADER, user.as_str())
}

#[async_trait]
impl RemoteStore for HttpCommerceClient {
    async fn fetch(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        let url = self.endpoint(&[kind.as_str()])?;
        let body: Option<CollectionBody> = self.send(as_user(self.http.get(url), user)).await?;

        Ok(body.map(Vec::from).unwrap_or_default())
    }

    async fn add(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&[kind.as_str()])?;
        let body = json!({ "productId": product, "quantity": quantity });

        self.send::<serde_json::Value>(as_user(self.http.post(url), user).json(&body))
            .await?;

        Ok(())
    }

    async fn remove(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&[kind.as_str(), product.as_str()])?;

        self.send::<serde_json::Value>(as_user(self.http.delete(url), user))
            .await?;

        Ok(())
    }

    async fn update_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&[CollectionKind::Cart.as_str(), product.as_str()])?;
        let body = json!({ "quantity": quantity });

        self.send::<serde_json::Value>(as_user(self.http.put(url), user).json(&body))
            .await?;

        Ok(())
    }

    async fn clear(&self, user: &UserId, kind: CollectionKind) -> Result<(), RemoteError> {
        let url = self.endpoint(&[kind.as_str()])?;

        self.send::<serde_json::Value>(as_user(self.http.delete(url), user))
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for HttpCommerceClient {
    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError> {
        let url = self
            .endpoint(&["products", id.as_str()])
            .map_err(|err| CatalogError::Unavailable(err.to_string()))?;

        match self.send::<CatalogProduct>(self.http.get(url)).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(CatalogError::NotFound(id.clone())),
            Err(RemoteError::Rejected {
                status: Some(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => Err(CatalogError::NotFound(id.clone())),
            Err(RemoteError::Decode(message)) => Err(CatalogError::Malformed(id.clone(), message)),
            Err(err) => Err(CatalogError::Unavailable(err.to_string())),
        }
    }
}

#[async_trait]
impl CouponService for HttpCommerceClient {
    async fn validate(&self, code: &str) -> Result<Option<Coupon>, RemoteError> {
        let url = self.endpoint(&["coupons", "validate"])?;
        let body = json!({ "code": code });

        match self.send::<Coupon>(self.http.post(url).json(&body)).await {
            Err(RemoteError::Rejected {
                status: Some(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            other => other,
        }
    }

    async fn record_usage(&self, code: &str) -> Result<(), RemoteError> {
        let url = self.endpoint(&["coupons", code, "use"])?;

        self.send::<serde_json::Value>(self.http.post(url)).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn client(base: &str) -> Result<HttpCommerceClient, RemoteError> {
        HttpCommerceClient::new(base, Duration::from_secs(5))
    }

    #[test]
    fn endpoints_join_onto_the_base_path() -> TestResult {
        let client = client("http://localhost:5000/api/")?;

        assert_eq!(
            client.endpoint(&["cart"])?.as_str(),
            "http://localhost:5000/api/cart"
        );
        assert_eq!(
            client.endpoint(&["products", "p-1"])?.as_str(),
            "http://localhost:5000/api/products/p-1"
        );

        Ok(())
    }

    #[test]
    fn endpoint_segments_are_percent_encoded() -> TestResult {
        let client = client("https://shop.example.com/api")?;

        assert_eq!(
            client.endpoint(&["coupons", "A/B C", "use"])?.as_str(),
            "https://shop.example.com/api/coupons/A%2FB%20C/use"
        );

        Ok(())
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(client("not a url"), Err(RemoteError::Decode(_))));
        assert!(matches!(
            client("mailto:shop@example.com"),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn envelopes_default_to_success() -> TestResult {
        let envelope: Envelope<CollectionBody> =
            serde_json::from_str(r#"{ "data": { "items": [ { "product": "p-1", "quantity": 2 } ] } }"#)?;

        assert!(envelope.success);

        let items: Vec<RemoteEntry> = envelope.data.map(Vec::from).unwrap_or_default();

        assert_eq!(items, vec![RemoteEntry::bare("p-1", Some(2))]);

        Ok(())
    }

    #[test]
    fn envelopes_without_data_read_as_none() -> TestResult {
        let envelope: Envelope<Coupon> = serde_json::from_str(r#"{ "success": true }"#)?;

        assert!(envelope.success);
        assert!(envelope.data.is_none());

        Ok(())
    }

    #[test]
    fn collection_bodies_accept_bare_lists_with_hydrated_products() -> TestResult {
        let body: CollectionBody = serde_json::from_str(
            r#"[ { "product": { "id": "p-2", "name": "Scarf", "price": 2450, "category": "accessories" } } ]"#,
        )?;

        let items = Vec::from(body);

        assert_eq!(items.len(), 1);
        assert!(items.iter().all(|entry| !entry.product.is_bare()));

        Ok(())
    }

    #[test]
    fn failed_envelopes_carry_their_message() -> TestResult {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{ "success": false, "message": "Coupon expired" }"#)?;

        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Coupon expired"));

        Ok(())
    }
}
