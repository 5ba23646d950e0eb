//! Food database lookup.
//!
//! [`FoodLookup`] is the seam; [`OpenFoodFactsClient`] is the production
//! implementation. Lookups are best effort: any transport or decode failure
//! yields an empty list and a warning, never an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";
const USER_AGENT: &str = "ForgeFit/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Most results a search returns.
pub const MAX_RESULTS: usize = 6;

/// A food with nutrient values per 100 g, each rounded to 1 decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub cal_100g: f64,
    pub protein_100g: f64,
    pub carbs_100g: f64,
    pub fat_100g: f64,
}

#[async_trait]
pub trait FoodLookup: Send + Sync {
    /// Free-text product search.
    async fn search(&self, query: &str) -> Vec<FoodItem>;

    /// Exact product by barcode (EAN/UPC digits).
    async fn barcode(&self, code: &str) -> Vec<FoodItem>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn FoodLookup) {}
};

/// OpenFoodFacts public API client.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: String,
}

impl Default for OpenFoodFactsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFoodFactsClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Option<Value> {
        let response = match self.client.get(url).query(query).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "food lookup request failed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "food lookup returned an error status");
                return None;
            }
        };
        match response.json::<Value>().await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(url, error = %e, "food lookup response was not JSON");
                None
            }
        }
    }
}

#[async_trait]
impl FoodLookup for OpenFoodFactsClient {
    async fn search(&self, query: &str) -> Vec<FoodItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_size = MAX_RESULTS.to_string();
        let params = [
            ("search_terms", query),
            ("action", "process"),
            ("json", "1"),
            ("fields", "product_name,nutriments"),
            ("page_size", page_size.as_str()),
        ];
        self.get_json(&url, &params)
            .await
            .map(|body| items_from_search(&body))
            .unwrap_or_default()
    }

    async fn barcode(&self, code: &str) -> Vec<FoodItem> {
        let code = code.trim();
        if !is_barcode(code) {
            return Vec::new();
        }
        let url = format!("{}/api/v0/product/{code}.json", self.base_url);
        self.get_json(&url, &[("fields", "product_name,nutriments")])
            .await
            .and_then(|body| item_from_product(&body))
            .into_iter()
            .collect()
    }
}

/// Barcodes are 8 to 14 ASCII digits.
pub fn is_barcode(code: &str) -> bool {
    (8..=14).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a `cgi/search.pl` response body. Unnamed products are skipped.
pub fn items_from_search(body: &Value) -> Vec<FoodItem> {
    body.get("products")
        .and_then(Value::as_array)
        .map(|products| {
            products
                .iter()
                .filter_map(item_from_entry)
                .take(MAX_RESULTS)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an `api/v0/product/{code}.json` response body.
pub fn item_from_product(body: &Value) -> Option<FoodItem> {
    if body.get("status").and_then(Value::as_i64) == Some(0) {
        return None;
    }
    body.get("product").and_then(item_from_entry)
}

fn item_from_entry(product: &Value) -> Option<FoodItem> {
    let name = product.get("product_name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let empty = Map::new();
    let n = product
        .get("nutriments")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let cal = nutrient(n, "energy-kcal_100g").or_else(|| nutrient(n, "energy-kcal"));
    Some(FoodItem {
        name: name.to_owned(),
        cal_100g: super::round1(cal.unwrap_or(0.0)),
        protein_100g: super::round1(nutrient(n, "proteins_100g").unwrap_or(0.0)),
        carbs_100g: super::round1(nutrient(n, "carbohydrates_100g").unwrap_or(0.0)),
        fat_100g: super::round1(nutrient(n, "fat_100g").unwrap_or(0.0)),
    })
}

/// OpenFoodFacts sends nutrients as numbers or numeric strings. Zero counts
/// as missing so the kcal fallback still applies.
fn nutrient(n: &Map<String, Value>, key: &str) -> Option<f64> {
    let v = match n.get(key)? {
        Value::Number(num) => num.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (v.is_finite() && v != 0.0).then_some(v)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn search_parsing_skips_unnamed_and_caps_results() {
        let mut products = vec![json!({"product_name": "  ", "nutriments": {}})];
        for i in 0..8 {
            products.push(json!({
                "product_name": format!("Oats {i}"),
                "nutriments": {"energy-kcal_100g": 389, "proteins_100g": 16.89, "carbohydrates_100g": "66.3", "fat_100g": 6.9}
            }));
        }
        let items = items_from_search(&json!({ "products": products }));
        assert_eq!(items.len(), MAX_RESULTS);
        assert_eq!(
            items[0],
            FoodItem {
                name: "Oats 0".into(),
                cal_100g: 389.0,
                protein_100g: 16.9,
                carbs_100g: 66.3,
                fat_100g: 6.9,
            }
        );
    }

    #[test]
    fn kcal_falls_back_and_missing_is_zero() {
        let item = item_from_entry(&json!({
            "product_name": "Greek Yogurt",
            "nutriments": {"energy-kcal": 97.04, "proteins_100g": 9}
        }))
        .unwrap();
        assert_eq!(item.cal_100g, 97.0);
        assert_eq!(item.protein_100g, 9.0);
        assert_eq!(item.carbs_100g, 0.0);
        assert_eq!(item.fat_100g, 0.0);
    }

    #[test]
    fn product_lookup_respects_status() {
        assert!(item_from_product(&json!({"status": 0, "status_verbose": "product not found"})).is_none());
        let found = item_from_product(&json!({
            "status": 1,
            "product": {"product_name": "Peanut Butter", "nutriments": {"energy-kcal_100g": 588}}
        }));
        assert_eq!(found.unwrap().cal_100g, 588.0);
    }

    #[test]
    fn garbage_bodies_yield_nothing() {
        assert!(items_from_search(&json!("nope")).is_empty());
        assert!(items_from_search(&json!({"products": "x"})).is_empty());
        assert!(item_from_product(&json!([])).is_none());
    }

    #[test]
    fn barcode_shape() {
        assert!(is_barcode("3017620422003"));
        assert!(!is_barcode("30176204220a3"));
        assert!(!is_barcode("123"));
        assert!(!is_barcode("../../etc/passwd"));
    }

    #[tokio::test]
    async fn unreachable_server_yields_empty_list() {
        let client = OpenFoodFactsClient::new().with_base_url("http://127.0.0.1:9");
        assert!(client.search("oats").await.is_empty());
        assert!(client.barcode("3017620422003").await.is_empty());
    }

    #[tokio::test]
    async fn blank_query_skips_request() {
        let client = OpenFoodFactsClient::new().with_base_url("http://127.0.0.1:9");
        assert!(client.search("   ").await.is_empty());
    }
}
