use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use lazy_static::lazy_static;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ResolverConfig;

/// Fields requested from Open Food Facts; everything the judge prompt uses.
const OFF_FIELDS: &str =
    "product_name,ingredients_text,nutriscore_score,nutriscore_grade,nova_group,allergens";

const USER_AGENT: &str = "cleanse/0.1 (food scan backend)";

/// Nutrition facts for one barcode, as far as Open Food Facts knows them.
/// Every field except the barcode itself is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFacts {
    pub upc: String,
    pub product_name: Option<String>,
    pub ingredients_text: Option<String>,
    pub nutriscore_score: Option<i32>,
    pub nutriscore_grade: Option<String>,
    pub nova_group: Option<i32>,
    pub allergens: Option<String>,
}

/// Display name and image scraped from the product page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no product found for upc {upc}")]
    NotFound { upc: String },
    #[error("product lookup failed: {0}")]
    Request(String),
    #[error("could not parse product data: {0}")]
    Parse(String),
}

#[async_trait]
pub trait ProductResolver: Send + Sync {
    async fn lookup_facts(&self, upc: &str) -> Result<ProductFacts, ResolverError>;
    async fn lookup_image_and_name(&self, upc: &str) -> Result<ResolvedMedia, ResolverError>;
}

#[derive(Debug, Deserialize)]
struct OffResponse {
    status: i32,
    #[serde(default)]
    product: Option<OffProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct OffProduct {
    product_name: Option<String>,
    ingredients_text: Option<String>,
    nutriscore_score: Option<i32>,
    nutriscore_grade: Option<String>,
    nova_group: Option<i32>,
    allergens: Option<String>,
}

lazy_static! {
    static ref NAME_SELECTOR: Selector =
        Selector::parse("h1.product-name").expect("valid selector");
    static ref IMAGE_SELECTORS: [Selector; 2] = [
        Selector::parse("figure.product-image.non-mobile img").expect("valid selector"),
        Selector::parse("figure.product-image.mobile img").expect("valid selector"),
    ];
}

pub struct HttpProductResolver {
    client: reqwest::Client,
    off_base_url: String,
    goupc_base_url: String,
}

impl HttpProductResolver {
    pub fn new(config: &ResolverConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build product resolver http client")?;
        Ok(Self {
            client,
            off_base_url: config.off_base_url.trim_end_matches('/').to_string(),
            goupc_base_url: config.goupc_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductResolver for HttpProductResolver {
    async fn lookup_facts(&self, upc: &str) -> Result<ProductFacts, ResolverError> {
        let url = format!(
            "{}/api/v2/product/{}?fields={}",
            self.off_base_url, upc, OFF_FIELDS
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ResolverError::NotFound {
                upc: upc.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(ResolverError::Request(format!(
                "open food facts returned {}",
                response.status()
            )));
        }

        let payload: OffResponse = response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))?;

        match (payload.status, payload.product) {
            (1, Some(product)) => Ok(ProductFacts {
                upc: upc.to_string(),
                product_name: product.product_name,
                ingredients_text: product.ingredients_text,
                nutriscore_score: product.nutriscore_score,
                nutriscore_grade: product.nutriscore_grade,
                nova_group: product.nova_group,
                allergens: product.allergens,
            }),
            _ => Err(ResolverError::NotFound {
                upc: upc.to_string(),
            }),
        }
    }

    async fn lookup_image_and_name(&self, upc: &str) -> Result<ResolvedMedia, ResolverError> {
        let url = format!("{}/search?q={}", self.goupc_base_url, upc);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ResolverError::Request(format!(
                "product page returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolverError::Request(e.to_string()))?;

        // Html is not Send, so the parse stays in a sync helper after the
        // last await.
        parse_product_page(&body, upc)
    }
}

fn parse_product_page(html: &str, upc: &str) -> Result<ResolvedMedia, ResolverError> {
    let document = Html::parse_document(html);

    let name = document
        .select(&NAME_SELECTOR)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ResolverError::Parse(format!("no product name on page for {upc}")))?;

    // Desktop figure first, mobile as fallback.
    let image_url = IMAGE_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector))
        .find_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .ok_or_else(|| ResolverError::Parse(format!("no product image on page for {upc}")))?;

    Ok(ResolvedMedia { name, image_url })
}
