//! Product-catalog agent: product lookups and structured cart offers

use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::domain::{format_vnd, AgentName, AgentPayload, ChatQuery, ProductOffer};
use crate::error::AgentError;
use crate::stores::{CatalogStore, ProductRow};

const SEARCH_LIMIT: i64 = 3;

const PRODUCT_KEYWORDS: &[&str] = &[
    "sản phẩm",
    "laptop",
    "máy tính",
    "thiết bị",
    "model",
    "tham khảo",
    "thông số",
    "cấu hình",
    "giá",
    "mua",
    "đặc điểm",
    "chi tiết",
    "specs",
];

/// Detail/spec requests get the plain formatted listing instead of an offer.
const DETAIL_KEYWORDS: &[&str] = &["thông số", "cấu hình", "chi tiết", "đặc điểm", "specs"];

const BRAND_NAMES: &[&str] = &[
    "Dell", "HP", "Lenovo", "Asus", "Acer", "MSI", "Apple", "MacBook",
];

pub struct ProductCatalogAgent {
    catalog: Arc<dyn CatalogStore>,
    name_patterns: Vec<Regex>,
}

impl ProductCatalogAgent {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        // Ordered: explicit lexical patterns first, brand scan as the last
        // resort in extract_product_name.
        let name_patterns = [
            r"(?i)(?:sản phẩm|laptop|máy tính|thiết bị|model)\s+([A-Za-z0-9\s]+)",
            r"(?i)(?:tham khảo|thông số|cấu hình|giá|mua)\s+([A-Za-z0-9\s]+)",
            r"(?i)(?:về|thông tin về)\s+([A-Za-z0-9\s]+)",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("static pattern"))
        .collect();

        Self {
            catalog,
            name_patterns,
        }
    }

    fn extract_product_name(&self, question: &str) -> Option<String> {
        for pattern in &self.name_patterns {
            if let Some(captures) = pattern.captures(question) {
                if let Some(name) = captures.get(1) {
                    let name = name.as_str().trim();
                    if !name.is_empty() {
                        return Some(name.to_string());
                    }
                }
            }
        }

        // Brand-keyword scan: take the brand word plus up to two followers.
        let words: Vec<&str> = question.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            for brand in BRAND_NAMES {
                if word.to_lowercase().contains(&brand.to_lowercase()) {
                    let end = (i + 3).min(words.len());
                    return Some(words[i..end].join(" ").trim().to_string());
                }
            }
        }

        None
    }

    fn format_product(product: &ProductRow) -> String {
        let none = "Không có thông tin";
        let display = match (&product.display_type, product.display_inches) {
            (Some(_), Some(inches)) => format!("{}\"", inches),
            _ => none.to_string(),
        };
        format!(
            "• {}\n  • Thương hiệu: {}\n  • CPU: {}\n  • Chip: {}\n  • RAM: {}\n  • Ổ cứng:\n      - SSD: {}\n      - HDD: {}\n  • Màn hình: {}\n  • Giá: {}",
            product.name,
            product.brand.as_deref().unwrap_or(none),
            product.processor_name.as_deref().unwrap_or(none),
            product.processor_brand.as_deref().unwrap_or(none),
            product.ram.as_deref().unwrap_or(none),
            product.ssd.as_deref().unwrap_or(none),
            product.hdd.as_deref().unwrap_or(none),
            display,
            format_vnd(product.price),
        )
    }
}

#[async_trait]
impl RetrievalAgent for ProductCatalogAgent {
    fn name(&self) -> AgentName {
        AgentName::Product
    }

    fn is_relevant(&self, question: &str) -> bool {
        contains_any(question, PRODUCT_KEYWORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể truy vấn thông tin sản phẩm."
    }

    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        let Some(product_name) = self.extract_product_name(&query.question) else {
            return Ok(AgentPayload::text(
                "Không thể xác định sản phẩm cần tìm. Vui lòng cung cấp tên hoặc mã sản phẩm cụ thể.",
            ));
        };

        let products = self.catalog.search(&product_name, SEARCH_LIMIT).await?;
        if products.is_empty() {
            return Ok(AgentPayload::text(
                "Không tìm thấy thông tin về sản phẩm này.",
            ));
        }

        if contains_any(&query.question, DETAIL_KEYWORDS) {
            let listing = products
                .iter()
                .map(Self::format_product)
                .collect::<Vec<_>>()
                .join("\n\n");
            return Ok(AgentPayload::text(listing));
        }

        // General product mention: offer the top match with a pending
        // add-to-cart confirmation.
        let top = &products[0];
        Ok(AgentPayload::Offer(ProductOffer {
            product_id: top.id,
            product_name: top.name.clone(),
            price: top.price,
            text: format!(
                "{}\n\nBạn có muốn thêm sản phẩm này vào giỏ hàng không?",
                Self::format_product(top)
            ),
            awaiting_confirmation: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCatalog(Vec<ProductRow>);

    #[async_trait]
    impl CatalogStore for FakeCatalog {
        async fn search(&self, _text: &str, _limit: i64) -> Result<Vec<ProductRow>, AgentError> {
            Ok(self.0.clone())
        }
    }

    fn product(id: i64, name: &str) -> ProductRow {
        ProductRow {
            id,
            name: name.to_string(),
            brand: Some("Dell".to_string()),
            price: 25_000_000.0,
            processor_name: Some("Intel Core i7".to_string()),
            processor_brand: Some("Intel".to_string()),
            ram: Some("16GB".to_string()),
            ssd: Some("512GB".to_string()),
            hdd: None,
            display_type: Some("IPS".to_string()),
            display_inches: Some(13.4),
        }
    }

    fn agent(rows: Vec<ProductRow>) -> ProductCatalogAgent {
        ProductCatalogAgent::new(Arc::new(FakeCatalog(rows)))
    }

    #[test]
    fn extracts_name_from_lexical_patterns_before_brand_scan() {
        let agent = agent(vec![]);
        assert_eq!(
            agent
                .extract_product_name("cho tôi tham khảo laptop Dell XPS 13")
                .as_deref(),
            Some("Dell XPS 13")
        );
        // No lexical trigger word: the brand scan kicks in.
        assert_eq!(
            agent
                .extract_product_name("Dell XPS 13 còn hàng không")
                .as_deref(),
            Some("Dell XPS 13")
        );
        assert_eq!(agent.extract_product_name("xin chào shop"), None);
    }

    #[tokio::test]
    async fn general_mention_returns_offer_with_confirmation() {
        let agent = agent(vec![product(12, "Dell XPS 13"), product(13, "Dell XPS 15")]);
        let payload = agent
            .get_context(&ChatQuery::anonymous("tôi muốn tham khảo laptop Dell XPS"))
            .await
            .unwrap();
        let offer = payload.as_offer().expect("structured offer");
        assert_eq!(offer.product_id, 12);
        assert!(offer.awaiting_confirmation);
        assert!(offer.text.contains("thêm sản phẩm này vào giỏ hàng"));
    }

    #[tokio::test]
    async fn detail_request_returns_plain_listing() {
        let agent = agent(vec![product(12, "Dell XPS 13")]);
        let payload = agent
            .get_context(&ChatQuery::anonymous("thông số laptop Dell XPS 13"))
            .await
            .unwrap();
        assert!(payload.as_offer().is_none());
        assert!(payload.as_text().contains("Intel Core i7"));
    }

    #[tokio::test]
    async fn unknown_product_degrades_to_explanatory_text() {
        let agent = agent(vec![]);
        let payload = agent
            .get_context(&ChatQuery::anonymous("laptop Acer Nitro"))
            .await
            .unwrap();
        assert!(payload.as_text().contains("Không tìm thấy"));
    }
}
