//! Static retailer catalog.
//!
//! Endpoint URLs and harvested routes were collected by watching each
//! retailer's own site traffic; selector maps track their current listing
//! markup. Expect to revisit these when a retailer redesigns.

use super::{
    DirectApiConfig, DomSelectors, EmbeddedPattern, GraphqlConfig, HarvestedConfig,
    RequestShape, RetailerConfig,
};

static AMAZON: RetailerConfig = RetailerConfig {
    key: "amazon",
    name: "Amazon",
    origin: "https://www.amazon.in",
    search_url: "https://www.amazon.in/s?k={query}",
    // No stable public JSON search API; browser path carries this retailer.
    direct_api: None,
    graphql: None,
    harvested: Some(HarvestedConfig {
        url: "https://completion.amazon.in/api/2017/suggestions?mid=A21TJRUUN4KGV&alias=aps&prefix={query}",
        html: false,
    }),
    headers: &[("Accept", "application/json, text/html;q=0.9")],
    dom: DomSelectors {
        container: "div[data-component-type='s-search-result']",
        name: "h2 a span, span.a-text-normal",
        price: "span.a-price > span.a-offscreen",
        original_price: Some("span.a-price.a-text-price > span.a-offscreen"),
        image: "img.s-image",
        link: "h2 a, a.a-link-normal.s-no-outline",
        rating: Some("span.a-icon-alt"),
    },
    embedded: &[],
    consent_selectors: &["#sp-cc-accept", "input[data-action-type='DISMISS']"],
};

static FLIPKART: RetailerConfig = RetailerConfig {
    key: "flipkart",
    name: "Flipkart",
    origin: "https://www.flipkart.com",
    search_url: "https://www.flipkart.com/search?q={query}",
    direct_api: Some(DirectApiConfig {
        url: "https://2.rome.api.flipkart.com/api/4/page/fetch",
        shape: RequestShape::JsonBody,
        body: Some(r#"{"pageUri":"/search?q={query}","pageContext":{"fetchSeoData":false}}"#),
    }),
    graphql: None,
    harvested: Some(HarvestedConfig {
        url: "https://www.flipkart.com/search?q={query}",
        html: true,
    }),
    headers: &[
        ("X-User-Agent", "Mozilla/5.0 FKUA/website/42/website/Desktop"),
        ("Content-Type", "application/json"),
    ],
    dom: DomSelectors {
        container: "div[data-id]",
        name: "div.KzDlHZ, a.s1Q9rs, a.WKTcLC",
        price: "div.Nx9bqj",
        original_price: Some("div.yRaY8j"),
        image: "img.DByuf4, img._53J4C-",
        link: "a.CGtC98, a.s1Q9rs, a.WKTcLC",
        rating: Some("div.XQDdHH"),
    },
    embedded: &[
        EmbeddedPattern {
            pattern: r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.+?\})\s*;\s*</script>",
            path: "pageDataV4.page.data.10002",
        },
        EmbeddedPattern {
            pattern: r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.+?\});",
            path: "pageDataV4.page.data",
        },
    ],
    consent_selectors: &["button._2KpZ6l._2doB4z", "span._30XB9F"],
};

static CROMA: RetailerConfig = RetailerConfig {
    key: "croma",
    name: "Croma",
    origin: "https://www.croma.com",
    search_url: "https://www.croma.com/searchB?q={query}",
    direct_api: Some(DirectApiConfig {
        url: "https://api.croma.com/searchservices/v1/search?currentPage=0&query={query}&fields=FULL&channel=WEB",
        shape: RequestShape::QueryString,
        body: None,
    }),
    graphql: None,
    harvested: Some(HarvestedConfig {
        url: "https://api.croma.com/searchservices/v1/autocomplete?term={query}",
        html: false,
    }),
    headers: &[("Accept", "application/json"), ("oc-env", "production")],
    dom: DomSelectors {
        container: "li.product-item",
        name: "h3.product-title a",
        price: "span.amount, span.new-price",
        original_price: Some("span.old-price"),
        image: "img[data-src], img.product-img",
        link: "h3.product-title a",
        rating: Some("span.rating-text"),
    },
    embedded: &[],
    consent_selectors: &["#wzrk-cancel", "button.cookie-accept"],
};

static AJIO: RetailerConfig = RetailerConfig {
    key: "ajio",
    name: "AJIO",
    origin: "https://www.ajio.com",
    search_url: "https://www.ajio.com/search/?text={query}",
    direct_api: Some(DirectApiConfig {
        url: "https://www.ajio.com/api/search?fields=SITE&query={query}%3Arelevance&pageSize=45&currentPage=0",
        shape: RequestShape::QueryString,
        body: None,
    }),
    graphql: None,
    harvested: None,
    headers: &[("Accept", "application/json")],
    dom: DomSelectors {
        container: "div.item.rilrtl-products-list__item",
        name: "div.nameCls",
        price: "span.price",
        original_price: Some("span.orginal-price"),
        image: "img.rilrtl-lazy-img",
        link: "a.rilrtl-products-list__link",
        rating: Some("p._3I65V"),
    },
    embedded: &[EmbeddedPattern {
        pattern: r"(?s)window\.__PRELOADED_STATE__\s*=\s*(\{.+?\})\s*;?\s*</script>",
        path: "search.searchData.products",
    }],
    consent_selectors: &["div.ic-cross", "span.close-icon"],
};

static SNAPDEAL: RetailerConfig = RetailerConfig {
    key: "snapdeal",
    name: "Snapdeal",
    origin: "https://www.snapdeal.com",
    search_url: "https://www.snapdeal.com/search?keyword={query}",
    direct_api: None,
    graphql: Some(GraphqlConfig {
        url: "https://apigateway.snapdeal.com/graphql",
        document: "query search($keyword: String!, $start: Int) { searchProducts(keyword: $keyword, start: $start) { products { id name displayPrice mrp imagePath pageUrl avgRating } } }",
    }),
    harvested: Some(HarvestedConfig {
        url: "https://www.snapdeal.com/acors/json/product/get/search/0/0/20?keyword={query}&sort=rlvncy",
        html: false,
    }),
    headers: &[("Accept", "application/json")],
    dom: DomSelectors {
        container: "div.product-tuple-listing",
        name: "p.product-title",
        price: "span.product-price",
        original_price: Some("span.product-desc-price"),
        image: "img.product-image",
        link: "a.dp-widget-link",
        rating: Some("div.filled-stars"),
    },
    embedded: &[],
    consent_selectors: &["a.close-icon"],
};

/// The built-in catalog, in dispatch order.
#[must_use]
pub fn default_retailer_configs() -> &'static [&'static RetailerConfig] {
    &[&AMAZON, &CROMA, &FLIPKART, &AJIO, &SNAPDEAL]
}
