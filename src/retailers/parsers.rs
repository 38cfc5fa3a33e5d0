//! Per-retailer payload parsers.
//!
//! Each parser accepts whatever the strategies hand it — an API response
//! root, an embedded-state subtree, or a bare product array — locates the
//! product list by trying known key paths in order, and normalizes each
//! entry. Field names are tried in a fixed fallback order, first non-empty
//! wins. Entries without a name or parseable price are dropped whole.

use serde_json::Value;

use super::{PayloadParser, RetailerConfig};
use crate::models::Product;
use crate::normalize::{absolutize, clean_price, first_string, parse_rating, value_at};

/// Resolve the parser for a retailer key. Unknown keys get the generic
/// parser, which handles the common `{products: [...]}` shapes.
#[must_use]
pub fn parser_for(key: &str) -> PayloadParser {
    match key {
        "amazon" => parse_amazon,
        "flipkart" => parse_flipkart,
        "croma" => parse_croma,
        "ajio" => parse_ajio,
        "snapdeal" => parse_snapdeal,
        _ => parse_generic,
    }
}

/// Locate the product array: the payload itself if it is one, else the
/// first known path that resolves to a non-empty array.
fn locate_products<'a>(payload: &'a Value, paths: &[&str]) -> Option<&'a Vec<Value>> {
    if let Value::Array(items) = payload {
        return Some(items);
    }
    for path in paths {
        if let Some(Value::Array(items)) = value_at(payload, path)
            && !items.is_empty()
        {
            return Some(items);
        }
    }
    None
}

/// Field-name fallback orders for one retailer's entries.
struct FieldMap {
    id: &'static [&'static str],
    name: &'static [&'static str],
    price: &'static [&'static str],
    original_price: &'static [&'static str],
    image: &'static [&'static str],
    link: &'static [&'static str],
    rating: &'static [&'static str],
}

/// Build one normalized product from a raw entry, or `None` when the name
/// or price is missing/unparseable.
fn build_product(entry: &Value, cfg: &RetailerConfig, fields: &FieldMap) -> Option<Product> {
    let name = first_string(entry, fields.name)?;
    let price = clean_price(&first_string(entry, fields.price)?)?;

    let id = first_string(entry, fields.id).unwrap_or_else(|| name.clone());
    let original_price = first_string(entry, fields.original_price)
        .and_then(|p| clean_price(&p))
        .filter(|p| *p != price);
    let image_url = first_string(entry, fields.image).map(|u| absolutize(cfg.origin, &u));
    let detail_url = first_string(entry, fields.link).map(|u| absolutize(cfg.origin, &u));
    let rating = first_string(entry, fields.rating).and_then(|r| parse_rating(&r));

    Some(Product {
        id,
        name,
        price,
        original_price,
        image_url,
        detail_url,
        retailer: cfg.name.to_string(),
        rating,
    })
}

fn collect(payload: &Value, cfg: &RetailerConfig, paths: &[&str], fields: &FieldMap) -> Vec<Product> {
    let Some(items) = locate_products(payload, paths) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| build_product(entry, cfg, fields))
        .collect()
}

fn parse_amazon(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    // Amazon's suggestion API carries no prices; only sniffed search-ajax
    // payloads and DOM data reach this parser with full entries.
    static FIELDS: FieldMap = FieldMap {
        id: &["asin", "id"],
        name: &["title", "name", "value"],
        price: &["price", "priceAmount", "displayPrice"],
        original_price: &["listPrice", "basisPrice", "strikePrice"],
        image: &["imageUrl", "image", "mainImageUrl"],
        link: &["detailPageUrl", "url", "link"],
        rating: &["rating", "averageRating", "starRating"],
    };
    collect(
        payload,
        cfg,
        &["searchResults", "results", "products", "suggestions"],
        &FIELDS,
    )
}

fn parse_flipkart(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    // Rome API nests products inside slot widgets; embedded state hands us
    // the slot list directly. Unwrap both shapes before the field pass.
    static FIELDS: FieldMap = FieldMap {
        id: &["productId", "id", "itemId"],
        name: &["title", "name", "displayName"],
        price: &["finalPrice", "price", "sellingPrice", "value"],
        original_price: &["mrp", "originalPrice", "strikeOffPrice"],
        image: &["imageUrl", "image", "thumbnail"],
        link: &["baseUrl", "url", "seoUrl"],
        rating: &["rating", "averageRating"],
    };

    let mut out = Vec::new();
    let slot_paths = ["RESPONSE.slots", "page.data.10002", "slots", ""];
    for path in slot_paths {
        let located = if path.is_empty() {
            // Embedded-state extraction can hand us the slot array itself.
            match payload {
                Value::Array(_) => Some(payload),
                _ => None,
            }
        } else {
            value_at(payload, path)
        };
        if let Some(Value::Array(slots)) = located {
            for slot in slots {
                for product_path in [
                    "widget.data.products",
                    "data.products",
                    "widget.data.renderableComponents",
                ] {
                    if let Some(Value::Array(items)) = value_at(slot, product_path) {
                        for item in items {
                            // Entries wrap the real product in productInfo.value
                            let entry = value_at(item, "productInfo.value")
                                .or_else(|| value_at(item, "value"))
                                .unwrap_or(item);
                            if let Some(p) = build_product(entry, cfg, &FIELDS) {
                                out.push(p);
                            }
                        }
                    }
                }
            }
            if !out.is_empty() {
                return out;
            }
        }
    }

    collect(payload, cfg, &["products", "results"], &FIELDS)
}

fn parse_croma(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    static FIELDS: FieldMap = FieldMap {
        id: &["code", "productId", "id"],
        name: &["name", "title", "plpSellingPoint"],
        price: &["sellingPrice.formattedValue", "displayPrice", "price"],
        original_price: &["mrp.formattedValue", "mrp", "wasPrice"],
        image: &["plpImage", "imageUrl", "image"],
        link: &["url", "pdpUrl", "link"],
        rating: &["averageRating", "rating"],
    };
    // Croma formats prices under nested objects; flatten the two money
    // fields before the generic field pass.
    let Some(items) = locate_products(payload, &["products", "searchResult.products", "suggestions"]) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| {
            let mut flat = entry.clone();
            if let Some(formatted) = value_at(entry, "sellingPrice.formattedValue").cloned()
                && let Value::Object(map) = &mut flat
            {
                map.insert("sellingPrice.formattedValue".to_string(), formatted);
            }
            if let Some(formatted) = value_at(entry, "mrp.formattedValue").cloned()
                && let Value::Object(map) = &mut flat
            {
                map.insert("mrp.formattedValue".to_string(), formatted);
            }
            build_product(&flat, cfg, &FIELDS)
        })
        .collect()
}

fn parse_ajio(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    static FIELDS: FieldMap = FieldMap {
        id: &["code", "id"],
        name: &["name", "fnlColorVariantData.brandName"],
        price: &["price.value", "offerPrice", "price"],
        original_price: &["wasPriceData.value", "mrp"],
        image: &["images.0.url", "imageUrl"],
        link: &["url", "link"],
        rating: &["averageRating", "rating"],
    };
    let Some(items) = locate_products(payload, &["products", "search.searchData.products"]) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| {
            let mut flat = entry.clone();
            if let Value::Object(map) = &mut flat {
                for (src, key) in [
                    ("price.value", "price.value"),
                    ("wasPriceData.value", "wasPriceData.value"),
                    ("images.0.url", "images.0.url"),
                ] {
                    if let Some(v) = value_at(entry, src).cloned() {
                        map.insert(key.to_string(), v);
                    }
                }
            }
            build_product(&flat, cfg, &FIELDS)
        })
        .collect()
}

fn parse_snapdeal(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    static FIELDS: FieldMap = FieldMap {
        id: &["id", "pogId", "catalogId"],
        name: &["name", "title"],
        price: &["displayPrice", "price", "sellingPrice"],
        original_price: &["mrp", "originalPrice"],
        image: &["imagePath", "imageUrl", "image"],
        link: &["pageUrl", "url", "landingUrl"],
        rating: &["avgRating", "rating"],
    };
    collect(
        payload,
        cfg,
        &[
            "data.searchProducts.products",
            "searchProducts.products",
            "productOffers",
            "products",
        ],
        &FIELDS,
    )
}

fn parse_generic(payload: &Value, cfg: &RetailerConfig) -> Vec<Product> {
    static FIELDS: FieldMap = FieldMap {
        id: &["productId", "id", "code", "sku"],
        name: &["name", "title", "displayName"],
        price: &["price", "sellingPrice", "displayPrice", "finalPrice"],
        original_price: &["originalPrice", "mrp", "listPrice"],
        image: &["imageUrl", "image", "thumbnail"],
        link: &["url", "link", "detailUrl"],
        rating: &["rating", "averageRating"],
    };
    collect(payload, cfg, &["products", "results", "items", "data.products"], &FIELDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retailers::RetailerRegistry;
    use serde_json::json;

    fn registry_parse(key: &str, payload: Value) -> Vec<Product> {
        let registry = RetailerRegistry::with_defaults();
        registry.get(key).expect("retailer exists").parse(&payload)
    }

    #[test]
    fn generic_shape_parses_and_drops_malformed() {
        let payload = json!({
            "products": [
                {"id": "A1", "name": "Mixer Grinder", "price": "₹2,499.00", "url": "/p/a1"},
                {"id": "A2", "name": "", "price": "999"},
                {"id": "A3", "name": "No price here"}
            ]
        });
        let products = registry_parse("ajio", payload);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, "2499.00");
        assert_eq!(products[0].detail_url.as_deref(), Some("https://www.ajio.com/p/a1"));
    }

    #[test]
    fn snapdeal_graphql_shape() {
        let payload = json!({
            "data": {"searchProducts": {"products": [
                {"id": 101, "name": "Desk Lamp", "displayPrice": "Rs. 1,299", "mrp": "1,999",
                 "imagePath": "//img.snapdeal.com/lamp.jpg", "pageUrl": "/product/lamp/101",
                 "avgRating": "4.1"}
            ]}}
        });
        let products = registry_parse("snapdeal", payload);
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.id, "101");
        assert_eq!(p.price, "1299");
        assert_eq!(p.original_price.as_deref(), Some("1999"));
        assert_eq!(p.image_url.as_deref(), Some("https://img.snapdeal.com/lamp.jpg"));
        assert_eq!(p.rating, Some(4.1));
    }

    #[test]
    fn flipkart_slot_shape() {
        let payload = json!({
            "RESPONSE": {"slots": [
                {"widget": {"data": {"products": [
                    {"productInfo": {"value": {
                        "productId": "MOBG6VF5Q0GFVFMA",
                        "title": "Pixel 8a",
                        "finalPrice": {"value": 52999},
                        "mrp": {"value": 59999},
                        "baseUrl": "/pixel-8a/p/itm123"
                    }}}
                ]}}}
            ]}
        });
        // finalPrice is an object here; first_string skips it, entry dropped.
        // The wire shape with scalar prices must parse.
        let scalar = json!({
            "RESPONSE": {"slots": [
                {"widget": {"data": {"products": [
                    {"productInfo": {"value": {
                        "productId": "MOBG6VF5Q0GFVFMA",
                        "title": "Pixel 8a",
                        "finalPrice": "₹52,999",
                        "mrp": "₹59,999",
                        "baseUrl": "/pixel-8a/p/itm123"
                    }}}
                ]}}}
            ]}
        });
        assert!(registry_parse("flipkart", payload).is_empty());
        let products = registry_parse("flipkart", scalar);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, "52999");
        assert_eq!(products[0].id, "MOBG6VF5Q0GFVFMA");
    }

    #[test]
    fn bare_array_payload_is_accepted() {
        let payload = json!([
            {"id": "X", "name": "Kettle", "price": "1499"}
        ]);
        let products = registry_parse("ajio", payload);
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn original_price_equal_to_price_is_dropped() {
        let payload = json!({"products": [
            {"id": "Y", "name": "Toaster", "price": "999", "mrp": "999"}
        ]});
        let products = registry_parse("snapdeal", payload);
        assert_eq!(products[0].original_price, None);
    }
}
