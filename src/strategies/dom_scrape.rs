//! DOM-scrape fallback.
//!
//! Last resort inside the browser strategy: parse the rendered HTML with
//! the retailer's CSS selector map. Capped at the first 20 matching
//! containers; containers missing a name or price are dropped whole.
//! Kept as a pure function over an HTML string so it is testable without
//! a browser.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::models::Product;
use crate::normalize::{absolutize, clean_price, parse_rating};
use crate::retailers::Retailer;
use crate::utils::DOM_SCRAPE_CONTAINER_CAP;

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("invalid selector {css:?}: {e}");
            None
        }
    }
}

fn select_text(container: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = container.select(selector).next()?;
    let text: String = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn select_attr(container: ElementRef<'_>, selector: &Selector, attrs: &[&str]) -> Option<String> {
    let element = container.select(selector).next()?;
    for attr in attrs {
        if let Some(value) = element.value().attr(attr)
            && !value.trim().is_empty()
        {
            return Some(value.trim().to_string());
        }
    }
    None
}

/// Scrape products out of rendered search-page HTML.
#[must_use]
pub fn scrape_products(html: &str, retailer: &Retailer) -> Vec<Product> {
    let cfg = retailer.config;
    let document = Html::parse_document(html);

    let Some(container_sel) = parse_selector(cfg.dom.container) else {
        return Vec::new();
    };
    let Some(name_sel) = parse_selector(cfg.dom.name) else {
        return Vec::new();
    };
    let Some(price_sel) = parse_selector(cfg.dom.price) else {
        return Vec::new();
    };
    let image_sel = parse_selector(cfg.dom.image);
    let link_sel = parse_selector(cfg.dom.link);
    let original_sel = cfg.dom.original_price.and_then(parse_selector);
    let rating_sel = cfg.dom.rating.and_then(parse_selector);

    let mut products = Vec::new();

    for container in document.select(&container_sel).take(DOM_SCRAPE_CONTAINER_CAP) {
        let Some(name) = select_text(container, &name_sel) else {
            continue;
        };
        let Some(price) = select_text(container, &price_sel).and_then(|p| clean_price(&p)) else {
            continue;
        };

        let detail_url = link_sel
            .as_ref()
            .and_then(|sel| select_attr(container, sel, &["href"]))
            .map(|href| absolutize(cfg.origin, &href));
        let image_url = image_sel
            .as_ref()
            .and_then(|sel| select_attr(container, sel, &["src", "data-src", "data-lazy-src"]))
            .map(|src| absolutize(cfg.origin, &src));
        let original_price = original_sel
            .as_ref()
            .and_then(|sel| select_text(container, sel))
            .and_then(|p| clean_price(&p))
            .filter(|p| *p != price);
        let rating = rating_sel
            .as_ref()
            .and_then(|sel| select_text(container, sel))
            .and_then(|r| parse_rating(&r));

        // Stable-ish id: the data-id attribute when the container carries
        // one, else the detail URL, else the name.
        let id = container
            .value()
            .attr("data-id")
            .map(str::to_string)
            .or_else(|| detail_url.clone())
            .unwrap_or_else(|| name.clone());

        products.push(Product {
            id,
            name,
            price,
            original_price,
            image_url,
            detail_url,
            retailer: cfg.name.to_string(),
            rating,
        });
    }

    debug!(
        retailer = cfg.key,
        count = products.len(),
        "dom scrape finished"
    );
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retailers::RetailerRegistry;

    fn flipkart_card(id: &str, name: &str, price: &str) -> String {
        format!(
            r#"<div data-id="{id}">
                 <a class="CGtC98" href="/p/{id}">
                   <div class="KzDlHZ">{name}</div>
                 </a>
                 <div class="Nx9bqj">{price}</div>
                 <div class="yRaY8j">₹19,999</div>
                 <div class="XQDdHH">4.4</div>
               </div>"#
        )
    }

    #[test]
    fn scrapes_complete_cards_and_drops_partial() {
        let html = format!(
            "<html><body>{}{}<div data-id=\"X3\"><div class=\"KzDlHZ\">No price card</div></div></body></html>",
            flipkart_card("A1", "Galaxy M15", "₹11,499"),
            flipkart_card("A2", "Galaxy A25", "₹17,999"),
        );
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("flipkart").unwrap();

        let products = scrape_products(&html, retailer);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "A1");
        assert_eq!(products[0].price, "11499");
        assert_eq!(products[0].original_price.as_deref(), Some("19999"));
        assert_eq!(
            products[0].detail_url.as_deref(),
            Some("https://www.flipkart.com/p/A1")
        );
        assert_eq!(products[0].rating, Some(4.4));
    }

    #[test]
    fn container_cap_limits_output() {
        let cards: String = (0..40)
            .map(|i| flipkart_card(&format!("C{i}"), "Widget", "999"))
            .collect();
        let html = format!("<html><body>{cards}</body></html>");
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("flipkart").unwrap();

        let products = scrape_products(&html, retailer);
        assert_eq!(products.len(), DOM_SCRAPE_CONTAINER_CAP);
    }

    #[test]
    fn empty_page_yields_nothing() {
        let registry = RetailerRegistry::with_defaults();
        let retailer = registry.get("flipkart").unwrap();
        assert!(scrape_products("<html><body></body></html>", retailer).is_empty());
    }
}
