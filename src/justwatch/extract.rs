//! Extraction of a [`MediaEntry`] from one search result row.

use crate::browser::Element;
use crate::error::{FieldError, LookupError};
use crate::justwatch::models::{MediaEntry, Offer};
use crate::justwatch::selectors::search;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Settings shared by every row of one result page.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Wait applied to lookups of elements expected to be present.
    pub wait: Duration,
    /// Used to resolve relative offer links.
    pub base_url: &'a str,
}

struct FieldFailure {
    field: &'static str,
    source: FieldError,
}

trait FieldContext<T> {
    fn field(self, name: &'static str) -> Result<T, FieldFailure>;
}

impl<T, E: Into<FieldError>> FieldContext<T> for Result<T, E> {
    fn field(self, name: &'static str) -> Result<T, FieldFailure> {
        self.map_err(|e| FieldFailure { field: name, source: e.into() })
    }
}

/// Extracts one result row. Either the whole entry is returned or an
/// [`LookupError::Extraction`] naming the row and the field that failed.
pub async fn parse_entry<E: Element>(
    row: &E,
    index: usize,
    ctx: &ExtractContext<'_>,
) -> Result<MediaEntry, LookupError> {
    let entry = extract_entry(row, ctx).await.map_err(|failure| LookupError::Extraction {
        row: index,
        field: failure.field,
        source: failure.source,
    })?;

    trace!("Parsed row {}: {} ({}), {} offers", index, entry.title, entry.year, entry.offer_count());
    Ok(entry)
}

async fn extract_entry<E: Element>(
    row: &E,
    ctx: &ExtractContext<'_>,
) -> Result<MediaEntry, FieldFailure> {
    let title = row.find(&search::TITLE, ctx.wait).await.field("title")?.text().await.field("title")?;
    if title.is_empty() {
        return Err(FieldError::Empty).field("title");
    }

    let year = row.find(&search::YEAR, ctx.wait).await.field("year")?.text().await.field("year")?;

    Ok(MediaEntry {
        title,
        year: strip_year(&year),
        offers_by_category: extract_offers(row, ctx).await?,
    })
}

async fn extract_offers<E: Element>(
    row: &E,
    ctx: &ExtractContext<'_>,
) -> Result<BTreeMap<String, Vec<Offer>>, FieldFailure> {
    // Offer rows sit either directly in the row or inside a buybox wrapper.
    // Wait for whichever the page renders, then look for the wrapper without
    // waiting again.
    row.find(&search::OFFER_AREA, ctx.wait).await.field("offers container")?;
    let container = row
        .find_all(&search::BUYBOX, Duration::ZERO)
        .await
        .field("offers container")?
        .into_iter()
        .next()
        .unwrap_or_else(|| row.clone());

    // The marker is usually absent; a zero wait keeps every row with offers
    // from paying the full timeout.
    let no_offers = container.find_all(&search::NO_OFFERS, Duration::ZERO).await.field("offers")?;
    if !no_offers.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut offers_by_category = BTreeMap::new();
    for category in container.find_all(&search::CATEGORY_ROW, ctx.wait).await.field("offers")? {
        let label = category
            .find(&search::CATEGORY_LABEL, ctx.wait)
            .await
            .field("category label")?
            .text()
            .await
            .field("category label")?;
        let label = capitalize_label(&label);
        if label.is_empty() {
            return Err(FieldError::Empty).field("category label");
        }

        let list = category.find(&search::CATEGORY_OFFERS, ctx.wait).await.field("offers")?;
        let mut offers = Vec::new();
        for offer in list.find_all(&search::OFFER, ctx.wait).await.field("offers")? {
            offers.push(extract_offer(&offer, ctx).await?);
        }

        if offers_by_category.insert(label.clone(), offers).is_some() {
            debug!("Category {} listed twice, keeping the last one", label);
        }
    }

    Ok(offers_by_category)
}

async fn extract_offer<E: Element>(
    offer: &E,
    ctx: &ExtractContext<'_>,
) -> Result<Offer, FieldFailure> {
    let icon = offer.find(&search::OFFER_ICON, ctx.wait).await.field("provider")?;
    let provider_name = accessible_name(&icon).await.field("provider")?;

    let href = offer
        .attr("href")
        .await
        .field("deep link")?
        .ok_or(FieldError::MissingAttribute("href"))
        .field("deep link")?;

    let label = offer
        .find(&search::OFFER_LABEL, ctx.wait)
        .await
        .field("price label")?
        .text()
        .await
        .field("price label")?;

    Ok(Offer { provider_name, deep_link: absolute_link(ctx.base_url, &href), label })
}

/// Accessible name of an image: `aria-label` overrides `alt`, and `title` is
/// the last resort.
async fn accessible_name<E: Element>(element: &E) -> Result<String, FieldError> {
    for attr in ["aria-label", "alt", "title"] {
        if let Some(value) = element.attr(attr).await? {
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
        }
    }
    Ok(String::new())
}

/// Normalizes the year text: "(2014)" becomes "2014". Anything that does not
/// contain a four-digit year yields an empty string.
pub fn strip_year(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '(' | ')')).collect();
    let cleaned = cleaned.trim();

    cleaned
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .unwrap_or_default()
        .to_string()
}

/// Uppercases the first character only: "stream" becomes "Stream", "4K BUY"
/// stays as is.
pub fn capitalize_label(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolves a link against the base URL. Protocol-relative links take the
/// base URL's scheme; path-relative ones are resolved from the site root.
pub fn absolute_link(base_url: &str, href: &str) -> String {
    let base = base_url.trim_end_matches('/');

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = base.split_once("://").map_or("https", |(scheme, _)| scheme);
        format!("{}://{}", scheme, rest)
    } else if href.starts_with('/') {
        format!("{}{}", base, href)
    } else if has_scheme(href) {
        href.to_string()
    } else {
        format!("{}/{}", base, href)
    }
}

fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
