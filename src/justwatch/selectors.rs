//! Element locators and URLs for JustWatch pages.
//!
//! Everything here is a contract with a site we do not control. Update this
//! file when JustWatch changes its markup, and add a fixture under
//! `tests/fixtures/` reproducing the new layout.

use crate::browser::Locator;
use crate::justwatch::country::Country;

/// Site root, loaded once when a session starts.
pub const BASE_URL: &str = "https://www.justwatch.com";

/// Builds the search page URL for `name` in `country`.
pub fn search_url(base_url: &str, country: &Country, name: &str) -> String {
    format!(
        "{}/{}/search?q={}",
        base_url.trim_end_matches('/'),
        country.url_segment(),
        urlencoding::encode(name)
    )
}

/// Cookie consent overlay.
pub mod consent {
    use super::*;

    /// Host element of the overlay; its markup lives in a shadow root.
    pub const OVERLAY: Locator = Locator::Id("usercentrics-root");

    /// Accept button inside the overlay's shadow root.
    pub const ACCEPT_BUTTON: Locator =
        Locator::Attr { tag: "button", name: "data-testid", value: "uc-accept-all-button" };
}

/// Search results page.
pub mod search {
    use super::*;

    /// One result (film or show).
    pub const ROW: Locator = Locator::Class("title-list-row__row");

    pub const TITLE: Locator = Locator::Class("header-title");

    /// Release year, rendered as "(2014)".
    pub const YEAR: Locator = Locator::Class("header-year");

    /// Wrapper around the offer rows on some page variants.
    pub const BUYBOX: Locator = Locator::Class("buybox__content");

    /// Marker shown instead of offer rows when nothing is available.
    pub const NO_OFFERS: Locator = Locator::Class("no-offer-row");

    /// One acquisition category (stream, rent, buy).
    pub const CATEGORY_ROW: Locator = Locator::Class("buybox-row");

    pub const CATEGORY_LABEL: Locator = Locator::Class("buybox-row__label");

    pub const CATEGORY_OFFERS: Locator = Locator::Class("buybox-row__offers");

    /// A single offer link.
    pub const OFFER: Locator = Locator::Class("offer");

    /// Provider logo; its accessible name is the provider.
    pub const OFFER_ICON: Locator = Locator::Tag("img");

    /// Price or quality text, e.g. "$3.99 HD".
    pub const OFFER_LABEL: Locator = Locator::Class("offer__label");

    /// Anything that shows the offer area of a row has rendered.
    pub const OFFER_AREA: Locator = Locator::AnyOf(&[BUYBOX, CATEGORY_ROW, NO_OFFERS]);
}
