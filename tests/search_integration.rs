//! Integration tests for sessions and extraction using fixture pages.

use std::collections::BTreeMap;
use std::time::Duration;
use streamfinder::browser::FixtureBrowser;
use streamfinder::justwatch::selectors::{self, consent, search};
use streamfinder::justwatch::{SessionOptions, Timeouts};
use streamfinder::{Country, LookupError, Offer, Session};

const HOME_FIXTURE: &str = include_str!("fixtures/home.html");
const INCEPTION_FIXTURE: &str = include_str!("fixtures/search_inception.html");
const WRAPPED_FIXTURE: &str = include_str!("fixtures/search_wrapped.html");
const FLAT_FIXTURE: &str = include_str!("fixtures/search_flat.html");

fn browser_with(query: &str, results: &str) -> FixtureBrowser {
    let url = selectors::search_url(selectors::BASE_URL, &Country::default(), query);
    FixtureBrowser::new().with_page(selectors::BASE_URL, HOME_FIXTURE).with_page(url, results)
}

#[tokio::test]
async fn test_search_inception() {
    let session = Session::open(browser_with("Inception", INCEPTION_FIXTURE), SessionOptions::default())
        .await
        .unwrap();

    let entries = session.search("Inception").await.unwrap();

    let mut expected = BTreeMap::new();
    expected.insert(
        "Buy".to_string(),
        vec![Offer::new("ExampleStore", "https://example.com/buy", "$9.99 HD")],
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Inception");
    assert_eq!(entries[0].year, "2010");
    assert_eq!(entries[0].offers_by_category, expected);
}

#[tokio::test]
async fn test_open_dismisses_consent_overlay() {
    let browser = browser_with("Inception", INCEPTION_FIXTURE);
    let journal = browser.journal_handle();

    let session = Session::open(browser, SessionOptions::default()).await.unwrap();

    let journal = journal.lock().unwrap().clone();
    assert_eq!(journal.visited, vec![selectors::BASE_URL.to_string()]);
    assert_eq!(journal.clicks.len(), 1);
    assert_eq!(journal.timeouts_for(&consent::OVERLAY), vec![Duration::from_secs(10)]);
    assert!(!session.is_closed());
}

#[tokio::test]
async fn test_search_wrapped_buybox() {
    let session = Session::open(browser_with("The Matrix", WRAPPED_FIXTURE), SessionOptions::default())
        .await
        .unwrap();

    let entries = session.search("The Matrix").await.unwrap();
    assert_eq!(entries.len(), 3);

    // Page order is kept
    let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["The Matrix", "The Matrix Revisited", "The Matrix Resurrections"]);

    let matrix = &entries[0];
    assert_eq!(matrix.year, "1999");
    assert_eq!(matrix.offer_count(), 4);

    let stream = matrix.offers("Stream").unwrap();
    assert_eq!(stream.len(), 2);
    assert_eq!(stream[0].provider_name, "Netflix");
    assert_eq!(stream[0].label, "4K");
    assert_eq!(stream[1].provider_name, "Max");

    let rent = matrix.offers("Rent").unwrap();
    assert_eq!(rent[0].deep_link, "https://tv.apple.com/us/movie/the-matrix");
    assert_eq!(rent[0].label, "$3.99 4K");

    // Labels that are already capitalized are kept; relative links are resolved
    let buy = matrix.offers("4K BUY").unwrap();
    assert_eq!(buy[0].provider_name, "Vudu");
    assert_eq!(buy[0].deep_link, "https://www.justwatch.com/us/buy/matrix");

    let revisited = &entries[1];
    assert_eq!(revisited.year, "");
    assert!(!revisited.has_offers());

    assert_eq!(entries[2].year, "2021");
    assert_eq!(entries[2].offers("Stream").unwrap()[0].provider_name, "Max");
}

#[tokio::test]
async fn test_search_flat_buybox() {
    let session = Session::open(browser_with("Paddington", FLAT_FIXTURE), SessionOptions::default())
        .await
        .unwrap();

    let entries = session.search("Paddington").await.unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].title, "Paddington 2");
    assert_eq!(entries[0].year, "2017");
    let stream = entries[0].offers("Stream").unwrap();
    assert_eq!(stream[0].provider_name, "Amazon Prime Video");
    assert_eq!(stream[0].deep_link, "https://www.primevideo.com/detail/paddington2");

    assert_eq!(entries[1].title, "Paddington");
    assert!(entries[1].offers_by_category.is_empty());
}

#[tokio::test]
async fn test_no_offers_check_does_not_wait() {
    let browser = browser_with("The Matrix", WRAPPED_FIXTURE);
    let journal = browser.journal_handle();

    let session = Session::open(browser, SessionOptions::default()).await.unwrap();
    session.search("The Matrix").await.unwrap();

    let journal = journal.lock().unwrap().clone();
    let no_offer_waits = journal.timeouts_for(&search::NO_OFFERS);
    assert_eq!(no_offer_waits.len(), 3);
    assert!(no_offer_waits.iter().all(|t| t.is_zero()));
    assert_eq!(journal.timeouts_for(&search::ROW), vec![Duration::from_secs(10)]);
}

#[tokio::test]
async fn test_every_entry_has_title_and_year_shape() {
    for (query, page) in
        [("Inception", INCEPTION_FIXTURE), ("The Matrix", WRAPPED_FIXTURE), ("Paddington", FLAT_FIXTURE)]
    {
        let session =
            Session::open(browser_with(query, page), SessionOptions::default()).await.unwrap();

        for entry in session.search(query).await.unwrap() {
            assert!(!entry.title.is_empty());
            assert!(entry.year.is_empty() || (entry.year.len() == 4 && entry.year.chars().all(|c| c.is_ascii_digit())));
            for (category, offers) in &entry.offers_by_category {
                assert!(category.starts_with(|c: char| !c.is_lowercase()));
                assert!(offers.iter().all(|o| !o.provider_name.is_empty()));
            }
        }
    }
}

#[tokio::test]
async fn test_search_without_rows_is_no_results() {
    let browser = browser_with("Inception", INCEPTION_FIXTURE)
        .with_fallback_page("<html><body><p>No results</p></body></html>");
    let options = SessionOptions {
        timeouts: Timeouts { results: Duration::from_secs(3), ..Timeouts::default() },
        ..SessionOptions::default()
    };
    let session = Session::open(browser, options).await.unwrap();

    match session.search("qwertyuiop").await {
        Err(LookupError::NoResults { query, waited }) => {
            assert_eq!(query, "qwertyuiop");
            assert_eq!(waited, Duration::from_secs(3));
        }
        other => panic!("expected NoResults, got {:?}", other),
    }
}

#[tokio::test]
async fn test_country_in_search_url() {
    let country: Country = "de".parse().unwrap();
    let url = selectors::search_url(selectors::BASE_URL, &country, "Inception");
    assert_eq!(url, "https://www.justwatch.com/de/search?q=Inception");

    let browser = FixtureBrowser::new()
        .with_page(selectors::BASE_URL, HOME_FIXTURE)
        .with_page(url.clone(), INCEPTION_FIXTURE);
    let journal = browser.journal_handle();
    let options = SessionOptions { country, ..SessionOptions::default() };

    let session = Session::open(browser, options).await.unwrap();
    assert_eq!(session.search("Inception").await.unwrap().len(), 1);
    assert_eq!(journal.lock().unwrap().visited.last(), Some(&url));
}

#[tokio::test]
async fn test_close_twice_releases_once() {
    let browser = browser_with("Inception", INCEPTION_FIXTURE);
    let journal = browser.journal_handle();

    let mut session = Session::open(browser, SessionOptions::default()).await.unwrap();
    session.close().await;
    session.close().await;

    assert!(session.is_closed());
    assert_eq!(journal.lock().unwrap().quits, 1);
    assert!(matches!(session.search("Inception").await, Err(LookupError::Closed)));
}
