//! In-memory browser serving saved HTML pages.
//!
//! Pages are parsed once with `scraper` and converted to an owned tree, so
//! element handles are cheap to clone and can cross await points. Declarative
//! shadow roots (`<template shadowrootmode="open">`) become the host element's
//! shadow subtree and are invisible to ordinary lookups.
//!
//! The page is static: a lookup either matches immediately or reports a
//! timeout without sleeping. Every lookup's timeout is recorded in the
//! [`Journal`].

use super::{Browser, DriverError, Element, Locator};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
enum Node {
    Element(Arc<ElementNode>),
    Text(String),
}

#[derive(Debug)]
struct ElementNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Node>,
    shadow: Option<Arc<ElementNode>>,
}

impl ElementNode {
    fn from_html(html: &str) -> Arc<Self> {
        let document = Html::parse_document(html);
        Arc::new(Self::convert(document.root_element()))
    }

    fn convert(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let mut node = Self {
            tag: value.name().to_ascii_lowercase(),
            attrs: value.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            children: Vec::new(),
            shadow: None,
        };

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                let converted = Self::convert(child_element);
                if converted.tag == "template" && converted.attrs.contains_key("shadowrootmode") {
                    node.shadow = Some(Arc::new(Self {
                        tag: "#shadow-root".to_string(),
                        attrs: BTreeMap::new(),
                        children: converted.children,
                        shadow: None,
                    }));
                } else {
                    node.children.push(Node::Element(Arc::new(converted)));
                }
            } else if let scraper::Node::Text(text) = child.value() {
                let content: &str = text;
                node.children.push(Node::Text(content.to_string()));
            }
        }

        node
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Id(id) => self.attrs.get("id").is_some_and(|v| v == id),
            Locator::Class(class) => self
                .attrs
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == *class)),
            Locator::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
            Locator::Attr { tag, name, value } => {
                self.tag.eq_ignore_ascii_case(tag) && self.attrs.get(*name).is_some_and(|v| v == value)
            }
            Locator::AnyOf(alternatives) => alternatives.iter().any(|l| self.matches(l)),
        }
    }

    /// Descendants in document order, not crossing shadow boundaries.
    fn collect(&self, locator: &Locator, out: &mut Vec<Arc<ElementNode>>) {
        for child in &self.children {
            if let Node::Element(element) = child {
                if element.matches(locator) {
                    out.push(Arc::clone(element));
                }
                element.collect(locator, out);
            }
        }
    }

    fn push_text(&self, out: &mut String) {
        if matches!(self.tag.as_str(), "script" | "style" | "template") {
            return;
        }
        for child in &self.children {
            match child {
                Node::Text(text) => {
                    out.push(' ');
                    out.push_str(text);
                }
                Node::Element(element) => element.push_text(out),
            }
        }
    }

    fn is_clickable(&self) -> bool {
        !self.attrs.contains_key("disabled") && !self.attrs.contains_key("hidden")
    }

    fn describe(&self) -> String {
        match (self.attrs.get("id"), self.attrs.get("class")) {
            (Some(id), _) => format!("{}#{}", self.tag, id),
            (None, Some(class)) => format!("{}.{}", self.tag, class.split_whitespace().collect::<Vec<_>>().join(".")),
            (None, None) => self.tag.clone(),
        }
    }
}

/// One element lookup as seen by the fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub selector: String,
    pub timeout: Duration,
}

/// Record of everything done against a [`FixtureBrowser`].
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub visited: Vec<String>,
    pub lookups: Vec<Lookup>,
    pub clicks: Vec<String>,
    pub quits: usize,
}

impl Journal {
    /// Timeouts requested for lookups of `locator`, in call order.
    pub fn timeouts_for(&self, locator: &Locator) -> Vec<Duration> {
        let selector = locator.css();
        self.lookups.iter().filter(|l| l.selector == selector).map(|l| l.timeout).collect()
    }
}

type SharedJournal = Arc<Mutex<Journal>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Element handle into a fixture page.
#[derive(Debug, Clone)]
pub struct FixtureElement {
    node: Arc<ElementNode>,
    journal: SharedJournal,
}

impl FixtureElement {
    fn record(&self, locator: &Locator, timeout: Duration) {
        lock(&self.journal).lookups.push(Lookup { selector: locator.css(), timeout });
    }

    fn wrap(&self, nodes: Vec<Arc<ElementNode>>) -> Vec<Self> {
        nodes.into_iter().map(|node| Self { node, journal: Arc::clone(&self.journal) }).collect()
    }
}

#[async_trait]
impl Element for FixtureElement {
    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self>, DriverError> {
        self.record(locator, timeout);
        let mut found = Vec::new();
        self.node.collect(locator, &mut found);
        Ok(self.wrap(found))
    }

    async fn find_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self>, DriverError> {
        self.record(locator, timeout);
        let mut found = Vec::new();
        self.node.collect(locator, &mut found);
        found.retain(|node| node.is_clickable());
        Ok(self.wrap(found).into_iter().next())
    }

    async fn shadow_root(&self) -> Result<Self, DriverError> {
        match &self.node.shadow {
            Some(shadow) => Ok(Self { node: Arc::clone(shadow), journal: Arc::clone(&self.journal) }),
            None => Err(DriverError::NoShadowRoot(self.node.describe())),
        }
    }

    async fn text(&self) -> Result<String, DriverError> {
        let mut raw = String::new();
        self.node.push_text(&mut raw);
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.node.attrs.get(name).cloned())
    }

    async fn click(&self) -> Result<(), DriverError> {
        lock(&self.journal).clicks.push(self.node.describe());
        Ok(())
    }
}

/// Browser serving pre-registered pages by URL.
#[derive(Debug, Default)]
pub struct FixtureBrowser {
    pages: HashMap<String, Arc<ElementNode>>,
    fallback: Option<Arc<ElementNode>>,
    current: Mutex<Option<Arc<ElementNode>>>,
    journal: SharedJournal,
    closed: bool,
}

impl FixtureBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` when the browser navigates to exactly `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: &str) -> Self {
        self.pages.insert(url.into(), ElementNode::from_html(html));
        self
    }

    /// Serves `html` for any URL without a registered page.
    pub fn with_fallback_page(mut self, html: &str) -> Self {
        self.fallback = Some(ElementNode::from_html(html));
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn journal(&self) -> Journal {
        lock(&self.journal).clone()
    }

    /// Shared handle to the journal, still readable after the browser moves.
    pub fn journal_handle(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    fn document(&self) -> Result<Option<FixtureElement>, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        Ok(lock(&self.current)
            .as_ref()
            .map(|node| FixtureElement { node: Arc::clone(node), journal: Arc::clone(&self.journal) }))
    }
}

#[async_trait]
impl Browser for FixtureBrowser {
    type Element = FixtureElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        lock(&self.journal).visited.push(url.to_string());

        let page = self.pages.get(url).or(self.fallback.as_ref()).cloned().ok_or_else(|| {
            DriverError::Navigation { url: url.to_string(), reason: "no fixture page".to_string() }
        })?;
        *lock(&self.current) = Some(page);
        Ok(())
    }

    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<FixtureElement>, DriverError> {
        match self.document()? {
            Some(document) => document.find_all(locator, timeout).await,
            None => {
                lock(&self.journal).lookups.push(Lookup { selector: locator.css(), timeout });
                Ok(Vec::new())
            }
        }
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        if !self.closed {
            self.closed = true;
            *lock(&self.current) = None;
            lock(&self.journal).quits += 1;
        }
        Ok(())
    }
}
