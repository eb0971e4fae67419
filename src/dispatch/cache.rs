//! Rendered page cache.
//!
//! # Responsibilities
//! - Store serialized page bodies keyed by method, route and params, before
//!   the bootstrap block is injected
//! - Keep the hydration state and scripts the render itself produced, so a
//!   hit can replay them into the current request
//! - Expire entries after the duration the page component asked for
//! - Bound the number of stored pages
//!
//! # Design Decisions
//! - `DashMap` for lock-free reads across request threads
//! - Expired entries are dropped lazily on read and by `purge_expired`
//! - Inserts over the bound are skipped after one purge attempt; a page
//!   that is not cached renders normally

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Method, StatusCode};
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::dispatch::hydration::ScriptBag;
use crate::routing::PathParams;

/// Identity of a cacheable render.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: Method,
    pub route: String,
    pub params: PathParams,
}

impl CacheKey {
    pub fn new(method: Method, route: impl Into<String>, params: PathParams) -> Self {
        Self {
            method,
            route: route.into(),
            params,
        }
    }
}

/// A stored page.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Markup without the bootstrap block.
    pub body: String,
    /// State entries the render added or changed.
    pub state: Map<String, Value>,
    /// Scripts the render pushed.
    pub scripts: ScriptBag,
    expires_at: Instant,
}

impl CachedPage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
            state: Map::new(),
            scripts: ScriptBag::default(),
            expires_at: Instant::now(),
        }
    }

    pub fn with_hydration(mut self, state: Map<String, Value>, scripts: ScriptBag) -> Self {
        self.state = state;
        self.scripts = scripts;
        self
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A thread-safe cache for rendered pages.
#[derive(Clone)]
pub struct RenderCache {
    inner: Arc<DashMap<CacheKey, CachedPage>>,
    max_entries: usize,
}

impl RenderCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    /// Fresh page for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<CachedPage> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<CachedPage> {
        let page = self.inner.get(key).map(|r| r.value().clone())?;
        if page.is_fresh(now) {
            Some(page)
        } else {
            self.inner.remove_if(key, |_, p| !p.is_fresh(now));
            None
        }
    }

    /// Store a page for `ttl`. Returns false when the cache is full.
    pub fn insert(&self, key: CacheKey, page: CachedPage, ttl: Duration) -> bool {
        self.insert_at(key, page, ttl, Instant::now())
    }

    pub fn insert_at(&self, key: CacheKey, mut page: CachedPage, ttl: Duration, now: Instant) -> bool {
        if !self.inner.contains_key(&key) && self.inner.len() >= self.max_entries {
            self.purge_expired_at(now);
            if self.inner.len() >= self.max_entries {
                tracing::debug!(route = %key.route, entries = self.inner.len(), "Render cache full, skipping insert");
                return false;
            }
        }

        page.expires_at = now + ttl;
        self.inner.insert(key, page);
        true
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, page| page.is_fresh(now));
        before.saturating_sub(self.inner.len())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}
