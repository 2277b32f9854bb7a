//! Asset cache service: bounded memoization with on-demand population

use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, trace};

use super::key::CacheKey;
use crate::assets::{AssetBundle, DirectoryAssets, EmbeddedAssets};
use crate::config::Config;
use crate::errors::{AppError, AppResult, AssetError, AssetResult};
use crate::models::{Bitmap, Size};
use crate::rendering::{AssetRenderer, BitmapFontRenderer, TextRenderer};
use crate::utils::http_client::{HttpImageFetcher, ImageFetcher};
use crate::utils::url::UrlUtils;

/// Widest tag text laid out before the badge stops growing
const MAX_TAG_TEXT_WIDTH: f32 = 200.0;

/// One population per key; concurrent misses wait on the same cell
type Flight = Arc<OnceCell<Option<Arc<Bitmap>>>>;

/// Registry of running populations; only locked briefly and never across an await
type FlightMap = std::sync::Mutex<HashMap<CacheKey, Flight>>;

/// Bounded in-memory cache of decoded and generated bitmaps
///
/// Build one per process at the composition root and share it behind an `Arc`.
/// Entries are write-once; they leave the cache only through LRU eviction.
pub struct AssetCache {
    entries: Mutex<LruCache<CacheKey, Arc<Bitmap>>>,
    in_flight: FlightMap,
    capacity: NonZeroUsize,
    fetcher: Arc<dyn ImageFetcher>,
    bundle: Arc<dyn AssetBundle>,
    renderer: AssetRenderer,
    placeholder_name: String,
    counters: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time view of cache activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    /// Requests answered from stored entries
    pub hits: u64,
    /// Populations started (fetch/decode or draw work performed)
    pub misses: u64,
    /// Requests that joined a population already running for the same key
    pub coalesced: u64,
    /// Populations that produced no entry
    pub failures: u64,
    pub evictions: u64,
    pub in_flight: usize,
}

impl AssetCache {
    pub fn builder(config: &Config) -> AssetCacheBuilder {
        AssetCacheBuilder::new(config.clone())
    }

    /// Remote image, optionally stretched to `size`; `None` on any fetch or decode failure
    pub async fn fetch_remote_image(&self, url: &str, size: Option<Size>) -> Option<Arc<Bitmap>> {
        let key = CacheKey::remote_image(url, size);
        let target = size.map(|s| s.to_pixels(self.renderer.scale()));

        self.get_or_populate(key, || async move {
            let bytes = self.fetcher.fetch_bytes(url).await?;
            decode_and_fit(bytes, UrlUtils::obfuscate_credentials(url), target).await
        })
        .await
    }

    /// Bundled placeholder stretched to `size`; `None` if the asset is missing or corrupt
    pub async fn placeholder(&self, size: Size) -> Option<Arc<Bitmap>> {
        let key = CacheKey::Placeholder { size };
        let target = Some(size.to_pixels(self.renderer.scale()));

        self.get_or_populate(key, || async move {
            let bytes = self.bundle.load(&self.placeholder_name).await?;
            decode_and_fit(bytes, self.placeholder_name.clone(), target).await
        })
        .await
    }

    /// Pennant-shaped label for `text`
    ///
    /// # Panics
    ///
    /// If the raster pipeline cannot produce a surface, which only happens when
    /// the process is out of memory.
    pub async fn tag_badge(&self, text: &str) -> Arc<Bitmap> {
        self.render(CacheKey::tag_badge(text), || self.renderer.tag_badge(text))
            .await
    }

    /// Outlined "stock" (saved) icon at `size`
    ///
    /// # Panics
    ///
    /// Same conditions as [`AssetCache::tag_badge`].
    pub async fn stock_icon(&self, size: Size) -> Arc<Bitmap> {
        self.render(CacheKey::StockIcon { size }, || self.renderer.stock_icon(size))
            .await
    }

    /// Outlined comment ellipse icon at `size`
    ///
    /// # Panics
    ///
    /// Same conditions as [`AssetCache::tag_badge`].
    pub async fn comment_icon(&self, size: Size) -> Arc<Bitmap> {
        self.render(CacheKey::CommentIcon { size }, || {
            self.renderer.comment_icon(size)
        })
        .await
    }

    /// Whether `key` currently has an entry (does not affect recency)
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        let in_flight = lock_flights(&self.in_flight).len();

        CacheStats {
            entries,
            capacity: self.capacity(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            in_flight,
        }
    }

    async fn render<F>(&self, key: CacheKey, draw: F) -> Arc<Bitmap>
    where
        F: FnOnce() -> AssetResult<Bitmap>,
    {
        let label = key.to_string();
        match self.get_or_populate(key, || async move { draw() }).await {
            Some(bitmap) => bitmap,
            None => panic!("rasterizing {label} failed; the raster pipeline is unusable"),
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Arc<Bitmap>> {
        let hit = self.entries.lock().await.get(key).cloned();
        if hit.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Asset cache hit: {}", key);
        }
        hit
    }

    /// Return the entry for `key`, running `populate` at most once across concurrent callers
    async fn get_or_populate<F, Fut>(&self, key: CacheKey, populate: F) -> Option<Arc<Bitmap>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AssetResult<Bitmap>>,
    {
        if let Some(hit) = self.lookup(&key).await {
            return Some(hit);
        }

        let guard = FlightGuard::join(&self.in_flight, &key);

        let populated_here = AtomicBool::new(false);
        let result = guard
            .flight()
            .get_or_init(|| async {
                populated_here.store(true, Ordering::Relaxed);
                // Another flight may have stored the entry between our lookup and registration
                if let Some(hit) = self.lookup(&key).await {
                    return Some(hit);
                }
                self.populate(&key, populate).await
            })
            .await
            .clone();

        if !populated_here.load(Ordering::Relaxed) {
            self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
            trace!("Joined in-flight population: {}", key);
        }

        drop(guard);
        result
    }

    async fn populate<F, Fut>(&self, key: &CacheKey, populate: F) -> Option<Arc<Bitmap>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AssetResult<Bitmap>>,
    {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Asset cache miss, populating: {}", key);

        match populate().await {
            Ok(bitmap) => {
                let entry = Arc::new(bitmap);
                debug!(
                    "Stored {} ({}x{}, {} bytes)",
                    key,
                    entry.width(),
                    entry.height(),
                    entry.byte_size()
                );

                let mut entries = self.entries.lock().await;
                if let Some((evicted, _)) = entries.push(key.clone(), Arc::clone(&entry))
                    && &evicted != key
                {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    trace!("Evicted least recently used entry: {}", evicted);
                }
                Some(entry)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                if e.is_render() {
                    error!("Failed to render {}: {}", key, e);
                } else {
                    debug!("No result for {}: {}", key, e);
                }
                None
            }
        }
    }
}

fn lock_flights(flights: &FlightMap) -> MutexGuard<'_, HashMap<CacheKey, Flight>> {
    // The map is only mutated in short critical sections that cannot leave it inconsistent
    flights.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A caller's stake in the population for one key
///
/// The registry entry is removed when the last participant leaves, including
/// callers whose future is dropped before the population finishes.
struct FlightGuard<'a> {
    flights: &'a FlightMap,
    key: &'a CacheKey,
    flight: Flight,
}

impl<'a> FlightGuard<'a> {
    fn join(flights: &'a FlightMap, key: &'a CacheKey) -> Self {
        let mut map = lock_flights(flights);
        let slot = map.entry(key.clone()).or_default();
        // A finished flight is never joined: failures must not be remembered
        if slot.initialized() {
            *slot = Flight::default();
        }
        let flight = Arc::clone(slot);

        Self {
            flights,
            key,
            flight,
        }
    }

    fn flight(&self) -> &OnceCell<Option<Arc<Bitmap>>> {
        &self.flight
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let flight = std::mem::take(&mut self.flight);
        let mut map = lock_flights(self.flights);
        // Participants hold one reference each and the registry holds one more;
        // every clone and release happens under this lock
        let last_participant = map
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &flight) && Arc::strong_count(&flight) == 2);
        if last_participant {
            map.remove(self.key);
            trace!("Retired in-flight population: {}", self.key);
        }
        drop(flight);
    }
}

/// Decode fetched bytes off the async workers, stretching to `target` pixels if given
async fn decode_and_fit(
    bytes: impl AsRef<[u8]> + Send + 'static,
    source_name: String,
    target: Option<(u32, u32)>,
) -> AssetResult<Bitmap> {
    let task_source = source_name.clone();
    tokio::task::spawn_blocking(move || -> AssetResult<Bitmap> {
        let bitmap = Bitmap::decode(bytes.as_ref(), &task_source)?;
        Ok(match target {
            Some((width, height)) => bitmap.resized(width, height),
            None => bitmap,
        })
    })
    .await
    .map_err(|e| AssetError::decode(source_name, format!("decode task failed: {e}")))?
}

/// Wires an [`AssetCache`] to its collaborators
///
/// Anything not supplied explicitly is derived from the configuration: an
/// HTTP fetcher from `[http]`, the embedded bundle (or `assets.bundle_dir`), and
/// the bitmap font renderer.
pub struct AssetCacheBuilder {
    config: Config,
    fetcher: Option<Arc<dyn ImageFetcher>>,
    bundle: Option<Arc<dyn AssetBundle>>,
    text_renderer: Option<Arc<dyn TextRenderer>>,
}

impl AssetCacheBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            fetcher: None,
            bundle: None,
            text_renderer: None,
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn bundle(mut self, bundle: Arc<dyn AssetBundle>) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn text_renderer(mut self, text_renderer: Arc<dyn TextRenderer>) -> Self {
        self.text_renderer = Some(text_renderer);
        self
    }

    pub fn build(self) -> AppResult<AssetCache> {
        self.config.validate().map_err(AppError::configuration)?;

        let capacity = NonZeroUsize::new(self.config.cache.capacity)
            .ok_or_else(|| AppError::configuration("cache.capacity must be greater than zero"))?;

        let fetcher: Arc<dyn ImageFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpImageFetcher::from_config(&self.config.http)?),
        };

        let bundle: Arc<dyn AssetBundle> = match (self.bundle, &self.config.assets.bundle_dir) {
            (Some(bundle), _) => bundle,
            (None, Some(dir)) => Arc::new(DirectoryAssets::new(dir.clone())),
            (None, None) => Arc::new(EmbeddedAssets),
        };

        let text_renderer = self
            .text_renderer
            .unwrap_or_else(|| Arc::new(BitmapFontRenderer::with_max_width(MAX_TAG_TEXT_WIDTH)));

        info!(
            "Asset cache initialized (capacity: {}, render scale: {})",
            capacity, self.config.render.scale
        );

        Ok(AssetCache {
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: FlightMap::default(),
            capacity,
            fetcher,
            bundle,
            renderer: AssetRenderer::new(text_renderer, &self.config.render),
            placeholder_name: self.config.assets.placeholder.clone(),
            counters: Counters::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MockAssetBundle;
    use crate::rendering::{Canvas, TextMetrics};
    use crate::utils::http_client::MockImageFetcher;
    use bytes::Bytes;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let bitmap = Bitmap::from_image(RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255])));
        Bytes::from(bitmap.encode_png().unwrap())
    }

    fn config_with_capacity(capacity: usize) -> Config {
        let mut config = Config::default();
        config.cache.capacity = capacity;
        config
    }

    fn cache_with(fetcher: Arc<dyn ImageFetcher>, capacity: usize) -> AssetCache {
        AssetCache::builder(&config_with_capacity(capacity))
            .fetcher(fetcher)
            .bundle(Arc::new(EmbeddedAssets))
            .build()
            .unwrap()
    }

    /// Fetcher whose outcome can be flipped between calls
    struct ScriptedFetcher {
        calls: AtomicUsize,
        reachable: AtomicBool,
        delay: Duration,
    }

    impl ScriptedFetcher {
        fn new(reachable: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reachable: AtomicBool::new(reachable),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageFetcher for ScriptedFetcher {
        async fn fetch_bytes(&self, url: &str) -> AssetResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.reachable.load(Ordering::SeqCst) {
                Ok(png_bytes(300, 200))
            } else {
                Err(AssetError::fetch(url, "connection refused"))
            }
        }
    }

    /// Text renderer that counts layout passes
    #[derive(Default)]
    struct CountingText {
        inner: BitmapFontRenderer,
        measured: AtomicUsize,
    }

    impl TextRenderer for CountingText {
        fn measure(&self, text: &str, font_size: f32) -> TextMetrics {
            self.measured.fetch_add(1, Ordering::SeqCst);
            self.inner.measure(text, font_size)
        }

        fn draw(
            &self,
            canvas: &mut Canvas,
            text: &str,
            font_size: f32,
            origin: (f32, f32),
            color: tiny_skia::Color,
        ) {
            self.inner.draw(canvas, text, font_size, origin, color)
        }
    }

    #[tokio::test]
    async fn test_remote_image_memoized() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch_bytes()
            .times(1)
            .returning(|_| Ok(png_bytes(300, 200)));
        let cache = cache_with(Arc::new(fetcher), 200);

        let first = cache
            .fetch_remote_image("http://x/img.png", Some(Size::new(100, 50)))
            .await
            .unwrap();
        let second = cache
            .fetch_remote_image("http://x/img.png", Some(Size::new(100, 50)))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.dimensions(), (100, 50));

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_remote_image_without_size_keeps_source_dimensions() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch_bytes()
            .times(1)
            .returning(|_| Ok(png_bytes(300, 200)));
        let cache = cache_with(Arc::new(fetcher), 200);

        let image = cache.fetch_remote_image("http://x/img.png", None).await.unwrap();
        assert_eq!(image.dimensions(), (300, 200));
    }

    #[tokio::test]
    async fn test_sizes_produce_distinct_entries() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch_bytes()
            .times(3)
            .returning(|_| Ok(png_bytes(300, 200)));
        let cache = cache_with(Arc::new(fetcher), 200);

        let a = cache
            .fetch_remote_image("http://x/img.png", Some(Size::new(100, 50)))
            .await
            .unwrap();
        // Same width, different height: must not reuse the 100x50 entry
        let b = cache
            .fetch_remote_image("http://x/img.png", Some(Size::new(100, 80)))
            .await
            .unwrap();
        let c = cache.fetch_remote_image("http://x/other.png", Some(Size::new(100, 50))).await.unwrap();

        assert_eq!(a.dimensions(), (100, 50));
        assert_eq!(b.dimensions(), (100, 80));
        assert_eq!(c.dimensions(), (100, 50));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn test_unreachable_url_is_silent_miss_then_recovers() {
        let fetcher = Arc::new(ScriptedFetcher::new(false));
        let cache = cache_with(fetcher.clone(), 200);
        let size = Some(Size::new(100, 50));
        let key = CacheKey::remote_image("http://x/img.png", size);

        assert!(cache.fetch_remote_image("http://x/img.png", size).await.is_none());
        assert!(!cache.contains(&key).await);
        assert_eq!(cache.stats().await.failures, 1);

        fetcher.reachable.store(true, Ordering::SeqCst);
        let image = cache.fetch_remote_image("http://x/img.png", size).await.unwrap();

        assert_eq!(image.dimensions(), (100, 50));
        assert!(cache.contains(&key).await);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_body_stores_nothing() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch_bytes()
            .times(2)
            .returning(|_| Ok(Bytes::from_static(b"<html>404</html>")));
        let cache = cache_with(Arc::new(fetcher), 200);

        assert!(cache.fetch_remote_image("http://x/img.png", None).await.is_none());
        // Failure is not memoized: the second call tries again
        assert!(cache.fetch_remote_image("http://x/img.png", None).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Duration::from_millis(50),
            ..ScriptedFetcher::new(true)
        });
        let cache = Arc::new(cache_with(fetcher.clone(), 200));

        let requests = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .fetch_remote_image("http://x/slow.png", Some(Size::square(64)))
                    .await
            })
        });
        let results = futures::future::join_all(requests).await;

        let images: Vec<_> = results.into_iter().map(|r| r.unwrap().unwrap()).collect();
        assert_eq!(fetcher.calls(), 1);
        assert!(images.iter().all(|img| Arc::ptr_eq(img, &images[0])));

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.hits + stats.coalesced, 7);
    }

    #[tokio::test]
    async fn test_concurrent_failures_shared_then_retried() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Duration::from_millis(50),
            ..ScriptedFetcher::new(false)
        });
        let cache = Arc::new(cache_with(fetcher.clone(), 200));

        let requests = (0..4).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.fetch_remote_image("http://x/down.png", None).await })
        });
        for result in futures::future::join_all(requests).await {
            assert!(result.unwrap().is_none());
        }
        assert_eq!(fetcher.calls(), 1);

        assert!(cache.fetch_remote_image("http://x/down.png", None).await.is_none());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_requests_leave_no_in_flight_entries() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Duration::from_millis(200),
            ..ScriptedFetcher::new(true)
        });
        let cache = cache_with(fetcher.clone(), 200);

        for i in 0..5 {
            let url = format!("http://x/slow-{i}.png");
            let outcome = tokio::time::timeout(
                Duration::from_millis(10),
                cache.fetch_remote_image(&url, None),
            )
            .await;
            assert!(outcome.is_err());
        }

        let stats = cache.stats().await;
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.entries, 0);
        assert_eq!(fetcher.calls(), 5);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_does_not_split_population() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Duration::from_millis(100),
            ..ScriptedFetcher::new(true)
        });
        let cache = Arc::new(cache_with(fetcher.clone(), 200));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.fetch_remote_image("http://x/shared.png", None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let impatient = tokio::time::timeout(
            Duration::from_millis(10),
            cache.fetch_remote_image("http://x/shared.png", None),
        )
        .await;
        assert!(impatient.is_err());
        assert_eq!(cache.stats().await.in_flight, 1);

        let patient = cache.fetch_remote_image("http://x/shared.png", None).await.unwrap();
        let first = first.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &patient));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.stats().await.in_flight, 0);
    }

    #[tokio::test]
    async fn test_abandoned_initializer_is_taken_over() {
        let fetcher = Arc::new(ScriptedFetcher {
            delay: Duration::from_millis(50),
            ..ScriptedFetcher::new(true)
        });
        let cache = cache_with(fetcher.clone(), 200);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.fetch_remote_image("http://x/retry.png", Some(Size::square(16))),
        )
        .await;
        assert!(abandoned.is_err());

        let image = cache
            .fetch_remote_image("http://x/retry.png", Some(Size::square(16)))
            .await
            .unwrap();
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(cache.stats().await.in_flight, 0);
    }

    #[tokio::test]
    async fn test_placeholder_resized_and_memoized() {
        let fetcher = Arc::new(ScriptedFetcher::new(false));
        let cache = cache_with(fetcher.clone(), 200);

        let first = cache.placeholder(Size::new(120, 90)).await.unwrap();
        let second = cache.placeholder(Size::new(120, 90)).await.unwrap();
        let other = cache.placeholder(Size::new(40, 40)).await.unwrap();

        assert_eq!(first.dimensions(), (120, 90));
        assert_eq!(other.dimensions(), (40, 40));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_placeholder_is_absent() {
        let mut bundle = MockAssetBundle::new();
        bundle
            .expect_load()
            .times(2)
            .returning(|name| Err(AssetError::missing(name)));

        let cache = AssetCache::builder(&Config::default())
            .fetcher(Arc::new(ScriptedFetcher::new(false)))
            .bundle(Arc::new(bundle))
            .build()
            .unwrap();

        assert!(cache.placeholder(Size::square(32)).await.is_none());
        assert!(cache.placeholder(Size::square(32)).await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_tag_badge_drawn_once() {
        let text = Arc::new(CountingText::default());
        let cache = AssetCache::builder(&Config::default())
            .fetcher(Arc::new(ScriptedFetcher::new(false)))
            .text_renderer(text.clone())
            .build()
            .unwrap();

        let first = cache.tag_badge("Tech").await;
        let second = cache.tag_badge("Tech").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.pixels(), second.pixels());
        assert_eq!(text.measured.load(Ordering::SeqCst), 1);

        let other = cache.tag_badge("Science").await;
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(text.measured.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stock_icon_sizes_are_distinct_entries() {
        let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), 200);

        let small = cache.stock_icon(Size::square(24)).await;
        let large = cache.stock_icon(Size::square(32)).await;

        assert_eq!(small.dimensions(), (24, 24));
        assert_eq!(large.dimensions(), (32, 32));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_icons_with_same_size_do_not_share_entries() {
        let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), 200);

        let stock = cache.stock_icon(Size::square(24)).await;
        let comment = cache.comment_icon(Size::square(24)).await;

        assert_ne!(stock.pixels(), comment.pixels());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_render_scale_applies_to_all_kinds() {
        let mut config = Config::default();
        config.render.scale = 2.0;
        let cache = AssetCache::builder(&config)
            .fetcher(Arc::new(ScriptedFetcher::new(true)))
            .build()
            .unwrap();

        assert_eq!(cache.comment_icon(Size::square(24)).await.dimensions(), (48, 48));
        assert_eq!(cache.placeholder(Size::new(10, 20)).await.unwrap().dimensions(), (20, 40));
        assert_eq!(
            cache
                .fetch_remote_image("http://x/img.png", Some(Size::new(100, 50)))
                .await
                .unwrap()
                .dimensions(),
            (200, 100)
        );
    }

    #[tokio::test]
    async fn test_evicted_entry_regenerates() {
        let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), 2);

        let first = cache.stock_icon(Size::square(10)).await;
        cache.stock_icon(Size::square(11)).await;
        cache.stock_icon(Size::square(12)).await;

        assert!(!cache.contains(&CacheKey::StockIcon { size: Size::square(10) }).await);
        let again = cache.stock_icon(Size::square(10)).await;
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(first.pixels(), again.pixels());

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 2);
    }

    #[tokio::test]
    async fn test_hits_refresh_recency() {
        let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), 2);

        cache.comment_icon(Size::square(10)).await;
        cache.comment_icon(Size::square(11)).await;
        cache.comment_icon(Size::square(10)).await;
        cache.comment_icon(Size::square(12)).await;

        assert!(cache.contains(&CacheKey::CommentIcon { size: Size::square(10) }).await);
        assert!(!cache.contains(&CacheKey::CommentIcon { size: Size::square(11) }).await);
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let result = AssetCache::builder(&config_with_capacity(0))
            .fetcher(Arc::new(ScriptedFetcher::new(false)))
            .build();
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_default_capacity_bound() {
        let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), 200);
        assert_eq!(cache.capacity(), 200);

        for side in 1..=250 {
            cache.comment_icon(Size::square(side)).await;
        }
        assert_eq!(cache.len().await, 200);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_capacity_never_exceeded(
            capacity in 1usize..16,
            sides in proptest::collection::vec(1u32..40, 0..60),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let cache = cache_with(Arc::new(ScriptedFetcher::new(false)), capacity);
                for side in sides {
                    cache.stock_icon(Size::square(side)).await;
                    prop_assert!(cache.len().await <= capacity);
                }
                Ok(())
            })?;
        }
    }
}
