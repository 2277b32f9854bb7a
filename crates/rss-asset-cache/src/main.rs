use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rss_asset_cache::{AssetCache, Bitmap, Config, Size};

#[derive(Parser)]
#[command(name = "rss-asset-cache")]
#[command(version)]
#[command(about = "Fetch, generate and cache the images shown in an RSS article list")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Maximum number of cached entries (overrides config file)
    #[arg(long, value_name = "ENTRIES")]
    capacity: Option<usize>,

    /// Render scale, pixels per point (overrides config file)
    #[arg(long, value_name = "FACTOR")]
    scale: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a remote image and write it as PNG
    Fetch {
        url: String,
        /// Stretch to WIDTHxHEIGHT points
        #[arg(short, long, value_name = "WxH")]
        size: Option<Size>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the bundled placeholder at the given size
    Placeholder {
        #[arg(short, long, value_name = "WxH")]
        size: Size,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render a tag badge
    Tag {
        text: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render the stock (saved) icon
    StockIcon {
        #[arg(short, long, value_name = "WxH", default_value = "24x24")]
        size: Size,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render the comment icon
    CommentIcon {
        #[arg(short, long, value_name = "WxH", default_value = "24x24")]
        size: Size,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Exercise the cache with a list-like workload and print its statistics as JSON
    Stats {
        /// Tag texts to render (each twice)
        #[arg(long, value_delimiter = ',', default_value = "Tech,Science,World")]
        tags: Vec<String>,
        /// Remote images to fetch at 80x60 (each twice)
        #[arg(long, value_delimiter = ',')]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("rss_asset_cache={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting rss-asset-cache v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(capacity) = cli.capacity {
        config.cache.capacity = capacity;
    }
    if let Some(scale) = cli.scale {
        config.render.scale = scale;
    }

    let cache = Arc::new(AssetCache::builder(&config).build()?);

    match cli.command {
        Command::Fetch { url, size, output } => {
            let Some(image) = cache.fetch_remote_image(&url, size).await else {
                bail!("no image available for {url}");
            };
            write_png(&image, &output).await?;
        }
        Command::Placeholder { size, output } => {
            let Some(image) = cache.placeholder(size).await else {
                bail!("placeholder asset {} is unavailable", config.assets.placeholder);
            };
            write_png(&image, &output).await?;
        }
        Command::Tag { text, output } => {
            let image = cache.tag_badge(&text).await;
            write_png(&image, &output).await?;
        }
        Command::StockIcon { size, output } => {
            let image = cache.stock_icon(size).await;
            write_png(&image, &output).await?;
        }
        Command::CommentIcon { size, output } => {
            let image = cache.comment_icon(size).await;
            write_png(&image, &output).await?;
        }
        Command::Stats { tags, urls } => {
            run_workload(&cache, &tags, &urls).await;
            let stats = cache.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Simulate two passes over an article list: every row asks for its badge,
/// icons, and thumbnail (falling back to the placeholder)
async fn run_workload(cache: &AssetCache, tags: &[String], urls: &[String]) {
    let icon = Size::square(24);
    let thumbnail = Size::new(80, 60);

    for _pass in 0..2 {
        for tag in tags {
            cache.tag_badge(tag).await;
        }
        cache.stock_icon(icon).await;
        cache.comment_icon(icon).await;

        for url in urls {
            if cache.fetch_remote_image(url, Some(thumbnail)).await.is_none() {
                cache.placeholder(thumbnail).await;
            }
        }
    }
}

async fn write_png(image: &Bitmap, output: &Path) -> Result<()> {
    let png = image.encode_png()?;
    tokio::fs::write(output, png)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        "Wrote {}x{} image to {}",
        image.width(),
        image.height(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_cache() -> AssetCache {
        AssetCache::builder(&Config::default()).build().unwrap()
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "rss-asset-cache",
            "--capacity",
            "50",
            "fetch",
            "http://x/img.png",
            "--size",
            "100x50",
            "-o",
            "out.png",
        ])
        .unwrap();
        assert_eq!(cli.capacity, Some(50));
        let Command::Fetch { url, size, output } = cli.command else {
            panic!("expected the fetch subcommand");
        };
        assert_eq!(url, "http://x/img.png");
        assert_eq!(size, Some(Size::new(100, 50)));
        assert_eq!(output, PathBuf::from("out.png"));

        let cli = Cli::try_parse_from(["rss-asset-cache", "stock-icon", "-o", "s.png"]).unwrap();
        assert!(matches!(cli.command, Command::StockIcon { size, .. } if size == Size::square(24)));

        let cli = Cli::try_parse_from(["rss-asset-cache", "stats", "--tags", "Tech,World"]).unwrap();
        assert!(matches!(cli.command, Command::Stats { ref tags, .. } if tags.len() == 2));
    }

    #[test]
    fn test_cli_rejects_zero_size() {
        let parsed = Cli::try_parse_from(["rss-asset-cache", "placeholder", "--size", "0x10", "-o", "p.png"]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_workload_second_pass_hits() {
        let cache = offline_cache();
        let tags = vec!["Tech".to_string(), "World".to_string()];

        run_workload(&cache, &tags, &[]).await;

        let stats = cache.stats().await;
        // Two badges and two icons drawn once each, then served from the cache
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.misses, 4);
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test]
    async fn test_workload_falls_back_to_placeholder() {
        let cache = offline_cache();
        let urls = vec!["http://127.0.0.1:9/thumb.png".to_string()];

        run_workload(&cache, &[], &urls).await;

        let stats = cache.stats().await;
        assert!(
            cache
                .contains(&rss_asset_cache::CacheKey::Placeholder {
                    size: Size::new(80, 60)
                })
                .await
        );
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.entries, 3);
    }

    #[tokio::test]
    async fn test_write_png_for_each_drawn_kind() {
        let cache = offline_cache();
        let dir = tempfile::tempdir().unwrap();

        let badge = cache.tag_badge("Tech").await;
        let stock = cache.stock_icon(Size::square(24)).await;
        let comment = cache.comment_icon(Size::square(32)).await;

        for (name, image) in [("tag.png", &badge), ("stock.png", &stock), ("comment.png", &comment)] {
            let path = dir.path().join(name);
            write_png(image, &path).await.unwrap();

            let written = Bitmap::decode(&std::fs::read(&path).unwrap(), name).unwrap();
            assert_eq!(written.dimensions(), image.dimensions());
        }
    }

    #[tokio::test]
    async fn test_write_png_reports_unwritable_output() {
        let cache = offline_cache();
        let dir = tempfile::tempdir().unwrap();
        let image = cache.comment_icon(Size::square(8)).await;

        let result = write_png(&image, &dir.path().join("missing-dir").join("icon.png")).await;
        assert!(result.is_err());
    }
}
