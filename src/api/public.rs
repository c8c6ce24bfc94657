use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::sitemap;

#[derive(Serialize)]
#[serde(rename = "urlset")]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "url")]
    urls: Vec<SitemapUrl>,
}

#[derive(Serialize)]
struct SitemapUrl {
    loc: String,
    changefreq: &'static str,
    priority: &'static str,
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub uptime_seconds: u64,
}

fn base_url(site_url: &str) -> &str {
    site_url.trim_end_matches('/')
}

pub(crate) fn render_robots(site_url: &str) -> String {
    format!(
        "User-agent: *\nDisallow: /api/\nDisallow: /media/\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        base_url(site_url)
    )
}

pub(crate) fn render_sitemap(site_url: &str) -> anyhow::Result<String> {
    let base = base_url(site_url);
    let set = UrlSet {
        xmlns: "http://www.sitemaps.org/schemas/sitemap/0.9",
        urls: sitemap::PAGES
            .iter()
            .map(|(path, changefreq, priority)| SitemapUrl {
                loc: format!("{base}{path}"),
                changefreq,
                priority,
            })
            .collect(),
    };

    let body = quick_xml::se::to_string(&set).context("Failed to serialize sitemap")?;
    Ok(format!(r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#))
}

/// GET /robots.txt
pub async fn robots_txt(State(state): State<Arc<AppState>>) -> Response {
    let site_url = state.config().read().await.server.site_url.clone();
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_robots(&site_url),
    )
        .into_response()
}

/// GET /sitemap.xml
pub async fn sitemap_xml(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let site_url = state.config().read().await.server.site_url.clone();
    let body = render_sitemap(&site_url)?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], body).into_response())
}

/// GET /api/health
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Health>>, ApiError> {
    state.store().ping().await?;
    Ok(Json(ApiResponse::success(Health {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_points_at_sitemap() {
        let robots = render_robots("https://vote.example.org/");
        assert!(robots.contains("Sitemap: https://vote.example.org/sitemap.xml"));
        assert!(robots.contains("Disallow: /api/"));
    }

    #[test]
    fn test_sitemap_lists_pages() {
        let xml = render_sitemap("https://vote.example.org").unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://vote.example.org/</loc>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
    }
}
