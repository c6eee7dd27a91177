//! Full-page screenshots from a scrolling viewport
//!
//! Browser screenshot commands only return what is visible. A full page is
//! rebuilt by scrolling over a row-major grid of viewport-sized tiles and
//! pasting each viewport capture into one canvas. When the document size is
//! not a multiple of the viewport, the browser cannot scroll the last tile
//! fully into place; its paste offset is pulled back so the capture's far
//! edge lines up with the document edge.

use super::{CaptureError, CaptureResult};
use crate::browser::Browser;
use image::{imageops, DynamicImage, RgbaImage};
use std::time::Duration;

const TOTAL_WIDTH_SCRIPT: &str = "return document.body.offsetWidth";
const TOTAL_HEIGHT_SCRIPT: &str = "return document.body.parentNode.scrollHeight";
const VIEWPORT_WIDTH_SCRIPT: &str = "return document.body.clientWidth";
const VIEWPORT_HEIGHT_SCRIPT: &str = "return window.innerHeight";

/// Pins a fixed top bar so it is captured once instead of on every tile
const HIDE_HEADER_SCRIPT: &str = "var bar = document.getElementById('topnav') || \
     document.getElementsByTagName('header')[0]; \
     if (bar) { bar.setAttribute('style', 'position: absolute; top: 0px;'); } \
     return !!bar;";

/// Rendered document and viewport dimensions, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub total_width: u32,
    pub total_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

/// One viewport capture: where to scroll and where to paste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub scroll_x: u32,
    pub scroll_y: u32,
    pub paste_x: u32,
    pub paste_y: u32,
}

/// Partitions the document into viewport-sized tiles, row by row
///
/// Returns an empty plan when any dimension is zero.
pub fn plan_tiles(geometry: &PageGeometry) -> Vec<Tile> {
    let PageGeometry {
        total_width,
        total_height,
        viewport_width,
        viewport_height,
    } = *geometry;

    if total_width == 0 || total_height == 0 || viewport_width == 0 || viewport_height == 0 {
        return Vec::new();
    }

    let clamp = |offset: u32, viewport: u32, total: u32| {
        if offset + viewport > total {
            total.saturating_sub(viewport)
        } else {
            offset
        }
    };

    let mut tiles = Vec::new();
    for scroll_y in (0..total_height).step_by(viewport_height as usize) {
        for scroll_x in (0..total_width).step_by(viewport_width as usize) {
            tiles.push(Tile {
                scroll_x,
                scroll_y,
                paste_x: clamp(scroll_x, viewport_width, total_width),
                paste_y: clamp(scroll_y, viewport_height, total_height),
            });
        }
    }
    tiles
}

/// Pastes a viewport capture into the canvas at the tile's offset
///
/// Whatever falls outside the canvas is clipped.
pub fn paste_tile(canvas: &mut RgbaImage, tile: &Tile, shot: &DynamicImage) {
    let shot = shot.to_rgba8();
    imageops::replace(canvas, &shot, i64::from(tile.paste_x), i64::from(tile.paste_y));
}

/// Reads one integer dimension from the page
async fn script_dimension<B: Browser>(browser: &mut B, script: &str) -> CaptureResult<u32> {
    let value = browser.execute_script(script).await?;
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32)
        .ok_or_else(|| CaptureError::Geometry(format!("'{}' returned {}", script, value)))
}

/// Queries the document and viewport size from the rendered page
pub async fn measure_page<B: Browser>(browser: &mut B) -> CaptureResult<PageGeometry> {
    Ok(PageGeometry {
        total_width: script_dimension(browser, TOTAL_WIDTH_SCRIPT).await?,
        total_height: script_dimension(browser, TOTAL_HEIGHT_SCRIPT).await?,
        viewport_width: script_dimension(browser, VIEWPORT_WIDTH_SCRIPT).await?,
        viewport_height: script_dimension(browser, VIEWPORT_HEIGHT_SCRIPT).await?,
    })
}

/// Captures the whole rendered page as one image
///
/// `settle` is waited after every scroll before the viewport is captured.
pub async fn fullpage_screenshot<B: Browser>(browser: &mut B, settle: Duration) -> CaptureResult<RgbaImage> {
    let geometry = measure_page(browser).await?;
    let tiles = plan_tiles(&geometry);
    if tiles.is_empty() {
        return Err(CaptureError::Geometry(format!("empty page {:?}", geometry)));
    }

    tracing::debug!("Stitching {} tiles for {:?}", tiles.len(), geometry);

    let mut canvas = RgbaImage::new(geometry.total_width, geometry.total_height);
    for tile in &tiles {
        browser
            .execute_script(&format!("window.scrollTo({}, {})", tile.scroll_x, tile.scroll_y))
            .await?;
        tokio::time::sleep(settle).await;

        browser.execute_script(HIDE_HEADER_SCRIPT).await?;
        tokio::time::sleep(settle).await;

        let shot = browser.screenshot_viewport().await?;
        paste_tile(&mut canvas, tile, &shot);
    }

    Ok(canvas)
}
