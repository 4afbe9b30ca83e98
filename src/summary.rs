use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::Context;
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_text_mut},
    rect::Rect,
};
use tracing::{debug, warn};

use crate::store::CountryStore;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const BACKGROUND: Rgb<u8> = Rgb([0x66, 0x7e, 0xea]);
const FOREGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const TITLE_PX: f32 = 36.0;
const TEXT_PX: f32 = 20.0;
const TOP_N: u64 = 5;

/// Draws the post-refresh report and keeps it at a fixed path.
#[derive(Clone, Debug)]
pub struct SummaryRenderer {
    image_path: PathBuf,
    font_path: PathBuf,
    title_font_path: PathBuf,
}

/// What goes on the canvas, detached from the store.
#[derive(Clone, Debug)]
pub struct Report {
    pub total_countries: u64,
    pub ranked: Vec<(String, f64)>,
    pub rendered_at: String,
}

impl SummaryRenderer {
    pub fn new(image_path: PathBuf, font_path: PathBuf, title_font_path: PathBuf) -> Self {
        Self { image_path, font_path, title_font_path }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub async fn render(&self, store: &CountryStore, total_countries: u64) -> anyhow::Result<()> {
        let ranked = store
            .top_by_gdp(TOP_N)
            .await?
            .into_iter()
            .map(|c| (c.name, c.estimated_gdp))
            .collect();

        let report = Report {
            total_countries,
            ranked,
            rendered_at: jiff::Zoned::now().strftime("%Y-%m-%d %H:%M:%S").to_string(),
        };

        let renderer = self.clone();
        tokio::task::spawn_blocking(move || renderer.write(&report)).await??;

        debug!(path = %self.image_path.display(), "wrote summary image");
        Ok(())
    }

    fn write(&self, report: &Report) -> anyhow::Result<()> {
        let canvas = self.draw(report);

        if let Some(dir) = self.image_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }

        // Readers never see a half-written file.
        let tmp = self.image_path.with_extension("png.tmp");
        canvas.save_with_format(&tmp, ImageFormat::Png).context("encoding summary image")?;
        std::fs::rename(&tmp, &self.image_path)
            .with_context(|| format!("replacing {}", self.image_path.display()))?;
        Ok(())
    }

    pub fn draw(&self, report: &Report) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        let title = Typeface::load(&self.title_font_path, TITLE_PX);
        let text = Typeface::load(&self.font_path, TEXT_PX);

        title.draw(&mut canvas, 50, 50, "Country Summary Report");
        text.draw(&mut canvas, 50, 120, &format!("Total Countries: {}", report.total_countries));
        text.draw(&mut canvas, 50, 180, "Top 5 Countries by Estimated GDP:");

        let mut y = 220;
        for (rank, (name, gdp)) in report.ranked.iter().enumerate() {
            let line = format!("{}. {} - {}", rank + 1, name, format_usd(*gdp));
            text.draw(&mut canvas, 70, y, &line);
            y += 40;
        }

        text.draw(
            &mut canvas,
            50,
            HEIGHT as i32 - 80,
            &format!("Last Updated: {}", report.rendered_at),
        );

        canvas
    }
}

enum Typeface {
    Outline { font: FontVec, scale: PxScale },
    /// Built-in 8×8 glyphs, each pixel drawn as a `scale`-sized square.
    Bitmap { scale: u32 },
}

impl Typeface {
    /// Never fails: an unreadable font degrades to the bitmap glyphs.
    fn load(path: &Path, px: f32) -> Self {
        let loaded = std::fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(anyhow::Error::from));

        match loaded {
            Ok(font) => Typeface::Outline { font, scale: PxScale::from(px) },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "font unavailable, using built-in glyphs");
                Typeface::Bitmap { scale: ((px / 8.0).round() as u32).max(1) }
            },
        }
    }

    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str) {
        match self {
            Typeface::Outline { font, scale } => {
                draw_text_mut(canvas, FOREGROUND, x, y, *scale, font, text);
            },
            Typeface::Bitmap { scale } => {
                let advance = 8 * *scale as i32;
                for (i, ch) in text.chars().enumerate() {
                    let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| LATIN_FONTS.get(ch)) else {
                        continue;
                    };
                    let origin_x = x + i as i32 * advance;
                    for (row, bits) in glyph.iter().enumerate() {
                        for col in 0..8i32 {
                            if (*bits >> col) & 1 == 0 {
                                continue;
                            }
                            let px = origin_x + col * *scale as i32;
                            let py = y + row as i32 * *scale as i32;
                            draw_filled_rect_mut(
                                canvas,
                                Rect::at(px, py).of_size(*scale, *scale),
                                FOREGROUND,
                            );
                        }
                    }
                }
            },
        }
    }
}

/// `$1,234,567.89`
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
