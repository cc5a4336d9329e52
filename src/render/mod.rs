//! CPU frame rendering: background image plus frequency bars.
//!
//! Each frame is the dimension-normalized background with one colored
//! rectangle per bar alpha-blended on top, and optionally a soft glow
//! rectangle beneath each bar.

pub mod background;
pub mod style;

pub use background::{ensure_even, even_dimensions, load_background, BackgroundError};
pub use style::{parse_hex_color, BarAnchor, StyleConfig, StyleError};

use image::RgbaImage;

/// Bars read against any background at this opacity while still
/// letting it bleed through.
const BAR_ALPHA: f32 = 0.7;

/// Glow rectangle padding around the bar, in pixels.
const GLOW_PAD: f32 = 5.0;

/// Fraction of the image height available to a full-amplitude bar;
/// the rest is headroom.
const HEIGHT_HEADROOM: f32 = 0.8;

/// Render one frame: the background with bars for `amplitudes` drawn
/// over it.
///
/// The output has exactly the background's pixel dimensions. The
/// background is drawn unscaled at the top-left with its normal
/// orientation; callers are expected to have passed it through
/// [`background::ensure_even`] already.
pub fn render_frame(background: &RgbaImage, amplitudes: &[f32], style: &StyleConfig) -> RgbaImage {
    let mut frame = background.clone();
    let bar_count = amplitudes.len();
    if bar_count == 0 {
        return frame;
    }

    let width = frame.width() as f32;
    let height = frame.height() as f32;

    let usable = width * (1.0 - 2.0 * style.horizontal_margin);
    let bar_width = usable * style.bar_width_ratio / bar_count as f32;
    let spacing = if bar_count > 1 {
        usable * (1.0 - style.bar_width_ratio) / (bar_count - 1) as f32
    } else {
        0.0
    };
    let origin_x = width * style.horizontal_margin;
    let anchor_y = height * style.vertical_position;

    for (j, &amplitude) in amplitudes.iter().enumerate() {
        let bar_height =
            amplitude.clamp(0.0, 1.0) * height * HEIGHT_HEADROOM * style.bar_height_scale;
        if bar_height <= 0.0 {
            continue;
        }

        let x0 = origin_x + j as f32 * (bar_width + spacing);
        let x1 = x0 + bar_width;
        let (y0, y1) = bar_extent(anchor_y, bar_height, style);

        if style.glow_enabled && style.glow_intensity > 0.0 {
            blend_rect(
                &mut frame,
                x0 - GLOW_PAD,
                y0 - GLOW_PAD,
                x1 + GLOW_PAD,
                y1 + GLOW_PAD,
                style.color,
                0.3 * style.glow_intensity,
            );
        }

        blend_rect(&mut frame, x0, y0, x1, y1, style.color, BAR_ALPHA);
    }

    frame
}

/// Vertical span of a bar around the anchor line.
fn bar_extent(anchor_y: f32, bar_height: f32, style: &StyleConfig) -> (f32, f32) {
    match style.anchor {
        BarAnchor::Centered => (anchor_y - bar_height * 0.5, anchor_y + bar_height * 0.5),
        BarAnchor::Directional => {
            if style.vertical_position <= 0.5 {
                (anchor_y, anchor_y + bar_height)
            } else {
                (anchor_y - bar_height, anchor_y)
            }
        }
    }
}

/// Alpha-blend a solid rectangle over the image, clamped to bounds.
fn blend_rect(image: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: [u8; 3], alpha: f32) {
    let (width, height) = image.dimensions();
    let xs = x0.round().max(0.0) as u32;
    let xe = (x1.round().min(width as f32) as u32).min(width);
    let ys = y0.round().max(0.0) as u32;
    let ye = (y1.round().min(height as f32) as u32).min(height);

    for y in ys..ye {
        for x in xs..xe {
            let pixel = image.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = color[c] as f32 * alpha + pixel.0[c] as f32 * (1.0 - alpha);
                pixel.0[c] = blended.round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn black(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    fn style_one_bar() -> StyleConfig {
        StyleConfig {
            bar_count: 1,
            bar_width_ratio: 1.0,
            horizontal_margin: 0.1,
            smoothing: 0.0,
            ..StyleConfig::default()
        }
    }

    #[test]
    fn test_output_dimensions_match_background() {
        let bg = black(640, 480);
        let frame = render_frame(&bg, &[0.5; 64], &StyleConfig::default());
        assert_eq!(frame.dimensions(), (640, 480));
    }

    #[test]
    fn test_zero_amplitudes_leave_background_untouched() {
        let bg = black(64, 64);
        let frame = render_frame(&bg, &[0.0; 8], &StyleConfig::default());
        assert_eq!(frame.as_raw(), bg.as_raw());
    }

    #[test]
    fn test_full_bar_is_drawn() {
        let bg = black(100, 100);
        let frame = render_frame(&bg, &[1.0], &style_one_bar());

        // Bar spans x 10..90; height 80 centered on y=50 spans y 10..90.
        assert_ne!(frame.get_pixel(50, 50), bg.get_pixel(50, 50));
        // Headroom above and below stays clean.
        assert_eq!(frame.get_pixel(50, 5), bg.get_pixel(50, 5));
        assert_eq!(frame.get_pixel(50, 95), bg.get_pixel(50, 95));
        // Margin columns stay clean.
        assert_eq!(frame.get_pixel(5, 50), bg.get_pixel(5, 50));
    }

    #[test]
    fn test_centered_anchor_is_symmetric() {
        let bg = black(100, 100);
        let frame = render_frame(&bg, &[0.5], &style_one_bar());

        // Height 40 centered on y=50: rows 30..70 painted, outside clean.
        assert_ne!(frame.get_pixel(50, 35), bg.get_pixel(50, 35));
        assert_ne!(frame.get_pixel(50, 65), bg.get_pixel(50, 65));
        assert_eq!(frame.get_pixel(50, 25), bg.get_pixel(50, 25));
        assert_eq!(frame.get_pixel(50, 75), bg.get_pixel(50, 75));
    }

    #[test]
    fn test_directional_anchor_grows_downward_in_top_half() {
        let bg = black(100, 100);
        let style = StyleConfig {
            anchor: BarAnchor::Directional,
            vertical_position: 0.25,
            ..style_one_bar()
        };
        let frame = render_frame(&bg, &[0.5], &style);

        // Anchor y=25, height 40: rows 25..65 painted, above stays clean.
        assert_eq!(frame.get_pixel(50, 20), bg.get_pixel(50, 20));
        assert_ne!(frame.get_pixel(50, 30), bg.get_pixel(50, 30));
        assert_ne!(frame.get_pixel(50, 60), bg.get_pixel(50, 60));
        assert_eq!(frame.get_pixel(50, 70), bg.get_pixel(50, 70));
    }

    #[test]
    fn test_directional_anchor_grows_upward_in_bottom_half() {
        let bg = black(100, 100);
        let style = StyleConfig {
            anchor: BarAnchor::Directional,
            vertical_position: 0.75,
            ..style_one_bar()
        };
        let frame = render_frame(&bg, &[0.5], &style);

        // Anchor y=75, height 40: rows 35..75 painted, below stays clean.
        assert_ne!(frame.get_pixel(50, 40), bg.get_pixel(50, 40));
        assert_ne!(frame.get_pixel(50, 70), bg.get_pixel(50, 70));
        assert_eq!(frame.get_pixel(50, 80), bg.get_pixel(50, 80));
        assert_eq!(frame.get_pixel(50, 30), bg.get_pixel(50, 30));
    }

    #[test]
    fn test_glow_extends_past_bar() {
        let bg = black(100, 100);
        let mut style = style_one_bar();
        style.glow_enabled = true;
        style.glow_intensity = 1.0;
        let frame = render_frame(&bg, &[0.5], &style);

        // Bar rows are 30..70; glow pads 5px beyond.
        assert_ne!(frame.get_pixel(50, 27), bg.get_pixel(50, 27));
        assert_ne!(frame.get_pixel(7, 50), bg.get_pixel(7, 50));
    }

    #[test]
    fn test_bar_alpha_blends_with_background() {
        let bg = RgbaImage::from_pixel(100, 100, Rgba([200, 200, 200, 255]));
        let style = StyleConfig {
            color: [0, 0, 0],
            ..style_one_bar()
        };
        let frame = render_frame(&bg, &[1.0], &style);

        // 0.7 alpha over 200 gray leaves 30% of the background.
        let px = frame.get_pixel(50, 50);
        assert_eq!(px.0[0], 60);
    }
}
