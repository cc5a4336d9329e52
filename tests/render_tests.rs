//! Integration tests for background normalization, rendering, and the
//! frame store.

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use wavebar_visualizer::frames::FrameStore;
use wavebar_visualizer::render::{load_background, render_frame, StyleConfig};

fn write_jpeg(path: &std::path::Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([120, 40, 200]))
        .save(path)
        .unwrap();
}

#[test]
fn test_odd_jpeg_normalized_to_even() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.jpg");
    write_jpeg(&path, 641, 481);

    let background = load_background(&path).unwrap();
    assert_eq!(background.dimensions(), (640, 480));
}

#[test]
fn test_even_png_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.png");
    RgbaImage::from_pixel(320, 200, Rgba([1, 2, 3, 255]))
        .save(&path)
        .unwrap();

    let background = load_background(&path).unwrap();
    assert_eq!(background.dimensions(), (320, 200));
}

#[test]
fn test_rendered_frames_land_in_store_with_even_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cover.jpg");
    write_jpeg(&path, 321, 241);

    let background = load_background(&path).unwrap();
    let style = StyleConfig::default();
    let store = FrameStore::new().unwrap();

    for (index, level) in [0.0f32, 0.5, 1.0].iter().enumerate() {
        let amps = vec![*level; style.bar_count as usize];
        let frame = render_frame(&background, &amps, &style);
        assert_eq!(frame.dimensions(), background.dimensions());
        store.write_frame(index, &frame).unwrap();
    }

    assert_eq!(store.frame_count(), 3);
    let (width, height) = store.first_frame_dimensions().unwrap();
    assert_eq!(width % 2, 0);
    assert_eq!(height % 2, 0);
}

#[test]
fn test_store_renormalization_rewrites_every_frame() {
    let store = FrameStore::new().unwrap();
    let odd = RgbaImage::from_pixel(11, 9, Rgba([5, 5, 5, 255]));
    for index in 0..4 {
        store.write_frame(index, &odd).unwrap();
    }

    store.renormalize_all(10, 8).unwrap();
    for index in 0..4 {
        let dims = image::image_dimensions(store.frame_path(index)).unwrap();
        assert_eq!(dims, (10, 8));
    }
}

#[test]
fn test_undecodable_background_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.png");
    std::fs::write(&path, b"not a png at all").unwrap();

    assert!(load_background(&path).is_err());
}
