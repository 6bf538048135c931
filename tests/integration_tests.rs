use std::path::Path;

use announce_raster::rendering::background::{procedural_background, NOISE_SEED};
use announce_raster::rendering::compositor::Compositor;
use announce_raster::rendering::fonts::FontSet;
use announce_raster::rendering::raster::blend_rect;
use announce_raster::{
    render_with_fallback, AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, Error,
    OutputFormat, RasterEngine, RenderOptions, RenderOutput, Result, StyleConfig,
};
use pretty_assertions::assert_eq;

fn no_font_files() -> StyleConfig {
    StyleConfig {
        font_regular: "/nonexistent/regular.ttf".into(),
        font_bold: "/nonexistent/bold.ttf".into(),
        ..Default::default()
    }
}

fn render(content: &AnnouncementContent, background: Option<&Path>) -> RenderOutput {
    RasterEngine::new(RenderOptions::default())
        .render(
            content,
            &AnnouncementLayout::defaults_for(content),
            &no_font_files(),
            background,
        )
        .expect("render")
}

fn decode(out: &RenderOutput) -> image::RgbImage {
    image::load_from_memory(&out.bytes)
        .expect("decode output")
        .to_rgb8()
}

#[test]
fn test_indisponibilidade_renders_two_fixed_lines() {
    for title in ["Indisponibilidade", "INDISPONIBILIDADE", "indisponibilidade"] {
        let content = AnnouncementContent {
            title: Some(title.to_string()),
            ..Default::default()
        };
        let fonts = FontSet::builtin();
        let list = Compositor::new(&fonts, 1200, 630).compose(
            &content,
            &AnnouncementLayout::defaults_for(&content),
            &StyleConfig::default(),
        );
        assert_eq!(list.texts(), vec!["INDISPONIBILIDADE", "DETECTADA"]);
    }
}

#[test]
fn test_missing_template_gives_deterministic_gradient() {
    let content = AnnouncementContent {
        body: Some("<p>Hello</p>".to_string()),
        ..Default::default()
    };
    let missing = Path::new("/nonexistent/template.png");
    let first = render(&content, Some(missing));
    let second = render(&content, Some(missing));

    assert_eq!((first.width, first.height), (1200, 630));
    assert_eq!(first.bytes, second.bytes);

    let canvas = decode(&first);
    let mut expected = procedural_background(1200, 630, NOISE_SEED);
    // top-right corner is never drawn on
    assert_eq!(canvas.get_pixel(1199, 0), expected.get_pixel(1199, 0));

    // panel edge above the first body row
    blend_rect(&mut expected, 40, 490, 900, 200, (255, 255, 255, 230));
    assert_eq!(canvas.get_pixel(930, 495), expected.get_pixel(930, 495));
}

#[test]
fn test_template_sets_canvas_size() {
    let path = std::env::temp_dir().join("announce-raster-it-template.png");
    image::RgbImage::from_pixel(1000, 1300, image::Rgb([200, 10, 10]))
        .save(&path)
        .unwrap();
    let content = AnnouncementContent {
        title: Some("Normalização".to_string()),
        footer: Some("<p>Equipe de Operações</p>".to_string()),
        ..Default::default()
    };
    let out = render(&content, Some(&path));
    assert_eq!((out.width, out.height), (1000, 1300));
    let canvas = decode(&out);
    assert_eq!(canvas.get_pixel(999, 1299), &image::Rgb([200, 10, 10]));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_long_body_is_truncated_and_flagged() {
    let body: String = (1..=30).map(|i| format!("<p>Item {}</p>", i)).collect();
    let content = AnnouncementContent {
        body: Some(body),
        ..Default::default()
    };
    let out = render(&content, None);
    assert!(out.truncated);

    let short = AnnouncementContent {
        body: Some("<p>One line</p>".to_string()),
        ..Default::default()
    };
    assert!(!render(&short, None).truncated);
}

#[test]
fn test_out_of_range_layout_still_renders() {
    let content = AnnouncementContent {
        title: Some("Aviso".to_string()),
        subtitle: Some("Portal".to_string()),
        body: Some("<p>Texto do <b>corpo</b></p>".to_string()),
        footer: Some("<p>Equipe</p>".to_string()),
        audience: Some("Todos".to_string()),
    };
    let engine = RasterEngine::new(RenderOptions::default());
    for raw in [
        r#"{"title": {"x": 1500000000, "y": 80}}"#,
        r#"{"audience": {"x": 3000000000, "y": 560}}"#,
        r#"{"body": {"x": 60, "y": 4294967295}}"#,
        r#"{"body": {"x": 60, "y": 100, "font_size": 3000000000}}"#,
        r#"{"footer": {"x": 4294967295, "y": 4294967295, "font_size": 4294967295}}"#,
    ] {
        let layout: AnnouncementLayout = serde_json::from_str(raw).unwrap();
        let out = engine
            .render(&content, &layout, &no_font_files(), None)
            .unwrap_or_else(|e| panic!("{} failed: {}", raw, e));
        assert_eq!((out.width, out.height), (1200, 630));
    }
}

#[test]
fn test_jpeg_output() {
    let engine = RasterEngine::new(RenderOptions {
        format: OutputFormat::Jpeg,
    });
    let content = AnnouncementContent {
        title: Some("Manutenção".to_string()),
        subtitle: Some("Janela das 22h às 23h".to_string()),
        audience: Some("Todos os clientes".to_string()),
        ..Default::default()
    };
    let out = engine
        .render(
            &content,
            &AnnouncementLayout::default(),
            &no_font_files(),
            None,
        )
        .unwrap();
    assert_eq!(out.format, OutputFormat::Jpeg);
    assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
}

struct Unavailable;

impl AnnouncementRenderer for Unavailable {
    fn render(
        &self,
        _content: &AnnouncementContent,
        _layout: &AnnouncementLayout,
        _style: &StyleConfig,
        _background: Option<&Path>,
    ) -> Result<RenderOutput> {
        Err(Error::InitializationError("no browser".into()))
    }
}

#[test]
fn test_fallback_to_raster_engine() {
    let engine = RasterEngine::new(RenderOptions::default());
    let content = AnnouncementContent {
        title: Some("Aviso".to_string()),
        ..Default::default()
    };
    let out = render_with_fallback(
        &Unavailable,
        &engine,
        &content,
        &AnnouncementLayout::default(),
        &no_font_files(),
        None,
    )
    .unwrap();
    assert_eq!((out.width, out.height), (1200, 630));
    assert_eq!(&out.bytes[1..4], b"PNG");
}
