use criterion::{black_box, criterion_group, criterion_main, Criterion};

use announce_raster::rendering::background::{procedural_background, NOISE_SEED};
use announce_raster::rendering::fonts::FixedAdvance;
use announce_raster::rendering::layout::wrap_rich_text;
use announce_raster::rendering::markup::normalize;
use announce_raster::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, RasterEngine, RenderOptions,
    StyleConfig,
};

const BODY: &str = "<p>Identificamos <b>instabilidade</b> no serviço de autenticação a partir das \
    14h10. Usuários podem enfrentar <i>lentidão</i> ou falhas no login.</p>\
    <ul><li>Portal do cliente</li><li>Aplicativo móvel</li><li>API pública</li></ul>\
    <p>A equipe de operações já atua na correção e novas atualizações serão enviadas \
    a cada 30 minutos.</p>";

fn bench_wrap(c: &mut Criterion) {
    let normalized = normalize(BODY);
    let measurer = FixedAdvance::uniform(12.0);
    c.bench_function("normalize_body", |b| b.iter(|| normalize(black_box(BODY))));
    c.bench_function("wrap_body_840", |b| {
        b.iter(|| wrap_rich_text(black_box(&normalized), 840.0, &measurer))
    });
}

fn bench_background(c: &mut Criterion) {
    c.bench_function("procedural_background_1200x630", |b| {
        b.iter(|| procedural_background(1200, 630, black_box(NOISE_SEED)))
    });
}

fn bench_render(c: &mut Criterion) {
    let engine = RasterEngine::new(RenderOptions::default());
    let content = AnnouncementContent {
        title: Some("Instabilidade".to_string()),
        subtitle: Some("Autenticação".to_string()),
        body: Some(BODY.to_string()),
        footer: Some("<p>Equipe de Operações</p>".to_string()),
        audience: Some("Todos os clientes".to_string()),
    };
    let layout = AnnouncementLayout::defaults_for(&content);
    let style = StyleConfig::default();

    c.bench_function("render_png_default_canvas", |b| {
        b.iter(|| {
            engine
                .render(black_box(&content), &layout, &style, None)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_wrap, bench_background, bench_render);
criterion_main!(benches);
