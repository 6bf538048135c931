//! Render a sample incident announcement to `announcement.png`, plus its HTML
//! preview, using the default layout for its title.

use announce_raster::preview::preview_html;
use announce_raster::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, RasterEngine, RenderOptions,
    StyleConfig,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let content = AnnouncementContent {
        title: Some("Indisponibilidade".to_string()),
        subtitle: Some("Portal do cliente".to_string()),
        body: Some(
            "<p>O portal está <b>indisponível</b> desde as 09h40.</p>\
             <p>Serviços afetados:</p>\
             <ul><li>Login</li><li>Emissão de boletos</li></ul>\
             <p>Próxima atualização em <i>30 minutos</i>.</p>"
                .to_string(),
        ),
        footer: Some("<p>Central de Operações &mdash; 24x7</p>".to_string()),
        audience: Some("Clientes e parceiros".to_string()),
    };
    let layout = AnnouncementLayout::defaults_for(&content);
    let style = StyleConfig::default();

    let engine = RasterEngine::new(RenderOptions::default());
    let output = engine.render(&content, &layout, &style, None)?;
    std::fs::write("announcement.png", &output.bytes)?;
    println!(
        "announcement.png: {}x{}, {} bytes{}",
        output.width,
        output.height,
        output.bytes.len(),
        if output.truncated { " (body truncated)" } else { "" }
    );

    std::fs::write("announcement.html", preview_html(&content, &layout, &style, None))?;
    println!("announcement.html written");
    Ok(())
}
