use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

use veneer::align::{AlignOutcome, ItemAligner, RenderContext, TextItem};
use veneer::font::{FontMetrics, TableRegistry};
use veneer::geometry::StaticPage;
use veneer::measure::NullMeasurer;

#[derive(Debug, Deserialize)]
struct Scene {
    page: ScenePage,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default)]
    rotation: i32,
    #[serde(default)]
    fonts: HashMap<String, FontMetrics>,
    items: Vec<SceneItem>,
}

#[derive(Debug, Deserialize)]
struct ScenePage {
    view_box: [f64; 4],
    #[serde(default)]
    rotation: i32,
}

#[derive(Debug, Deserialize)]
struct SceneItem {
    text: String,
    font_name: String,
    width: f64,
    transform: [f64; 6],
}

fn default_scale() -> f64 {
    1.0
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut path: Option<String> = None;
    let mut scale_override: Option<f64> = None;
    let mut rotation_override: Option<i32> = None;

    let mut i = 0usize;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--scale" => {
                if i + 1 >= args.len() {
                    eprintln!("missing value for --scale");
                    std::process::exit(2);
                }
                match args[i + 1].parse() {
                    Ok(value) => scale_override = Some(value),
                    Err(_) => {
                        eprintln!("invalid value for --scale: {}", args[i + 1]);
                        std::process::exit(2);
                    }
                }
                i += 1;
            }
            "--rotation" => {
                if i + 1 >= args.len() {
                    eprintln!("missing value for --rotation");
                    std::process::exit(2);
                }
                match args[i + 1].parse() {
                    Ok(value) => rotation_override = Some(value),
                    Err(_) => {
                        eprintln!("invalid value for --rotation: {}", args[i + 1]);
                        std::process::exit(2);
                    }
                }
                i += 1;
            }
            _ => {
                path = Some(arg.clone());
            }
        }
        i += 1;
    }

    let Some(path) = path else {
        eprintln!("usage: veneer <scene.json> [--scale N] [--rotation DEG]");
        std::process::exit(2);
    };

    let data = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let scene: Scene = serde_json::from_str(&data).context("invalid scene JSON")?;

    let page = StaticPage::new(scene.page.view_box.into(), scene.page.rotation);
    let ctx = RenderContext {
        scale: scale_override.unwrap_or(scene.scale),
        rotation: rotation_override.unwrap_or(scene.rotation),
    };
    let registry = TableRegistry::new(scene.fonts);
    let measurer = NullMeasurer;

    for item in scene.items {
        let aligner = ItemAligner::new(TextItem::new(
            item.text,
            item.font_name,
            item.width,
            item.transform.into(),
        ));
        aligner.mount();
        match aligner.align(&page, &ctx, &registry, &measurer).await {
            AlignOutcome::Placed(_) => {
                if let Some(span) = aligner.span(None) {
                    println!("{}", serde_json::to_string(&span)?);
                }
            }
            outcome => log::warn!("item was not placed: {:?}", outcome),
        }
    }

    Ok(())
}
