use std::sync::Arc;

use hatchwork::{
    Geometry, LocalFontSource, ModelData, Worker, WorkerConfig,
    protocol::{Inbound, Outbound},
};
use serde_json::json;

fn models() -> Vec<ModelData> {
    vec![
        ModelData {
            id: "field".into(),
            geometry: Geometry::Polygon(vec![vec![
                [10.0, 10.0],
                [90.0, 10.0],
                [90.0, 40.0],
                [10.0, 40.0],
                [10.0, 10.0],
            ]]),
            properties: json!({
                "params": { "hn": 12, "rotation": 0.785 },
                "style": { "strokeStyle": "#336", "lineWidth": 0.5 }
            }),
        },
        ModelData {
            id: "label".into(),
            geometry: Geometry::Polygon(vec![vec![
                [10.0, 50.0],
                [90.0, 50.0],
                [50.0, 95.0],
                [10.0, 50.0],
            ]]),
            properties: json!({
                "params": { "text": "Hatchwork\nflows text into shapes" },
                "style": { "fillStyle": "#222" }
            }),
        },
        ModelData {
            id: "road".into(),
            geometry: Geometry::LineString(vec![[0.0, 0.0], [40.0, 5.0], [100.0, 0.0]]),
            properties: json!({
                "params": { "text": "along the road", "fontsize": 4 },
            }),
        },
    ]
}

#[allow(clippy::unwrap_used)]
#[tokio::main]
async fn main() {
    env_logger::init();

    let Some(font_path) = std::env::args().nth(1) else {
        eprintln!("usage: render_frame <font file>");
        std::process::exit(2);
    };

    let config = WorkerConfig {
        default_font_url: font_path,
        ..WorkerConfig::default()
    };
    let (worker, mut frames) = Worker::new(config, Arc::new(LocalFontSource::new()));

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let runner = tokio::spawn(worker.run(rx));

    tx.send(Inbound::Init {
        models: models(),
        ack: "init".into(),
    })
    .unwrap();
    // 100x100 map units onto a 500x500 canvas, y pointing down
    tx.send(Inbound::RenderFrame {
        extent: [0.0, 0.0, 100.0, 100.0],
        transform: [5.0, 0.0, 0.0, -5.0, 0.0, 500.0],
        id: "frame-1".into(),
    })
    .unwrap();
    drop(tx);
    runner.await.unwrap();

    while let Some(msg) = frames.recv().await {
        if let Outbound::Frame { instructions, .. } = &msg {
            eprintln!("batch of {} commands", instructions.len());
        }
        println!("{}", msg.to_json().unwrap());
        if matches!(msg, Outbound::Frame { .. }) {
            break;
        }
    }
}
