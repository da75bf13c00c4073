//! `roachwatch detect`: the terminal counterpart of the browser client.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::Rgba;
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use roachwatch_core::{layout_boxes, InferenceOutput, OverlayBox, OverlayFilter};

use crate::terminal_output::{note_info, note_success, note_warn, render_table, Column};

/// Stroke width of annotated boxes, in pixels.
const STROKE: i32 = 3;

pub async fn run(
    base_url: &str,
    image_path: &Path,
    filter: &OverlayFilter,
    annotate: Option<&Path>,
) -> Result<()> {
    let data = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("Failed to read {}", image_path.display()))?;
    let (width, height) = image::image_dimensions(image_path)
        .with_context(|| format!("Not a readable image: {}", image_path.display()))?;

    let endpoint = format!("{}/api/DetectCockroach", base_url.trim_end_matches('/'));
    note_info(&format!("Posting {} bytes to {endpoint}", data.len()));

    let resp = reqwest::Client::new()
        .post(&endpoint)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(data)
        .send()
        .await
        .with_context(|| format!("Could not reach {endpoint}"))?;

    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        bail!("API failed: {} {}", status.as_u16(), String::from_utf8_lossy(&body));
    }

    let output = InferenceOutput::parse(body)?;
    let pretty: serde_json::Value = serde_json::from_slice(&output.raw)?;
    println!("{}", serde_json::to_string_pretty(&pretty)?);

    let boxes = layout_boxes(&output.predictions, width as f64, height as f64, filter);
    if boxes.is_empty() {
        note_warn(&format!(
            "No '{}' above {:.0}% in this image",
            filter.tag,
            filter.threshold * 100.0
        ));
        return Ok(());
    }
    print!("{}", box_table(&boxes));

    if let Some(out) = annotate {
        draw_boxes(image_path, &boxes, out)?;
        note_success(&format!("Annotated image written to {}", out.display()));
    }
    Ok(())
}

fn box_table(boxes: &[OverlayBox]) -> String {
    let columns = [
        Column::left("Label"),
        Column::right("X"),
        Column::right("Y"),
        Column::right("Width"),
        Column::right("Height"),
    ];
    let rows: Vec<Vec<String>> = boxes
        .iter()
        .map(|b| {
            vec![
                b.label.clone(),
                format!("{:.0}", b.x),
                format!("{:.0}", b.y),
                format!("{:.0}", b.width),
                format!("{:.0}", b.height),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// Draw each box in red onto a copy of the source image.
fn draw_boxes(image_path: &Path, boxes: &[OverlayBox], out: &Path) -> Result<()> {
    let mut img = image::open(image_path)
        .with_context(|| format!("Failed to decode {}", image_path.display()))?
        .to_rgba8();

    for b in boxes {
        let (x, y) = (b.x.round() as i32, b.y.round() as i32);
        let (w, h) = (b.width.round() as i32, b.height.round() as i32);
        // Nested outlines give the stroke its width.
        for i in 0..STROKE {
            let (rw, rh) = (w - 2 * i, h - 2 * i);
            if rw <= 0 || rh <= 0 {
                break;
            }
            let rect = Rect::at(x + i, y + i).of_size(rw as u32, rh as u32);
            draw_hollow_rect_mut(&mut img, rect, Rgba([255, 0, 0, 255]));
        }
    }

    img.save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(())
}
