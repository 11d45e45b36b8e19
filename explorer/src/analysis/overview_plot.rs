use std::fs::create_dir_all;
use std::path::Path;

use plotters::prelude::*;
use polars::prelude::*;
use tracing::{info, warn};

use crate::analysis::pathway_summary::{aggregate_pathways, PathwaySummary};
use crate::models::{polars_err, DatasetSpec};

/// Fixed colour map for direction / highest-group labels.
fn colour_for_direction(label: &str) -> RGBColor {
    match label {
        "CD5 hi" => RGBColor(214, 39, 40),
        "CD5 lo" => RGBColor(31, 119, 180),
        "Early" => RGBColor(44, 160, 44),
        "Late" => RGBColor(255, 127, 14),
        "Mature" => RGBColor(148, 103, 189),
        "B6" => RGBColor(140, 86, 75),
        "NOD" => RGBColor(227, 119, 194),
        "BALB/c" => RGBColor(23, 190, 207),
        _ => RGBColor(127, 127, 127),
    }
}

fn bubble_radius(n_total: u32) -> i32 {
    let r = 3.0 + (n_total as f64).sqrt() * 2.0;
    r.min(18.0) as i32
}

/// Scatter of every pathway in the dataset: x = median effect size,
/// y = percent significant, bubble size = reaction count, colour =
/// direction label. Drawn from the unfiltered table, like the
/// dashboards' overview panel.
pub fn plot_pathway_overview(
    df: &DataFrame,
    spec: &DatasetSpec,
    output_path: &Path,
) -> PolarsResult<()> {
    let summaries = aggregate_pathways(df, spec, 0.0)?;
    if summaries.is_empty() {
        warn!("{}: nothing to plot, skipping overview", spec.id);
        return Ok(());
    }

    if let Some(parent) = output_path.parent() {
        create_dir_all(parent).map_err(|e| polars_err(Box::new(e)))?;
    }

    let caption_font = ("sans-serif bold", 24);
    let axis_font = ("sans-serif", 20);
    let label_font = ("sans-serif", 16);

    let x_min = summaries.iter().map(|s| s.median_d).fold(f64::INFINITY, f64::min);
    let x_max = summaries
        .iter()
        .map(|s| s.median_d)
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((x_max - x_min) * 0.1).max(0.5);
    let x_range = (x_min - pad)..(x_max + pad);

    let path_str = output_path.to_string_lossy().to_string();
    let root = BitMapBackend::new(&path_str, (900, 650)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| polars_err(Box::new(e)))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{}: Pathway Effect Size vs Significance", spec.title),
            caption_font,
        )
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, -5.0..105.0)
        .map_err(|e| polars_err(Box::new(e)))?;

    chart
        .configure_mesh()
        .x_desc(spec.effect.axis_label())
        .y_desc("% Significant Reactions")
        .axis_desc_style(axis_font)
        .label_style(label_font)
        .draw()
        .map_err(|e| polars_err(Box::new(e)))?;

    // One series per direction label so each gets a legend entry.
    let mut labels: Vec<&str> = Vec::new();
    for s in &summaries {
        if !labels.contains(&s.direction.as_str()) {
            labels.push(&s.direction);
        }
    }

    for label in labels {
        let colour = colour_for_direction(label);
        let points: Vec<&PathwaySummary> =
            summaries.iter().filter(|s| s.direction == label).collect();

        chart
            .draw_series(points.iter().map(|s| {
                Circle::new(
                    (s.median_d, s.pct_significant),
                    bubble_radius(s.n_total),
                    colour.mix(0.65).filled(),
                )
            }))
            .map_err(|e| polars_err(Box::new(e)))?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, colour.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .legend_area_size(25)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(|e| polars_err(Box::new(e)))?;

    info!("Pathway overview saved to: {}", output_path.display());
    Ok(())
}
