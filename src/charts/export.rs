//! Static Chart Export
//! Chart surface that writes one SVG file per anchor using plotters.
//!
//! Layout of a circular chart:
//! 1. Title centered at the top
//! 2. Pie or doughnut on the left
//! 3. Legend on the right, one row per slice with its tooltip text

use crate::charts::chart_spec::{slice_angles, PLACEHOLDER_TEXT};
use crate::charts::{
    card_anchors, ChartColor, ChartKind, ChartOptions, ChartRenderer, ChartSpec, ChartSurface,
    RenderError,
};
use crate::data::ResultCard;
use plotters::coord::Shift;
use plotters::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_SIZE: (u32, u32) = (900, 560);
const DOUGHNUT_HOLE: f64 = 0.55;

fn to_rgba(color: ChartColor) -> RGBAColor {
    RGBAColor(color.r, color.g, color.b, color.alpha())
}

/// Writes `<anchor>.svg` into an output directory.
pub struct SvgExporter {
    out_dir: PathBuf,
    size: (u32, u32),
}

impl SvgExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir).map_err(|e| RenderError::io("<output>", e))?;
        Ok(Self {
            out_dir,
            size: DEFAULT_SIZE,
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn chart_path(&self, anchor: &str) -> PathBuf {
        self.out_dir.join(format!("{}.svg", anchor))
    }

    fn draw_bar_chart(
        root: &DrawingArea<SVGBackend, Shift>,
        spec: &ChartSpec,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let n = spec.labels.len().max(1);
        let y_max = spec.y_max.unwrap_or(100.0);
        let labels = spec.labels.clone();

        let mut chart = ChartBuilder::on(root)
            .caption(&spec.title, ("sans-serif", 22).into_font().color(&BLACK))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| {
                let idx = x.round();
                if (x - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .x_desc(spec.x_title.clone().unwrap_or_default())
            .y_desc(spec.y_title.clone().unwrap_or_default())
            .axis_desc_style(("sans-serif", 14))
            .draw()?;

        let group_width = 0.8;
        let bar_width = group_width / spec.datasets.len().max(1) as f64;

        for (d, dataset) in spec.datasets.iter().enumerate() {
            let offset = -group_width / 2.0 + bar_width * d as f64;
            let fill = to_rgba(dataset.color_at(0));
            chart
                .draw_series(dataset.values.iter().enumerate().map(|(i, &value)| {
                    let x0 = i as f64 + offset;
                    Rectangle::new(
                        [(x0, 0.0), (x0 + bar_width * 0.9, value)],
                        to_rgba(dataset.color_at(i)).filled(),
                    )
                }))?
                .label(dataset.label.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK.mix(0.3))
            .draw()?;

        Ok(())
    }

    fn draw_circular_chart(
        root: &DrawingArea<SVGBackend, Shift>,
        spec: &ChartSpec,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(dataset) = spec.datasets.first() else {
            return Ok(());
        };
        let (width, height) = root.dim_in_pixel();

        root.draw_text(
            &spec.title,
            &TextStyle::from(("sans-serif", 22).into_font())
                .color(&BLACK)
                .pos(plotters::style::text_anchor::Pos::new(
                    plotters::style::text_anchor::HPos::Center,
                    plotters::style::text_anchor::VPos::Top,
                )),
            ((width / 2) as i32, 15),
        )?;

        let radius = f64::from(height.min(width / 2)) / 2.0 - 40.0;
        let center = ((width / 4) as i32 + 20, (height / 2) as i32 + 15);
        let inner = if spec.kind == ChartKind::Doughnut {
            radius * DOUGHNUT_HOLE
        } else {
            0.0
        };

        for (i, (start, end)) in slice_angles(&dataset.values).into_iter().enumerate() {
            if end <= start {
                continue;
            }
            let points = Self::segment_points(center, radius, inner, start, end);
            root.draw(&Polygon::new(points.clone(), to_rgba(dataset.color_at(i)).filled()))?;
            root.draw(&PathElement::new(
                points,
                to_rgba(dataset.border).stroke_width(2),
            ))?;
        }

        let legend_x = (width / 2) as i32 + 40;
        let legend_y = 80;
        for (i, (_label, color)) in spec.legend_entries().into_iter().enumerate() {
            let y = legend_y + i as i32 * 32;
            root.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 16, y + 16)],
                to_rgba(color).filled(),
            ))?;
            root.draw_text(
                dataset.tooltip_at(i),
                &TextStyle::from(("sans-serif", 15).into_font()).color(&BLACK),
                (legend_x + 26, y + 1),
            )?;
        }

        Ok(())
    }

    /// Outline of one slice; angles clockwise from 12 o'clock.
    fn segment_points(
        center: (i32, i32),
        radius: f64,
        inner: f64,
        start: f64,
        end: f64,
    ) -> Vec<(i32, i32)> {
        let steps = (((end - start) / 2.0).ceil() as usize).max(1);
        let at = |angle: f64, r: f64| {
            let rad = (angle - 90.0).to_radians();
            (
                center.0 + (r * rad.cos()).round() as i32,
                center.1 + (r * rad.sin()).round() as i32,
            )
        };

        let mut points = Vec::with_capacity(2 * steps + 3);
        for i in 0..=steps {
            points.push(at(start + (end - start) * i as f64 / steps as f64, radius));
        }
        if inner > 0.0 {
            for i in (0..=steps).rev() {
                points.push(at(start + (end - start) * i as f64 / steps as f64, inner));
            }
        } else {
            points.push(center);
        }
        points.push(points[0]);
        points
    }
}

impl ChartSurface for SvgExporter {
    fn create_chart(&mut self, anchor: &str, spec: &ChartSpec) -> Result<(), RenderError> {
        let path = self.chart_path(anchor);
        let root = SVGBackend::new(&path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| RenderError::backend(anchor, e))?;

        let drawn = match spec.kind {
            ChartKind::Bar => Self::draw_bar_chart(&root, spec),
            ChartKind::Doughnut | ChartKind::Pie => Self::draw_circular_chart(&root, spec),
        };
        drawn.map_err(|e| RenderError::backend(anchor, e))?;
        root.present().map_err(|e| RenderError::backend(anchor, e))?;
        Ok(())
    }

    fn destroy_chart(&mut self, anchor: &str) {
        let path = self.chart_path(anchor);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove chart file");
            }
        }
    }

    fn show_placeholder(&mut self, anchor: &str, message: &str) -> Result<(), RenderError> {
        let path = self.chart_path(anchor);
        let root = SVGBackend::new(&path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(|e| RenderError::backend(anchor, e))?;

        let (width, height) = root.dim_in_pixel();
        root.draw_text(
            message,
            &TextStyle::from(("sans-serif", 18).into_font())
                .color(&to_rgba(PLACEHOLDER_TEXT))
                .pos(plotters::style::text_anchor::Pos::new(
                    plotters::style::text_anchor::HPos::Center,
                    plotters::style::text_anchor::VPos::Center,
                )),
            ((width / 2) as i32, (height / 2) as i32),
        )
        .map_err(|e| RenderError::backend(anchor, e))?;
        root.present().map_err(|e| RenderError::backend(anchor, e))?;
        Ok(())
    }
}

/// Render every card's three anchors into `out_dir`, cards in parallel.
/// Returns the written file paths in card order.
pub fn export_cards(
    cards: &[ResultCard],
    out_dir: &Path,
    options: ChartOptions,
) -> Result<Vec<PathBuf>, RenderError> {
    std::fs::create_dir_all(out_dir).map_err(|e| RenderError::io("<output>", e))?;

    let written: Vec<Vec<PathBuf>> = cards
        .par_iter()
        .enumerate()
        .map(|(index, card)| {
            let exporter = SvgExporter::new(out_dir)?;
            let mut renderer = ChartRenderer::new(exporter, options);
            renderer.initialize_charts(index, &card.result)?;
            let exporter = renderer.into_surface();
            Ok(card_anchors(index)
                .iter()
                .map(|anchor| exporter.chart_path(anchor))
                .collect())
        })
        .collect::<Result<_, RenderError>>()?;

    let paths: Vec<PathBuf> = written.into_iter().flatten().collect();
    info!(cards = cards.len(), files = paths.len(), dir = %out_dir.display(), "exported charts");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_points_close_the_outline() {
        let pie = SvgExporter::segment_points((100, 100), 50.0, 0.0, 0.0, 90.0);
        assert_eq!(pie.first(), pie.last());
        assert_eq!(pie[0], (100, 50));
        assert!(pie.contains(&(100, 100)));

        let ring = SvgExporter::segment_points((100, 100), 50.0, 25.0, 0.0, 180.0);
        assert_eq!(ring.first(), ring.last());
        assert!(!ring.contains(&(100, 100)));
    }

    #[test]
    fn test_placeholder_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = SvgExporter::new(dir.path()).unwrap();
        exporter
            .show_placeholder("subjectChart0", "No subject data available")
            .unwrap();

        let svg = std::fs::read_to_string(exporter.chart_path("subjectChart0")).unwrap();
        assert!(svg.contains("No subject data available"));

        exporter.destroy_chart("subjectChart0");
        assert!(!exporter.chart_path("subjectChart0").exists());
        exporter.destroy_chart("subjectChart0");
    }
}
