//! Chart Plotter Module
//! Interactive chart surface drawn with egui_plot.

use crate::charts::chart_spec::{slice_angles, slice_at, PLACEHOLDER_TEXT};
use crate::charts::{ChartColor, ChartKind, ChartSpec, ChartSurface, RenderError};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Polygon};
use std::collections::HashMap;

/// Doughnut hole as a fraction of the outer radius
const DOUGHNUT_HOLE: f64 = 0.55;
/// Arc resolution in degrees
const ARC_STEP: f64 = 3.0;
/// Bar group width in x units
const GROUP_WIDTH: f64 = 0.8;

/// What an anchor currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorContent {
    Chart(ChartSpec),
    Placeholder(String),
}

/// In-memory chart surface for the desktop viewer. Charts are kept as specs
/// and redrawn every frame.
#[derive(Debug, Default)]
pub struct ChartBoard {
    anchors: HashMap<String, AnchorContent>,
}

impl ChartBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, anchor: &str) -> Option<&AnchorContent> {
        self.anchors.get(anchor)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn chart_count(&self) -> usize {
        self.anchors
            .values()
            .filter(|c| matches!(c, AnchorContent::Chart(_)))
            .count()
    }

    /// Drop every chart and placeholder.
    pub fn clear(&mut self) {
        self.anchors.clear();
    }
}

impl ChartSurface for ChartBoard {
    fn create_chart(&mut self, anchor: &str, spec: &ChartSpec) -> Result<(), RenderError> {
        self.anchors
            .insert(anchor.to_string(), AnchorContent::Chart(spec.clone()));
        Ok(())
    }

    fn destroy_chart(&mut self, anchor: &str) {
        self.anchors.remove(anchor);
    }

    fn show_placeholder(&mut self, anchor: &str, message: &str) -> Result<(), RenderError> {
        self.anchors.insert(
            anchor.to_string(),
            AnchorContent::Placeholder(message.to_string()),
        );
        Ok(())
    }
}

pub fn to_color32(color: ChartColor) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Draws board content with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw whatever the anchor holds; an unknown anchor draws nothing.
    pub fn draw_anchor(ui: &mut egui::Ui, board: &ChartBoard, anchor: &str, height: f32) {
        match board.get(anchor) {
            Some(AnchorContent::Chart(spec)) => Self::draw_chart(ui, anchor, spec, height),
            Some(AnchorContent::Placeholder(message)) => {
                Self::draw_placeholder(ui, message, height)
            }
            None => {}
        }
    }

    pub fn draw_chart(ui: &mut egui::Ui, anchor: &str, spec: &ChartSpec, height: f32) {
        ui.label(RichText::new(&spec.title).size(13.0).strong());
        match spec.kind {
            ChartKind::Bar => Self::draw_bar_chart(ui, anchor, spec, height),
            ChartKind::Doughnut | ChartKind::Pie => {
                Self::draw_circular_chart(ui, anchor, spec, height)
            }
        }
    }

    fn draw_placeholder(ui: &mut egui::Ui, message: &str, height: f32) {
        ui.allocate_ui(egui::vec2(ui.available_width(), height), |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(message)
                        .size(13.0)
                        .color(to_color32(PLACEHOLDER_TEXT)),
                );
            });
        });
    }

    /// Grouped bars: one group per label, one bar per dataset.
    pub fn draw_bar_chart(ui: &mut egui::Ui, anchor: &str, spec: &ChartSpec, height: f32) {
        let x_labels = spec.labels.clone();
        let n_sets = spec.datasets.len().max(1);
        let bar_width = GROUP_WIDTH / n_sets as f64;
        let y_max = spec.y_max.unwrap_or(100.0);

        let mut plot = Plot::new(format!("plot_{}", anchor))
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(y_max)
            .legend(Legend::default())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                x_labels.get(idx as usize).cloned().unwrap_or_default()
            });
        if let Some(x_title) = &spec.x_title {
            plot = plot.x_axis_label(x_title.clone());
        }
        if let Some(y_title) = &spec.y_title {
            plot = plot.y_axis_label(y_title.clone());
        }

        plot.show(ui, |plot_ui| {
            for (d, dataset) in spec.datasets.iter().enumerate() {
                let offset = -GROUP_WIDTH / 2.0 + bar_width * (d as f64 + 0.5);
                let bars: Vec<Bar> = dataset
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, &value)| {
                        Bar::new(i as f64 + offset, value)
                            .width(bar_width * 0.9)
                            .name(dataset.tooltip_at(i))
                            .fill(to_color32(dataset.color_at(i)))
                            .stroke(Stroke::new(1.5, to_color32(dataset.border)))
                    })
                    .collect();

                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(&dataset.label)
                        .color(to_color32(dataset.color_at(0)))
                        .element_formatter(Box::new(|bar, _chart| bar.name.clone())),
                );
            }
        });
    }

    /// Pie or doughnut drawn from small convex wedges, with a custom legend.
    pub fn draw_circular_chart(ui: &mut egui::Ui, anchor: &str, spec: &ChartSpec, height: f32) {
        let Some(dataset) = spec.datasets.first() else {
            return;
        };
        let inner = if spec.kind == ChartKind::Doughnut {
            DOUGHNUT_HOLE
        } else {
            0.0
        };
        let values = dataset.values.clone();
        let tooltips = dataset.tooltips.clone();

        Plot::new(format!("plot_{}", anchor))
            .height(height - 28.0)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_x(-1.1)
            .include_x(1.1)
            .include_y(-1.1)
            .include_y(1.1)
            .label_formatter(move |_name, point| {
                let radius = (point.x * point.x + point.y * point.y).sqrt();
                if radius > 1.0 || radius < inner {
                    return String::new();
                }
                let clockwise = 90.0 - point.y.atan2(point.x).to_degrees();
                slice_at(&values, clockwise)
                    .and_then(|i| tooltips.get(i).cloned())
                    .unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                for (i, (start, end)) in slice_angles(&dataset.values)
                    .into_iter()
                    .enumerate()
                {
                    let fill = to_color32(dataset.color_at(i));
                    for wedge in Self::wedges(start, end, inner) {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::new(wedge))
                                .fill_color(fill)
                                .stroke(Stroke::new(0.5, fill)),
                        );
                    }
                }
            });

        ui.horizontal_wrapped(|ui| {
            for (label, color) in spec.legend_entries() {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, to_color32(color));
                ui.label(RichText::new(label).size(11.0));
                ui.add_space(8.0);
            }
        });
    }

    /// Split the arc [start, end) into convex pieces on the unit circle.
    /// Angles are clockwise from 12 o'clock; `inner` is the hole radius.
    fn wedges(start: f64, end: f64, inner: f64) -> Vec<Vec<[f64; 2]>> {
        let mut pieces = Vec::new();
        let mut a = start;
        while a < end {
            let b = (a + ARC_STEP).min(end);
            let p = |angle: f64, r: f64| {
                let rad = (90.0 - angle).to_radians();
                [r * rad.cos(), r * rad.sin()]
            };
            if inner > 0.0 {
                pieces.push(vec![p(a, inner), p(a, 1.0), p(b, 1.0), p(b, inner)]);
            } else {
                pieces.push(vec![[0.0, 0.0], p(a, 1.0), p(b, 1.0)]);
            }
            a = b;
        }
        pieces
    }
}
