//! Chart Viewer Widget
//! Scrollable list of result cards, each with three interactive charts and a
//! PDF download control.

use crate::charts::{card_anchors, ChartBoard, ChartOptions, ChartPlotter, ChartRenderer, RenderError};
use crate::data::ResultCard;
use crate::download::{DownloadControl, ReportRequest, DOWNLOAD_LABEL};
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const CHART_HEIGHT: f32 = 280.0;
const PASS_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
const FAIL_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// A card plus the state of its download button.
pub struct CardView {
    pub card: ResultCard,
    pub control: DownloadControl,
}

impl CardView {
    pub fn new(index: usize, card: ResultCard) -> Self {
        Self {
            card,
            control: DownloadControl::new(format!("download{}", index), DOWNLOAD_LABEL),
        }
    }

    /// The report request behind the download button, when both the launch
    /// and the student are known.
    pub fn report_request(&self) -> Option<ReportRequest> {
        let launch_id = self.card.launch_id?;
        let student_id = self.card.resolved_student_id()?;
        Some(ReportRequest::new(launch_id, student_id))
    }

    pub fn title(&self) -> String {
        match &self.card.section_name {
            Some(section) => format!("{} · {}", self.card.launch_name, section),
            None => self.card.launch_name.clone(),
        }
    }

    /// "Name (Roll) · Grade A · CGPA 8.50 · 85.0%"
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(info) = &self.card.result.student_info {
            match (&info.name, &info.roll_number) {
                (Some(name), Some(roll)) => parts.push(format!("{} ({})", name, roll)),
                (Some(name), None) => parts.push(name.clone()),
                (None, Some(roll)) => parts.push(roll.clone()),
                (None, None) => {}
            }
        }
        if let Some(overall) = &self.card.result.overall {
            if let Some(grade) = &overall.grade {
                parts.push(format!("Grade {}", grade));
            }
            if let Some(cgpa) = overall.cgpa {
                parts.push(format!("CGPA {:.2}", cgpa));
            }
            if let Some(percentage) = overall.percentage {
                parts.push(format!("{:.1}%", percentage));
            }
        }
        if let Some(date) = &self.card.launch_date {
            parts.push(date.clone());
        }

        parts.join(" · ")
    }
}

/// Result cards and the chart board their charts live on.
pub struct ChartViewer {
    pub cards: Vec<CardView>,
    renderer: ChartRenderer<ChartBoard>,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            renderer: ChartRenderer::new(ChartBoard::new(), ChartOptions::default()),
        }
    }
}

impl ChartViewer {
    pub fn new(options: ChartOptions) -> Self {
        Self {
            cards: Vec::new(),
            renderer: ChartRenderer::new(ChartBoard::new(), options),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn board(&self) -> &ChartBoard {
        self.renderer.surface()
    }

    pub fn card_data(&self) -> Vec<ResultCard> {
        self.cards.iter().map(|view| view.card.clone()).collect()
    }

    /// Clear all charts
    pub fn clear(&mut self) {
        self.renderer.clear();
        self.renderer.surface_mut().clear();
        self.cards.clear();
    }

    /// Replace the cards and render their charts
    pub fn set_cards(&mut self, cards: Vec<ResultCard>) -> Result<(), RenderError> {
        self.clear();
        self.cards = cards
            .into_iter()
            .enumerate()
            .map(|(index, card)| CardView::new(index, card))
            .collect();
        self.render_all()
    }

    /// Re-render every card with new presentation options
    pub fn set_options(&mut self, options: ChartOptions) -> Result<(), RenderError> {
        self.renderer.set_options(options);
        self.render_all()
    }

    /// Renders every card even when one fails; the first error is returned.
    fn render_all(&mut self) -> Result<(), RenderError> {
        let mut first_error = None;
        for (index, view) in self.cards.iter().enumerate() {
            if let Err(e) = self.renderer.initialize_charts(index, &view.card.result) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Draw the cards; returns the indices whose download button was clicked
    pub fn show(&mut self, ui: &mut egui::Ui) -> Vec<usize> {
        let mut clicked = Vec::new();

        if self.cards.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Results").size(20.0));
            });
            return clicked;
        }

        let board = self.renderer.surface();
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (index, view) in self.cards.iter().enumerate() {
                    if Self::draw_card(ui, board, index, view) {
                        clicked.push(index);
                    }
                    ui.add_space(CARD_SPACING);
                }
            });

        clicked
    }

    /// Draw one card; returns true when its download button was clicked
    fn draw_card(ui: &mut egui::Ui, board: &ChartBoard, index: usize, view: &CardView) -> bool {
        let passing = view
            .card
            .result
            .overall
            .as_ref()
            .map(|overall| overall.is_passing);
        let border_color = match passing {
            Some(true) => PASS_COLOR,
            Some(false) => FAIL_COLOR,
            None => Color32::from_rgb(102, 126, 234),
        };
        let mut clicked = false;

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, border_color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(format!("📋 {}", view.title()))
                                .size(18.0)
                                .strong()
                                .color(border_color),
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let enabled =
                                view.control.is_enabled() && view.report_request().is_some();
                            ui.add_enabled_ui(enabled, |ui| {
                                if ui.button(view.control.label()).clicked() {
                                    clicked = true;
                                }
                            });
                        });
                    });

                    let summary = view.summary();
                    if !summary.is_empty() {
                        ui.label(RichText::new(summary).size(13.0).color(Color32::GRAY));
                    }

                    ui.add_space(10.0);

                    let anchors = card_anchors(index);
                    ui.columns(anchors.len(), |columns| {
                        for (column, anchor) in columns.iter_mut().zip(anchors.iter()) {
                            ChartPlotter::draw_anchor(column, board, anchor, CHART_HEIGHT);
                        }
                    });
                });
            });

        clicked
    }
}
