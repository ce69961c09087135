//! Control Panel Widget
//! Left side panel with data source, chart options and export controls.

use crate::charts::{ChartOptions, ExamTooltip, PassFailLegend};
use crate::download::DownloadStrategy;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Left side control panel with file selection, portal fetch and options.
pub struct ControlPanel {
    pub file_path: Option<PathBuf>,
    pub student_id: String,
    pub base_url: String,
    pub options: ChartOptions,
    pub strategy: DownloadStrategy,
    pub status: String,
    pub busy: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            file_path: None,
            student_id: String::new(),
            base_url: String::new(),
            options: ChartOptions::default(),
            strategy: DownloadStrategy::default(),
            status: "Ready".to_string(),
            busy: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed student id, if the field holds a whole number
    pub fn parsed_student_id(&self) -> Option<i64> {
        self.student_id.trim().parse().ok()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🎓 Result Charts")
                    .size(22.0)
                    .color(Color32::from_rgb(102, 126, 234)),
            );
            ui.label(RichText::new("Student Results").size(11.0).color(Color32::GRAY));
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Result File").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .file_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.file_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Open").clicked() {
                                action = ControlPanelAction::OpenFile;
                            }
                        });
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Portal Section =====
        ui.label(RichText::new("🌐 Result Portal").size(14.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new(&self.base_url).size(11.0).color(Color32::GRAY));
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([80.0, 20.0], egui::Label::new("Student ID:"));
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.student_id)
                    .desired_width(110.0)
                    .hint_text("e.g. 1042"),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let can_fetch = !self.busy && self.parsed_student_id().is_some();
            ui.add_enabled_ui(can_fetch, |ui| {
                if ui.button("⬇ Fetch").clicked() || (submitted && can_fetch) {
                    action = ControlPanelAction::FetchResults;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Options Section =====
        ui.label(RichText::new("⚙️ Options").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 110.0;
        let combo_width = 150.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Exam tooltip:"));
            ComboBox::from_id_salt("exam_tooltip")
                .width(combo_width)
                .selected_text(exam_tooltip_label(self.options.exam_tooltip))
                .show_ui(ui, |ui| {
                    for choice in [ExamTooltip::ValueAndPercent, ExamTooltip::ValueOnly] {
                        if ui
                            .selectable_value(
                                &mut self.options.exam_tooltip,
                                choice,
                                exam_tooltip_label(choice),
                            )
                            .clicked()
                        {
                            action = ControlPanelAction::OptionsChanged;
                        }
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Pass/fail legend:"));
            ComboBox::from_id_salt("pass_fail_legend")
                .width(combo_width)
                .selected_text(legend_label(self.options.pass_fail_legend))
                .show_ui(ui, |ui| {
                    for choice in [PassFailLegend::AlwaysShow, PassFailLegend::HideZero] {
                        if ui
                            .selectable_value(
                                &mut self.options.pass_fail_legend,
                                choice,
                                legend_label(choice),
                            )
                            .clicked()
                        {
                            action = ControlPanelAction::OptionsChanged;
                        }
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("PDF download:"));
            ComboBox::from_id_salt("download_strategy")
                .width(combo_width)
                .selected_text(strategy_label(self.strategy))
                .show_ui(ui, |ui| {
                    for choice in [DownloadStrategy::FetchAndSave, DownloadStrategy::Navigate] {
                        if ui
                            .selectable_value(&mut self.strategy, choice, strategy_label(choice))
                            .clicked()
                        {
                            action = ControlPanelAction::StrategyChanged;
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export SVG…").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportSvg;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.busy {
            ui.add(egui::Spinner::new());
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

fn exam_tooltip_label(choice: ExamTooltip) -> &'static str {
    match choice {
        ExamTooltip::ValueAndPercent => "Marks and share",
        ExamTooltip::ValueOnly => "Marks only",
    }
}

fn legend_label(choice: PassFailLegend) -> &'static str {
    match choice {
        PassFailLegend::AlwaysShow => "Always show both",
        PassFailLegend::HideZero => "Hide empty",
    }
}

fn strategy_label(choice: DownloadStrategy) -> &'static str {
    match choice {
        DownloadStrategy::FetchAndSave => "Fetch and save",
        DownloadStrategy::Navigate => "Open in browser",
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    OpenFile,
    FetchResults,
    OptionsChanged,
    StrategyChanged,
    ExportSvg,
}
