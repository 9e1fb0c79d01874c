use crate::app::{ConverterApp, NoticeKind};
use crate::constants::{APP_VERSION, PROGRESS_UPDATE_INTERVAL_MS};
use crate::presets::{OutputFormat, QualityPreset};
use crate::services::OverwritePolicy;
use crate::state::JobState;
use eframe::egui;

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(12.0, 8.0);
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        ctx.set_style(style);
        ctx.set_visuals(egui::Visuals::dark());

        let modal_open = !self.notices.is_empty();

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(15.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new("🎬 Video Converter").size(26.0).color(egui::Color32::WHITE).strong());
                    ui.label(egui::RichText::new("Batch conversion powered by FFmpeg").size(13.0).color(egui::Color32::from_rgb(150, 150, 150)));
                });
            });

        egui::TopBottomPanel::bottom("controls")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(15.0))
            .show(ctx, |ui| {
                ui.add_enabled_ui(!modal_open, |ui| self.show_main_controls(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_selection_card(ui);
                    ui.add_space(12.0);
                    self.show_settings_card(ui);
                    ui.add_space(12.0);
                    self.show_progress_card(ui);
                });
            });
        });

        self.show_notice(ctx);

        if self.is_converting() {
            ctx.request_repaint_after(std::time::Duration::from_millis(PROGRESS_UPDATE_INTERVAL_MS));
        }
    }
}

fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(egui::Color32::from_gray(30))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(45)))
        .rounding(10.0)
        .inner_margin(16.0)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                ui.heading(egui::RichText::new(title).color(egui::Color32::WHITE).size(17.0));
                ui.add_space(8.0);
                add_contents(ui);
            });
        });
}

impl ConverterApp {
    fn show_selection_card(&mut self, ui: &mut egui::Ui) {
        card(ui, "📁 Videos", |ui| {
            ui.label(egui::RichText::new(&self.status_label).strong());
            let running = self.is_converting();
            if ui.add_enabled(!running, egui::Button::new("➕ Select Videos")).clicked() {
                self.select_videos();
            }

            if !self.videos.is_empty() {
                egui::ScrollArea::vertical()
                    .id_source("selected_videos")
                    .max_height(90.0)
                    .show(ui, |ui| {
                        for video in &self.videos {
                            ui.label(egui::RichText::new(video.display().to_string()).color(egui::Color32::LIGHT_GRAY).small());
                        }
                    });
            }
        });
    }

    fn show_settings_card(&mut self, ui: &mut egui::Ui) {
        let running = self.is_converting();
        card(ui, "⚙️ Settings", |ui| {
            ui.add_enabled_ui(!running, |ui| {
                egui::Grid::new("settings")
                    .num_columns(2)
                    .spacing([20.0, 12.0])
                    .show(ui, |ui| {
                        let before = (self.format, self.quality, self.overwrite);

                        ui.label(egui::RichText::new("Output Format:").strong());
                        egui::ComboBox::from_id_source("output_format")
                            .selected_text(self.format.extension())
                            .width(220.0)
                            .show_ui(ui, |ui| {
                                for format in OutputFormat::ALL {
                                    ui.selectable_value(&mut self.format, format, format.display_name());
                                }
                            });
                        ui.end_row();

                        ui.label(egui::RichText::new("Quality:").strong());
                        ui.horizontal(|ui| {
                            egui::ComboBox::from_id_source("quality")
                                .selected_text(self.quality.label())
                                .width(120.0)
                                .show_ui(ui, |ui| {
                                    for quality in QualityPreset::ALL {
                                        ui.selectable_value(&mut self.quality, quality, quality.label());
                                    }
                                });
                            ui.label(egui::RichText::new(self.quality.description()).color(egui::Color32::GRAY));
                        });
                        ui.end_row();

                        ui.label(egui::RichText::new("Existing Files:").strong());
                        egui::ComboBox::from_id_source("overwrite_policy")
                            .selected_text(self.overwrite.display_name())
                            .width(220.0)
                            .show_ui(ui, |ui| {
                                for policy in OverwritePolicy::ALL {
                                    ui.selectable_value(&mut self.overwrite, policy, policy.display_name());
                                }
                            });
                        ui.end_row();

                        ui.label(egui::RichText::new("Output Folder:").strong());
                        ui.horizontal(|ui| {
                            if ui.button("📂 Browse").clicked() {
                                self.select_output_folder();
                            }
                            ui.label(self.folder_label.as_str());
                        });
                        ui.end_row();

                        if before != (self.format, self.quality, self.overwrite) {
                            self.settings_changed();
                        }
                    });
            });
        });
    }

    fn show_progress_card(&mut self, ui: &mut egui::Ui) {
        card(ui, "📊 Progress", |ui| {
            let percent = self.state.percent();
            ui.add(
                egui::ProgressBar::new(percent as f32 / 100.0)
                    .text(format!("{}%", percent))
                    .desired_width(ui.available_width()),
            );

            match &self.state {
                JobState::Running { file_index, file_count, errors, .. } => {
                    ui.label(format!("File {} of {}", file_index + 1, file_count));
                    if *errors > 0 {
                        ui.label(egui::RichText::new(format!("{} file(s) failed", errors)).color(egui::Color32::LIGHT_RED));
                    }
                }
                JobState::Completed { duration, errors, .. } => {
                    ui.label(egui::RichText::new(format!("✅ Finished in {}s, {} error(s)", duration.as_secs(), errors)).color(egui::Color32::LIGHT_GREEN));
                }
                JobState::Cancelled { .. } => {
                    ui.label(egui::RichText::new("⏹ Cancelled").color(egui::Color32::YELLOW));
                }
                JobState::Idle => {}
            }

            if !self.file_log.is_empty() {
                egui::ScrollArea::vertical()
                    .id_source("file_log")
                    .max_height(120.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.file_log {
                            ui.label(egui::RichText::new(line).small());
                        }
                    });
            }
        });
    }

    fn show_main_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.is_converting();

            let convert_button = egui::Button::new(egui::RichText::new("🚀 Convert").size(16.0)).min_size(egui::vec2(160.0, 40.0));
            let mut convert = ui.add_enabled(!running, convert_button);
            if !running && !self.can_start() {
                convert = convert.on_hover_text("Select videos and an output folder first");
            }
            if convert.clicked() {
                self.start_conversion();
            }

            ui.add_space(15.0);

            let cancel_button = egui::Button::new(egui::RichText::new("⏹ Cancel").size(16.0)).min_size(egui::vec2(160.0, 40.0));
            if ui.add_enabled(running, cancel_button).clicked() {
                self.cancel_conversion();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let version = self.ffmpeg_version.as_deref().unwrap_or("FFmpeg unavailable");
                ui.label(egui::RichText::new(format!("v{} · {}", APP_VERSION, version)).small().color(egui::Color32::GRAY));
            });
        });
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notices.front().cloned() else {
            return;
        };

        let (icon, color) = match notice.kind {
            NoticeKind::Info => ("ℹ", egui::Color32::LIGHT_BLUE),
            NoticeKind::Error => ("❌", egui::Color32::LIGHT_RED),
        };

        let mut dismissed = false;
        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(icon).size(22.0).color(color));
                    ui.label(notice.message.as_str());
                });
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.dismiss_notice();
        }
    }
}
