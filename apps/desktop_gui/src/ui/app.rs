use std::collections::HashMap;

use client_core::form::retain_numeric;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use serde::{Deserialize, Serialize};
use shared::domain::CommandTask;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{ConsoleState, StatusBannerSeverity, TilePreview};

pub const SETTINGS_STORAGE_KEY: &str = "sandtable_console.settings";

const TILE_SIZE: egui::Vec2 = egui::vec2(176.0, 208.0);
const TILE_PADDING: f32 = 8.0;
const TILE_IMAGE_SIZE: f32 = 160.0;

fn ui_in_rect(ui: &mut egui::Ui, rect: egui::Rect, add: impl FnOnce(&mut egui::Ui)) {
    let mut child = ui.new_child(
        egui::UiBuilder::new()
            .max_rect(rect)
            .layout(egui::Layout::top_down(egui::Align::Center)),
    );
    child.set_clip_rect(rect);
    add(&mut child);
}

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedConsoleSettings {
    pub server_url: Option<String>,
}

impl PersistedConsoleSettings {
    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    console: ConsoleState,
    server_url: String,
    textures: HashMap<usize, TextureHandle>,
    texture_epoch: u64,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            console: ConsoleState::new(),
            server_url: startup.server_url,
            textures: HashMap::new(),
            texture_epoch: 0,
        };
        let connect = app.console.reconnect(&app.server_url);
        app.dispatch(connect);
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.console.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            for cmd in self.console.apply_event(event) {
                self.dispatch(cmd);
            }
        }

        if self.texture_epoch != self.console.catalog_epoch {
            self.textures.clear();
            self.texture_epoch = self.console.catalog_epoch;
        }
    }

    fn tile_texture(&mut self, ctx: &egui::Context, tile: usize) -> Option<TextureHandle> {
        if let Some(texture) = self.textures.get(&tile) {
            return Some(texture.clone());
        }
        let TilePreview::Ready(image) = self.console.previews.get(tile)? else {
            return None;
        };
        let color = egui::ColorImage::from_rgba_unmultiplied(
            [image.width, image.height],
            &image.rgba,
        );
        let texture = ctx.load_texture(
            format!("tile_preview_{}_{tile}", self.texture_epoch),
            color,
            egui::TextureOptions::LINEAR,
        );
        self.textures.insert(tile, texture.clone());
        Some(texture)
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("connection_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label("Server");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.server_url)
                        .id_salt("server_url")
                        .desired_width(280.0),
                );
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Reconnect").clicked() || submitted {
                    let cmd = self.console.reconnect(self.server_url.trim());
                    self.dispatch(cmd);
                }
                if self.console.catalog_loading {
                    ui.spinner();
                }
            });

            let mut dismissed = false;
            if let Some(banner) = &self.console.banner {
                let (fill, text) = match banner.severity {
                    StatusBannerSeverity::Info => (
                        egui::Color32::from_rgb(30, 70, 45),
                        egui::Color32::from_rgb(200, 240, 210),
                    ),
                    StatusBannerSeverity::Error => (
                        egui::Color32::from_rgb(90, 30, 30),
                        egui::Color32::from_rgb(255, 215, 215),
                    ),
                };
                egui::Frame::new()
                    .fill(fill)
                    .corner_radius(4.0)
                    .inner_margin(egui::Margin::same(6))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(text, banner.message.as_str());
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                dismissed = ui.small_button("x").clicked();
                            });
                        });
                    });
            }
            if dismissed {
                self.console.banner = None;
            }
            ui.add_space(4.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.console.status.as_str());
            });
        });
    }

    fn show_controls_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");
                ui.separator();
                self.show_parameter_form(ui);

                ui.add_space(12.0);
                ui.heading("Table");
                ui.separator();
                ui.horizontal_wrapped(|ui| {
                    for task in CommandTask::ALL {
                        if ui.button(task.label()).clicked() {
                            let cmd = self.console.press_button(task);
                            self.dispatch(cmd);
                        }
                    }
                });
            });
    }

    fn show_parameter_form(&mut self, ui: &mut egui::Ui) {
        match self.console.session.active() {
            Some(active) => {
                ui.label(egui::RichText::new(active.item().name.as_str()).strong());
                ui.weak(format!("Engine: {}", active.metadata().engine));
            }
            None => {
                ui.weak("Select an item to edit its parameters.");
            }
        }
        if self.console.session.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Loading parameters...");
            });
        }
        if let Some(err) = &self.console.metadata_error {
            ui.colored_label(egui::Color32::from_rgb(230, 120, 120), err.as_str());
        }
        ui.add_space(6.0);

        let names: Vec<String> = self
            .console
            .session
            .form()
            .fields()
            .iter()
            .map(|field| field.name.clone())
            .collect();
        let epoch = self.console.catalog_epoch;
        egui::Grid::new("parameter_grid")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                for (index, name) in names.iter().enumerate() {
                    ui.label(name.as_str());
                    if let Some(value) = self.console.session.form_mut().value_mut(name) {
                        let response = ui.add(
                            egui::TextEdit::singleline(&mut *value)
                                .id_salt(("parameter", epoch, index))
                                .desired_width(120.0),
                        );
                        if response.changed() {
                            retain_numeric(value);
                        }
                    }
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        let ready = !self.console.session.is_loading();
        if ui.add_enabled(ready, egui::Button::new("Submit")).clicked() {
            if let Some(cmd) = self.console.send_data() {
                self.dispatch(cmd);
            }
        }
    }

    fn show_gallery(&mut self, ctx: &egui::Context) {
        let tiles: Vec<String> = self
            .console
            .session
            .gallery()
            .items()
            .iter()
            .map(|item| item.name.clone())
            .collect();

        egui::CentralPanel::default().show(ctx, |ui| {
            if tiles.is_empty() {
                ui.centered_and_justified(|ui| {
                    if self.console.catalog_loading {
                        ui.spinner();
                    } else {
                        ui.weak("No items available.");
                    }
                });
                return;
            }

            let mut clicked = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (tile, name) in tiles.iter().enumerate() {
                        if self.show_tile(ui, ctx, tile, name) {
                            clicked = Some(tile);
                        }
                    }
                });
            });

            if let Some(tile) = clicked {
                if let Some(cmd) = self.console.click_tile(tile) {
                    self.dispatch(cmd);
                }
            }
        });
    }

    fn show_tile(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, tile: usize, name: &str) -> bool {
        let (rect, response) = ui.allocate_exact_size(TILE_SIZE, egui::Sense::click());
        let highlighted = self.console.session.is_highlighted(tile);
        let visuals = ui.visuals().clone();
        let fill = if highlighted {
            visuals.selection.bg_fill.gamma_multiply(0.35)
        } else if response.hovered() {
            visuals.widgets.hovered.weak_bg_fill
        } else {
            visuals.faint_bg_color
        };
        let radius = egui::CornerRadius::same(6);
        ui.painter().rect_filled(rect, radius, fill);
        if highlighted {
            ui.painter().rect_stroke(
                rect,
                radius,
                egui::Stroke::new(2.0, visuals.selection.stroke.color),
                egui::StrokeKind::Inside,
            );
        }

        let texture = self.tile_texture(ctx, tile);
        let (placeholder, hover) = match self.console.previews.get(tile) {
            Some(TilePreview::Failed(reason)) => ("no preview", format!("{name}\n{reason}")),
            Some(TilePreview::Ready(_)) => ("", name.to_string()),
            Some(TilePreview::Loading) | None => ("loading...", name.to_string()),
        };
        ui_in_rect(ui, rect.shrink(TILE_PADDING), |ui| {
            let image_size = egui::vec2(TILE_IMAGE_SIZE, TILE_IMAGE_SIZE);
            match &texture {
                Some(texture) => {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(image_size));
                }
                None => {
                    let (slot, _) = ui.allocate_exact_size(image_size, egui::Sense::hover());
                    ui.painter().text(
                        slot.center(),
                        egui::Align2::CENTER_CENTER,
                        placeholder,
                        egui::FontId::proportional(13.0),
                        visuals.weak_text_color(),
                    );
                }
            }
            ui.add(egui::Label::new(name).truncate());
        });

        response.on_hover_text(hover).clicked()
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);
        self.show_controls_panel(ctx);
        self.show_gallery(ctx);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedConsoleSettings {
            server_url: Some(self.server_url.trim().to_string()),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
