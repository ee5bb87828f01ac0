#![windows_subsystem = "windows"]
//! PlateWatch Admin - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod api;
mod app;
mod constants;
mod settings;
mod theme;
mod types;
mod ui;
mod utils;
mod validate;

use app::{App, ProfileLoad, Screen, ToastKind};
use constants::*;
use eframe::egui;
use std::path::PathBuf;
use tracing::info;
use types::{alert_label, color_label, ImageKind, VehicleRecord, ALERT_TYPES, COLOR_TABLE};
use ui::components;
use utils::{format_record_date, rasterize_logo, rasterize_logo_square};

/// Vehicles table columns: backend sort field + header label.
const VEHICLE_COLUMNS: [(&str, &str); 9] = [
    ("license", "Licença"),
    ("alert", "Tipo de Alerta"),
    ("camera", "Câmera"),
    ("station", "Estação"),
    ("color", "Cor"),
    ("date", "Data"),
    ("time", "Hora"),
    ("vehicleImg", "Imagem do veículo"),
    ("plateImg", "Imagem de licença"),
];

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "platewatch-admin.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,platewatch_admin=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("PlateWatch Admin");

    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "PlateWatch Admin starting");

    let settings = settings::Settings::load(&data_dir);
    let win_pos = match (settings.window_x, settings.window_y) {
        (Some(x), Some(y)) => Some(egui::pos2(x, y)),
        _ => None,
    };
    let win_size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) => Some(egui::vec2(w, h)),
        _ => None,
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(win_size.unwrap_or(egui::vec2(1280.0, 800.0)))
        .with_min_inner_size([1100.0, 680.0])
        .with_title("PlateWatch Admin");

    // Window/taskbar icon rasterized from the inline SVG
    {
        let (rgba, width, height) = rasterize_logo_square(64);
        let icon = egui::IconData { rgba, width, height };
        viewport = viewport.with_icon(std::sync::Arc::new(icon));
    }

    let needs_center = win_pos.is_none();

    if let Some(pos) = win_pos {
        viewport = viewport.with_position(pos);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "PlateWatch Admin",
        options,
        Box::new(move |cc| {
            let mut app = App::new(cc, settings, data_dir);
            app.needs_center = needs_center;
            Ok(Box::new(app))
        }),
    )
}

// ============================================================================
// MAIN UPDATE LOOP
// ============================================================================

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window position/size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                self.window_pos = Some(rect.min);
            }
            if let Some(rect) = i.viewport().inner_rect {
                self.window_size = Some(rect.size());
            }
        });

        // Center window on first launch
        if self.needs_center {
            self.needs_center = false;
            if let Some(cmd) = egui::ViewportCommand::center_on_screen(ctx) {
                ctx.send_viewport_cmd(cmd);
            }
        }

        // Initial vehicle page
        if !self.vehicles.started {
            self.vehicles.start(&self.api, &self.runtime, ctx);
        }

        // Drain backend responses into screen state
        self.vehicles.tick(&self.api, &self.runtime, ctx, &mut self.toast);
        self.profile.poll(&mut self.toast);

        self.render_detail_modal(ctx);

        // Left sidebar - navigation (must be added BEFORE CentralPanel)
        egui::SidePanel::left("nav_panel")
            .exact_width(theme::SIDEBAR_WIDTH)
            .resizable(false)
            .show_separator_line(false)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::symmetric(16, 16)),
            )
            .show(ctx, |ui| self.render_sidebar(ui, ctx));

        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::same(16)),
            )
            .show(ctx, |ui| {
                // Store panel rect for toast positioning
                self.central_panel_rect = Some(ui.max_rect());
                match self.screen {
                    Screen::Vehicles => self.render_vehicles_screen(ui, ctx),
                    Screen::Profile => self.render_profile_screen(ui, ctx),
                }
            });

        self.render_toast(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_settings();
        info!("PlateWatch Admin shutting down");
    }
}

// ============================================================================
// SIDEBAR
// ============================================================================

impl App {
    fn render_sidebar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let logo = self.logo_texture.get_or_insert_with(|| {
            let (pixels, w, h) = rasterize_logo(theme::LOGO_WIDTH);
            ctx.load_texture(
                "logo",
                egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels),
                egui::TextureOptions::LINEAR,
            )
        });

        ui.vertical_centered(|ui| {
            ui.add(egui::Image::new(&*logo).fit_to_exact_size(egui::vec2(120.0, 75.0)));
            ui.add_space(2.0);
            ui.label(
                egui::RichText::new("PlateWatch Admin")
                    .size(theme::FONT_TITLE)
                    .strong(),
            );
        });
        ui.add_space(theme::SPACING_XL);

        let entries = [
            (Screen::Vehicles, egui_phosphor::regular::CAR, "Veículos"),
            (Screen::Profile, egui_phosphor::regular::USER, "Perfil"),
        ];
        for (screen, icon, label) in entries {
            let selected = self.screen == screen;
            let fill = if selected {
                theme::TOGGLE_SELECTED
            } else {
                theme::TOGGLE_UNSELECTED
            };
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), 36.0),
                egui::Sense::click(),
            );
            if response.hovered() {
                ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
            }
            if ui.is_rect_visible(rect) {
                let (fill, draw_rect) = theme::button_visual(&response, fill, rect);
                ui.painter()
                    .rect_filled(draw_rect, theme::RADIUS_DEFAULT, fill);
                ui.painter().text(
                    draw_rect.left_center() + egui::vec2(12.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    format!("{icon}  {label}"),
                    egui::FontId::proportional(theme::FONT_BODY),
                    theme::TEXT_PRIMARY,
                );
            }
            if response.clicked() {
                self.screen = screen;
            }
            ui.add_space(theme::SPACING_SM);
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
            ui.add_space(theme::SPACING_MD);
            ui.label(
                egui::RichText::new(format!("v{APP_VERSION}"))
                    .size(theme::FONT_SMALL)
                    .color(theme::TEXT_DIM),
            );
        });
    }
}

// ============================================================================
// VEHICLES SCREEN
// ============================================================================

impl App {
    fn render_vehicles_screen(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        // Header row
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!("{}  Veículos", egui_phosphor::regular::CAR))
                    .size(theme::FONT_TITLE)
                    .strong(),
            );
            if self.vehicles.loading {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let refresh = ui.add(theme::button(format!(
                    "{}  Atualizar",
                    egui_phosphor::regular::ARROWS_CLOCKWISE
                )));
                if refresh.clicked() {
                    self.vehicles.refetch(&self.api, &self.runtime, ctx);
                }
                ui.add_space(theme::SPACING_MD);
                ui.label(
                    egui::RichText::new(format!("Total: {}", self.vehicles.total))
                        .color(theme::TEXT_MUTED),
                );
            });
        });
        ui.add_space(theme::SPACING_MD);

        self.render_filter_bar(ui, ctx);
        ui.add_space(theme::SPACING_MD);

        // Reserve room for the pagination bar below the table
        let table_height = ui.available_height() - 44.0;
        let mut sort_clicked: Option<&'static str> = None;
        let mut popover_next: Option<(String, ImageKind)> = None;
        let mut detail_to_open: Option<VehicleRecord> = None;

        ui.scope(|ui| {
            use egui_extras::{Column, TableBuilder};

            let mut table = TableBuilder::new(ui)
                .striped(true)
                .resizable(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .min_scrolled_height(0.0)
                .max_scroll_height(table_height);

            for (field, _) in VEHICLE_COLUMNS {
                table = match field {
                    "alert" => table.column(Column::exact(150.0).clip(true)),
                    "time" => table.column(Column::exact(80.0).clip(true)),
                    "vehicleImg" | "plateImg" => table.column(Column::remainder().clip(true)),
                    _ => table.column(Column::exact(95.0).clip(true)),
                };
            }
            // Actions column
            table = table.column(Column::exact(110.0));

            table
                .header(36.0, |mut header| {
                    for (field, label) in VEHICLE_COLUMNS {
                        header.col(|ui| {
                            let is_sorted = self.vehicles.query.sort_field == field;
                            let icon = if is_sorted {
                                match self.vehicles.query.sort_direction {
                                    types::SortDirection::Ascending => {
                                        egui_phosphor::regular::CARET_UP
                                    }
                                    types::SortDirection::Descending => {
                                        egui_phosphor::regular::CARET_DOWN
                                    }
                                }
                            } else {
                                egui_phosphor::regular::CARET_UP_DOWN
                            };
                            let color = if is_sorted {
                                egui::Color32::WHITE
                            } else {
                                theme::TEXT_MUTED
                            };
                            let resp = ui.add(
                                egui::Label::new(
                                    egui::RichText::new(format!("{label} {icon}"))
                                        .size(theme::FONT_LABEL)
                                        .strong()
                                        .color(color),
                                )
                                .selectable(false)
                                .sense(egui::Sense::click()),
                            );
                            if resp.clicked() {
                                sort_clicked = Some(field);
                            }
                        });
                    }
                    header.col(|ui| {
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new("Ações")
                                    .size(theme::FONT_LABEL)
                                    .strong()
                                    .color(theme::TEXT_MUTED),
                            )
                            .selectable(false),
                        );
                    });
                })
                .body(|mut body| {
                    body.ui_mut().visuals_mut().selection.bg_fill = theme::TABLE_ROW_SELECTED;
                    let records = self.vehicles.records.clone();

                    body.rows(theme::ROW_HEIGHT, records.len(), |mut row| {
                        let record = &records[row.index()];

                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.license)
                                        .strong()
                                        .size(theme::FONT_BODY),
                                )
                                .truncate()
                                .selectable(false),
                            );
                        });
                        row.col(|ui| {
                            let (bg, fg) = theme::alert_badge_colors(record.alert);
                            components::badge(ui, alert_label(record.alert), bg, fg);
                        });
                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.camera)
                                        .size(theme::FONT_SECTION)
                                        .color(theme::TEXT_MUTED),
                                )
                                .truncate()
                                .selectable(false),
                            );
                        });
                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.station)
                                        .size(theme::FONT_SECTION)
                                        .color(theme::TEXT_MUTED),
                                )
                                .truncate()
                                .selectable(false),
                            );
                        });
                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(color_label(&record.color))
                                        .size(theme::FONT_SECTION)
                                        .color(theme::TEXT_MUTED),
                                )
                                .selectable(false),
                            );
                        });
                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(format_record_date(&record.date))
                                        .size(theme::FONT_SECTION)
                                        .color(theme::TEXT_MUTED),
                                )
                                .selectable(false),
                            );
                        });
                        row.col(|ui| {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.time)
                                        .size(theme::FONT_SECTION)
                                        .color(theme::TEXT_MUTED),
                                )
                                .selectable(false),
                            );
                        });
                        // Image-name cells: hovering opens the preview popover
                        for (kind, name) in [
                            (ImageKind::Vehicle, &record.vehicle_img),
                            (ImageKind::Plate, &record.plate_img),
                        ] {
                            row.col(|ui| {
                                if name.is_empty() {
                                    return;
                                }
                                let resp = ui.add(
                                    egui::Label::new(
                                        egui::RichText::new(name)
                                            .size(theme::FONT_SECTION)
                                            .color(theme::ACCENT),
                                    )
                                    .truncate()
                                    .selectable(false)
                                    .sense(egui::Sense::hover()),
                                );
                                if resp.hovered() {
                                    popover_next = Some((name.clone(), kind));
                                }
                            });
                        }
                        row.col(|ui| {
                            let btn = ui.add(theme::button_accent(format!(
                                "{}  Detalhes",
                                egui_phosphor::regular::EYE
                            )));
                            if btn.clicked() {
                                detail_to_open = Some(record.clone());
                            }
                        });
                    });
                });
        });

        if self.vehicles.records.is_empty() && !self.vehicles.loading {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Não há dados")
                        .size(theme::FONT_BODY)
                        .color(theme::TEXT_DIM),
                );
            });
        }

        // Apply deferred table interactions
        if let Some(field) = sort_clicked {
            self.vehicles
                .on_sort_clicked(field, &self.api, &self.runtime, ctx);
        }
        if let Some(record) = detail_to_open {
            self.vehicles.detail = Some(record);
        }
        self.vehicles.popover = popover_next;
        self.render_image_popover(ctx);

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
            self.render_pagination_bar(ui, ctx);
        });
    }

    fn render_filter_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let mut select_changed = false;
        let mut clear_clicked = false;

        theme::section_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(egui_phosphor::regular::FUNNEL)
                        .color(theme::TEXT_DIM),
                );
                let mut text_edited = false;
                for (value, hint) in [
                    (&mut self.vehicles.draft.license, "Licença"),
                    (&mut self.vehicles.draft.camera, "Câmera"),
                    (&mut self.vehicles.draft.station, "Estação"),
                ] {
                    let edit = egui::TextEdit::singleline(value)
                        .hint_text(hint)
                        .desired_width(130.0)
                        .background_color(theme::BG_INPUT);
                    text_edited |= ui.add(edit).changed();
                }
                if text_edited {
                    self.vehicles.note_text_filter_edit();
                }

                let alert_text = self
                    .vehicles
                    .draft
                    .alert
                    .map(alert_label)
                    .unwrap_or("Tipo de Alerta");
                egui::ComboBox::from_id_salt("filter_alert")
                    .selected_text(alert_text)
                    .width(160.0)
                    .show_ui(ui, |ui| {
                        select_changed |= ui
                            .selectable_value(&mut self.vehicles.draft.alert, None, "Todos")
                            .changed();
                        for (code, label) in ALERT_TYPES {
                            select_changed |= ui
                                .selectable_value(
                                    &mut self.vehicles.draft.alert,
                                    Some(code),
                                    label,
                                )
                                .changed();
                        }
                    });

                let color_text = self
                    .vehicles
                    .draft
                    .color
                    .as_deref()
                    .map(color_label)
                    .unwrap_or("Cor");
                egui::ComboBox::from_id_salt("filter_color")
                    .selected_text(color_text)
                    .width(140.0)
                    .show_ui(ui, |ui| {
                        select_changed |= ui
                            .selectable_value(&mut self.vehicles.draft.color, None, "Todas")
                            .changed();
                        for (code, label) in COLOR_TABLE {
                            select_changed |= ui
                                .selectable_value(
                                    &mut self.vehicles.draft.color,
                                    Some(code.to_string()),
                                    label,
                                )
                                .changed();
                        }
                    });

                if !self.vehicles.draft.is_empty() {
                    let clear = ui.add(theme::button(format!(
                        "{}  Limpar",
                        egui_phosphor::regular::X
                    )));
                    clear_clicked = clear.clicked();
                }
            });
        });

        if clear_clicked {
            self.vehicles.draft = Default::default();
            select_changed = true;
        }
        if select_changed {
            self.vehicles.apply_filters_now(&self.api, &self.runtime, ctx);
        }
    }

    fn render_pagination_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let page = self.vehicles.query.page;
        let size = self.vehicles.query.size_per_page;
        let total_pages = self.vehicles.query.total_pages(self.vehicles.total);

        ui.horizontal(|ui| {
            // Windowed page-number strip around the current page
            let window = PAGINATION_WINDOW;
            let start = page
                .saturating_sub(window / 2)
                .clamp(1, total_pages.saturating_sub(window - 1).max(1));
            let end = (start + window - 1).min(total_pages);

            let prev = ui.add_enabled(page > 1, theme::button(egui_phosphor::regular::CARET_LEFT));
            if prev.clicked() {
                self.vehicles
                    .on_page_change(page - 1, &self.api, &self.runtime, ctx);
            }
            for p in start..=end {
                let is_current = p == page;
                let fill = if is_current {
                    theme::BTN_ACCENT
                } else {
                    theme::BTN_DEFAULT
                };
                let text = if is_current {
                    egui::RichText::new(p.to_string()).color(egui::Color32::from_rgb(0x04, 0x2f, 0x2e))
                } else {
                    egui::RichText::new(p.to_string())
                };
                let btn = ui.add(
                    egui::Button::new(text)
                        .fill(fill)
                        .corner_radius(theme::RADIUS_DEFAULT)
                        .min_size(egui::vec2(32.0, 28.0)),
                );
                if btn.clicked() && !is_current {
                    self.vehicles
                        .on_page_change(p, &self.api, &self.runtime, ctx);
                }
            }
            let next = ui.add_enabled(
                page < total_pages,
                theme::button(egui_phosphor::regular::CARET_RIGHT),
            );
            if next.clicked() {
                self.vehicles
                    .on_page_change(page + 1, &self.api, &self.runtime, ctx);
            }

            if total_pages > 0 {
                ui.label(
                    egui::RichText::new(format!("Página {page} de {total_pages}"))
                        .size(theme::FONT_SECTION)
                        .color(theme::TEXT_DIM),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut selected = size;
                egui::ComboBox::from_id_salt("page_size")
                    .selected_text(format!("{size} por página"))
                    .width(130.0)
                    .show_ui(ui, |ui| {
                        for option in PAGE_SIZES {
                            ui.selectable_value(&mut selected, option, option.to_string());
                        }
                    });
                if selected != size {
                    self.vehicles
                        .on_size_change(selected, &self.api, &self.runtime, ctx);
                }
            });
        });
    }

    fn render_image_popover(&mut self, ctx: &egui::Context) {
        let Some((name, kind)) = self.vehicles.popover.clone() else {
            return;
        };
        self.vehicles
            .ensure_image(kind, &name, &self.api, &self.runtime, ctx);

        let Some(pointer) = ctx.pointer_hover_pos() else {
            return;
        };
        egui::Area::new(egui::Id::new("image_popover"))
            .fixed_pos(pointer + egui::vec2(16.0, 16.0))
            .order(egui::Order::Tooltip)
            .show(ctx, |ui| {
                theme::card_frame().show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(&name)
                            .size(theme::FONT_LABEL)
                            .strong(),
                    );
                    ui.separator();
                    match self.vehicles.image_texture(kind, &name) {
                        Some(texture) => {
                            ui.add(egui::Image::new(texture).max_width(360.0));
                        }
                        None => {
                            ui.add_space(theme::SPACING_MD);
                            ui.spinner();
                            ui.add_space(theme::SPACING_MD);
                        }
                    }
                });
            });
    }

    fn render_detail_modal(&mut self, ctx: &egui::Context) {
        let Some(record) = self.vehicles.detail.clone() else {
            return;
        };
        for (kind, name) in [
            (ImageKind::Vehicle, &record.vehicle_img),
            (ImageKind::Plate, &record.plate_img),
        ] {
            if !name.is_empty() {
                self.vehicles
                    .ensure_image(kind, name, &self.api, &self.runtime, ctx);
            }
        }

        let modal_area = egui::Modal::default_area(egui::Id::new("vehicle_detail_modal"))
            .default_width(560.0 + theme::SPACING_XL * 2.0);
        let modal = egui::Modal::new(egui::Id::new("vehicle_detail_modal"))
            .area(modal_area)
            .backdrop_color(egui::Color32::from_black_alpha(180))
            .frame(theme::modal_frame());
        let modal_response = modal.show(ctx, |ui| {
            ui.set_min_width(560.0);
            ui.set_max_width(560.0);

            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(&record.license)
                        .size(theme::FONT_TITLE)
                        .strong(),
                );
                let (bg, fg) = theme::alert_badge_colors(record.alert);
                components::badge(ui, alert_label(record.alert), bg, fg);
            });
            ui.add_space(theme::SPACING_MD);

            egui::Grid::new("vehicle_detail_grid")
                .num_columns(2)
                .spacing([24.0, 6.0])
                .show(ui, |ui| {
                    let rows = [
                        ("Câmera", record.camera.clone()),
                        ("Estação", record.station.clone()),
                        ("Cor", color_label(&record.color).to_string()),
                        ("Data", format_record_date(&record.date)),
                        ("Hora", record.time.clone()),
                    ];
                    for (label, value) in rows {
                        ui.label(
                            egui::RichText::new(label)
                                .size(theme::FONT_SECTION)
                                .color(theme::TEXT_DIM),
                        );
                        ui.label(egui::RichText::new(value).size(theme::FONT_BODY));
                        ui.end_row();
                    }
                });
            ui.add_space(theme::SPACING_MD);

            ui.columns(2, |columns| {
                let panes = [
                    (0, ImageKind::Vehicle, &record.vehicle_img, "Veículo"),
                    (1, ImageKind::Plate, &record.plate_img, "Placa"),
                ];
                for (idx, kind, name, title) in panes {
                    let ui = &mut columns[idx];
                    ui.label(
                        egui::RichText::new(title)
                            .size(theme::FONT_SECTION)
                            .color(theme::TEXT_DIM),
                    );
                    if name.is_empty() {
                        ui.label(
                            egui::RichText::new("Sem imagem")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                    } else {
                        match self.vehicles.image_texture(kind, name) {
                            Some(texture) => {
                                ui.add(egui::Image::new(texture).max_width(260.0));
                            }
                            None => {
                                ui.spinner();
                            }
                        }
                    }
                }
            });

            ui.add_space(theme::SPACING_XL);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let close = ui.add(theme::button(format!(
                    "{}  Fechar",
                    egui_phosphor::regular::X
                )));
                if close.clicked() {
                    self.vehicles.detail = None;
                }
            });
        });
        if modal_response.should_close() {
            self.vehicles.detail = None;
        }
    }
}

// ============================================================================
// PROFILE SCREEN
// ============================================================================

impl App {
    fn render_profile_screen(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if !self.profile.started {
            self.profile
                .start(&self.api, &self.runtime, ctx, &self.operator_id);
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(460.0);
                theme::card_frame().show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}  Perfil",
                                egui_phosphor::regular::USER
                            ))
                            .size(theme::FONT_TITLE)
                            .strong(),
                        );
                    });
                    ui.separator();
                    ui.add_space(theme::SPACING_MD);

                    match self.profile.load {
                        ProfileLoad::Loading => {
                            ui.vertical_centered(|ui| {
                                ui.add_space(24.0);
                                ui.spinner();
                                ui.add_space(24.0);
                            });
                        }
                        ProfileLoad::Missing => {
                            ui.vertical_centered(|ui| {
                                ui.add_space(24.0);
                                ui.label(
                                    egui::RichText::new("Perfil não existe")
                                        .size(theme::FONT_BODY)
                                        .color(theme::TEXT_MUTED),
                                );
                                ui.add_space(24.0);
                            });
                        }
                        ProfileLoad::Ready => self.render_profile_form(ui, ctx),
                    }
                });
            });
        });
    }

    fn render_profile_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let errors = self.profile.errors.clone();
        let err = |key: &str| errors.get(key).map(String::as_str);
        let mut changed = false;

        changed |= components::text_field(ui, &mut self.profile.form.name, "Nome", err("name"));
        changed |= components::text_field(ui, &mut self.profile.form.cpf, "CPF", err("cpf"));
        changed |= components::text_field(ui, &mut self.profile.form.email, "Email", err("email"));
        changed |= components::text_field(
            ui,
            &mut self.profile.form.organization,
            "Organização",
            err("organization"),
        );

        let city_text = self
            .profile
            .cities
            .iter()
            .find(|c| c.id == self.profile.form.city)
            .map(|c| c.city.clone())
            .unwrap_or_else(|| "Selecione a cidade".to_string());
        egui::ComboBox::from_id_salt("profile_city")
            .selected_text(city_text)
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for city in &self.profile.cities {
                    changed |= ui
                        .selectable_value(
                            &mut self.profile.form.city,
                            city.id.clone(),
                            &city.city,
                        )
                        .changed();
                }
            });
        components::field_error(ui, err("city"));

        let group_text = self
            .profile
            .groups
            .iter()
            .find(|g| g.id == self.profile.form.group)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| "Selecione um grupo".to_string());
        egui::ComboBox::from_id_salt("profile_group")
            .selected_text(group_text)
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for group in &self.profile.groups {
                    changed |= ui
                        .selectable_value(
                            &mut self.profile.form.group,
                            group.id.clone(),
                            &group.name,
                        )
                        .changed();
                }
            });
        components::field_error(ui, err("group"));

        changed |= components::text_field(
            ui,
            &mut self.profile.form.whats_app,
            "Whatsapp: 12 920155555",
            err("whatsApp"),
        );
        changed |= components::text_field(
            ui,
            &mut self.profile.form.mobile,
            "Móvel: 12 920155555",
            err("mobile"),
        );

        let role_text = match self.profile.form.role.as_str() {
            "admin" => "Administrador",
            "user" => "Usuário",
            _ => "Selecione a função",
        };
        egui::ComboBox::from_id_salt("profile_role")
            .selected_text(role_text)
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(
                        &mut self.profile.form.role,
                        "admin".to_string(),
                        "Administrador",
                    )
                    .changed();
                changed |= ui
                    .selectable_value(&mut self.profile.form.role, "user".to_string(), "Usuário")
                    .changed();
            });
        components::field_error(ui, err("role"));

        ui.add_space(theme::SPACING_MD);
        ui.label(
            egui::RichText::new("Permissões")
                .size(theme::FONT_SECTION)
                .color(theme::TEXT_DIM),
        );
        let mut toggle: Option<String> = None;
        for permission in &self.profile.permissions {
            let mut checked = self
                .profile
                .selected_permissions
                .iter()
                .any(|id| id == &permission.id);
            if components::labeled_checkbox(ui, &mut checked, &permission.name) {
                toggle = Some(permission.id.clone());
            }
        }
        if let Some(id) = toggle {
            self.profile.toggle_permission(&id);
        }

        ui.add_space(theme::SPACING_MD);
        ui.label(
            egui::RichText::new("Vou receber uma notificação via:")
                .size(theme::FONT_SECTION)
                .color(theme::TEXT_DIM),
        );
        components::labeled_checkbox(ui, &mut self.profile.form.sms, "SMS");
        components::labeled_checkbox(ui, &mut self.profile.form.whats_app_message, "Whatsapp");
        components::labeled_checkbox(ui, &mut self.profile.form.mail, "Email");

        if changed {
            self.profile.revalidate();
        }

        ui.add_space(theme::SPACING_XL);
        ui.vertical_centered(|ui| {
            let label = if self.profile.submitting {
                "Esperar..."
            } else {
                "Atualizar"
            };
            let submit = ui.add_enabled(self.profile.can_submit(), theme::button_accent(label));
            if submit.clicked() {
                self.profile
                    .submit(&self.api, &self.runtime, ctx, &self.operator_id);
            }
        });
    }
}

// ============================================================================
// TOAST
// ============================================================================

impl App {
    fn render_toast(&mut self, ctx: &egui::Context) {
        // Bottom-right of central panel, 3s visible then fade, pause on hover
        let Some(panel_rect) = self.central_panel_rect else {
            return;
        };
        let Some((kind, msg)) = self.toast.message.clone() else {
            return;
        };

        let visible_duration = 3.0;
        let fade_duration = 0.5;
        let total_duration = visible_duration + fade_duration;
        let margin = 12.0;

        let toast_pos = egui::pos2(panel_rect.right() - margin, panel_rect.bottom() - margin);

        let response = egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(toast_pos)
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                let elapsed = self
                    .toast
                    .start
                    .map(|t| t.elapsed().as_secs_f32())
                    .unwrap_or(0.0);
                let alpha = if elapsed > visible_duration {
                    (total_duration - elapsed) / fade_duration
                } else {
                    1.0
                };

                let (accent, icon) = match kind {
                    ToastKind::Success => {
                        (theme::STATUS_SUCCESS, egui_phosphor::regular::CHECK_CIRCLE)
                    }
                    ToastKind::Warning => (theme::STATUS_WARNING, egui_phosphor::regular::WARNING),
                };

                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(
                        0x1a,
                        0x1a,
                        0x1e,
                        (230.0 * alpha) as u8,
                    ))
                    .stroke(egui::Stroke::new(
                        1.0,
                        egui::Color32::from_rgba_unmultiplied(
                            accent.r(),
                            accent.g(),
                            accent.b(),
                            (100.0 * alpha) as u8,
                        ),
                    ))
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::symmetric(16, 10))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(icon).color(
                                egui::Color32::from_rgba_unmultiplied(
                                    accent.r(),
                                    accent.g(),
                                    accent.b(),
                                    (255.0 * alpha) as u8,
                                ),
                            ));
                            ui.label(egui::RichText::new(&msg).color(
                                egui::Color32::from_rgba_unmultiplied(
                                    255,
                                    255,
                                    255,
                                    (255.0 * alpha) as u8,
                                ),
                            ));
                        });
                    });
            });

        // Pause timer while hovering
        if response.response.hovered() {
            self.toast.start = Some(std::time::Instant::now());
        }

        let elapsed = self
            .toast
            .start
            .map(|t| t.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        if elapsed >= total_duration {
            self.toast.message = None;
            self.toast.start = None;
        } else {
            ctx.request_repaint();
        }
    }
}
