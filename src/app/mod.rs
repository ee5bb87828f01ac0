//! App module - contains the main application state and logic

mod profile;
mod vehicles;

pub use profile::{ProfileLoad, ProfileScreen};
pub use vehicles::VehiclesScreen;

use crate::api::ApiClient;
use crate::settings::Settings;
use crate::theme;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Which screen the central panel shows
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Vehicles,
    Profile,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
}

/// Non-blocking notification in the corner of the central panel.
/// One at a time; a new toast replaces the current one.
#[derive(Default)]
pub struct ToastState {
    pub message: Option<(ToastKind, String)>,
    pub start: Option<Instant>,
}

impl ToastState {
    pub fn success(&mut self, message: impl Into<String>) {
        self.message = Some((ToastKind::Success, message.into()));
        self.start = Some(Instant::now());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.message = Some((ToastKind::Warning, message.into()));
        self.start = Some(Instant::now());
    }
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) api: Arc<ApiClient>,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) screen: Screen,
    pub(crate) vehicles: VehiclesScreen,
    pub(crate) profile: ProfileScreen,
    pub(crate) toast: ToastState,
    pub(crate) operator_id: String,
    pub(crate) logo_texture: Option<egui::TextureHandle>,
    // Central panel rect for toast positioning
    pub(crate) central_panel_rect: Option<egui::Rect>,
    // Window geometry, tracked for saving on exit
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) data_dir: PathBuf,
    settings: Settings,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, data_dir: PathBuf) -> Self {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        // Apply theme from theme.rs
        theme::apply_visuals(&cc.egui_ctx);

        let api = Arc::new(ApiClient::new(
            settings.server_url.clone(),
            settings.storage_url.clone(),
        ));

        Self {
            api,
            runtime: tokio::runtime::Runtime::new().expect("tokio runtime"),
            screen: Screen::Vehicles,
            vehicles: VehiclesScreen::new(settings.size_per_page),
            profile: ProfileScreen::new(),
            toast: ToastState::default(),
            operator_id: settings.operator_id.clone(),
            logo_texture: None,
            central_panel_rect: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
            data_dir,
            settings,
        }
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
            server_url: self.settings.server_url.clone(),
            storage_url: self.settings.storage_url.clone(),
            operator_id: self.operator_id.clone(),
            size_per_page: self.vehicles.query.size_per_page,
        };
        settings.save(&self.data_dir);
    }
}
