//! Reusable UI components
//!
//! Standalone widgets shared by the vehicles table and the profile form.

use crate::theme;
use eframe::egui;

/// Paint a pill badge with the given colors, sized to its text.
pub fn badge(ui: &mut egui::Ui, text: &str, bg: egui::Color32, fg: egui::Color32) {
    let font = egui::FontId::proportional(theme::FONT_SECTION);
    let width = ui
        .fonts(|f| f.layout_no_wrap(text.to_string(), font.clone(), fg).rect.width())
        + 16.0;
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(width, theme::BADGE_HEIGHT),
        egui::Sense::hover(),
    );
    ui.painter().rect_filled(rect, 3.0, bg);
    ui.painter()
        .text(rect.center(), egui::Align2::CENTER_CENTER, text, font, fg);
}

/// Custom checkbox widget with consistent styling
pub fn styled_checkbox(ui: &mut egui::Ui, selected: bool, size: f32) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::click());

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        let rounding = 3.0;

        if selected {
            painter.rect_filled(rect, rounding, theme::ACCENT);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                egui_phosphor::regular::CHECK,
                egui::FontId::proportional(size * 0.7),
                egui::Color32::WHITE,
            );
        } else {
            painter.rect_stroke(
                rect,
                rounding,
                egui::Stroke::new(1.5, theme::BORDER_DEFAULT),
                egui::StrokeKind::Inside,
            );
        }
    }

    response
}

/// Checkbox with a trailing label. Returns true if toggled.
pub fn labeled_checkbox(ui: &mut egui::Ui, checked: &mut bool, label: &str) -> bool {
    let mut toggled = false;
    ui.horizontal(|ui| {
        if styled_checkbox(ui, *checked, 16.0).clicked() {
            *checked = !*checked;
            toggled = true;
        }
        let resp = ui.add(
            egui::Label::new(egui::RichText::new(label).size(theme::FONT_BODY))
                .selectable(false)
                .sense(egui::Sense::click()),
        );
        if resp.clicked() {
            *checked = !*checked;
            toggled = true;
        }
    });
    toggled
}

/// Single-line text input with hint text and an optional error message
/// rendered beneath it. Returns true when the value changed this frame.
pub fn text_field(
    ui: &mut egui::Ui,
    value: &mut String,
    hint: &str,
    error: Option<&str>,
) -> bool {
    let edit = egui::TextEdit::singleline(value)
        .hint_text(hint)
        .desired_width(f32::INFINITY)
        .background_color(theme::BG_INPUT)
        .margin(egui::Margin::symmetric(8, 6));
    let changed = ui.add(edit).changed();
    field_error(ui, error);
    changed
}

/// Error line shown under a form field; reserves no space when clear.
pub fn field_error(ui: &mut egui::Ui, error: Option<&str>) {
    if let Some(msg) = error {
        ui.add(
            egui::Label::new(
                egui::RichText::new(msg)
                    .size(theme::FONT_SMALL)
                    .color(theme::STATUS_ERROR),
            )
            .selectable(false),
        );
    }
}
