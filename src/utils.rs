//! Utility functions

use chrono::NaiveDate;

// License-plate mark with camera lens — for the sidebar logo
pub const LOGO_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 240 150"><defs><style>.c1{fill:none;stroke:#fff;stroke-width:10px}.c2{fill:#2dd4bf}.c3{fill:#09090b}</style></defs><rect class="c1" x="8" y="30" width="224" height="90" rx="14"/><rect class="c2" x="8" y="30" width="46" height="90" rx="14"/><rect class="c2" x="40" y="30" width="14" height="90"/><circle class="c2" cx="168" cy="75" r="34"/><circle class="c3" cx="168" cy="75" r="20"/><circle class="c2" cx="176" cy="67" r="6"/><rect class="c2" x="76" y="62" width="44" height="26" rx="6"/></svg>"#;

// Square viewBox — for window/taskbar icons
pub const ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 240 240"><defs><style>.c1{fill:none;stroke:#fff;stroke-width:10px}.c2{fill:#2dd4bf}.c3{fill:#09090b}</style></defs><g transform="translate(0,45)"><rect class="c1" x="8" y="30" width="224" height="90" rx="14"/><rect class="c2" x="8" y="30" width="46" height="90" rx="14"/><rect class="c2" x="40" y="30" width="14" height="90"/><circle class="c2" cx="168" cy="75" r="34"/><circle class="c3" cx="168" cy="75" r="20"/><circle class="c2" cx="176" cy="67" r="6"/><rect class="c2" x="76" y="62" width="44" height="26" rx="6"/></g></svg>"#;

/// Rasterize the logo SVG at the given width, preserving aspect ratio.
pub fn rasterize_logo(width: u32) -> (Vec<u8>, u32, u32) {
    let tree = resvg::usvg::Tree::from_str(LOGO_SVG, &resvg::usvg::Options::default()).unwrap();
    let svg_size = tree.size();
    let scale = width as f32 / svg_size.width();
    let height = (svg_size.height() * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).unwrap();
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    (premul_to_straight(&pixmap), width, height)
}

/// Rasterize the icon SVG to a square image (for window/taskbar icons).
pub fn rasterize_logo_square(size: u32) -> (Vec<u8>, u32, u32) {
    let tree = resvg::usvg::Tree::from_str(ICON_SVG, &resvg::usvg::Options::default()).unwrap();
    let scale = size as f32 / tree.size().width();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size).unwrap();
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    (premul_to_straight(&pixmap), size, size)
}

fn premul_to_straight(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let a = p.alpha();
            if a == 0 {
                [0, 0, 0, 0]
            } else {
                let r = (p.red() as u16 * 255 / a as u16) as u8;
                let g = (p.green() as u16 * 255 / a as u16) as u8;
                let b = (p.blue() as u16 * 255 / a as u16) as u8;
                [r, g, b, a]
            }
        })
        .collect()
}

// ============================================================================
// PHONE NUMBER NORMALIZATION
// ============================================================================

/// Backend → display form: drops the 3-character country prefix and
/// reinserts one space after the 2-digit area code.
/// `"+5512920155555"` becomes `"12 920155555"`.
pub fn strip_country_code(e164: &str) -> String {
    let rest: String = e164.chars().skip(3).collect();
    if rest.len() <= 2 {
        return rest;
    }
    format!("{} {}", &rest[..2], &rest[2..])
}

/// Display → backend form: removes all whitespace and prepends `+55`.
/// Exact inverse of [`strip_country_code`] for unedited round-trips.
pub fn to_e164(display: &str) -> String {
    let digits: String = display.chars().filter(|c| !c.is_whitespace()).collect();
    format!("+55{digits}")
}

/// Record dates arrive as `YYYY-MM-DD`; shown as `DD/MM/YYYY`. Anything
/// unparseable is displayed as-is.
pub fn format_record_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_country_prefix_and_spaces_area_code() {
        assert_eq!(strip_country_code("+5512920155555"), "12 920155555");
        assert_eq!(strip_country_code("+5585987654321"), "85 987654321");
    }

    #[test]
    fn e164_removes_whitespace_and_prefixes() {
        assert_eq!(to_e164("12 920155555"), "+5512920155555");
        assert_eq!(to_e164("85 987654321"), "+5585987654321");
    }

    #[test]
    fn phone_transforms_are_inverses_for_display_strings() {
        for display in ["12 920155555", "85 987654321", "99 512345678"] {
            assert_eq!(strip_country_code(&to_e164(display)), display);
        }
    }

    #[test]
    fn degenerate_phone_inputs_do_not_panic() {
        assert_eq!(strip_country_code(""), "");
        assert_eq!(strip_country_code("+55"), "");
        assert_eq!(strip_country_code("+5512"), "12");
        assert_eq!(to_e164(""), "+55");
    }

    #[test]
    fn record_dates_render_as_day_month_year() {
        assert_eq!(format_record_date("2020-06-15"), "15/06/2020");
        assert_eq!(format_record_date("not-a-date"), "not-a-date");
        assert_eq!(format_record_date(""), "");
    }
}
