//! Common types and data structures

use std::collections::BTreeMap;

use serde::Deserialize;

/// Sort direction for the vehicles table
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_param(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// A single column filter constraint.
///
/// The variant is chosen by the screen assembling the filter, never inferred
/// from the field name at serialization time: enumerated columns carry their
/// coded value as `Exact`, free-text columns carry the typed text as
/// `Contains`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Exact(String),
    Contains(String),
}

/// Combined pagination + sort + filter parameters driving a server-side
/// paginated fetch. Exactly one sort field is active at a time.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryState {
    pub page: u32,
    pub size_per_page: u32,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub filters: BTreeMap<String, FilterValue>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            size_per_page: 10,
            sort_field: "cameraId".to_string(),
            sort_direction: SortDirection::Descending,
            filters: BTreeMap::new(),
        }
    }
}

impl QueryState {
    /// Page change: replaces page and page size, preserves sort and filters.
    pub fn set_page(&mut self, page: u32, size_per_page: u32) {
        self.page = page.max(1);
        self.size_per_page = size_per_page.max(1);
    }

    /// Page-size change keeps the current page, as the original screen did.
    // TODO: clamp to the new last page when a larger size shrinks the page
    // count below the current page; the backend currently receives an
    // out-of-range page in that case.
    pub fn set_size_per_page(&mut self, size_per_page: u32) {
        self.size_per_page = size_per_page.max(1);
    }

    /// Replaces the single active sort criterion. Page and filters are
    /// untouched.
    pub fn set_sort(&mut self, field: &str, direction: SortDirection) {
        self.sort_field = field.to_string();
        self.sort_direction = direction;
    }

    /// Wholesale replacement of the filter map. Page, size and sort are
    /// untouched.
    pub fn set_filters(&mut self, filters: BTreeMap<String, FilterValue>) {
        self.filters = filters;
    }

    /// Number of pages needed for `total` records at the current page size.
    pub fn total_pages(&self, total: u64) -> u32 {
        if total == 0 {
            return 0;
        }
        total.div_ceil(self.size_per_page as u64) as u32
    }
}

/// One vehicle-alert record as served by the backend. Read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub license: String,
    pub alert: u8,
    pub camera: String,
    pub station: String,
    pub color: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "vehicleImg")]
    pub vehicle_img: String,
    #[serde(rename = "plateImg")]
    pub plate_img: String,
}

/// Which captured image a popover or detail pane refers to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageKind {
    Vehicle,
    Plate,
}

impl ImageKind {
    /// Relative path prefix under the storage base URL
    pub fn path(self) -> &'static str {
        match self {
            ImageKind::Vehicle => "vehicle",
            ImageKind::Plate => "plate",
        }
    }
}

/// Editable profile values, owned by the profile screen while the form is
/// open. Phones are held in display form (`"AA NNNNNNNNN"`) and converted to
/// E.164-like form on submit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub cpf: String,
    pub organization: String,
    pub city: String,
    pub group: String,
    pub email: String,
    pub whats_app: String,
    pub mobile: String,
    pub role: String,
    pub sms: bool,
    pub whats_app_message: bool,
    pub mail: bool,
}

// ============================================================================
// CODED LOOKUP TABLES
// ============================================================================

/// Alert code → label, in code order; used for both display and the select
/// filter options.
pub const ALERT_TYPES: [(u8, &str); 6] = [
    (0, "Nenhum"),
    (1, "Roubo"),
    (2, "Licenciamento"),
    (3, "Renajud"),
    (4, "Envolvido na ocorrência"),
    (5, "Investigado"),
];

/// Color code → label. Codes are the backend's two-digit strings.
pub const COLOR_TABLE: [(&str, &str); 16] = [
    ("01", "AMARELA"),
    ("02", "AZUL"),
    ("03", "BEGE"),
    ("04", "BRANCA"),
    ("05", "CINZA"),
    ("06", "DOURADA"),
    ("07", "GRENA"),
    ("08", "LARANJA"),
    ("09", "MARROM"),
    ("10", "PRATA"),
    ("11", "PRETA"),
    ("12", "ROSA"),
    ("13", "ROXA"),
    ("14", "VERDE"),
    ("15", "VERMELHA"),
    ("16", "FANTASIA"),
];

pub fn alert_label(code: u8) -> &'static str {
    ALERT_TYPES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or("Desconhecido")
}

pub fn color_label(code: &str) -> &'static str {
    COLOR_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or("DESCONHECIDA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_sorts_by_camera_descending() {
        let q = QueryState::default();
        assert_eq!(q.page, 1);
        assert_eq!(q.size_per_page, 10);
        assert_eq!(q.sort_field, "cameraId");
        assert_eq!(q.sort_direction, SortDirection::Descending);
        assert!(q.filters.is_empty());
    }

    #[test]
    fn set_page_preserves_sort_and_filters() {
        let mut q = QueryState::default();
        q.set_sort("license", SortDirection::Ascending);
        let mut filters = BTreeMap::new();
        filters.insert("alert".to_string(), FilterValue::Exact("2".into()));
        q.set_filters(filters.clone());

        q.set_page(3, 25);

        assert_eq!(q.page, 3);
        assert_eq!(q.size_per_page, 25);
        assert_eq!(q.sort_field, "license");
        assert_eq!(q.sort_direction, SortDirection::Ascending);
        assert_eq!(q.filters, filters);
    }

    #[test]
    fn set_sort_preserves_page_and_filters() {
        let mut q = QueryState::default();
        q.set_page(4, 50);
        let mut filters = BTreeMap::new();
        filters.insert("license".to_string(), FilterValue::Contains("ABC".into()));
        q.set_filters(filters.clone());

        q.set_sort("station", SortDirection::Ascending);

        assert_eq!(q.page, 4);
        assert_eq!(q.size_per_page, 50);
        assert_eq!(q.filters, filters);
    }

    #[test]
    fn set_filters_preserves_page_and_sort() {
        let mut q = QueryState::default();
        q.set_page(2, 10);
        q.set_sort("date", SortDirection::Descending);

        let mut filters = BTreeMap::new();
        filters.insert("camera".to_string(), FilterValue::Contains("12".into()));
        q.set_filters(filters);

        assert_eq!(q.page, 2);
        assert_eq!(q.size_per_page, 10);
        assert_eq!(q.sort_field, "date");
        assert_eq!(q.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn size_change_keeps_the_current_page() {
        let mut q = QueryState::default();
        q.set_page(3, 10);
        q.set_size_per_page(50);
        assert_eq!(q.page, 3);
        assert_eq!(q.size_per_page, 50);
    }

    #[test]
    fn twenty_five_records_at_ten_per_page_is_three_pages() {
        let mut q = QueryState::default();
        q.set_page(2, 10);
        assert_eq!(q.total_pages(25), 3);
        assert_eq!(q.total_pages(30), 3);
        assert_eq!(q.total_pages(31), 4);
        assert_eq!(q.total_pages(0), 0);
    }

    #[test]
    fn alert_labels_cover_all_codes_with_fallback() {
        assert_eq!(alert_label(0), "Nenhum");
        assert_eq!(alert_label(2), "Licenciamento");
        assert_eq!(alert_label(5), "Investigado");
        assert_eq!(alert_label(9), "Desconhecido");
    }

    #[test]
    fn color_labels_cover_known_codes_with_fallback() {
        assert_eq!(color_label("01"), "AMARELA");
        assert_eq!(color_label("16"), "FANTASIA");
        assert_eq!(color_label("99"), "DESCONHECIDA");
        assert_eq!(color_label(""), "DESCONHECIDA");
    }
}
