//! Vehicles screen state: query-state wiring, fetch plumbing and the
//! image-preview cache.
//!
//! Every backend fetch is spawned onto the app runtime and reports back over
//! a channel drained once per frame. A fetch carries a sequence token; a
//! response that is no longer the latest is dropped so rapid page/sort/filter
//! changes can never apply stale data over fresh data.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use futures::future::join_all;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, VehiclePage};
use crate::constants::FILTER_DEBOUNCE_MS;
use crate::types::{FilterValue, ImageKind, QueryState, SortDirection, VehicleRecord};

use super::ToastState;

pub(crate) enum VehiclesEvent {
    Page {
        seq: u64,
        result: Result<VehiclePage, ApiError>,
    },
    Image {
        key: String,
        bytes: Option<Vec<u8>>,
    },
}

/// Per-column filter widget values, as typed. The enumerated columns hold a
/// coded value; the free-text columns hold raw text.
#[derive(Clone, Default)]
pub struct FilterDraft {
    pub license: String,
    pub camera: String,
    pub station: String,
    pub alert: Option<u8>,
    pub color: Option<String>,
}

impl FilterDraft {
    pub fn is_empty(&self) -> bool {
        self.license.trim().is_empty()
            && self.camera.trim().is_empty()
            && self.station.trim().is_empty()
            && self.alert.is_none()
            && self.color.is_none()
    }
}

/// Assembles the query constraints from the draft. The enumerated columns
/// (`alert`, `color`) always become exact-match constraints on their coded
/// value; the free-text columns always become substring constraints.
pub(crate) fn build_filters(draft: &FilterDraft) -> BTreeMap<String, FilterValue> {
    let mut filters = BTreeMap::new();
    if let Some(code) = draft.alert {
        filters.insert("alert".to_string(), FilterValue::Exact(code.to_string()));
    }
    if let Some(code) = &draft.color {
        filters.insert("color".to_string(), FilterValue::Exact(code.clone()));
    }
    for (field, text) in [
        ("license", &draft.license),
        ("camera", &draft.camera),
        ("station", &draft.station),
    ] {
        let text = text.trim();
        if !text.is_empty() {
            filters.insert(field.to_string(), FilterValue::Contains(text.to_string()));
        }
    }
    filters
}

pub struct VehiclesScreen {
    pub query: QueryState,
    pub records: Vec<VehicleRecord>,
    pub total: u64,
    pub loading: bool,
    pub started: bool,
    pub draft: FilterDraft,
    pub popover: Option<(String, ImageKind)>,
    pub detail: Option<VehicleRecord>,
    /// key = "vehicle/<name>" or "plate/<name>"; None = fetch or decode failed
    pub image_textures: HashMap<String, Option<egui::TextureHandle>>,
    image_loading: HashSet<String>,
    fetch_seq: u64,
    pending_text_filter: Option<Instant>,
    tx: UnboundedSender<VehiclesEvent>,
    rx: UnboundedReceiver<VehiclesEvent>,
}

impl VehiclesScreen {
    pub fn new(size_per_page: u32) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut query = QueryState::default();
        query.set_size_per_page(size_per_page);
        Self {
            query,
            records: Vec::new(),
            total: 0,
            loading: false,
            started: false,
            draft: FilterDraft::default(),
            popover: None,
            detail: None,
            image_textures: HashMap::new(),
            image_loading: HashSet::new(),
            fetch_seq: 0,
            pending_text_filter: None,
            tx,
            rx,
        }
    }

    /// First fetch, once, when the screen becomes live.
    pub fn start(&mut self, api: &Arc<ApiClient>, runtime: &tokio::runtime::Runtime, ctx: &egui::Context) {
        if self.started {
            return;
        }
        self.started = true;
        self.refetch(api, runtime, ctx);
    }

    /// Spawns a fetch for the current query state. Any response from an
    /// earlier call is ignored when it eventually lands.
    pub fn refetch(&mut self, api: &Arc<ApiClient>, runtime: &tokio::runtime::Runtime, ctx: &egui::Context) {
        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        self.loading = true;

        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let query = self.query.clone();
        runtime.spawn(async move {
            let result = api.fetch_vehicles(&query).await;
            let _ = tx.send(VehiclesEvent::Page { seq, result });
            ctx.request_repaint();
        });
    }

    // ------------------------------------------------------------------
    // Query-state event handlers
    // ------------------------------------------------------------------

    pub fn on_page_change(
        &mut self,
        page: u32,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        self.query.set_page(page, self.query.size_per_page);
        self.refetch(api, runtime, ctx);
    }

    pub fn on_size_change(
        &mut self,
        size_per_page: u32,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        self.query.set_size_per_page(size_per_page);
        self.refetch(api, runtime, ctx);
    }

    /// Header click: same column toggles direction, a new column starts
    /// ascending. There is always exactly one active sort.
    pub fn on_sort_clicked(
        &mut self,
        field: &str,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        let direction = if self.query.sort_field == field {
            self.query.sort_direction.toggled()
        } else {
            SortDirection::Ascending
        };
        self.query.set_sort(field, direction);
        self.refetch(api, runtime, ctx);
    }

    /// Select-filter change: applied immediately.
    pub fn apply_filters_now(
        &mut self,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        self.pending_text_filter = None;
        self.query.set_filters(build_filters(&self.draft));
        self.refetch(api, runtime, ctx);
    }

    /// Text-filter keystroke: applied after the debounce delay elapses.
    pub fn note_text_filter_edit(&mut self) {
        self.pending_text_filter = Some(Instant::now());
    }

    // ------------------------------------------------------------------
    // Frame tick: debounce + event drain
    // ------------------------------------------------------------------

    pub fn tick(
        &mut self,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
        toast: &mut ToastState,
    ) {
        if let Some(edited) = self.pending_text_filter {
            let debounce = Duration::from_millis(FILTER_DEBOUNCE_MS);
            if edited.elapsed() >= debounce {
                self.apply_filters_now(api, runtime, ctx);
            } else {
                ctx.request_repaint_after(debounce - edited.elapsed());
            }
        }

        while let Ok(event) = self.rx.try_recv() {
            match event {
                VehiclesEvent::Page { seq, result } => {
                    let fresh = self.apply_page(seq, result, toast);
                    if fresh {
                        self.prefetch_page_images(api, runtime, ctx);
                    }
                }
                VehiclesEvent::Image { key, bytes } => {
                    self.image_loading.remove(&key);
                    let texture = bytes.and_then(|bytes| decode_texture(ctx, &key, &bytes));
                    self.image_textures.insert(key, texture);
                }
            }
        }
    }

    /// Applies one page response; returns true when a fresh page replaced
    /// the displayed records. Failure keeps the previous page on screen.
    fn apply_page(
        &mut self,
        seq: u64,
        result: Result<VehiclePage, ApiError>,
        toast: &mut ToastState,
    ) -> bool {
        if seq != self.fetch_seq {
            debug!(seq, current = self.fetch_seq, "Dropping stale vehicle page");
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                debug!(count = page.vehicles.len(), total = page.total, "Vehicle page applied");
                self.records = page.vehicles;
                self.total = page.total;
                true
            }
            Err(e) => {
                warn!(error = %e, "Vehicle page fetch failed");
                toast.warn(e.to_string());
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Image previews
    // ------------------------------------------------------------------

    fn image_key(kind: ImageKind, name: &str) -> String {
        format!("{}/{}", kind.path(), name)
    }

    /// Texture for a captured image, if it has arrived and decoded.
    pub fn image_texture(&self, kind: ImageKind, name: &str) -> Option<&egui::TextureHandle> {
        self.image_textures
            .get(&Self::image_key(kind, name))
            .and_then(|t| t.as_ref())
    }

    /// Kicks off a fetch for one image unless it is cached or in flight.
    pub fn ensure_image(
        &mut self,
        kind: ImageKind,
        name: &str,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        let key = Self::image_key(kind, name);
        if self.image_textures.contains_key(&key) || self.image_loading.contains(&key) {
            return;
        }
        self.image_loading.insert(key.clone());

        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let name = name.to_string();
        runtime.spawn(async move {
            let bytes = api.fetch_image(kind, &name).await.ok();
            let _ = tx.send(VehiclesEvent::Image { key, bytes });
            ctx.request_repaint();
        });
    }

    /// Warms the cache for every image on the freshly loaded page so the
    /// hover popover is instant. Concurrency is capped by a semaphore.
    fn prefetch_page_images(
        &mut self,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
    ) {
        let mut wanted: Vec<(ImageKind, String)> = Vec::new();
        for record in &self.records {
            for (kind, name) in [
                (ImageKind::Vehicle, &record.vehicle_img),
                (ImageKind::Plate, &record.plate_img),
            ] {
                if name.is_empty() {
                    continue;
                }
                let key = Self::image_key(kind, name);
                if !self.image_textures.contains_key(&key) && !self.image_loading.contains(&key) {
                    self.image_loading.insert(key);
                    wanted.push((kind, name.clone()));
                }
            }
        }
        if wanted.is_empty() {
            return;
        }
        debug!(count = wanted.len(), "Prefetching page images");

        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        runtime.spawn(async move {
            let semaphore = Arc::new(tokio::sync::Semaphore::new(8));
            let tasks = wanted.into_iter().map(|(kind, name)| {
                let api = api.clone();
                let tx = tx.clone();
                let ctx = ctx.clone();
                let sem = semaphore.clone();
                async move {
                    let _permit = sem.acquire().await.ok();
                    let key = VehiclesScreen::image_key(kind, &name);
                    let bytes = api.fetch_image(kind, &name).await.ok();
                    let _ = tx.send(VehiclesEvent::Image { key, bytes });
                    ctx.request_repaint();
                }
            });
            join_all(tasks).await;
        });
    }
}

fn decode_texture(ctx: &egui::Context, key: &str, bytes: &[u8]) -> Option<egui::TextureHandle> {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(key, error = %e, "Failed to decode image");
            return None;
        }
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.into_raw();
    Some(ctx.load_texture(
        key,
        egui::ColorImage::from_rgba_unmultiplied(size, &pixels),
        egui::TextureOptions::LINEAR,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> VehicleRecord {
        VehicleRecord {
            id: id.to_string(),
            license: "ABC1234".to_string(),
            alert: 0,
            camera: "cam-01".to_string(),
            station: "Central".to_string(),
            color: "04".to_string(),
            date: "2020-06-15".to_string(),
            time: "10:00:00".to_string(),
            vehicle_img: "v.jpg".to_string(),
            plate_img: "p.jpg".to_string(),
        }
    }

    #[test]
    fn enumerated_columns_filter_exactly_text_columns_by_substring() {
        let draft = FilterDraft {
            license: "ABC".to_string(),
            camera: " cam-7 ".to_string(),
            station: String::new(),
            alert: Some(2),
            color: Some("11".to_string()),
        };
        let filters = build_filters(&draft);
        assert_eq!(
            filters.get("alert"),
            Some(&FilterValue::Exact("2".to_string()))
        );
        assert_eq!(
            filters.get("color"),
            Some(&FilterValue::Exact("11".to_string()))
        );
        assert_eq!(
            filters.get("license"),
            Some(&FilterValue::Contains("ABC".to_string()))
        );
        assert_eq!(
            filters.get("camera"),
            Some(&FilterValue::Contains("cam-7".to_string()))
        );
        assert!(!filters.contains_key("station"));
    }

    #[test]
    fn blank_draft_builds_no_constraints() {
        assert!(build_filters(&FilterDraft::default()).is_empty());
    }

    #[test]
    fn fresh_page_replaces_records_and_total() {
        let mut screen = VehiclesScreen::new(10);
        screen.fetch_seq = 1;
        let mut toast = ToastState::default();

        let fresh = screen.apply_page(
            1,
            Ok(VehiclePage {
                vehicles: vec![record("a"), record("b")],
                total: 25,
            }),
            &mut toast,
        );

        assert!(fresh);
        assert_eq!(screen.records.len(), 2);
        assert_eq!(screen.total, 25);
        assert!(!screen.loading);
        assert!(toast.message.is_none());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut screen = VehiclesScreen::new(10);
        screen.fetch_seq = 2;
        screen.records = vec![record("current")];
        screen.total = 1;
        let mut toast = ToastState::default();

        let fresh = screen.apply_page(
            1,
            Ok(VehiclePage {
                vehicles: vec![record("stale1"), record("stale2")],
                total: 99,
            }),
            &mut toast,
        );

        assert!(!fresh);
        assert_eq!(screen.records.len(), 1);
        assert_eq!(screen.records[0].id, "current");
        assert_eq!(screen.total, 1);
    }

    #[test]
    fn failed_fetch_keeps_previous_page_and_warns() {
        let mut screen = VehiclesScreen::new(10);
        screen.fetch_seq = 1;
        screen.records = vec![record("kept")];
        screen.total = 1;
        let mut toast = ToastState::default();

        let fresh = screen.apply_page(
            1,
            Err(ApiError::Backend("sem acesso".to_string())),
            &mut toast,
        );

        assert!(!fresh);
        assert_eq!(screen.records[0].id, "kept");
        assert_eq!(screen.total, 1);
        assert!(matches!(
            toast.message,
            Some((super::super::ToastKind::Warning, ref msg)) if msg == "sem acesso"
        ));
    }
}
