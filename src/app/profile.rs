//! Profile screen state: reference data, form values owned by the edit
//! workflow, eager validation and the normalized submit.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, City, Group, Permission, ProfileDto, ProfileUpdate};
use crate::types::ProfileForm;
use crate::utils::{strip_country_code, to_e164};
use crate::validate::{validate_profile, FieldErrors};

use super::ToastState;

pub(crate) enum ProfileEvent {
    Cities(Result<Vec<City>, ApiError>),
    Groups(Result<Vec<Group>, ApiError>),
    Permissions(Result<Vec<Permission>, ApiError>),
    Profile(Result<ProfileDto, ApiError>),
    Saved(Result<(), ApiError>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProfileLoad {
    Loading,
    Missing,
    Ready,
}

pub struct ProfileScreen {
    pub load: ProfileLoad,
    pub form: ProfileForm,
    /// Ids of the granted permissions, in selection order
    pub selected_permissions: Vec<String>,
    pub errors: FieldErrors,
    pub submitting: bool,
    pub started: bool,
    pub cities: Vec<City>,
    pub groups: Vec<Group>,
    pub permissions: Vec<Permission>,
    tx: UnboundedSender<ProfileEvent>,
    rx: UnboundedReceiver<ProfileEvent>,
}

impl ProfileScreen {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            load: ProfileLoad::Loading,
            form: ProfileForm::default(),
            selected_permissions: Vec::new(),
            errors: FieldErrors::new(),
            submitting: false,
            started: false,
            cities: Vec::new(),
            groups: Vec::new(),
            permissions: Vec::new(),
            tx,
            rx,
        }
    }

    /// Loads reference data and the profile itself, once, when the screen is
    /// first shown.
    pub fn start(
        &mut self,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
        operator_id: &str,
    ) {
        if self.started {
            return;
        }
        self.started = true;
        debug!(operator_id, "Loading profile screen data");

        {
            let api = api.clone();
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            runtime.spawn(async move {
                let _ = tx.send(ProfileEvent::Cities(api.fetch_cities().await));
                ctx.request_repaint();
            });
        }
        {
            let api = api.clone();
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            runtime.spawn(async move {
                let _ = tx.send(ProfileEvent::Groups(api.fetch_groups().await));
                ctx.request_repaint();
            });
        }
        {
            let api = api.clone();
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            runtime.spawn(async move {
                let _ = tx.send(ProfileEvent::Permissions(api.fetch_permissions().await));
                ctx.request_repaint();
            });
        }
        {
            let api = api.clone();
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            let id = operator_id.to_string();
            runtime.spawn(async move {
                let _ = tx.send(ProfileEvent::Profile(api.fetch_profile(&id).await));
                ctx.request_repaint();
            });
        }
    }

    /// Drains pending backend events into screen state.
    pub fn poll(&mut self, toast: &mut ToastState) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ProfileEvent::Cities(Ok(cities)) => self.cities = cities,
                ProfileEvent::Groups(Ok(groups)) => self.groups = groups,
                ProfileEvent::Permissions(Ok(permissions)) => self.permissions = permissions,
                ProfileEvent::Cities(Err(e))
                | ProfileEvent::Groups(Err(e))
                | ProfileEvent::Permissions(Err(e)) => {
                    warn!(error = %e, "Reference data fetch failed");
                    toast.warn(e.to_string());
                }
                ProfileEvent::Profile(Ok(profile)) => self.apply_profile(profile),
                ProfileEvent::Profile(Err(e)) => {
                    warn!(error = %e, "Profile fetch failed");
                    self.load = ProfileLoad::Missing;
                    toast.warn(e.to_string());
                }
                ProfileEvent::Saved(Ok(())) => {
                    self.submitting = false;
                    toast.success("Criado com sucesso!");
                }
                ProfileEvent::Saved(Err(e)) => {
                    warn!(error = %e, "Profile update failed");
                    self.submitting = false;
                    toast.warn(e.to_string());
                }
            }
        }
    }

    fn apply_profile(&mut self, profile: ProfileDto) {
        self.form = ProfileForm {
            name: profile.name,
            cpf: profile.cpf,
            organization: profile.organization,
            city: profile.city,
            group: profile.group,
            email: profile.email,
            whats_app: strip_country_code(&profile.whats_app),
            mobile: strip_country_code(&profile.mobile),
            role: profile.role,
            sms: profile.sms,
            whats_app_message: profile.whats_app_message,
            mail: profile.mail,
        };
        self.selected_permissions = profile.permissions.into_iter().map(|p| p.id).collect();
        self.load = ProfileLoad::Ready;
        self.revalidate();
    }

    /// Eager validation: runs on every edit, not only on submit.
    pub fn revalidate(&mut self) {
        self.errors = validate_profile(&self.form);
    }

    pub fn can_submit(&self) -> bool {
        self.load == ProfileLoad::Ready && !self.submitting && self.errors.is_empty()
    }

    pub fn toggle_permission(&mut self, id: &str) {
        if let Some(pos) = self.selected_permissions.iter().position(|p| p == id) {
            self.selected_permissions.remove(pos);
        } else {
            self.selected_permissions.push(id.to_string());
        }
    }

    /// Validates once more and sends the atomic update. The submitting flag
    /// keeps the submit control disabled until the response lands.
    pub fn submit(
        &mut self,
        api: &Arc<ApiClient>,
        runtime: &tokio::runtime::Runtime,
        ctx: &egui::Context,
        operator_id: &str,
    ) {
        self.revalidate();
        if !self.can_submit() {
            return;
        }
        self.submitting = true;

        let update = build_update(&self.form, &self.selected_permissions);
        let api = api.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let id = operator_id.to_string();
        runtime.spawn(async move {
            let _ = tx.send(ProfileEvent::Saved(api.update_profile(&id, &update).await));
            ctx.request_repaint();
        });
    }
}

/// Normalizes the form for the wire: permissions as an id array, phones in
/// E.164-like form.
fn build_update(form: &ProfileForm, permissions: &[String]) -> ProfileUpdate {
    ProfileUpdate {
        name: form.name.clone(),
        cpf: form.cpf.clone(),
        organization: form.organization.clone(),
        city: form.city.clone(),
        group: form.group.clone(),
        email: form.email.clone(),
        whats_app: to_e164(&form.whats_app),
        mobile: to_e164(&form.mobile),
        role: form.role.clone(),
        permissions: permissions.to_vec(),
        sms: form.sms,
        whats_app_message: form.whats_app_message,
        mail: form.mail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> ProfileDto {
        ProfileDto {
            name: "Carlos Pereira".to_string(),
            cpf: "52998224725".to_string(),
            organization: "Polícia Civil".to_string(),
            city: "c1".to_string(),
            group: "g1".to_string(),
            email: "carlos@example.com".to_string(),
            whats_app: "+5512920155555".to_string(),
            mobile: "+5585987654321".to_string(),
            role: "admin".to_string(),
            permissions: vec![Permission {
                id: "p1".to_string(),
                name: "Consulta".to_string(),
            }],
            sms: true,
            whats_app_message: false,
            mail: true,
        }
    }

    #[test]
    fn loaded_profile_is_displayed_with_stripped_phones() {
        let mut screen = ProfileScreen::new();
        screen.apply_profile(dto());

        assert_eq!(screen.load, ProfileLoad::Ready);
        assert_eq!(screen.form.whats_app, "12 920155555");
        assert_eq!(screen.form.mobile, "85 987654321");
        assert_eq!(screen.selected_permissions, vec!["p1".to_string()]);
        assert!(screen.errors.is_empty());
        assert!(screen.can_submit());
    }

    #[test]
    fn failed_profile_fetch_renders_the_missing_state() {
        let mut screen = ProfileScreen::new();
        let mut toast = ToastState::default();
        screen
            .tx
            .send(ProfileEvent::Profile(Err(ApiError::Backend(
                "not found".to_string(),
            ))))
            .unwrap();

        screen.poll(&mut toast);

        assert_eq!(screen.load, ProfileLoad::Missing);
        assert!(matches!(
            toast.message,
            Some((super::super::ToastKind::Warning, ref msg)) if msg == "not found"
        ));
    }

    #[test]
    fn submit_is_blocked_while_errors_are_present() {
        let mut screen = ProfileScreen::new();
        let mut profile = dto();
        profile.cpf = "123.456.789-00".to_string();
        screen.apply_profile(profile);

        assert!(!screen.errors.is_empty());
        assert!(!screen.can_submit());
    }

    #[test]
    fn update_payload_normalizes_phones_and_permissions() {
        let mut screen = ProfileScreen::new();
        screen.apply_profile(dto());
        screen.toggle_permission("p2");

        let update = build_update(&screen.form, &screen.selected_permissions);
        assert_eq!(update.whats_app, "+5512920155555");
        assert_eq!(update.mobile, "+5585987654321");
        assert_eq!(
            update.permissions,
            vec!["p1".to_string(), "p2".to_string()]
        );
    }

    #[test]
    fn toggling_an_existing_permission_removes_it() {
        let mut screen = ProfileScreen::new();
        screen.apply_profile(dto());
        screen.toggle_permission("p1");
        assert!(screen.selected_permissions.is_empty());
    }
}
