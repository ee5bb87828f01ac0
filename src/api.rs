//! Backend API client
//!
//! All communication with the PlateWatch backend goes through [`ApiClient`].
//! The backend wraps every response in a `{success, errorMsg?}` envelope;
//! `success: false` and transport-level failures both surface as [`ApiError`]
//! so callers handle one failure path.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{FilterValue, ImageKind, QueryState, VehicleRecord};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("falha de comunicação: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Backend(String),
}

fn backend_err(msg: Option<String>) -> ApiError {
    ApiError::Backend(msg.unwrap_or_else(|| "Falha na operação".to_string()))
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct City {
    #[serde(rename = "_id")]
    pub id: String,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Permission {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Profile as served by the backend; phones arrive in E.164-like form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDto {
    pub name: String,
    pub cpf: String,
    pub organization: String,
    pub city: String,
    pub group: String,
    pub email: String,
    #[serde(rename = "whatsApp")]
    pub whats_app: String,
    pub mobile: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub sms: bool,
    #[serde(rename = "whatsAppMessage", default)]
    pub whats_app_message: bool,
    #[serde(default)]
    pub mail: bool,
}

/// Atomic profile update: permissions normalized to id strings, phones to
/// E.164-like form.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub cpf: String,
    pub organization: String,
    pub city: String,
    pub group: String,
    pub email: String,
    #[serde(rename = "whatsApp")]
    pub whats_app: String,
    pub mobile: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub sms: bool,
    #[serde(rename = "whatsAppMessage")]
    pub whats_app_message: bool,
    pub mail: bool,
}

/// One page of vehicle records plus the backend's total count.
#[derive(Debug, Clone)]
pub struct VehiclePage {
    pub vehicles: Vec<VehicleRecord>,
    pub total: u64,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    success: bool,
    #[serde(default)]
    profile: Option<ProfileDto>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct CitiesEnvelope {
    success: bool,
    #[serde(default)]
    cities: Vec<City>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct GroupsEnvelope {
    success: bool,
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct PermissionsEnvelope {
    success: bool,
    #[serde(default)]
    permissions: Vec<Permission>,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

#[derive(Deserialize)]
struct VehiclesEnvelope {
    success: bool,
    #[serde(default)]
    vehicles: Vec<VehicleRecord>,
    #[serde(default)]
    total: u64,
    #[serde(rename = "errorMsg", default)]
    error_msg: Option<String>,
}

// ============================================================================
// REQUEST SERIALIZATION
// ============================================================================

/// Body of the paginated vehicle list request. Serializes the query state
/// verbatim: `sort` as a single-entry `{field: "asc"|"desc"}` map and
/// `filterObj` with exact values for enumerated columns and `$regex`
/// wrappers for substring constraints.
#[derive(Debug)]
pub struct VehicleListRequest<'a> {
    pub query: &'a QueryState,
}

impl Serialize for VehicleListRequest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let q = self.query;
        let mut sort = BTreeMap::new();
        sort.insert(q.sort_field.as_str(), q.sort_direction.as_param());

        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("page", &q.page)?;
        map.serialize_entry("sizePerPage", &q.size_per_page)?;
        map.serialize_entry("sort", &sort)?;
        map.serialize_entry("filterObj", &FilterObj(&q.filters))?;
        map.end()
    }
}

struct FilterObj<'a>(&'a BTreeMap<String, FilterValue>);

impl Serialize for FilterObj<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, constraint) in self.0 {
            map.serialize_entry(field, &Constraint(constraint))?;
        }
        map.end()
    }
}

struct Constraint<'a>(&'a FilterValue);

impl Serialize for Constraint<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            FilterValue::Exact(value) => serializer.serialize_str(value),
            FilterValue::Contains(text) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$regex", &format!(".*{text}.*"))?;
                map.end()
            }
        }
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, storage_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            storage_url: storage_url.into(),
        }
    }

    /// Image assets live under `{storage}/{vehicle|plate}/{name}`.
    pub fn image_url(&self, kind: ImageKind, name: &str) -> String {
        format!("{}/{}/{}", self.storage_url, kind.path(), name)
    }

    pub async fn fetch_profile(&self, id: &str) -> Result<ProfileDto, ApiError> {
        let url = format!("{}/auth/profile/{id}", self.base_url);
        debug!(%url, "Fetching profile");
        let env: ProfileEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            env.profile.ok_or_else(|| backend_err(None))
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        let url = format!("{}/auth/update/{id}", self.base_url);
        debug!(%url, "Submitting profile update");
        let env: StatusEnvelope = self
            .http
            .put(&url)
            .json(update)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            Ok(())
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    pub async fn fetch_cities(&self) -> Result<Vec<City>, ApiError> {
        let url = format!("{}/city", self.base_url);
        let env: CitiesEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            Ok(env.cities)
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    pub async fn fetch_groups(&self) -> Result<Vec<Group>, ApiError> {
        let url = format!("{}/group", self.base_url);
        let env: GroupsEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            Ok(env.groups)
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    pub async fn fetch_permissions(&self) -> Result<Vec<Permission>, ApiError> {
        let url = format!("{}/permission", self.base_url);
        let env: PermissionsEnvelope = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            Ok(env.permissions)
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    /// One page of vehicle records for the given query state.
    pub async fn fetch_vehicles(&self, query: &QueryState) -> Result<VehiclePage, ApiError> {
        let url = format!("{}/vehicle/list", self.base_url);
        debug!(%url, page = query.page, size = query.size_per_page, "Fetching vehicle page");
        let env: VehiclesEnvelope = self
            .http
            .post(&url)
            .json(&VehicleListRequest { query })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if env.success {
            Ok(VehiclePage {
                vehicles: env.vehicles,
                total: env.total,
            })
        } else {
            Err(backend_err(env.error_msg))
        }
    }

    /// Raw image bytes from the storage service; decoding happens on the UI
    /// thread where a texture can be created.
    pub async fn fetch_image(&self, kind: ImageKind, name: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.image_url(kind, name);
        let bytes = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use serde_json::json;

    #[test]
    fn list_request_carries_the_query_state_verbatim() {
        let mut query = QueryState::default();
        query.set_page(2, 10);
        let body = serde_json::to_value(VehicleListRequest { query: &query }).unwrap();
        assert_eq!(
            body,
            json!({
                "page": 2,
                "sizePerPage": 10,
                "sort": {"cameraId": "desc"},
                "filterObj": {},
            })
        );
    }

    #[test]
    fn substring_filters_serialize_as_regex_wrappers() {
        let mut query = QueryState::default();
        let mut filters = BTreeMap::new();
        filters.insert(
            "license".to_string(),
            FilterValue::Contains("ABC".to_string()),
        );
        query.set_filters(filters);

        let body = serde_json::to_value(VehicleListRequest { query: &query }).unwrap();
        assert_eq!(body["filterObj"], json!({"license": {"$regex": ".*ABC.*"}}));
    }

    #[test]
    fn exact_filters_serialize_as_bare_values() {
        let mut query = QueryState::default();
        let mut filters = BTreeMap::new();
        filters.insert("alert".to_string(), FilterValue::Exact("2".to_string()));
        filters.insert("color".to_string(), FilterValue::Exact("11".to_string()));
        query.set_filters(filters);

        let body = serde_json::to_value(VehicleListRequest { query: &query }).unwrap();
        assert_eq!(body["filterObj"], json!({"alert": "2", "color": "11"}));
    }

    #[test]
    fn sort_is_a_single_entry_map() {
        let mut query = QueryState::default();
        query.set_sort("license", SortDirection::Ascending);
        let body = serde_json::to_value(VehicleListRequest { query: &query }).unwrap();
        assert_eq!(body["sort"], json!({"license": "asc"}));
    }

    #[test]
    fn profile_update_uses_backend_field_names() {
        let update = ProfileUpdate {
            name: "Carlos Pereira".into(),
            cpf: "52998224725".into(),
            organization: "Polícia Civil".into(),
            city: "c1".into(),
            group: "g1".into(),
            email: "carlos@example.com".into(),
            whats_app: "+5512920155555".into(),
            mobile: "+5585987654321".into(),
            role: "admin".into(),
            permissions: vec!["p1".into(), "p2".into()],
            sms: true,
            whats_app_message: false,
            mail: true,
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body["whatsApp"], json!("+5512920155555"));
        assert_eq!(body["whatsAppMessage"], json!(false));
        assert_eq!(body["permissions"], json!(["p1", "p2"]));
    }

    #[test]
    fn vehicle_records_deserialize_from_backend_naming() {
        let env: VehiclesEnvelope = serde_json::from_value(json!({
            "success": true,
            "total": 25,
            "vehicles": [{
                "_id": "v1",
                "license": "ABC1234",
                "alert": 2,
                "camera": "cam-07",
                "station": "Central",
                "color": "11",
                "date": "2020-06-15",
                "time": "14:02:55",
                "vehicleImg": "v1.jpg",
                "plateImg": "p1.jpg",
            }],
        }))
        .unwrap();
        assert!(env.success);
        assert_eq!(env.total, 25);
        assert_eq!(env.vehicles[0].id, "v1");
        assert_eq!(env.vehicles[0].vehicle_img, "v1.jpg");
        assert_eq!(env.vehicles[0].alert, 2);
    }

    #[test]
    fn image_urls_join_storage_base_and_kind() {
        let api = ApiClient::new("http://api.test", "http://img.test");
        assert_eq!(
            api.image_url(ImageKind::Vehicle, "v1.jpg"),
            "http://img.test/vehicle/v1.jpg"
        );
        assert_eq!(
            api.image_url(ImageKind::Plate, "p1.jpg"),
            "http://img.test/plate/p1.jpg"
        );
    }
}
