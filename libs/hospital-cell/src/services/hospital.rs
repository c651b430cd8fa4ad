use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_utils::pagination::Pagination;
use shared_utils::filter::{ilike, LikeMatch};
use shared_utils::validation::validate_phone;

use crate::models::{
    CreateHospitalRequest, Hospital, HospitalError, HospitalSearchFilters, NearbyHospital,
    NearbyQuery, SlotState,
};
use crate::services::geo::{self, BoundingBox, DEFAULT_RADIUS_KM};

pub struct HospitalService {
    supabase: SupabaseClient,
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Hospital>, HospitalError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(HospitalError::from))
        .collect()
}

impl HospitalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create a hospital with an empty slot counter starting today.
    pub async fn create_hospital(
        &self,
        request: CreateHospitalRequest,
        default_capacity: u32,
        auth_token: &str,
    ) -> Result<Hospital, HospitalError> {
        debug!("Creating hospital: {}", request.name);

        if request.name.trim().is_empty() {
            return Err(HospitalError::Validation("Hospital name is required".to_string()));
        }
        if request.city.trim().is_empty() {
            return Err(HospitalError::Validation("City is required".to_string()));
        }
        geo::validate_coordinates(request.latitude, request.longitude)
            .map_err(HospitalError::Validation)?;
        if let Some(ref phone) = request.phone {
            if !validate_phone(phone) {
                return Err(HospitalError::Validation(format!("Invalid phone number: {}", phone)));
            }
        }

        let daily_capacity = request.daily_capacity.unwrap_or(default_capacity);
        if daily_capacity == 0 {
            return Err(HospitalError::Validation("Daily capacity must be positive".to_string()));
        }

        let now = Utc::now();
        let hospital_data = json!({
            "name": request.name.trim(),
            "address": request.address.trim(),
            "city": request.city.trim(),
            "phone": request.phone,
            "latitude": request.latitude,
            "longitude": request.longitude,
            "daily_capacity": daily_capacity,
            "booked_count": 0,
            "free_slot_date": now.date_naive().format("%Y-%m-%d").to_string(),
            "rating_average": 0.0,
            "rating_count": 0,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/hospitals",
            Some(auth_token),
            Some(hospital_data),
            Some(return_representation()),
        ).await?;

        let hospital = parse_rows(result)?
            .into_iter()
            .next()
            .ok_or_else(|| HospitalError::Database("Failed to create hospital".to_string()))?;

        debug!("Hospital created with ID: {}", hospital.id);
        Ok(hospital)
    }

    pub async fn get_hospital(
        &self,
        hospital_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Hospital, HospitalError> {
        debug!("Fetching hospital: {}", hospital_id);

        let path = format!("/rest/v1/hospitals?id=eq.{}", hospital_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        parse_rows(result)?
            .into_iter()
            .next()
            .ok_or(HospitalError::NotFound)
    }

    pub async fn search_hospitals(
        &self,
        filters: HospitalSearchFilters,
        page: &Pagination,
        auth_token: Option<&str>,
    ) -> Result<Vec<Hospital>, HospitalError> {
        debug!("Searching hospitals with filters: {:?}", filters);

        let mut query_parts = Vec::new();

        if let Some(name) = filters.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query_parts.push(format!("name={}", ilike(name, LikeMatch::Contains)));
        }
        if let Some(city) = filters.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query_parts.push(format!("city={}", ilike(city, LikeMatch::Contains)));
        }
        if let Some(speciality_id) = filters.speciality_id {
            let ids = self.hospital_ids_for_speciality(speciality_id, auth_token).await?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let joined = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
            query_parts.push(format!("id=in.({})", joined));
        }

        query_parts.push("order=rating_average.desc,name.asc".to_string());

        let path = format!("/rest/v1/hospitals?{}{}", query_parts.join("&"), page.query());

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            auth_token,
            None,
        ).await?;

        parse_rows(result)
    }

    async fn hospital_ids_for_speciality(
        &self,
        speciality_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<Uuid>, HospitalError> {
        let path = format!(
            "/rest/v1/hospital_specialities?speciality_id=eq.{}&select=hospital_id",
            speciality_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("hospital_id").and_then(Value::as_str))
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect())
    }

    /// Hospitals within `radius_km` of a point, nearest first.
    pub async fn find_nearby(
        &self,
        query: NearbyQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<NearbyHospital>, HospitalError> {
        geo::validate_coordinates(query.latitude, query.longitude)
            .map_err(HospitalError::Validation)?;

        let radius_km = query.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if radius_km.is_nan() || radius_km <= 0.0 {
            return Err(HospitalError::Validation("Radius must be positive".to_string()));
        }

        let bbox = BoundingBox::around(query.latitude, query.longitude, radius_km);
        debug!("Nearby search at ({}, {}) within {} km", query.latitude, query.longitude, radius_km);

        let path = format!("/rest/v1/hospitals?{}", bbox.to_query());
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        let mut nearby: Vec<NearbyHospital> = parse_rows(result)?
            .into_iter()
            .map(|hospital| {
                let distance_km = geo::haversine_km(
                    query.latitude,
                    query.longitude,
                    hospital.latitude,
                    hospital.longitude,
                );
                NearbyHospital { hospital, distance_km }
            })
            .filter(|h| h.distance_km <= radius_km)
            .collect();

        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        if let Some(limit) = query.limit {
            nearby.truncate(limit);
        }

        Ok(nearby)
    }

    /// Write `next` only if the row still holds `expected`. Returns `None`
    /// when another booking changed the counter first.
    pub async fn compare_and_set_slot_state(
        &self,
        hospital_id: Uuid,
        expected: SlotState,
        next: SlotState,
        auth_token: &str,
    ) -> Result<Option<Hospital>, HospitalError> {
        let path = format!(
            "/rest/v1/hospitals?id=eq.{}&booked_count=eq.{}&free_slot_date=eq.{}",
            hospital_id,
            expected.booked_count,
            expected.free_slot_date.format("%Y-%m-%d"),
        );

        let update = json!({
            "booked_count": next.booked_count,
            "free_slot_date": next.free_slot_date.format("%Y-%m-%d").to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update),
            Some(return_representation()),
        ).await?;

        let updated = parse_rows(result)?.into_iter().next();
        if updated.is_none() {
            warn!("Slot state for hospital {} changed concurrently", hospital_id);
        }
        Ok(updated)
    }

    pub async fn set_rating_summary(
        &self,
        hospital_id: Uuid,
        rating_average: f64,
        rating_count: u32,
        auth_token: &str,
    ) -> Result<(), HospitalError> {
        debug!("Updating rating summary for hospital {}: {} over {}", hospital_id, rating_average, rating_count);

        let path = format!("/rest/v1/hospitals?id=eq.{}", hospital_id);
        let _: Value = self.supabase.request(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "rating_average": rating_average,
                "rating_count": rating_count,
                "updated_at": Utc::now().to_rfc3339()
            })),
        ).await?;

        Ok(())
    }
}
