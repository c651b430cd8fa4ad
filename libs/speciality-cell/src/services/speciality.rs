use std::collections::HashSet;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use hospital_cell::models::HospitalError;
use hospital_cell::services::HospitalService;
use shared_config::AppConfig;
use shared_database::supabase::{merge_duplicates, return_representation, SupabaseClient};
use shared_utils::filter::{ilike, LikeMatch};

use crate::models::{
    CreateSpecialityRequest, HospitalLink, HospitalLinkRequest, Severity, Speciality,
    SpecialityDetail, SpecialityError,
};
use crate::services::aggregation::{adjust_severity, aggregate_counters, empty_severity};

pub struct SpecialityService {
    supabase: SupabaseClient,
    hospitals: HospitalService,
}

fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, SpecialityError> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

impl SpecialityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            hospitals: HospitalService::new(config),
        }
    }

    pub async fn list_specialities(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<Speciality>, SpecialityError> {
        debug!("Listing specialities");

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            "/rest/v1/specialities?order=name.asc",
            auth_token,
            None,
        ).await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SpecialityError::from))
            .collect()
    }

    pub async fn get_speciality(
        &self,
        speciality_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Speciality, SpecialityError> {
        let path = format!("/rest/v1/specialities?id=eq.{}", speciality_id);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        first_row(result)?.ok_or(SpecialityError::NotFound)
    }

    pub async fn get_speciality_detail(
        &self,
        speciality_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<SpecialityDetail, SpecialityError> {
        let speciality = self.get_speciality(speciality_id, auth_token).await?;
        let hospitals = self.links_for(speciality_id, auth_token).await?;

        Ok(SpecialityDetail { speciality, hospitals })
    }

    async fn links_for(
        &self,
        speciality_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<HospitalLink>, SpecialityError> {
        let path = format!("/rest/v1/hospital_specialities?speciality_id=eq.{}", speciality_id);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(SpecialityError::from))
            .collect()
    }

    pub async fn hospital_offers(
        &self,
        hospital_id: Uuid,
        speciality_id: Uuid,
        auth_token: &str,
    ) -> Result<bool, SpecialityError> {
        let path = format!(
            "/rest/v1/hospital_specialities?hospital_id=eq.{}&speciality_id=eq.{}",
            hospital_id, speciality_id
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Ok(!result.is_empty())
    }

    async fn ensure_hospital(&self, hospital_id: Uuid, auth_token: &str) -> Result<(), SpecialityError> {
        match self.hospitals.get_hospital(hospital_id, Some(auth_token)).await {
            Ok(_) => Ok(()),
            Err(HospitalError::NotFound) => Err(SpecialityError::HospitalNotFound(hospital_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a speciality and its hospital links, then derive its counters.
    pub async fn create_speciality(
        &self,
        request: CreateSpecialityRequest,
        auth_token: &str,
    ) -> Result<SpecialityDetail, SpecialityError> {
        let name = request.name.trim().to_string();
        debug!("Creating speciality: {}", name);

        if name.is_empty() {
            return Err(SpecialityError::Validation("Speciality name is required".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = request.hospitals.iter().find(|h| !seen.insert(h.hospital_id)) {
            return Err(SpecialityError::Validation(format!(
                "Hospital {} listed more than once",
                dup.hospital_id
            )));
        }

        let existing_path = format!(
            "/rest/v1/specialities?name={}&select=id",
            ilike(&name, LikeMatch::Exact)
        );
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &existing_path,
            Some(auth_token),
            None,
        ).await?;

        if !existing.is_empty() {
            return Err(SpecialityError::DuplicateName(name));
        }

        for link in &request.hospitals {
            self.ensure_hospital(link.hospital_id, auth_token).await?;
        }

        let now = Utc::now().to_rfc3339();
        let speciality_data = json!({
            "name": name,
            "description": request.description,
            "doctor_count": 0,
            "hospital_count": 0,
            "severity": empty_severity(),
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/specialities",
            Some(auth_token),
            Some(speciality_data),
            Some(return_representation()),
        ).await?;

        let speciality: Speciality = first_row(result)?
            .ok_or_else(|| SpecialityError::Database("Failed to create speciality".to_string()))?;
        debug!("Speciality created with ID: {}", speciality.id);

        if !request.hospitals.is_empty() {
            let links: Vec<Value> = request
                .hospitals
                .iter()
                .map(|h| json!({
                    "hospital_id": h.hospital_id,
                    "speciality_id": speciality.id,
                    "doctor_count": h.doctor_count
                }))
                .collect();

            let _: Vec<Value> = self.supabase.request_with_headers(
                Method::POST,
                "/rest/v1/hospital_specialities",
                Some(auth_token),
                Some(Value::Array(links)),
                Some(return_representation()),
            ).await?;
        }

        self.recompute_counters(speciality.id, auth_token).await
    }

    /// Add a hospital to a speciality, or replace its doctor count if linked.
    pub async fn link_hospital(
        &self,
        speciality_id: Uuid,
        request: HospitalLinkRequest,
        auth_token: &str,
    ) -> Result<SpecialityDetail, SpecialityError> {
        debug!("Linking hospital {} to speciality {}", request.hospital_id, speciality_id);

        self.get_speciality(speciality_id, Some(auth_token)).await?;
        self.ensure_hospital(request.hospital_id, auth_token).await?;

        let _: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/hospital_specialities?on_conflict=hospital_id,speciality_id",
            Some(auth_token),
            Some(json!({
                "hospital_id": request.hospital_id,
                "speciality_id": speciality_id,
                "doctor_count": request.doctor_count
            })),
            Some(merge_duplicates()),
        ).await?;

        self.recompute_counters(speciality_id, auth_token).await
    }

    /// Rebuild `doctor_count` and `hospital_count` from the link table.
    pub async fn recompute_counters(
        &self,
        speciality_id: Uuid,
        auth_token: &str,
    ) -> Result<SpecialityDetail, SpecialityError> {
        let links = self.links_for(speciality_id, Some(auth_token)).await?;
        let counters = aggregate_counters(&links);
        debug!(
            "Speciality {} now spans {} hospitals with {} doctors",
            speciality_id, counters.hospital_count, counters.doctor_count
        );

        let path = format!("/rest/v1/specialities?id=eq.{}", speciality_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "doctor_count": counters.doctor_count,
                "hospital_count": counters.hospital_count,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(return_representation()),
        ).await?;

        let speciality = first_row(result)?.ok_or(SpecialityError::NotFound)?;
        Ok(SpecialityDetail { speciality, hospitals: links })
    }

    /// Move one severity bucket up or down for a booking or cancellation.
    pub async fn adjust_severity(
        &self,
        speciality_id: Uuid,
        level: Severity,
        delta: i64,
        auth_token: &str,
    ) -> Result<Speciality, SpecialityError> {
        let speciality = self.get_speciality(speciality_id, Some(auth_token)).await?;
        let severity = adjust_severity(&speciality.severity, level, delta);

        let path = format!("/rest/v1/specialities?id=eq.{}", speciality_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "severity": severity,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(return_representation()),
        ).await?;

        first_row(result)?.ok_or(SpecialityError::NotFound)
    }
}
