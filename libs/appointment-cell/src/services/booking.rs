// libs/appointment-cell/src/services/booking.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use hospital_cell::services::HospitalService;
use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_models::auth::User;
use shared_utils::pagination::Pagination;
use speciality_cell::services::SpecialityService;

use crate::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentStatus,
    CreateAppointmentRequest,
};
use crate::services::slots::allocate_slot;

/// Conditional counter updates tried before a booking gives up.
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

pub struct AppointmentService {
    supabase: SupabaseClient,
    hospitals: HospitalService,
    specialities: SpecialityService,
}

fn first_appointment(rows: Vec<Value>) -> Result<Option<Appointment>, AppointmentError> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            hospitals: HospitalService::new(config),
            specialities: SpecialityService::new(config),
        }
    }

    /// Book an appointment on the hospital's next free day.
    pub async fn create_appointment(
        &self,
        user: &User,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.create_appointment_on(user, request, Utc::now().date_naive(), auth_token).await
    }

    pub async fn create_appointment_on(
        &self,
        user: &User,
        request: CreateAppointmentRequest,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking appointment for user {} at hospital {}", user.id, request.hospital_id);

        request.validate()?;

        // An unknown hospital is a 404, not a missing speciality link
        self.hospitals.get_hospital(request.hospital_id, Some(auth_token)).await?;

        let offered = self.specialities
            .hospital_offers(request.hospital_id, request.speciality_id, auth_token)
            .await?;
        if !offered {
            return Err(AppointmentError::SpecialityNotOffered);
        }

        let appointment_date = self.reserve_slot(request.hospital_id, today, auth_token).await?;

        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "user_id": user.id,
            "hospital_id": request.hospital_id,
            "speciality_id": request.speciality_id,
            "patient_name": request.patient_name.trim(),
            "patient_phone": request.patient_phone.trim(),
            "patient_age": request.patient_age,
            "description": request.description,
            "severity": request.severity,
            "appointment_date": appointment_date.format("%Y-%m-%d").to_string(),
            "status": AppointmentStatus::Booked,
            "created_at": now,
            "updated_at": now
        });

        let appointment = match self.insert_appointment(appointment_data, auth_token).await {
            Ok(appointment) => appointment,
            Err(e) => {
                // The counter has already moved, so this slot stays consumed
                warn!(
                    "Slot on {} at hospital {} was reserved but no appointment holds it: {}",
                    appointment_date, request.hospital_id, e
                );
                return Err(e);
            }
        };

        if let Err(e) = self.specialities
            .adjust_severity(appointment.speciality_id, appointment.severity, 1, auth_token)
            .await
        {
            warn!("Failed to update severity counters for speciality {}: {}", appointment.speciality_id, e);
        }

        info!(
            "Appointment {} booked at hospital {} for {}",
            appointment.id, appointment.hospital_id, appointment.appointment_date
        );
        Ok(appointment)
    }

    async fn insert_appointment(
        &self,
        appointment_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(return_representation()),
        ).await?;

        first_appointment(result)?
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))
    }

    /// Advance the hospital's slot counter, retrying when a concurrent
    /// booking moved it between our read and write.
    async fn reserve_slot(
        &self,
        hospital_id: Uuid,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<NaiveDate, AppointmentError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let hospital = self.hospitals.get_hospital(hospital_id, Some(auth_token)).await?;
            let current = hospital.slot_state();

            let allocation = allocate_slot(current, hospital.daily_capacity, today)
                .ok_or(AppointmentError::NoCapacity)?;

            let updated = self.hospitals
                .compare_and_set_slot_state(hospital_id, current, allocation.next, auth_token)
                .await?;

            if updated.is_some() {
                debug!(
                    "Reserved {} at hospital {} on attempt {}",
                    allocation.appointment_date, hospital_id, attempt
                );
                return Ok(allocation.appointment_date);
            }
        }

        Err(AppointmentError::SlotContention(MAX_ALLOCATION_ATTEMPTS))
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let appointment = first_appointment(result)?.ok_or(AppointmentError::NotFound)?;

        if !user.can_access(&appointment.user_id) {
            return Err(AppointmentError::Unauthorized);
        }

        Ok(appointment)
    }

    pub async fn list_user_appointments(
        &self,
        user: &User,
        query: AppointmentListQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments for user: {}", user.id);

        let mut path = format!("/rest/v1/appointments?user_id=eq.{}", user.id);
        if let Some(status) = query.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=appointment_date.asc");

        let page = Pagination { limit: query.limit, offset: query.offset };
        path.push_str(&page.query());

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(AppointmentError::from))
            .collect()
    }

    /// Cancel a booking and release its severity count. The hospital's slot
    /// counter is left as is.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        user: &User,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id, user, auth_token).await?;

        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled));
        }

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id,
            AppointmentStatus::Booked
        );
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({
                "status": AppointmentStatus::Cancelled,
                "updated_at": Utc::now().to_rfc3339()
            })),
            Some(return_representation()),
        ).await?;

        // An empty result means someone else cancelled it in the meantime
        let cancelled = first_appointment(result)?
            .ok_or(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled))?;

        if let Err(e) = self.specialities
            .adjust_severity(cancelled.speciality_id, cancelled.severity, -1, auth_token)
            .await
        {
            warn!("Failed to release severity count for speciality {}: {}", cancelled.speciality_id, e);
        }

        info!("Appointment {} cancelled by {}", appointment_id, user.id);
        Ok(cancelled)
    }
}
