pub mod aggregation;
pub mod speciality;

pub use speciality::SpecialityService;
