pub mod geo;
pub mod hospital;

pub use hospital::HospitalService;
