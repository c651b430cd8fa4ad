pub mod rating;
pub mod summary;

pub use rating::RatingService;
