pub mod extractor;
pub mod filter;
pub mod jwt;
pub mod pagination;
pub mod test_utils;
pub mod validation;
