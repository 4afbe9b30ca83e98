pub mod country;
pub mod refresh_status;
