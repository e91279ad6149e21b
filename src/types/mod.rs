pub mod preferences;
pub mod workout;
