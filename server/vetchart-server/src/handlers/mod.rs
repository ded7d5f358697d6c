pub mod animals;
pub mod appointments;
pub mod debug;
pub mod form;
pub mod health;
pub mod records;
pub mod soap;
pub mod transcription;
pub mod uploads;
