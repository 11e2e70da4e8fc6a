pub mod doctor;

pub use doctor::DoctorDirectoryService;
