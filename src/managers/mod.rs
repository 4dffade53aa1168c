pub mod appointments;
pub mod cycles;
pub mod finances;
pub mod messages;
pub mod options;
pub mod patients;
pub mod records;
