pub mod combine;
pub mod evaluate;
pub mod status;
