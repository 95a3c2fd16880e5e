pub mod frame; // Marstek UDP frame codec
pub mod meter; // UDP transport to the meter
