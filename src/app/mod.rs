pub mod assembler;
pub mod normalizer;
pub mod ports;
pub mod prober;
pub mod refresh_use_case;
pub mod registration_use_case;
