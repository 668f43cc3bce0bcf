pub mod fit;
pub mod noise_model;
pub mod rates;
pub mod reconstruct;
pub mod segments;
pub mod smooth;
pub mod spectrum;
