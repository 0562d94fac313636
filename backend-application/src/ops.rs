// Background operations

pub mod scoring;
