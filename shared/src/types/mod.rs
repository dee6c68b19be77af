//! Data model

pub mod observation;
