pub mod extractors;
pub mod normalization;
