pub mod annotations;
pub mod config;
pub mod error;
pub mod export;
pub mod image_utils;
pub mod logging;
pub mod object_detection;
pub mod rendering;
