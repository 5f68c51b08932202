pub mod blade_renderer;
pub mod display_mode;
