pub mod decor;
pub mod layouts;
pub mod raster;
pub mod scene;
pub mod text;
pub mod texture_cache;
pub mod transition;
