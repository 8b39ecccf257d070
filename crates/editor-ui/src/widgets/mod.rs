pub mod overlay;
pub mod timeline;
