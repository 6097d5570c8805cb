// Nova Bridge - bridge between headless Blender and the Nova editor control API
// Library exports

// Core modules
pub mod blender;
pub mod config;
pub mod download;
pub mod errors;
pub mod nova;
pub mod process;
pub mod providers;
pub mod server;
pub mod tools;
