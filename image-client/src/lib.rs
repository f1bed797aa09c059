//! Client side of the image catalog: talks to the image service, keeps the UI state of one
//! session, and renders that state to HTML.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod render;
pub mod state;
