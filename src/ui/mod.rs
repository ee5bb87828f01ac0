//! UI module - contains UI rendering components
//!
//! Namespace for widgets shared by the vehicles and profile screens.

pub mod components;
