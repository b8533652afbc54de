//! Canvas object model and interaction engine for the whiteboard.
//!
//! Compiled to WebAssembly for the browser (through [`bindings`]) and used
//! natively by `boardtool` and the tests. [`engine::EngineCore`] is the single
//! owner of the object store, selection, history, clipboard and viewport; every
//! collaborator entry point and input handler goes through it and reports back
//! a list of [`engine::Action`]s for the host.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`] and its collaborator entry points |
//! | [`interaction`] | Pointer, wheel and keyboard handlers driving the gesture state machine |
//! | [`doc`] | Canvas object types and the in-memory object store |
//! | [`selection`] | Selected ids and marquee matching |
//! | [`history`] | Snapshot log for undo/redo |
//! | [`clipboard`] | Copy buffer and paste preparation |
//! | [`group`] | Shared group tags |
//! | [`viewport`] | Pan/zoom state and coordinate conversions |
//! | [`hit`] | Hit-testing bodies, edges and handles |
//! | [`input`] | Tools, modifiers, buttons, keys and the [`input::Gesture`] enum |
//! | [`snapshot`] | JSON snapshot codec |
//! | [`raster`] | Bitmap and PNG export |
//! | [`geom`] | Points, sizes, rectangles and helpers |
//! | [`config`] | [`config::EngineConfig`] and its environment loader |
//! | [`bindings`] | `wasm-bindgen` facade for the browser host |
//! | [`clock`] | Millisecond wall clock |
//! | [`error`] | Machine-readable error codes |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod bindings;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod geom;
pub mod group;
pub mod history;
pub mod hit;
pub mod input;
pub mod interaction;
pub mod raster;
pub mod selection;
pub mod snapshot;
pub mod viewport;
