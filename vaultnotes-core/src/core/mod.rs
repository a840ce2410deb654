//! Internal domain modules for the Vaultnotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod backlinks;
pub mod error;
pub mod links;
pub mod note;
pub mod rename;
pub mod render;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod storage;
pub mod tags;
pub mod tree;
pub mod vault;
