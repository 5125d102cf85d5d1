// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! KAS font resolution and caching library
//!
//! Resolves abstract font requests to faces and caches realized font
//! instances; see [`fonts::FontSystem`].

#![cfg_attr(doc_cfg, feature(doc_cfg))]

pub mod backend;

mod config;
pub use config::Config;

mod conv;
pub use conv::DPU;

mod data;
pub use data::*;

pub mod fonts;
pub mod store;
