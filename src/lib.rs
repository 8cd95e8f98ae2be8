#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod config;
pub mod io;

#[path = "../data/mod.rs"]
pub mod data;

#[path = "../model/mod.rs"]
pub mod model;

#[path = "../update/mod.rs"]
pub mod update;
