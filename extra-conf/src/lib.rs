// SPDX-License-Identifier: GPL-3.0-or-later

pub mod args;
pub mod config;
pub mod context;
pub mod database;
pub mod driver;
pub mod flags;
pub mod settings;
pub mod source;
