// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! LMS scraper runtime: logs into the portal with headless Chromium and
//! writes each module's materials to `./data/<module>.json`.
//!
//! Page interaction goes through [`renderer::PortalPage`], so the scrape
//! flow can be driven by Chromium or by an in-memory page in tests.

pub mod auth;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod extraction;
pub mod formatter;
pub mod locators;
pub mod pacing;
pub mod pipeline;
pub mod renderer;
