// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the segmentation client (config, notices).
//! Keeps host adapters thin and engine-agnostic.

pub mod config;
pub mod notice;
