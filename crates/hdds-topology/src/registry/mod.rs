// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topology registries: one [`DomainRegistry`] per domain, holding one
//! [`EndpointRegistry`] per topic name.

mod domain;
mod topic;

pub use domain::{DomainRegistry, DomainSnapshot, MismatchSnapshot, TopicSnapshot};
pub use topic::EndpointRegistry;
