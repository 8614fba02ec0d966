// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod health;
pub mod metrics;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod social_graph;
