// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of built resource graphs over generated configurations.

mod graph_properties;
