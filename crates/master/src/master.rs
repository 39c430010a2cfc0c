// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared master context handed to every handler.

use std::sync::Arc;

use sweep_core::{Clock, SystemClock};
use sweep_storage::Store;

use crate::collector::Collector;
use crate::registry::Registry;

/// Everything a connection handler or API handler needs.
///
/// One instance per process in production; tests construct their own
/// over a temp store and a fake clock.
pub struct Master<C: Clock = SystemClock> {
    pub store: Arc<Store>,
    pub registry: Registry<C>,
    pub collector: Collector,
    pub clock: C,
}

impl<C: Clock> Master<C> {
    pub fn new(store: Arc<Store>, clock: C) -> Arc<Self> {
        Arc::new(Self {
            registry: Registry::new(Arc::clone(&store), clock.clone()),
            collector: Collector::new(),
            store,
            clock,
        })
    }
}
