//! Shared application state handed to every handler via Axum's `State`
//! extractor: a concrete struct rather than a trait, since the control
//! plane has exactly one implementation.

use std::sync::Arc;

use relayer_queue::DeliveryQueue;
use relayer_listener::PauseRegistry;
use relayer_store::Store;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Store>,
    pub queue: Arc<DeliveryQueue>,
    pub pause: Arc<PauseRegistry>,
    /// One consumer group name per configured chain pair, used to report
    /// queue depth on the read-only status endpoint ("gauges for
    /// queue depth").
    pub consumer_group: String,
}

impl ApiState {
    pub fn new(
        store: Arc<Store>,
        queue: Arc<DeliveryQueue>,
        pause: Arc<PauseRegistry>,
        consumer_group: String,
    ) -> Self {
        ApiState {
            store,
            queue,
            pause,
            consumer_group,
        }
    }
}
