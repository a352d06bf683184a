use std::sync::Arc;

use reqwest::Client;

use crate::{
    common::config::{Config, OrderPolicies},
    store::Store,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub policies: OrderPolicies,
    pub http_client: Client,
    pub chatbot_webhook_url: Arc<str>,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            policies: config.policies,
            http_client: Client::new(),
            chatbot_webhook_url: config.chatbot_webhook_url.as_str().into(),
        }
    }

    /// State backed by the in-memory store with default policies.
    pub fn in_memory() -> Self {
        Self {
            store: Store::in_memory(),
            policies: OrderPolicies::default(),
            http_client: Client::new(),
            chatbot_webhook_url: "http://127.0.0.1:9/webhook".into(),
        }
    }

    pub fn with_policies(mut self, policies: OrderPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_chatbot_webhook_url(mut self, url: impl Into<Arc<str>>) -> Self {
        self.chatbot_webhook_url = url.into();
        self
    }
}
