//! One-line task summaries for known connector classes.

use std::collections::HashMap;

use crate::api::ConfigMap;
use crate::fleet::{Connector, Task};

pub type SummaryFn = fn(&ConfigMap) -> String;

pub const JDBC_SOURCE: &str = "io.confluent.connect.jdbc.JdbcSourceConnector";
pub const PUBSUB_SINK: &str = "com.google.pubsub.kafka.sink.CloudPubSubSinkConnector";

pub struct SummaryRegistry {
    entries: HashMap<&'static str, SummaryFn>,
}

impl Default for SummaryRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(JDBC_SOURCE, jdbc_source);
        registry.register(PUBSUB_SINK, pubsub_sink);
        registry
    }
}

impl SummaryRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn register(&mut self, connector_class: &'static str, summary: SummaryFn) {
        self.entries.insert(connector_class, summary);
    }

    /// Summary for `config`, or an empty string for unknown classes.
    pub fn summarize(&self, connector_class: &str, config: &ConfigMap) -> String {
        self.entries
            .get(connector_class)
            .map(|summary| summary(config))
            .unwrap_or_default()
    }

    /// Task config overlaid on its connector's config.
    pub fn summarize_task(&self, connector: &Connector, task: &Task) -> String {
        let mut merged = connector.config.clone();
        merged.extend(task.config.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.summarize(connector.connector_class(), &merged)
    }
}

fn non_empty<'a>(config: &'a ConfigMap, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn jdbc_source(config: &ConfigMap) -> String {
    non_empty(config, "tables")
        .or_else(|| non_empty(config, "query"))
        .unwrap_or("n/a")
        .to_string()
}

fn pubsub_sink(config: &ConfigMap) -> String {
    format!(
        "{} -> {}",
        non_empty(config, "topics").unwrap_or_default(),
        non_empty(config, "cps.topic").unwrap_or_default()
    )
}
