//! Static node enumeration.

use async_trait::async_trait;
use lighthouse_core::{ActionHandler, ArgValue};
use serde_json::{json, Value};

use crate::constants::RESULT_SUCCESS;

/// Lists `prefix1` … `prefixN`.
#[derive(Debug, Clone)]
pub struct NodeListHandler {
    prefix: String,
    count: usize,
}

impl NodeListHandler {
    pub fn new(prefix: impl Into<String>, count: usize) -> Self {
        Self {
            prefix: prefix.into(),
            count,
        }
    }

    pub fn node_names(&self) -> Vec<String> {
        (1..=self.count)
            .map(|i| format!("{}{}", self.prefix, i))
            .collect()
    }
}

#[async_trait]
impl ActionHandler for NodeListHandler {
    fn arity(&self) -> usize {
        0
    }

    async fn call(&self, _args: Vec<ArgValue>) -> Value {
        json!({
            "action": "nodes",
            "nodes": self.node_names(),
            "result": RESULT_SUCCESS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_cluster_nodes() {
        let handler = NodeListHandler::new("johnny0", 6);
        let response = handler.call(vec![]).await;
        assert_eq!(
            response,
            json!({
                "action": "nodes",
                "nodes": ["johnny01", "johnny02", "johnny03", "johnny04", "johnny05", "johnny06"],
                "result": "success",
            })
        );
    }
}
