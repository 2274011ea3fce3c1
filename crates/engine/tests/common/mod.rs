#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use engine::{CashDesk, Gateway, Reply, Selection, Shift};
use serde_json::Value;

/// In-memory gateway answering from per-operation queues and recording every
/// call in order.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedGateway {
    pub fn reply(&self, operation: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn data(&self, operation: &str, value: Value) -> &Self {
        self.reply(operation, Reply::Data(value))
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|(op, _)| op == operation).count()
    }

    pub fn last_params(&self, operation: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(op, _)| op == operation)
            .map(|(_, params)| params)
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn invoke(&self, operation: &str, params: Value) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), params));
        self.replies
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::Unavailable(format!("no scripted reply for {operation}")))
    }
}

pub fn selection() -> Selection {
    Selection {
        date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
        shift: Shift::Morning,
        handler: "Nico".to_string(),
    }
}

pub fn desk(gateway: &Arc<ScriptedGateway>) -> CashDesk<ScriptedGateway> {
    CashDesk::new(Arc::clone(gateway), "Laura", selection())
}
