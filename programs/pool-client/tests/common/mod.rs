#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anchor_lang::prelude::Pubkey;
use pool_client::instructions::PoolInstruction;
use pool_client::sdk::{PoolProgram, Signature};
use pool_client::transport::{HttpRequest, HttpResponse, Transport};
use pool_client::ClientError;
use serde_json::{json, Value};

/// In-memory backend: answers queued responses in order, 503 once empty.
#[derive(Default)]
pub struct MemoryTransport {
    responses: Mutex<VecDeque<(u16, Value)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn push(&self, status: u16, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back((status, body));
        self
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.path.clone()).collect()
    }
}

impl Transport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((503, json!({ "error": "no scripted response" })));
        Ok(HttpResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        })
    }
}

/// Program client that confirms everything except instructions on
/// `failing` pools, which fail with `failure`.
pub struct FakeProgram {
    pub sent: Mutex<Vec<(Pubkey, PoolInstruction)>>,
    pub failing: Vec<Pubkey>,
    pub failure: Value,
}

impl FakeProgram {
    pub fn new(failing: Vec<Pubkey>, failure: Value) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing,
            failure,
        }
    }

    pub fn healthy() -> Self {
        Self::new(Vec::new(), Value::Null)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl PoolProgram for FakeProgram {
    async fn execute(&self, signer: Pubkey, instruction: PoolInstruction) -> Result<Signature, ClientError> {
        let pool = instruction.pool();
        let n = {
            let mut sent = self.sent.lock().unwrap();
            sent.push((signer, instruction));
            sent.len()
        };
        if self.failing.contains(&pool) {
            return Err(ClientError::transaction("transaction simulation failed", self.failure.clone()));
        }
        Ok(format!("5ig{n}"))
    }
}

pub fn pool_json(id: &str, current: u32, max: u32, address: Option<Pubkey>) -> Value {
    json!({
        "id": id,
        "poolAddress": address.map(|a| a.to_string()),
        "status": "open",
        "mint": "So11111111111111111111111111111111111111112",
        "tokenSymbol": "BONK",
        "entryAmount": 20.0,
        "currentParticipants": current,
        "maxParticipants": max,
        "creatorWallet": "4Nd1mYQbJ8fKkP2ZQ6jWQ2b1GvF5ryhXbUXbVY6C2DzV",
        "createdAt": "2026-01-02T03:04:05Z",
        "expiresAt": "2026-01-09T03:04:05Z",
        "winnerWallet": null,
        "randomnessAccount": null,
        "randomnessRequested": false
    })
}
