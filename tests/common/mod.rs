#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use deploy_dash::{RecordSource, SensorRecord, SensorStatus, SourceError};
use tokio::sync::oneshot;

pub type Reply = Result<Vec<SensorRecord>, SourceError>;

pub fn record(customer: &str, sensor: &str, status: &str) -> SensorRecord {
    SensorRecord {
        customer_name: customer.to_string(),
        sensor_assigned: sensor.to_string(),
        status: SensorStatus::parse(status),
        ..Default::default()
    }
}

pub fn unavailable() -> SourceError {
    SourceError::Status {
        url: "https://sheets.example/export".to_string(),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// answers each fetch with the next queued reply, then with an empty sheet
#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for ScriptedSource {
    async fn fetch(&self) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// each fetch waits until the test releases it, so completion order is
/// controlled independently of issue order
#[derive(Default)]
pub struct GatedSource {
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
}

impl GatedSource {
    pub fn gate(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for GatedSource {
    async fn fetch(&self) -> Reply {
        let gate = self.gates.lock().unwrap().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(SourceError::MissingHeader)),
            None => Err(SourceError::MissingHeader),
        }
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

/// serves one sheet, then panics on every later fetch
#[derive(Default)]
pub struct PanickingSource {
    calls: AtomicUsize,
}

impl PanickingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for PanickingSource {
    async fn fetch(&self) -> Reply {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(vec![record("Acme", "PH-1", "Live")]);
        }
        panic!("sheet parser blew up");
    }

    fn describe(&self) -> String {
        "panicking".to_string()
    }
}
