#![allow(dead_code)]

use async_trait::async_trait;
use connectors::market::{client::MarketplaceClient, error::RemoteError};
use engine_config::settings::SettingsOverrides;
use engine_processing::store::registry::LoadMode;
use engine_runtime::session::Session;
use model::{operation::Operation, records::field::StoreKind};
use std::{
    io::Write,
    sync::{Arc, Mutex},
};
use tempfile::NamedTempFile;

/// Credentials and a zero stagger so scenarios run without waiting.
pub const BASE_SETTINGS: &str = r#"
access = "AKIATEST"
secret = "not-a-secret"
throttleInterval = 0
"#;

pub const REFERENCE_CSV: &str = "WorkerId,ExitCode\nW1,X1\n";

/// In-memory marketplace. Records every call and fails calls whose subject
/// (AssignmentId, WorkerId, ...) is listed.
pub struct ScriptedMarket {
    calls: Mutex<Vec<(Operation, serde_json::Value)>>,
    failing: Vec<String>,
}

impl ScriptedMarket {
    pub fn new() -> Arc<Self> {
        Self::failing(&[])
    }

    pub fn failing(subjects: &[&str]) -> Arc<Self> {
        Arc::new(ScriptedMarket {
            calls: Mutex::new(Vec::new()),
            failing: subjects.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn calls(&self) -> Vec<(Operation, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.operations().iter().filter(|op| **op == operation).count()
    }
}

#[async_trait]
impl MarketplaceClient for ScriptedMarket {
    async fn call(
        &self,
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RemoteError> {
        let subject = operation.subject(&params);
        self.calls.lock().unwrap().push((operation, params));
        if self.failing.contains(&subject) {
            return Err(RemoteError::Service {
                status: 503,
                message: format!("{subject} is unavailable"),
            });
        }
        Ok(serde_json::json!({}))
    }
}

pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

pub fn path_of(file: &NamedTempFile) -> String {
    file.path().to_str().expect("utf-8 temp path").to_string()
}

/// Settings file made of [`BASE_SETTINGS`] plus `extra`.
pub fn settings_file(extra: &str) -> NamedTempFile {
    temp_file(&format!("{BASE_SETTINGS}\n{extra}"))
}

/// Opens a session and connects it to `market` unless it is dry.
pub fn open_session(settings: &NamedTempFile, dry: bool, market: Arc<ScriptedMarket>) -> Session {
    let session = Session::open(
        settings.path(),
        SettingsOverrides {
            dry,
            sandbox: false,
        },
    )
    .expect("valid settings");
    if !dry {
        session.connect(market).expect("first connection");
    }
    session
}

/// Loads the optional reference list, then the results.
pub fn load(session: &mut Session, reference: Option<&str>, results: &str) {
    if let Some(reference) = reference {
        let file = temp_file(reference);
        session
            .load(StoreKind::Reference, &path_of(&file), LoadMode::default())
            .expect("load reference");
    }
    let file = temp_file(results);
    session
        .load(StoreKind::Results, &path_of(&file), LoadMode::default())
        .expect("load results");
}
