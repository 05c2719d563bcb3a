//! End-to-end registration scenarios at the orchestrator seam, with an
//! in-memory store standing in for MySQL and a recording mailer standing in
//! for the mail API. The fakes enforce the same contracts the real
//! collaborators do (unique constraint on email and api_key, reported
//! delivery failures).

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use fmdb_registration::keygen::ApiKeyGenerator;
use fmdb_registration::mailer::{DeliveryError, Mailer};
use fmdb_registration::registration::{
    Registrar, RegistrationRequest, Status, MAIL_SUBJECT, MSG_ALREADY_REGISTERED,
    MSG_FIELDS_REQUIRED, MSG_SERVER_ERROR, MSG_SUCCESS,
};
use fmdb_registration::store::{RegistrationStore, StoreError, UserRecord};

/// Store fake enforcing the unique constraints of the `users` table.
#[derive(Default)]
struct InMemoryStore {
    records: Mutex<Vec<UserRecord>>,
}

impl InMemoryStore {
    fn records(&self) -> Vec<UserRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.email == email)
            .cloned())
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.email == record.email || r.api_key == record.api_key)
        {
            return Err(StoreError::DuplicateKey);
        }
        records.push(record.clone());
        Ok(())
    }
}

/// Mailer fake recording every dispatch, optionally failing them all.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Rejected("simulated outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn request(email: &str) -> RegistrationRequest {
    serde_json::from_value(serde_json::json!({
        "firstName": "Ana",
        "lastName": "Lee",
        "email": email,
        "use_case": "research"
    }))
    .unwrap()
}

fn registrar(store: Arc<InMemoryStore>, mailer: Arc<RecordingMailer>) -> Registrar {
    Registrar::new(store, ApiKeyGenerator::new(), mailer)
}

#[tokio::test]
async fn fresh_registration_persists_key_and_mails_it() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let registrar = registrar(Arc::clone(&store), Arc::clone(&mailer));

    let response = registrar.register(request("a@x.com")).await;

    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, MSG_SUCCESS);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email, "a@x.com");
    assert_eq!(records[0].api_key.len(), 32);
    assert!(records[0].api_key.chars().all(|c| c.is_ascii_hexdigit()));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let (to, subject, body) = &sent[0];
    assert_eq!(to, "a@x.com");
    assert_eq!(subject, MAIL_SUBJECT);
    assert!(body.contains("Hello Ana"));
    assert!(body.contains(&records[0].api_key));
}

#[tokio::test]
async fn second_registration_for_same_email_is_rejected() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let registrar = registrar(Arc::clone(&store), Arc::clone(&mailer));

    let first = registrar.register(request("a@x.com")).await;
    let second = registrar.register(request("a@x.com")).await;

    assert_eq!(first.status, Status::Success);
    assert_eq!(second.status, Status::Error);
    assert_eq!(second.message, MSG_ALREADY_REGISTERED);
    assert_eq!(store.records().len(), 1);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn missing_field_touches_neither_store_nor_mailer() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let registrar = registrar(Arc::clone(&store), Arc::clone(&mailer));

    let mut req = request("a@x.com");
    req.last_name = String::new();

    let response = registrar.register(req).await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.message, MSG_FIELDS_REQUIRED);
    assert!(store.records().is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn distinct_emails_each_get_a_distinct_key() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let registrar = registrar(Arc::clone(&store), Arc::clone(&mailer));

    for i in 0..20 {
        let response = registrar.register(request(&format!("user{}@x.com", i))).await;
        assert_eq!(response.status, Status::Success);
    }

    let records = store.records();
    assert_eq!(records.len(), 20);
    let mut keys: Vec<&str> = records.iter().map(|r| r.api_key.as_str()).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 20);
}

#[tokio::test]
async fn concurrent_registrations_for_one_email_yield_at_most_one_record() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::default());
    let registrar = Arc::new(registrar(Arc::clone(&store), Arc::clone(&mailer)));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registrar = Arc::clone(&registrar);
        handles.push(tokio::spawn(async move {
            registrar.register(request("a@x.com")).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        match response.status {
            Status::Success => successes += 1,
            Status::Error => assert_eq!(response.message, MSG_ALREADY_REGISTERED),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn delivery_failure_reports_error_but_keeps_the_record() {
    let store = Arc::new(InMemoryStore::default());
    let mailer = Arc::new(RecordingMailer::failing());
    let registrar = registrar(Arc::clone(&store), mailer);

    let response = registrar.register(request("a@x.com")).await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.message, MSG_SERVER_ERROR);
    // Accepted inconsistency: the record and its key stay persisted even
    // though the client saw an error.
    assert_eq!(store.records().len(), 1);
}
