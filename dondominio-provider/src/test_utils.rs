//! In-memory [`RecordApi`] for tests.
//!
//! Behaves like a tiny DonDominio: created records can be listed by value and
//! deleted by entity ID. Every call is recorded so tests can count them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{ApiError, ProviderError, Result};
use crate::records::RecordApi;
use crate::types::{DnsListData, DnsListResponse, DnsRecord, ServiceInfo, ServiceInfoResponse};

/// Builds a TXT record fixture.
pub fn record(entity_id: &str, name: &str, value: &str) -> DnsRecord {
    DnsRecord {
        entity_id: entity_id.to_string(),
        name: name.to_string(),
        record_type: "TXT".to_string(),
        ttl: "300".to_string(),
        priority: "0".to_string(),
        value: value.to_string(),
    }
}

/// `(domain, type, sub_domain, target)`
pub type CreateCall = (String, String, String, String);

/// `(domain, entity_id)`
pub type DeleteCall = (String, String);

pub struct MockRecordApi {
    status: String,
    fail_service_info: bool,
    records: Mutex<Vec<DnsRecord>>,
    next_id: AtomicUsize,
    service_info_calls: AtomicUsize,
    find_calls: AtomicUsize,
    created: Mutex<Vec<CreateCall>>,
    deleted: Mutex<Vec<DeleteCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockRecordApi {
    /// A mock whose domain service reports `status`.
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            fail_service_info: false,
            records: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1000),
            service_info_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Seeds the remote record set.
    #[must_use]
    pub fn with_records(self, records: Vec<DnsRecord>) -> Self {
        *lock(&self.records) = records;
        self
    }

    /// Makes `service_info` answer with an HTTP 500.
    #[must_use]
    pub fn failing_service_info(mut self) -> Self {
        self.fail_service_info = true;
        self
    }

    pub fn service_info_calls(&self) -> usize {
        self.service_info_calls.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<CreateCall> {
        lock(&self.created).clone()
    }

    pub fn deleted(&self) -> Vec<DeleteCall> {
        lock(&self.deleted).clone()
    }

    /// Records currently stored with `value`, without counting a call.
    pub fn find_records_now(&self, value: &str) -> Vec<DnsRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.value == value)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordApi for MockRecordApi {
    async fn service_info(&self, domain: &str) -> Result<ServiceInfoResponse> {
        self.service_info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_service_info {
            return Err(ProviderError::Api(ApiError {
                code: 500,
                message: "internal error".to_string(),
                class: None,
                query_id: Some("mock-query".to_string()),
            })
            .on_call("POST", "/service/getinfo"));
        }
        Ok(ServiceInfoResponse {
            success: true,
            response_data: ServiceInfo {
                name: domain.to_string(),
                status: self.status.clone(),
                ..ServiceInfo::default()
            },
            ..ServiceInfoResponse::default()
        })
    }

    async fn find_records(&self, _domain: &str, target: &str) -> Result<DnsListResponse> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(DnsListResponse {
            success: true,
            response_data: DnsListData {
                query_info: None,
                dns: self.find_records_now(target),
            },
            ..DnsListResponse::default()
        })
    }

    async fn create_record(
        &self,
        domain: &str,
        record_type: &str,
        sub_domain: &str,
        target: &str,
    ) -> Result<DnsListResponse> {
        lock(&self.created).push((
            domain.to_string(),
            record_type.to_string(),
            sub_domain.to_string(),
            target.to_string(),
        ));

        let name = format!("{sub_domain}.{domain}");
        let mut records = lock(&self.records);
        // Same name and value: the provider keeps a single record.
        if !records.iter().any(|r| r.name == name && r.value == target) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            records.push(record(&id, &name, target));
        }

        Ok(DnsListResponse {
            success: true,
            ..DnsListResponse::default()
        })
    }

    async fn delete_record(&self, domain: &str, entity_id: &str) -> Result<()> {
        lock(&self.deleted).push((domain.to_string(), entity_id.to_string()));
        lock(&self.records).retain(|r| r.entity_id != entity_id);
        Ok(())
    }
}
