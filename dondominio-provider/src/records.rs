//! DNS-01 record operations
//!
//! [`RecordApi`] has one primitive per DonDominio endpoint. The composite
//! TXT operations are default methods built on top of them, so every
//! implementor shares the same ordering rules.

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::http_client::Client;
use crate::types::{
    DnsCreateParams, DnsDeleteParams, DnsListParams, DnsListResponse, ServiceInfoResponse,
    ServiceStatusParams,
};

pub(crate) const PATH_SERVICE_INFO: &str = "/service/getinfo";
pub(crate) const PATH_DNS_LIST: &str = "/service/dnslist";
pub(crate) const PATH_DNS_CREATE: &str = "/service/dnscreate";
pub(crate) const PATH_DNS_DELETE: &str = "/service/dnsdelete";

/// Status literal of a service that can hold DNS records.
pub const SERVICE_STATUS_ACTIVE: &str = "active";

/// Record type used for ACME challenges.
pub const TXT: &str = "TXT";

/// DonDominio record operations.
///
/// Each primitive issues exactly one remote call and wraps failures with the
/// endpoint path.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// `/service/getinfo` with `infoType=status`.
    async fn service_info(&self, domain: &str) -> Result<ServiceInfoResponse>;

    /// `/service/dnslist` filtered by record value.
    async fn find_records(&self, domain: &str, target: &str) -> Result<DnsListResponse>;

    /// `/service/dnscreate`; the record name is `"{sub_domain}.{domain}"`.
    async fn create_record(
        &self,
        domain: &str,
        record_type: &str,
        sub_domain: &str,
        target: &str,
    ) -> Result<DnsListResponse>;

    /// `/service/dnsdelete` by entity ID.
    async fn delete_record(&self, domain: &str, entity_id: &str) -> Result<()>;

    /// Fails unless the domain's service reports `active`.
    async fn validate_service(&self, domain: &str) -> Result<()> {
        let info = self.service_info(domain).await?;
        let status = info.response_data.status;
        if status == SERVICE_STATUS_ACTIVE {
            Ok(())
        } else {
            Err(ProviderError::ServiceInactive {
                domain: domain.to_string(),
                status,
            })
        }
    }

    /// Publishes `target` as a TXT record at `sub_domain.domain`.
    ///
    /// Nothing is created when the service check fails; that error is
    /// returned as is.
    async fn add_txt_record(&self, domain: &str, sub_domain: &str, target: &str) -> Result<()> {
        self.validate_service(domain).await?;
        self.create_record(domain, TXT, sub_domain, target).await?;
        Ok(())
    }

    /// Removes the TXT record whose value is `target`.
    ///
    /// Only the first listed match is deleted. No match is a success.
    async fn remove_txt_record(&self, domain: &str, target: &str) -> Result<()> {
        let list = self.find_records(domain, target).await?;
        let Some(record) = list.records().first() else {
            log::debug!("No record with value {target} under {domain}, nothing to remove");
            return Ok(());
        };
        self.delete_record(domain, &record.entity_id).await
    }
}

#[async_trait]
impl RecordApi for Client {
    async fn service_info(&self, domain: &str) -> Result<ServiceInfoResponse> {
        let params = ServiceStatusParams {
            service_name: domain.to_string(),
            info_type: "status".to_string(),
        };
        self.post(PATH_SERVICE_INFO, &params)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.on_call("POST", PATH_SERVICE_INFO))
    }

    async fn find_records(&self, domain: &str, target: &str) -> Result<DnsListResponse> {
        let params = DnsListParams {
            service_name: domain.to_string(),
            filter_value: target.to_string(),
        };
        self.post(PATH_DNS_LIST, &params)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.on_call("POST", PATH_DNS_LIST))
    }

    async fn create_record(
        &self,
        domain: &str,
        record_type: &str,
        sub_domain: &str,
        target: &str,
    ) -> Result<DnsListResponse> {
        let params = DnsCreateParams {
            record_type: record_type.to_string(),
            service_name: domain.to_string(),
            name: format!("{sub_domain}.{domain}"),
            value: target.to_string(),
        };
        let created: DnsListResponse = self
            .post(PATH_DNS_CREATE, &params)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| e.on_call("POST", PATH_DNS_CREATE))?;

        // Duplicates come back as success=false; presenting twice must not fail.
        if !created.success && !created.error_code_msg.is_empty() {
            log::warn!(
                "DonDominio did not confirm {} record {}: {}",
                record_type,
                params.name,
                created.error_code_msg
            );
        }
        Ok(created)
    }

    async fn delete_record(&self, domain: &str, entity_id: &str) -> Result<()> {
        let params = DnsDeleteParams {
            service_name: domain.to_string(),
            entity_id: entity_id.to_string(),
        };
        self.post_no_output(PATH_DNS_DELETE, &params)
            .await
            .map_err(|e| e.on_call("DELETE", PATH_DNS_DELETE))
    }
}
