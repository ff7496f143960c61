//! # Certificates
//!
//! Issued when a user completes every lesson of a series. Public by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, SelfLinkResponse};
use super::records::Certificate;

/// Parsing into `Uuid` is the only check
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CertificatePathParams {
    #[serde(rename = "certificateID")]
    pub certificate_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub series: LinkResponse,
    pub language: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateLanguageEmbedded {
    pub id: i32,
    pub name: String,
    pub slug: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEmbedded {
    pub language: CertificateLanguageEmbedded,
}

/// Public certificate view; anyone with the id can verify it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub series_title: String,
    pub lessons: i16,
    pub watch_time: i32,
    pub read_time: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_embedded")]
    pub embedded: CertificateEmbedded,
    #[serde(rename = "_links")]
    pub links: CertificateLinks,
}

impl CertificateResponse {
    #[must_use]
    pub fn from_record(domain: &str, certificate: &Certificate) -> Self {
        let language = ResourcePath::language(&certificate.language_slug);

        Self {
            id: certificate.id,
            first_name: certificate.first_name.clone(),
            last_name: certificate.last_name.clone(),
            series_title: certificate.series_title.clone(),
            lessons: certificate.lessons,
            watch_time: certificate.watch_time_seconds,
            read_time: certificate.read_time_seconds,
            completed_at: certificate.completed_at,
            embedded: CertificateEmbedded {
                language: CertificateLanguageEmbedded {
                    id: certificate.language_id,
                    name: certificate.language_name.clone(),
                    slug: certificate.language_slug.clone(),
                    links: SelfLinkResponse::new(language.link(domain)),
                },
            },
            links: CertificateLinks {
                self_link: ResourcePath::certificate(certificate.id).link(domain),
                series: language.clone().series(&certificate.series_slug).link(domain),
                language: language.link(domain),
            },
        }
    }
}
