

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, info};
use url::Url;

use super::models::{ListPersonsInput, ListPersonsOutput};
use crate::core::config::DirectoryConfig;
use crate::core::error::{DirectoryError, Result};


/// The upstream person-search capability. Implementations return one page per
/// call; callers follow `next` references until exhausted.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn list_persons(&self, query: &ListPersonsInput) -> Result<ListPersonsOutput>;

    async fn get_next_page(&self, href: &str) -> Result<ListPersonsOutput>;
}

#[async_trait]
impl<D: PersonDirectory + ?Sized> PersonDirectory for std::sync::Arc<D> {
    async fn list_persons(&self, query: &ListPersonsInput) -> Result<ListPersonsOutput> {
        (**self).list_persons(query).await
    }

    async fn get_next_page(&self, href: &str) -> Result<ListPersonsOutput> {
        (**self).get_next_page(href).await
    }
}


pub struct PwsClient {
    http: reqwest::Client,
    host: Url,
    search_url: Url,
}

impl PwsClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .use_rustls_tls();

        if let Some(path) = &config.client_cert_path {
            let pem = std::fs::read(path)?;
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
            debug!("Loaded PWS client certificate from {}", path);
        }

        let host = Url::parse(&config.pws_host)?;
        let search_url = Url::parse(&format!("{}/person", config.pws_url()))?;

        info!("PwsClient created for {}", search_url);

        Ok(Self {
            http: builder.build()?,
            host,
            search_url,
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<ListPersonsOutput> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        info!("[GET] {} : {}", response.url(), status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::upstream(status.as_u16(), body));
        }

        Ok(response.json::<ListPersonsOutput>().await?)
    }
}

#[async_trait]
impl PersonDirectory for PwsClient {
    async fn list_persons(&self, query: &ListPersonsInput) -> Result<ListPersonsOutput> {
        let request = self.http.get(self.search_url.clone()).query(query);
        self.fetch(request).await
    }

    async fn get_next_page(&self, href: &str) -> Result<ListPersonsOutput> {
        // Page references are host-relative paths that already carry the query.
        let url = self.host.join(href)?;
        self.fetch(self.http.get(url)).await
    }
}
