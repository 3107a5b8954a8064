//! Upstream engine: translate page scrape followed by the batch-execute call.

use crate::config::Config;
use crate::consts::headers;
use crate::logic::{assemble, TranslationRecord};
use crate::translate::{build_batch_request, page_url, unwrap_envelope, BatchRequest, ScrapedTokens, TranslationQuery};
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("Upstream status {0}")] Upstream(StatusCode),
    #[error("Invalid URL: {0}")] InvalidUrl(String),
    #[error("Token {0} missing from translate page")] MissingToken(&'static str),
    #[error("Malformed response: {0}")] MalformedResponse(String),
}

/// Anything that can turn a word into a record. The web layer only sees this.
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        word: &'a str,
        lang: &'a str,
    ) -> BoxFuture<'a, Result<TranslationRecord, TranslateError>>;
}

pub struct TranslateEngine {
    client: Client,
    base_url: String,
    strict_tokens: bool,
}

impl TranslateEngine {
    pub fn new(config: &Config) -> Result<Self, TranslateError> {
        let client = Client::builder()
            .user_agent(headers::USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.google_url.clone(),
            strict_tokens: config.strict_tokens,
        })
    }

    pub async fn translate_query(&self, query: &TranslationQuery) -> Result<TranslationRecord, TranslateError> {
        let page = self.fetch_page(query).await?;
        let tokens = self.check_tokens(ScrapedTokens::scrape(&page))?;
        let request = build_batch_request(&self.base_url, &tokens, query)?;
        let raw = self.fetch_batch(request).await?;
        let payload = unwrap_envelope(&raw)?;

        let record = assemble(&payload, &query.word, &query.target_lang);
        log::debug!(
            "'{}' -> {}: {} translations, {} synonyms, {} definitions, {} examples",
            query.word,
            query.target_lang,
            record.translations.len(),
            record.synonyms.len(),
            record.definitions.len(),
            record.examples.len()
        );
        Ok(record)
    }

    fn check_tokens(&self, tokens: ScrapedTokens) -> Result<ScrapedTokens, TranslateError> {
        let missing = tokens.missing();
        if let Some(first) = missing.first() {
            if self.strict_tokens {
                return Err(TranslateError::MissingToken(*first));
            }
            log::warn!("Translate page lacks tokens {:?}; request will likely be rejected", missing);
        }
        Ok(tokens)
    }

    async fn fetch_page(&self, query: &TranslationQuery) -> Result<String, TranslateError> {
        let url = page_url(&self.base_url, query)?;
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(TranslateError::Upstream(res.status()));
        }
        Ok(res.text().await?)
    }

    async fn fetch_batch(&self, request: BatchRequest) -> Result<Vec<u8>, TranslateError> {
        let res = self
            .client
            .post(request.url)
            .header(CONTENT_TYPE, BatchRequest::CONTENT_TYPE)
            .body(request.body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(TranslateError::Upstream(res.status()));
        }
        Ok(res.bytes().await?.to_vec())
    }
}

impl Translator for TranslateEngine {
    fn translate<'a>(
        &'a self,
        word: &'a str,
        lang: &'a str,
    ) -> BoxFuture<'a, Result<TranslationRecord, TranslateError>> {
        Box::pin(async move { self.translate_query(&TranslationQuery::new(word, lang)).await })
    }
}
