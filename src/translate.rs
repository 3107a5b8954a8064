//! Batch-execute protocol: request construction and response framing.

use crate::consts::{endpoints, framing, headers, tokens, SOURCE_LANG};
use crate::network::TranslateError;
use crate::utils::{extract, extract_token, generate_request_id, PathStep::Index};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use serde_json::{json, Value};

/// Characters left as-is in the `f.req` form value
const FORM_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationQuery {
    pub word: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationQuery {
    pub fn new(word: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            source_lang: SOURCE_LANG.to_string(),
            target_lang: target_lang.into(),
        }
    }
}

/// Tokens scraped from one translate page, used for one batch request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedTokens {
    pub rpc_id: Option<String>,
    pub session_id: Option<String>,
    pub backend_list: Option<String>,
}

impl ScrapedTokens {
    pub fn scrape(page: &str) -> Self {
        Self {
            rpc_id: extract_token(page, tokens::RPC_ID),
            session_id: extract_token(page, tokens::SESSION_ID),
            backend_list: extract_token(page, tokens::BACKEND_LIST),
        }
    }

    /// Names of tokens the page did not carry
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (tokens::RPC_ID, &self.rpc_id),
            (tokens::SESSION_ID, &self.session_id),
            (tokens::BACKEND_LIST, &self.backend_list),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub url: Url,
    pub body: String,
}

impl BatchRequest {
    /// The endpoint rejects the body under any other content type
    pub const CONTENT_TYPE: &'static str = headers::FORM_CONTENT_TYPE;
}

/// Page URL the tokens are scraped from
pub fn page_url(base_url: &str, query: &TranslationQuery) -> Result<Url, TranslateError> {
    let url = Url::parse_with_params(
        &format!("{}/", base_url.trim_end_matches('/')),
        &[
            ("sl", query.source_lang.as_str()),
            ("tl", query.target_lang.as_str()),
            ("text", query.word.as_str()),
            ("op", "translate"),
        ],
    )
    .map_err(|e| TranslateError::InvalidUrl(e.to_string()))?;
    Ok(url)
}

pub fn build_batch_request(
    base_url: &str,
    tokens: &ScrapedTokens,
    query: &TranslationQuery,
) -> Result<BatchRequest, TranslateError> {
    let rpc_id = tokens.rpc_id.as_deref().unwrap_or_default();
    let request_id = generate_request_id().to_string();

    let url = Url::parse_with_params(
        &format!("{}{}", base_url.trim_end_matches('/'), endpoints::BATCH_PATH),
        &[
            ("rpcids", rpc_id),
            ("f.sid", tokens.session_id.as_deref().unwrap_or_default()),
            ("bl", tokens.backend_list.as_deref().unwrap_or_default()),
            ("soc-app", "1"),
            ("soc-platform", "1"),
            ("soc-device", "1"),
            ("_reqid", request_id.as_str()),
            ("rt", "c"),
        ],
    )
    .map_err(|e| TranslateError::InvalidUrl(e.to_string()))?;

    // The inner array travels as a JSON string inside the outer array.
    let inner = json!([
        [query.word, query.source_lang, query.target_lang, true],
        [null]
    ])
    .to_string();
    let envelope = json!([[[rpc_id, inner, null, "generic"]]]).to_string();
    let body = format!(
        "f.req={}&",
        utf8_percent_encode(&envelope, FORM_VALUE_SET)
    );

    Ok(BatchRequest { url, body })
}

/// Strip the framing from a raw batch response and decode the translation
/// payload, which upstream ships as a JSON string inside the envelope.
pub fn unwrap_envelope(raw: &[u8]) -> Result<Value, TranslateError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| TranslateError::MalformedResponse(format!("body is not utf-8: {e}")))?;
    let framed = match text.char_indices().nth(framing::PREFIX_CHARS) {
        Some((offset, _)) => &text[offset..],
        None => "",
    };

    let digits = framed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(TranslateError::MalformedResponse(
            "missing length header".into(),
        ));
    }
    let length: usize = framed[..digits]
        .parse()
        .map_err(|e| TranslateError::MalformedResponse(format!("bad length header: {e}")))?;

    // [len(header), len(header) + length) in characters; a short body just yields less
    let chunk: String = framed.chars().skip(digits).take(length).collect();
    let envelope: Value = serde_json::from_str(&chunk)
        .map_err(|e| TranslateError::MalformedResponse(format!("envelope: {e}")))?;

    let inner = extract(&envelope, &[Index(0), Index(2)])
        .and_then(Value::as_str)
        .ok_or_else(|| TranslateError::MalformedResponse("no payload string at [0][2]".into()))?;
    serde_json::from_str(inner)
        .map_err(|e| TranslateError::MalformedResponse(format!("payload: {e}")))
}
