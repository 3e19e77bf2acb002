use kasrisk_core::market::error::MarketError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// # Summary
/// 构建带超时与默认请求头的 HTTP 客户端。
///
/// # Arguments
/// * `timeout`: 单次请求超时。
///
/// # Returns
/// 构建失败 (例如 TLS 后端未初始化) 时返回 `MarketError::Network`。
pub(crate) fn build_client(timeout: Duration) -> Result<Client, MarketError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("kasrisk/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// 将非 2xx 响应映射为 MarketError：404 视为 NotFound，其余视为网络错误
pub(crate) fn check_status(resp: Response) -> Result<Response, MarketError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else if status == StatusCode::NOT_FOUND {
        Err(MarketError::NotFound)
    } else {
        Err(MarketError::Network(format!("HTTP {}", status)))
    }
}

/// 去掉结尾斜杠，方便拼接路径
pub(crate) fn trim_base(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
