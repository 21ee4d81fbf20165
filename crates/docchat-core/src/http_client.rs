use reqwest::Client;

const DISABLE_SYSTEM_PROXY_ENV: &str = "DOCCHAT_DISABLE_SYSTEM_PROXY";

/// Shared HTTP client for every backend call.
///
/// No request timeout is configured: a stalled answer stream stalls its turn.
pub fn build_http_client() -> crate::Result<Client> {
    let builder = if should_disable_system_proxy() {
        Client::builder().no_proxy()
    } else {
        Client::builder()
    };
    Ok(builder.build()?)
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
