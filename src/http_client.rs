use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::GatewayConfig;

fn has_proxy_env() -> bool {
    [
        "HTTPS_PROXY",
        "https_proxy",
        "HTTP_PROXY",
        "http_proxy",
        "ALL_PROXY",
        "all_proxy",
    ]
    .iter()
    .any(|k| std::env::var(k).is_ok_and(|v| !v.trim().is_empty()))
}

// The gateway usually runs on the same host; routing loopback traffic through a
// corporate proxy breaks it.
fn should_bypass_proxy_impl(url: &str, proxy_env_present: bool) -> bool {
    if !proxy_env_present {
        return false;
    }

    let Ok(u) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = u.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

pub fn should_bypass_proxy_for_url(url: &str) -> bool {
    should_bypass_proxy_impl(url, has_proxy_env())
}

pub fn maybe_disable_proxy(builder: ClientBuilder, url: &str) -> ClientBuilder {
    if should_bypass_proxy_for_url(url) {
        builder.no_proxy()
    } else {
        builder
    }
}

/// Client used for every upstream call.
///
/// The timeout bounds connecting and each individual read rather than the whole
/// exchange, so a stalled gateway fails while a long, live stream keeps flowing.
pub fn gateway_client(cfg: &GatewayConfig) -> Result<reqwest::Client, reqwest::Error> {
    let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
    let builder = reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout);
    maybe_disable_proxy(builder, &cfg.base_url).build()
}
