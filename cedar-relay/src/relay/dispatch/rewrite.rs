use cedar_core::{Request, ServiceInstance};
use reqwest::Url;

use super::types::RewriteError;

/// 安全实例对应的 scheme 升级
fn secure_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" => Some("https"),
        "ws" => Some("wss"),
        _ => None,
    }
}

/// 重建请求地址使用的 scheme
///
/// 实例显式声明的 scheme 优先；否则沿用原始 scheme，安全实例会把 http/ws 升级为 https/wss
fn resolve_scheme(instance: &ServiceInstance, original: &Url) -> String {
    if let Some(scheme) = &instance.scheme {
        return scheme.clone();
    }
    let original_scheme = original.scheme();
    if instance.secure {
        if let Some(upgraded) = secure_scheme(original_scheme) {
            return upgraded.to_string();
        }
    }
    original_scheme.to_string()
}

/// 用实例的 scheme、host、port 替换原始地址，其余部分原样保留
pub fn reconstruct_url(instance: &ServiceInstance, original: &Url) -> Result<Url, RewriteError> {
    let invalid = |reason: String| RewriteError::InvalidUrl {
        url: original.to_string(),
        reason,
    };

    let mut rebuilt = original.clone();

    let scheme = resolve_scheme(instance, original);
    if rebuilt.scheme() != scheme {
        rebuilt
            .set_scheme(&scheme)
            .map_err(|_| invalid(format!("scheme '{}' cannot replace '{}'", scheme, original.scheme())))?;
    }

    if instance.host.contains(['/', '?', '#', '@', '\\']) {
        return Err(invalid(format!("invalid instance host '{}'", instance.host)));
    }
    let host = instance.authority_host();
    rebuilt
        .set_host(Some(&host))
        .map_err(|e| invalid(format!("invalid instance host '{}': {}", instance.host, e)))?;
    rebuilt
        .set_port(Some(instance.port))
        .map_err(|_| invalid(format!("port {} cannot be set", instance.port)))?;

    Ok(rebuilt)
}

/// 以新地址构建请求，方法、请求头、请求体、字符集和模板元数据保持不变
pub fn build_request(request: &Request, reconstructed_url: &Url) -> Request {
    request.with_url(reconstructed_url.as_str())
}
