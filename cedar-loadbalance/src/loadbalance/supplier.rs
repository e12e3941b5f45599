use cedar_core::config::model::DEFAULT_HINT;
use cedar_core::ServiceInstance;

use crate::lifecycle::SelectionRequest;

/// 本次选择实际使用的提示：请求头优先，其次是选择请求携带的提示
pub fn effective_hint<'a>(request: &'a SelectionRequest, hint_header_name: &str) -> &'a str {
    request
        .request_data()
        .headers
        .get(hint_header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| request.hint())
}

/// 按提示过滤候选实例
///
/// 保留元数据 `hint` 与提示相同的实例；提示为空或为 `default`，
/// 或者没有任何实例匹配时，返回全部实例
pub fn filter_by_hint(instances: Vec<ServiceInstance>, hint: &str) -> Vec<ServiceInstance> {
    if hint.is_empty() || hint == DEFAULT_HINT {
        return instances;
    }

    let matched: Vec<ServiceInstance> = instances
        .iter()
        .filter(|instance| instance.hint() == Some(hint))
        .cloned()
        .collect();

    if matched.is_empty() {
        tracing::debug!(
            "No instance matches hint '{}', falling back to all {} instances",
            hint,
            instances.len()
        );
        instances
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::RequestData;
    use cedar_core::Request;

    fn create_test_instances() -> Vec<ServiceInstance> {
        vec![
            ServiceInstance::new("orders", "10.0.0.1", 9001).with_metadata_entry("hint", "blue"),
            ServiceInstance::new("orders", "10.0.0.2", 9001).with_metadata_entry("hint", "green"),
            ServiceInstance::new("orders", "10.0.0.3", 9001),
        ]
    }

    #[test]
    fn test_filter_by_matching_hint() {
        let filtered = filter_by_hint(create_test_instances(), "blue");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].host, "10.0.0.1");
    }

    #[test]
    fn test_default_hint_keeps_everything() {
        assert_eq!(filter_by_hint(create_test_instances(), "default").len(), 3);
        assert_eq!(filter_by_hint(create_test_instances(), "").len(), 3);
    }

    #[test]
    fn test_unmatched_hint_falls_back_to_all() {
        assert_eq!(filter_by_hint(create_test_instances(), "canary").len(), 3);
    }

    #[test]
    fn test_header_overrides_configured_hint() {
        let request = Request::get("http://orders/api")
            .header("X-LB-Hint", "green")
            .build();
        let selection = SelectionRequest::new(RequestData::from(&request), "blue");
        assert_eq!(effective_hint(&selection, "X-LB-Hint"), "green");

        let request = Request::get("http://orders/api").build();
        let selection = SelectionRequest::new(RequestData::from(&request), "blue");
        assert_eq!(effective_hint(&selection, "X-LB-Hint"), "blue");
    }
}
