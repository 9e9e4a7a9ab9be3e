// Plain `{ok, data, error, request_id}` envelope returned by non-computed routes

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
    pub request_id: String,
}

impl<T> Envelope<T> {
    pub fn ok(request_id: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            request_id: request_id.into(),
        }
    }

    pub fn err(request_id: impl Into<String>, error: ErrorBody) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            request_id: request_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_envelope_shape() {
        let env = Envelope::ok("req_a", vec![1, 2, 3]);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(
            v,
            json!({"ok": true, "data": [1, 2, 3], "error": null, "request_id": "req_a"})
        );
    }

    #[test]
    fn err_envelope_omits_empty_details() {
        let env: Envelope<()> = Envelope::err("req_b", ErrorBody::new("not_found", "account not found"));
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["ok"], json!(false));
        assert_eq!(v["data"], Value::Null);
        assert_eq!(v["error"], json!({"code": "not_found", "message": "account not found"}));
    }

    #[test]
    fn err_envelope_keeps_details() {
        let body = ErrorBody::new("bad_request", "invalid query").with_details(json!({"field": "limit"}));
        let env: Envelope<()> = Envelope::err("req_c", body);
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["error"]["details"]["field"], json!("limit"));
    }
}
