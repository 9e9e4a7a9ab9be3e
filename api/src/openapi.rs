// OpenAPI schema generator
// Hand-maintained document for the public routes

use serde_json::{json, Value};

fn envelope(data: Value) -> Value {
    json!({
        "type": "object",
        "required": ["ok", "data", "error", "request_id"],
        "properties": {
            "ok": { "type": "boolean" },
            "data": data,
            "error": { "$ref": "#/components/schemas/ErrorBody" },
            "request_id": { "type": "string" }
        }
    })
}

fn lifecycle(reasons: &[&str], payload_field: &str, payload: Value) -> Value {
    json!({
        "type": "object",
        "required": ["lifecycle", "reason_code", "reason_message", "generated_at", payload_field, "request_id"],
        "properties": {
            "lifecycle": { "$ref": "#/components/schemas/Lifecycle" },
            "reason_code": { "type": "string", "nullable": true, "enum": reasons },
            "reason_message": { "type": "string", "nullable": true },
            "generated_at": { "type": "string", "format": "date-time" },
            payload_field: payload,
            "request_id": { "type": "string" }
        }
    })
}

fn ok_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response(description: &str) -> Value {
    ok_response(description, envelope(json!({ "nullable": true })))
}

fn protected_get(tag: &str, summary: &str, schema: Value, params: Value) -> Value {
    json!({
        "get": {
            "summary": summary,
            "tags": [tag],
            "security": [{ "session": [] }],
            "parameters": params,
            "responses": {
                "200": ok_response("OK", schema),
                "400": error_response("Invalid input"),
                "401": error_response("Missing or invalid session")
            }
        }
    })
}

fn query_param(name: &str, description: &str, schema: Value) -> Value {
    json!({ "name": name, "in": "query", "description": description, "schema": schema })
}

pub fn generate_openapi_spec() -> Value {
    let failed_reasons = [
        "insufficient_data",
        "computation_error",
        "backend_timeout",
        "backend_unavailable",
        "not_configured",
        "computation_in_progress",
    ];
    let mut cfo_reasons = failed_reasons.to_vec();
    cfo_reasons.push("snapshot_expired");
    let mut govcon_reasons = failed_reasons.to_vec();
    govcon_reasons.push("no_evidence_uploaded");
    let intelligence_reasons = [
        "insufficient_data",
        "computation_error",
        "backend_timeout",
        "upstream_error",
        "not_configured",
        "generation_in_progress",
    ];

    let mut payroll = protected_get(
        "payroll",
        "List payroll runs (requires a second factor)",
        envelope(json!({})),
        json!([]),
    );
    payroll["post"] = json!({
        "summary": "Submit a payroll run (requires a second factor)",
        "tags": ["payroll"],
        "security": [{ "session": [] }],
        "requestBody": {
            "required": true,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PayRunRequest" } } }
        },
        "responses": {
            "201": ok_response("Created", envelope(json!({}))),
            "400": error_response("Invalid pay period"),
            "401": error_response("Missing or invalid session"),
            "403": error_response("Second factor required"),
            "502": error_response("Backend error"),
            "504": error_response("Backend timed out")
        }
    });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "finboard API",
            "description": "Tenant-scoped financial API. Computed views report a lifecycle instead of fabricating values.",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/healthz": { "get": { "summary": "Liveness", "responses": { "200": { "description": "Process is up" } } } },
            "/readyz": {
                "get": {
                    "summary": "Readiness of configured dependencies",
                    "responses": {
                        "200": { "description": "All configured dependencies reachable" },
                        "503": { "description": "A configured dependency is down" }
                    }
                }
            },
            "/version": { "get": { "summary": "Service name and version", "responses": { "200": { "description": "OK" } } } },
            "/api/accounts": protected_get(
                "ledger",
                "Linked bank accounts",
                envelope(json!({ "type": "array", "items": { "$ref": "#/components/schemas/Account" } })),
                json!([])
            ),
            "/api/transactions": protected_get(
                "ledger",
                "Search transactions",
                envelope(json!({ "type": "object" })),
                json!([
                    query_param("search", "Substring of name or merchant name", json!({ "type": "string", "maxLength": 100 })),
                    query_param("account_id", "Only this account", json!({ "type": "string" })),
                    query_param("start_date", "Inclusive lower date bound", json!({ "type": "string", "format": "date" })),
                    query_param("end_date", "Inclusive upper date bound", json!({ "type": "string", "format": "date" })),
                    query_param("limit", "Page size", json!({ "type": "integer", "minimum": 1, "maximum": 500, "default": 100 })),
                    query_param("offset", "Rows to skip", json!({ "type": "integer", "minimum": 0, "default": 0 }))
                ])
            ),
            "/api/payroll/runs": payroll,
            "/api/dashboard/metrics": protected_get(
                "dashboard",
                "Headline counts; failed sources are null and listed in degraded",
                envelope(json!({ "type": "object" })),
                json!([])
            ),
            "/api/cfo/snapshot": protected_get(
                "computed",
                "CFO snapshot",
                lifecycle(&cfo_reasons, "snapshot", json!({ "type": "object", "nullable": true })),
                json!([])
            ),
            "/api/govcon/snapshot": protected_get(
                "computed",
                "GovCon compliance snapshot",
                lifecycle(&govcon_reasons, "snapshot", json!({ "type": "object", "nullable": true })),
                json!([])
            ),
            "/api/intelligence/insights": protected_get(
                "computed",
                "Model-written insights over recent transactions",
                lifecycle(&intelligence_reasons, "items", json!({ "type": "array", "nullable": true, "items": { "type": "object" } })),
                json!([])
            ),
            "/api/reports/recurring": protected_get(
                "reports",
                "Recurring charges detected in the ledger",
                envelope(json!({ "type": "object" })),
                json!([
                    query_param("lookback_days", "Window to analyze", json!({ "type": "integer", "minimum": 30, "maximum": 730, "default": 365 }))
                ])
            )
        },
        "components": {
            "securitySchemes": {
                "session": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            },
            "schemas": {
                "Lifecycle": {
                    "type": "string",
                    "enum": ["success", "pending", "failed", "stale", "no_evidence"]
                },
                "ErrorBody": {
                    "type": "object",
                    "nullable": true,
                    "required": ["code", "message"],
                    "properties": {
                        "code": { "type": "string" },
                        "message": { "type": "string" },
                        "details": { "type": "object" }
                    }
                },
                "Account": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "type": { "type": "string", "nullable": true },
                        "current_balance": { "type": "number", "nullable": true },
                        "available_balance": { "type": "number", "nullable": true }
                    }
                },
                "PayRunRequest": {
                    "type": "object",
                    "required": ["pay_period_start", "pay_period_end", "pay_date"],
                    "properties": {
                        "pay_period_start": { "type": "string", "format": "date" },
                        "pay_period_end": { "type": "string", "format": "date" },
                        "pay_date": { "type": "string", "format": "date" },
                        "notes": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_api_route() {
        let spec = generate_openapi_spec();
        for path in [
            "/api/accounts",
            "/api/transactions",
            "/api/payroll/runs",
            "/api/dashboard/metrics",
            "/api/cfo/snapshot",
            "/api/govcon/snapshot",
            "/api/intelligence/insights",
            "/api/reports/recurring",
        ] {
            assert!(spec["paths"][path].is_object(), "missing {}", path);
        }
        assert!(spec["paths"]["/api/payroll/runs"]["post"].is_object());
    }
}
