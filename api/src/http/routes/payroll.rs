use actix_web::{http::StatusCode, web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::context::{RequestContext, Session};
use crate::infra::backend::{BackendClient, UpstreamError};

/// Longest pay period accepted (monthly payroll)
const MAX_PERIOD_DAYS: i64 = 31;
/// Latest a pay date may fall after its period ends
const MAX_PAY_DELAY_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PayRunRequest {
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub pay_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub fn validate_pay_run(req: &PayRunRequest) -> Result<(), ApiError> {
    if req.pay_period_end < req.pay_period_start {
        return Err(ApiError::bad_request(
            "pay_period_end",
            "pay_period_end must not be before pay_period_start",
        ));
    }

    let period_days = (req.pay_period_end - req.pay_period_start).num_days() + 1;
    if period_days > MAX_PERIOD_DAYS {
        return Err(ApiError::bad_request(
            "pay_period_end",
            format!("pay period must span at most {} days", MAX_PERIOD_DAYS),
        ));
    }

    if req.pay_date < req.pay_period_start {
        return Err(ApiError::bad_request(
            "pay_date",
            "pay_date must not be before pay_period_start",
        ));
    }

    if (req.pay_date - req.pay_period_end).num_days() > MAX_PAY_DELAY_DAYS {
        return Err(ApiError::bad_request(
            "pay_date",
            format!("pay_date must be within {} days of pay_period_end", MAX_PAY_DELAY_DAYS),
        ));
    }

    Ok(())
}

const DATE_FIELDS: [&str; 3] = ["pay_period_start", "pay_period_end", "pay_date"];

/// Decode a pay run body, naming the offending field on failure.
pub fn parse_pay_run(body: &[u8]) -> Result<PayRunRequest, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ApiError::BadRequest {
        reason: format!("pay run body is not valid JSON: {}", e),
        field: None,
    })?;
    let Some(object) = value.as_object() else {
        return Err(ApiError::BadRequest {
            reason: "pay run body must be a JSON object".to_string(),
            field: None,
        });
    };

    if let Some(unknown) = object
        .keys()
        .find(|k| k.as_str() != "notes" && !DATE_FIELDS.contains(&k.as_str()))
    {
        return Err(ApiError::bad_request(unknown, format!("unknown field `{}`", unknown)));
    }

    for field in DATE_FIELDS {
        match object.get(field) {
            None | Some(Value::Null) => {
                return Err(ApiError::bad_request(field, format!("{} is required", field)))
            }
            Some(v) if serde_json::from_value::<NaiveDate>(v.clone()).is_err() => {
                return Err(ApiError::bad_request(
                    field,
                    format!("{} must be a YYYY-MM-DD date", field),
                ))
            }
            Some(_) => {}
        }
    }

    if object.get("notes").is_some_and(|n| !n.is_string() && !n.is_null()) {
        return Err(ApiError::bad_request("notes", "notes must be a string"));
    }

    serde_json::from_value(value).map_err(|e| ApiError::BadRequest {
        reason: format!("invalid pay run body: {}", e),
        field: None,
    })
}

fn backend(state: &AppState) -> Result<&BackendClient, ApiError> {
    state
        .backend
        .as_ref()
        .ok_or_else(|| UpstreamError::NotConfigured.into())
}

/// Payroll needs a second factor no matter how the request was routed.
fn require_second_factor(session: &Session) -> Result<(), ApiError> {
    if session.mfa_verified {
        Ok(())
    } else {
        Err(ApiError::Forbidden {
            reason: "mfa_required".to_string(),
        })
    }
}

pub async fn list_runs(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    let result = async {
        require_second_factor(&session)?;
        let res = backend(&state)?
            .get("/payroll/runs", &session.org_id, &ctx.request_id)
            .await?;
        Ok::<Value, ApiError>(res.body)
    }
    .await;
    ctx.respond(result)
}

pub async fn create_run(
    ctx: RequestContext,
    session: Session,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HttpResponse {
    let result = async {
        require_second_factor(&session)?;
        let request = parse_pay_run(&body)?;
        validate_pay_run(&request)?;

        tracing::info!(
            request_id = %ctx.request_id,
            org_id = %session.org_id,
            user_id = %session.user_id,
            pay_date = %request.pay_date,
            "Submitting payroll run"
        );

        let res = backend(&state)?
            .post("/payroll/runs", &session.org_id, &ctx.request_id, &request)
            .await?;
        Ok::<Value, ApiError>(res.body)
    }
    .await;
    ctx.respond_with(StatusCode::CREATED, result)
}
