//! Wire Projection
//!
//! Renders a tagged [`Outcome`] as a JSON response document with its HTTP
//! status. Success bodies wrap the payload under `<Action>Response`; errors
//! use the `Response.Errors` envelope.

use crate::outcome::{ApiError, Outcome};
use serde::Serialize;
use serde_json::{json, Value};

/// A rendered response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
}

impl WireResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Fresh request id
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Render the outcome of `action`
pub fn render(action: &str, outcome: &Outcome, request_id: &str) -> WireResponse {
    match outcome {
        Outcome::Success(payload) => {
            let mut body = payload.clone();
            body.insert("requestId".to_string(), json!(request_id));
            let mut envelope = serde_json::Map::new();
            envelope.insert(format!("{}Response", action), Value::Object(body));
            WireResponse {
                status: 200,
                body: Value::Object(envelope),
            }
        }
        Outcome::Error(error) => render_error(error, request_id),
    }
}

fn render_error(error: &ApiError, request_id: &str) -> WireResponse {
    WireResponse {
        status: error.code.http_status(),
        body: json!({
            "Response": {
                "Errors": [{ "Code": error.code.as_str(), "Message": error.message }],
                "RequestID": request_id,
            }
        }),
    }
}

/// Render a dispatch failure (an action with no handler, and the like)
pub fn render_fault(error: &anyhow::Error, request_id: &str) -> WireResponse {
    WireResponse {
        status: 400,
        body: json!({
            "Response": {
                "Errors": [{ "Code": "InvalidAction", "Message": format!("{:#}", error) }],
                "RequestID": request_id,
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ErrorCode, Payload};
    use crate::store::ResourceKind;

    #[test]
    fn test_success_envelope() {
        let mut payload = Payload::new();
        payload.insert("return".into(), json!(true));
        let wire = render("DeleteVpc", &Outcome::Success(payload), "req-1");
        assert_eq!(wire.status, 200);
        assert_eq!(wire.body["DeleteVpcResponse"]["return"], true);
        assert_eq!(wire.body["DeleteVpcResponse"]["requestId"], "req-1");
    }

    #[test]
    fn test_error_envelope() {
        let error = ApiError::not_found(ResourceKind::Image, "ami-1");
        let wire = render("DescribeImages", &Outcome::Error(error), "req-2");
        assert_eq!(wire.status, 400);
        assert!(wire.is_error());
        assert_eq!(
            wire.body["Response"]["Errors"][0]["Code"],
            "InvalidAMIID.NotFound"
        );
        assert_eq!(wire.body["Response"]["RequestID"], "req-2");
    }

    #[test]
    fn test_internal_error_is_500() {
        let error = ApiError::new(ErrorCode::InternalError, "boom");
        let wire = render("CreateVpc", &Outcome::Error(error), "req-3");
        assert_eq!(wire.status, 500);
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(new_request_id(), new_request_id());
    }
}
