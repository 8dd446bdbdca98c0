//! JSON extractor that validates the body after deserializing it.

use std::collections::HashMap;

use aide::OperationInput;
use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use super::Json;
use crate::handler::response::ValidationErrorDetail;
use crate::handler::{Error, ErrorKind};

/// JSON extractor with automatic validation using the `validator` crate.
///
/// Rejects with `400` and one [`ValidationErrorDetail`] per failed rule.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

/// Formats a single validation failure for the response message.
fn format_validation_error(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("Field '{}' {}", field, message);
    }

    match error.code.as_ref() {
        "required" => format!("Field '{}' is required", field),
        "length" => format!("Field '{}' has invalid length", field),
        code => format!("Field '{}' failed validation: {}", field, code),
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut messages = Vec::new();
        let mut details = Vec::new();

        for (field, field_errors) in fields {
            for error in field_errors {
                messages.push(format_validation_error(&field, error));

                let params: HashMap<_, _> = error
                    .params
                    .iter()
                    .filter(|(key, _)| key.as_ref() != "value")
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect();

                details.push(ValidationErrorDetail {
                    field: field.to_string(),
                    code: error.code.to_string(),
                    message: format_validation_error(&field, error),
                    params: (!params.is_empty()).then_some(params),
                });
            }
        }

        tracing::warn!(
            fields = ?details.iter().map(|d| d.field.as_str()).collect::<Vec<_>>(),
            "Request validation failed"
        );

        let message = match messages.as_slice() {
            [] => "Validation failed".to_owned(),
            _ => messages.join(". "),
        };

        ErrorKind::BadRequest
            .with_message(message)
            .with_resource("request")
            .with_validation(details)
    }
}

impl<T> OperationInput for ValidateJson<T>
where
    T: schemars::JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        Json::<T>::inferred_early_responses(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::service::validation::check_username;

    #[derive(Debug, Deserialize, Validate)]
    struct Body {
        #[validate(custom(function = "check_username"))]
        username: String,
        #[validate(length(min = 2))]
        nickname: String,
    }

    #[test]
    fn validation_errors_become_bad_request_with_details() {
        let body = Body {
            username: "_bad".to_owned(),
            nickname: "x".to_owned(),
        };

        let error = Error::from(body.validate().expect_err("invalid body"));
        assert_eq!(error.kind(), ErrorKind::BadRequest);

        let details = error.validation().expect("details attached");
        let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["nickname", "username"]);
        assert_eq!(details[1].code, "username");
        assert!(error.message().is_some_and(|m| m.contains("username")));
    }
}
