use anyhow::Result;

use crate::Exchange;
use crate::Flow;
use crate::Interceptor;
use crate::Rejection;

/// Forbid requests carrying a header with a specific value.
///
/// Values are compared ignoring ASCII case.
#[derive(Clone, Debug)]
pub struct HeaderRejectInterceptor {
    header: String,
    message: String,
    value: String,
}

impl HeaderRejectInterceptor {
    /// Forbid requests where `header` is set to `value`, responding with `message`.
    pub fn new<S1, S2, S3>(header: S1, value: S2, message: S3) -> HeaderRejectInterceptor
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        HeaderRejectInterceptor {
            header: header.into(),
            message: message.into(),
            value: value.into(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for HeaderRejectInterceptor {
    async fn intercept(&self, exchange: &Exchange<'_>) -> Result<Flow> {
        let value = match exchange.request().header(&self.header) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return Ok(Flow::Proceed),
        };
        if !value.eq_ignore_ascii_case(&self.value) {
            return Ok(Flow::Proceed);
        }
        slog::debug!(
            exchange.context().logger, "Rejecting request with forbidden header";
            "header" => &self.header,
        );
        Ok(Flow::Reject(Rejection::forbidden(self.message.clone())))
    }
}
