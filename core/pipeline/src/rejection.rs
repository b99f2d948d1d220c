//! Responses for requests rejected by the pipeline.
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use portcullis_auth::access::AccessDenied;
use portcullis_auth::identity::RequestView;

use crate::PipelineError;

/// Response to send to clients when the pipeline is short-circuited.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejection {
    /// Redirect clients to this location instead of returning the message.
    pub location: Option<String>,

    /// Diagnostic message for the client.
    pub message: String,

    /// HTTP status code of the response.
    pub status: StatusCode,
}

impl Rejection {
    /// The caller is authenticated but not allowed to perform the request.
    pub fn forbidden<S: Into<String>>(message: S) -> Rejection {
        Rejection::new(StatusCode::FORBIDDEN, message)
    }

    /// The request could not be processed due to an unexpected error.
    pub fn internal<S: Into<String>>(message: S) -> Rejection {
        Rejection::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Convert the rejection into an HTTP response.
    pub fn into_response(self) -> HttpResponse {
        match self.location {
            Some(location) => HttpResponse::build(self.status)
                .insert_header((LOCATION, location))
                .finish(),
            None => HttpResponse::build(self.status)
                .content_type("text/plain; charset=utf-8")
                .body(self.message),
        }
    }

    /// Reject the request with an arbitrary status code.
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Rejection {
        Rejection {
            location: None,
            message: message.into(),
            status,
        }
    }

    /// Redirect the client to a different location.
    pub fn redirect<S: Into<String>>(location: S) -> Rejection {
        let location = location.into();
        Rejection {
            message: format!("redirecting to {}", location),
            location: Some(location),
            status: StatusCode::FOUND,
        }
    }

    /// The caller could not be identified.
    pub fn unauthorised<S: Into<String>>(message: S) -> Rejection {
        Rejection::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl From<&AccessDenied> for Rejection {
    fn from(value: &AccessDenied) -> Self {
        if value.is_unauthenticated() {
            Rejection::unauthorised(value.to_string())
        } else {
            Rejection::forbidden(value.to_string())
        }
    }
}

/// Redirect browsers to dedicated pages when access is denied.
///
/// Requests that don't accept HTML responses always receive raw 401 or 403 responses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DenialPolicy {
    denied_location: String,
    login_location: String,
}

impl DenialPolicy {
    /// Location forbidden callers are redirected to.
    pub fn denied_location(&self) -> &str {
        &self.denied_location
    }

    /// Location anonymous callers are redirected to.
    pub fn login_location(&self) -> &str {
        &self.login_location
    }

    /// Redirect anonymous browsers to `login` and forbidden browsers to `denied`.
    ///
    /// The two locations must differ or clients could bounce between them forever.
    pub fn new<S1, S2>(login: S1, denied: S2) -> Result<DenialPolicy, PipelineError>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let login_location = login.into();
        let denied_location = denied.into();
        if login_location == denied_location {
            return Err(PipelineError::SameDenialLocations(login_location));
        }
        Ok(DenialPolicy {
            denied_location,
            login_location,
        })
    }

    /// Choose how to respond to a denied request.
    pub fn reject(&self, request: &dyn RequestView, denied: &AccessDenied) -> Rejection {
        if !request.accepts_html() {
            return Rejection::from(denied);
        }
        if denied.is_unauthenticated() {
            Rejection::redirect(&self.login_location)
        } else {
            Rejection::redirect(&self.denied_location)
        }
    }
}
