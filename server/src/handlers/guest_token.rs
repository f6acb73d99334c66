use actix_multipart::Multipart;
use actix_web::{
    http::{header::ContentType, Method},
    web, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::TryStreamExt;

use crate::{
    error::{RelayError, Result},
    relay::{GuestTokenForm, TokenRelay},
};

/// Per-field cap for multipart values, matching the urlencoded form limit.
const FIELD_LIMIT: usize = 16 * 1024;

/// Accepts every method so that non-POST requests get a 405 from the relay
/// instead of the router's default 404. The body is only read for POST.
pub async fn guest_token(
    req: HttpRequest,
    payload: web::Payload,
    relay: web::Data<TokenRelay>,
) -> Result<HttpResponse> {
    if *req.method() != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let form = read_form(&req, payload).await;

    let token = relay.handle(req.method(), &form).await?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(token))
}

/// Decodes either an urlencoded or a multipart submission.
/// An absent or undecodable body counts as missing fields.
async fn read_form(req: &HttpRequest, payload: web::Payload) -> GuestTokenForm {
    let mut payload = payload.into_inner();

    if req.content_type() == "multipart/form-data" {
        return read_multipart(Multipart::new(req.headers(), payload))
            .await
            .unwrap_or_default();
    }

    web::Form::<GuestTokenForm>::from_request(req, &mut payload)
        .await
        .map(web::Form::into_inner)
        .unwrap_or_default()
}

async fn read_multipart(mut multipart: Multipart) -> Option<GuestTokenForm> {
    let mut form = GuestTokenForm::default();

    while let Some(mut field) = multipart.try_next().await.ok()? {
        let name = field.name().map(str::to_owned);

        let mut value = Vec::new();
        while let Some(chunk) = field.try_next().await.ok()? {
            if value.len() + chunk.len() > FIELD_LIMIT {
                return None;
            }
            value.extend_from_slice(&chunk);
        }

        match name.as_deref() {
            Some("superset_url") => form.superset_url = String::from_utf8(value).ok()?,
            Some("dashboard_uuid") => form.dashboard_uuid = String::from_utf8(value).ok()?,
            _ => {}
        }
    }

    Some(form)
}
