use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use tracing::debug;

use crate::{
    auth::dto::SignupRequest,
    error::{ApiError, AppJson},
    photos::services::UploadItem,
};

/// Signup input, read either from a JSON body or from `multipart/form-data`
/// with an optional `photo` file part.
#[derive(Debug)]
pub struct SignupForm {
    pub fields: SignupRequest,
    pub photo: Option<UploadItem>,
}

#[async_trait]
impl<S> FromRequest<S> for SignupForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let AppJson(fields) = AppJson::<SignupRequest>::from_request(req, state).await?;
            return Ok(Self { fields, photo: None });
        }

        let mut mp = Multipart::from_request(req, state).await?;
        let mut fields = SignupRequest::default();
        let mut photo = None;

        while let Some(field) = mp.next_field().await? {
            let part = field.name().unwrap_or_default().to_string();
            match part.as_str() {
                "photo" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let body = field.bytes().await?;
                    // Browsers send an empty file part when nothing was chosen.
                    if file_name.as_deref().map_or(true, str::is_empty) || body.is_empty() {
                        debug!("photo part without a file, skipping");
                        continue;
                    }
                    photo = Some(UploadItem {
                        body,
                        content_type,
                        file_name,
                    });
                }
                "name" => fields.name = Some(field.text().await?),
                "username" => {
                    let text = field.text().await?;
                    fields.name.get_or_insert(text);
                }
                "email" => fields.email = Some(field.text().await?),
                "password" => fields.password = Some(field.text().await?),
                "role" => fields.role = Some(field.text().await?),
                "gender" => fields.gender = Some(field.text().await?),
                other => debug!(field = other, "ignoring unknown signup field"),
            }
        }

        Ok(Self { fields, photo })
    }
}
