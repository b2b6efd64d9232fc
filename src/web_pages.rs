use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::data_url::{BaseImage, Upload, UploadError};
use crate::options;
use crate::params::ParamField;
use crate::state::Message;
use crate::studio::{ImageSource, StudioHandle};

const INDEX_HTML: &str = include_str!("../templates/index.html");

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
struct ParamValue {
    value: String,
}

#[derive(Clone, Copy)]
enum Slot {
    Base,
    Background,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse { error: message.to_string() })).into_response()
}

pub fn router(studio: StudioHandle, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/options", get(option_catalog))
        .route("/api/state", get(current_state))
        .route("/api/base-image", get(base_image).post(upload_base_image))
        .route(
            "/api/background-image",
            get(background_image)
                .post(upload_background_image)
                .delete(clear_background_image),
        )
        .route("/api/params/{field}", patch(update_param))
        .route("/api/generate", post(generate))
        .route("/api/error/dismiss", post(dismiss_error))
        .route("/api/images/{id}", get(result_image).delete(delete_image))
        .route("/api/images/{id}/regenerate", post(regenerate))
        .route("/api/images/{id}/download", get(download_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(studio)
}

async fn apply(studio: &StudioHandle, message: Message) -> Response {
    match studio.dispatch(message).await {
        Ok(state) => Json(state).into_response(),
        Err(err) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn option_catalog() -> Json<options::OptionCatalog> {
    Json(options::catalog())
}

async fn current_state(State(studio): State<StudioHandle>) -> Response {
    match studio.snapshot().await {
        Ok(state) => Json(state).into_response(),
        Err(err) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            return BaseImage::from_multipart(field).await;
        }
    }
    Err(UploadError::Missing)
}

async fn upload_into(studio: &StudioHandle, slot: Slot, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    let image = &upload.image;
    tracing::info!(file = %image.file_name, mime = %image.mime_type, "image uploaded");
    let message = match slot {
        Slot::Base => {
            if upload.is_below_recommended_size() {
                tracing::warn!(
                    file = %image.file_name,
                    "base image is smaller than the recommended 1080x1080"
                );
            }
            Message::BaseImageLoaded(upload.image)
        }
        Slot::Background => Message::BackgroundImageLoaded(upload.image),
    };
    apply(studio, message).await
}

async fn upload_base_image(State(studio): State<StudioHandle>, multipart: Multipart) -> Response {
    upload_into(&studio, Slot::Base, multipart).await
}

async fn upload_background_image(
    State(studio): State<StudioHandle>,
    multipart: Multipart,
) -> Response {
    upload_into(&studio, Slot::Background, multipart).await
}

async fn stored_image(studio: &StudioHandle, source: ImageSource) -> Response {
    let url = match studio.image(source).await {
        Ok(Some(url)) => url,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "image not found"),
        Err(err) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    };
    match url.decode_bytes() {
        Ok(bytes) => ([(header::CONTENT_TYPE, url.mime_type().to_string())], bytes).into_response(),
        Err(err) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("stored image is unreadable: {err}"),
        ),
    }
}

async fn base_image(State(studio): State<StudioHandle>) -> Response {
    stored_image(&studio, ImageSource::Base).await
}

async fn background_image(State(studio): State<StudioHandle>) -> Response {
    stored_image(&studio, ImageSource::Background).await
}

async fn result_image(State(studio): State<StudioHandle>, Path(id): Path<String>) -> Response {
    stored_image(&studio, ImageSource::Result(id)).await
}

async fn clear_background_image(State(studio): State<StudioHandle>) -> Response {
    apply(&studio, Message::BackgroundImageCleared).await
}

async fn update_param(
    State(studio): State<StudioHandle>,
    Path(field): Path<String>,
    Json(body): Json<ParamValue>,
) -> Response {
    let field: ParamField = match field.parse() {
        Ok(field) => field,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, &format!("{err}")),
    };
    apply(&studio, Message::ParamChanged(field, body.value)).await
}

async fn generate(State(studio): State<StudioHandle>) -> Response {
    apply(&studio, Message::Submit).await
}

async fn dismiss_error(State(studio): State<StudioHandle>) -> Response {
    apply(&studio, Message::DismissError).await
}

async fn regenerate(State(studio): State<StudioHandle>, Path(id): Path<String>) -> Response {
    apply(&studio, Message::Regenerate(id)).await
}

async fn delete_image(State(studio): State<StudioHandle>, Path(id): Path<String>) -> Response {
    apply(&studio, Message::Delete(id)).await
}

async fn download_image(State(studio): State<StudioHandle>, Path(id): Path<String>) -> Response {
    let download = match studio.download(id).await {
        Ok(Some(Ok(download))) => download,
        Ok(Some(Err(err))) => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("stored image is unreadable: {err}"),
            );
        }
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "image not found"),
        Err(err) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    };
    (
        [
            (header::CONTENT_TYPE, download.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.file_name),
            ),
        ],
        download.bytes,
    )
        .into_response()
}
