use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{request::TranscriptQuery, response::TranscriptResponse},
    services::{metrics::TRANSCRIPT_REQUESTS, video_id::extract_video_id},
};

#[get("/api/transcript/{video}")]
async fn get_transcript(
    state: web::Data<AppState>,
    video: web::Path<String>,
    query: web::Query<TranscriptQuery>,
) -> Result<HttpResponse, AppError> {
    state.metrics.increment(TRANSCRIPT_REQUESTS);

    let video_id = extract_video_id(&video)?;
    let transcript = state
        .transcript_service
        .acquire(&video_id, &query.preferred_languages())
        .await?;
    state.metrics.record_transcript_source(transcript.source);

    Ok(HttpResponse::Ok().json(TranscriptResponse::from(transcript)))
}
