use actix_web::{post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::request::GenerateQuizRequest,
    services::metrics::GENERATE_QUIZ_REQUESTS,
};

#[post("/api/generate-quiz")]
async fn generate_quiz(
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    state.metrics.increment(GENERATE_QUIZ_REQUESTS);

    let request = request.into_inner();
    request.validate()?;

    let video = request.video_url.clone();
    let options = request.into_options(state.config.default_questions);
    log::info!(
        "[{}] Quiz requested for {} ({} questions)",
        get_request_id(&req).unwrap_or_default(),
        video,
        options.num_questions
    );

    let quiz = state.quiz_service.generate_quiz(&video, &options).await?;
    Ok(HttpResponse::Ok().json(quiz))
}
