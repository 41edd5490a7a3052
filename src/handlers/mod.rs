pub mod health_handler;
pub mod quiz_handler;
pub mod transcript_handler;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;

pub use health_handler::{health_check, index, metrics};
pub use quiz_handler::generate_quiz;
pub use transcript_handler::get_transcript;

/// Registers every route and maps malformed JSON bodies to validation errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(generate_quiz)
        .service(get_transcript)
        .service(health_check)
        .service(metrics)
        .service(index);
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}
