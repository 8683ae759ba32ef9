use crate::services::error::ConvertError;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Convert(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Convert(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Convert(e) if e.is_client_error() => e.to_string(),
            AppError::Convert(e) => match e {
                ConvertError::Scratch { ref source, .. } => {
                    tracing::error!(stage = e.stage(), "Scratch storage error: {:?}", source);
                    "An error occurred: could not stage uploaded files".to_string()
                }
                ConvertError::Task(ref detail) => {
                    tracing::error!(stage = e.stage(), "Worker error: {}", detail);
                    "An error occurred: conversion was interrupted".to_string()
                }
                e => {
                    tracing::warn!(stage = e.stage(), "Conversion failed: {}", e);
                    format!("An error occurred: {}", e)
                }
            },
            AppError::BadRequest(msg) => msg,
            AppError::PayloadTooLarge(msg) => msg,
        };

        (
            status,
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            message,
        )
            .into_response()
    }
}
