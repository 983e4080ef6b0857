use planner_common::email::{ContactRouting, EmailSender, OutgoingEmail};
use planner_common::request_io::InputContactMessage;
use planner_common::validators::forms;

use actix_web::{web, HttpResponse};

use crate::env;
use crate::handlers::error::HttpErrorResponse;

/// Where contact messages go, and whether the mailer can actually deliver them.
#[derive(Clone, Debug)]
pub struct ContactSettings {
    pub routing: ContactRouting,
    pub configured: bool,
}

impl ContactSettings {
    pub fn from_conf() -> Self {
        Self {
            routing: ContactRouting {
                from: env::CONF.email_from_address.clone(),
                reply_to: env::CONF.email_reply_to_address.clone(),
                recipient: env::CONF.contact_recipient_address.clone(),
            },
            configured: env::CONF.is_email_configured(),
        }
    }
}

pub async fn send_message(
    email_sender: web::Data<EmailSender>,
    settings: web::Data<ContactSettings>,
    message: web::Json<InputContactMessage>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let fields = forms::validate_contact_message(&message)?;

    if !settings.configured {
        log::warn!("Rejected contact message because outbound email is not configured");
        return Err(HttpErrorResponse::ServiceNotConfigured(String::from(
            "Email is not configured. Please try again later.",
        )));
    }

    let email = OutgoingEmail::contact(&fields, &settings.routing);

    if let Err(e) = email_sender.send(email).await {
        log::error!("Failed to send contact message: {e}");
        return Err(HttpErrorResponse::ExternalServiceFailure(String::from(
            "Failed to send message. Please try again later.",
        )));
    }

    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::App;
    use async_trait::async_trait;
    use planner_common::email::senders::MockSender;
    use planner_common::email::{EmailError, SendEmail};
    use serde_json::json;

    use crate::handlers::test_utils;

    struct FailingSender {}

    #[async_trait]
    impl SendEmail for FailingSender {
        async fn send(&self, _email: OutgoingEmail) -> Result<(), EmailError> {
            Err(EmailError::FailedToSend(String::from("relay refused")))
        }
    }

    fn valid_message() -> serde_json::Value {
        json!({
            "name": "Sam",
            "email": "sam@example.com",
            "subject": "Question",
            "message": "How do budget goals work?",
        })
    }

    #[actix_web::test]
    async fn test_send_contact_message() {
        let sender = MockSender::new();
        let recorder = sender.clone();

        let app = test::init_service(App::new().configure(|cfg| {
            test_utils::configure_app(
                cfg,
                test_utils::unconnected_pool(),
                Box::new(sender),
                test_utils::contact_settings(true),
            )
        }))
        .await;

        let req = TestRequest::post()
            .uri("/api/contact")
            .set_json(valid_message())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Contact Form: Question");
        assert_eq!(
            sent[0].destination,
            env::CONF.contact_recipient_address.to_string()
        );
        assert_eq!(sent[0].reply_to, "sam@example.com");
        assert!(sent[0].body.contains("Email: sam@example.com\n"));
        assert!(sent[0].body.contains("How do budget goals work?"));
    }

    #[actix_web::test]
    async fn test_unconfigured_email_sends_nothing() {
        let sender = MockSender::new();
        let recorder = sender.clone();

        let app = test::init_service(App::new().configure(|cfg| {
            test_utils::configure_app(
                cfg,
                test_utils::unconnected_pool(),
                Box::new(sender),
                test_utils::contact_settings(false),
            )
        }))
        .await;

        let req = TestRequest::post()
            .uri("/api/contact")
            .set_json(valid_message())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "ServiceNotConfigured");
        assert!(recorder.sent().is_empty());
    }

    #[actix_web::test]
    async fn test_send_failure() {
        let app = test::init_service(App::new().configure(|cfg| {
            test_utils::configure_app(
                cfg,
                test_utils::unconnected_pool(),
                Box::new(FailingSender {}),
                test_utils::contact_settings(true),
            )
        }))
        .await;

        let req = TestRequest::post()
            .uri("/api/contact")
            .set_json(valid_message())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["err_type"], "ExternalServiceFailure");
    }

    #[actix_web::test]
    async fn test_invalid_contact_message() {
        let app = test::init_service(App::new().configure(test_utils::configure_offline_app)).await;

        let req = TestRequest::post()
            .uri("/api/contact")
            .set_json(json!({
                "name": "Sam",
                "email": "sam-at-example",
                "subject": " ",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["field_errors"]["email"].is_array());
        assert!(body["field_errors"]["subject"].is_array());
        assert!(body["field_errors"]["message"].is_array());
        assert!(body["field_errors"].get("name").is_none());
    }

    #[test]
    fn test_settings_follow_conf() {
        let settings = ContactSettings::from_conf();
        assert!(settings.configured);
        assert_eq!(settings.routing.recipient, env::CONF.contact_recipient_address);
    }
}
