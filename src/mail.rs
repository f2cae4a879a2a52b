use std::env;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email send failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email API error: {0}")]
    Api(String),
}

/// Thin client for a transactional-email provider: one HTTP POST carrying
/// `{from, to, subject, html}`. Unconfigured (empty api key) means sends
/// are silently skipped; callers on the booking path never observe a
/// failure either way.
#[derive(Clone)]
pub struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct MailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

impl Mailer {
    pub fn new(api_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }

    pub fn from_env() -> Self {
        let api_url = env::var("MAIL_API_URL")
            .unwrap_or_else(|_| "https://api.resend.com/emails".to_string());
        let api_key = env::var("MAIL_API_KEY").unwrap_or_default();
        let from = env::var("MAIL_FROM").unwrap_or_else(|_| "Salonbook <no-reply@salonbook.app>".to_string());
        if api_key.trim().is_empty() {
            log::warn!("MAIL_API_KEY not set. Outbound email is disabled.");
        }
        Self::new(&api_url, &api_key, &from)
    }

    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let request = MailRequest {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: subject.to_string(),
            html: html.to_string(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api(body));
        }

        log::debug!("email sent to {to}: {subject}");
        Ok(())
    }

    pub async fn send_booking_confirmation(
        &self,
        to: &str,
        salon_name: &str,
        date: &str,
        time: &str,
        service: &str,
    ) -> Result<(), MailError> {
        let html = format!(
            r#"<p>Your appointment at <strong>{salon_name}</strong> is confirmed.</p>
<p>{service}<br>{date} at {time}</p>"#
        );
        self.send(to, "Your booking is confirmed", &html).await
    }

    pub async fn send_salon_accepted(&self, to: &str, salon_name: &str) -> Result<(), MailError> {
        let html = format!(
            r#"<p>Good news: <strong>{salon_name}</strong> has been verified and is now visible to clients.</p>"#
        );
        self.send(to, "Your salon has been accepted", &html).await
    }
}

/// Fire-and-forget booking confirmation. Runs detached so the reservation
/// outcome is never coupled to the email provider; failures are logged.
pub fn notify_booking(mailer: &Mailer, to: &str, salon_name: &str, date: &str, time: &str, service: &str) {
    if !mailer.enabled() {
        return;
    }
    let mailer = mailer.clone();
    let (to, salon_name) = (to.to_string(), salon_name.to_string());
    let (date, time, service) = (date.to_string(), time.to_string(), service.to_string());
    tokio::spawn(async move {
        if let Err(err) = mailer
            .send_booking_confirmation(&to, &salon_name, &date, &time, &service)
            .await
        {
            log::warn!("booking confirmation email failed: {err}");
        }
    });
}

/// Fire-and-forget salon-acceptance notice, same isolation as bookings.
pub fn notify_salon_accepted(mailer: &Mailer, to: &str, salon_name: &str) {
    if !mailer.enabled() {
        return;
    }
    let mailer = mailer.clone();
    let (to, salon_name) = (to.to_string(), salon_name.to_string());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_salon_accepted(&to, &salon_name).await {
            log::warn!("salon acceptance email failed: {err}");
        }
    });
}
