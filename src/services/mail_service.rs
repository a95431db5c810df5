// src/services/mail_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    common::error::AppError,
    models::{auth::User, ticket::Ticket},
};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

// Transporte de e-mail. Implementações trocáveis para produção e testes.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError>;
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| AppError::MailError(format!("Erro de rede: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("✉️ E-mail enviado para {}", to);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::MailError(format!("Resend respondeu {}: {}", status.as_u16(), body)))
    }
}

// Usado quando não há chave da Resend configurada
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), AppError> {
        tracing::info!("✉️ [log] e-mail para {}: {}", to, subject);
        Ok(())
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2 style="color: #c8102e;">{}</h2>
  {}
  <p style="font-size: 12px; color: #888;">Banco Diocesano de Alimentos de los Altos A.C.</p>
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

pub fn account_verified_template(username: &str, login_url: &str) -> String {
    layout(
        "Cuenta verificada",
        &format!(
            r#"<p>Hola {},</p>
  <p>Tu cuenta ha sido verificada. Ya puedes iniciar sesión.</p>
  <p><a href="{}">Iniciar sesión</a></p>"#,
            html_escape::encode_text(username),
            html_escape::encode_double_quoted_attribute(login_url)
        ),
    )
}

pub fn password_reset_template(username: &str, reset_url: &str) -> String {
    layout(
        "Restablecer contraseña",
        &format!(
            r#"<p>Hola {},</p>
  <p>Recibimos una solicitud para restablecer tu contraseña. El enlace es válido por 1 hora.</p>
  <p><a href="{}">Restablecer contraseña</a></p>
  <p>Si no solicitaste el cambio, ignora este mensaje.</p>"#,
            html_escape::encode_text(username),
            html_escape::encode_double_quoted_attribute(reset_url)
        ),
    )
}

pub fn ticket_template(ticket: &Ticket, created: bool) -> String {
    let heading = if created { "Ticket recibido" } else { "Ticket actualizado" };
    let comments = ticket
        .comments
        .as_deref()
        .map(|c| format!("<p><strong>Comentarios:</strong> {}</p>", html_escape::encode_text(c)))
        .unwrap_or_default();

    layout(
        heading,
        &format!(
            r#"<p>Hola {},</p>
  <p>Ticket #{}: <strong>{}</strong> (prioridad {:?})</p>
  <p>{}</p>
  {}"#,
            html_escape::encode_text(&ticket.username),
            ticket.id,
            ticket.status.label(),
            ticket.priority,
            html_escape::encode_text(&ticket.description),
            comments
        ),
    )
}

#[derive(Clone)]
pub struct MailService {
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>, frontend_url: String) -> Self {
        Self { mailer, frontend_url }
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.frontend_url.trim_end_matches('/'), token)
    }

    pub async fn send_account_verified(&self, user: &User) -> Result<(), AppError> {
        let login_url = format!("{}/login", self.frontend_url.trim_end_matches('/'));
        let html = account_verified_template(&user.username, &login_url);
        self.mailer.send(&user.email, "Tu cuenta ha sido verificada", &html).await
    }

    pub async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), AppError> {
        let html = password_reset_template(&user.username, &self.reset_url(token));
        self.mailer.send(&user.email, "Restablecer contraseña", &html).await
    }

    pub async fn send_ticket_notification(&self, ticket: &Ticket, created: bool) -> Result<(), AppError> {
        let subject = if created {
            format!("Ticket #{} recibido", ticket.id)
        } else {
            format!("Ticket #{} actualizado", ticket.id)
        };
        let html = ticket_template(ticket, created);
        self.mailer.send(&ticket.email, &subject, &html).await
    }
}

// Notificações não derrubam a requisição: a falha fica no log
pub fn notify(result: Result<(), AppError>, context: &str) {
    if let Err(e) = result {
        tracing::warn!("⚠️ Falha ao enviar e-mail ({}): {}", context, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), html.to_string()));
            Ok(())
        }
    }

    #[test]
    fn link_attributes_cannot_break_out_of_href() {
        let html = account_verified_template("<b>Ana & Luis</b>", "https://app/login\" onclick=\"x");

        assert!(html.contains("&lt;b&gt;Ana &amp; Luis&lt;/b&gt;"));
        assert!(html.contains("https://app/login&quot; onclick=&quot;x"));
        assert!(!html.contains("\" onclick=\""));
    }

    #[test]
    fn reset_template_contains_link_and_escaped_name() {
        let html = password_reset_template("<script>", "https://app/reset-password/abc");

        assert!(html.contains("https://app/reset-password/abc"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn reset_mail_goes_to_user_with_frontend_link() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = MailService::new(mailer.clone(), "https://bamx.app/".into());
        let now = chrono::Utc::now();
        let user = User {
            id: 7,
            username: "luis".into(),
            email: "luis@bamx.org".into(),
            password_hash: String::new(),
            role: crate::models::auth::UserRole::Ts,
            verified: true,
            active: true,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        service.send_password_reset(&user, "tok123").await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "luis@bamx.org");
        assert!(sent[0].2.contains("https://bamx.app/reset-password/tok123"));
    }
}
