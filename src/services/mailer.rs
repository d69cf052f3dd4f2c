//! Verification-code email delivery.
//!
//! SMTP credentials are optional: without them the mailer degrades to
//! console-only logging of the code, which is also the development workflow.
//! The code is always logged so a misconfigured relay never locks anyone
//! out of registration.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use rand::Rng;

#[derive(Clone)]
struct SmtpConfig {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
}

#[derive(Clone)]
pub struct Mailer {
    smtp: Option<SmtpConfig>,
}

impl Mailer {
    /// Read `SMTP_HOST`/`SMTP_PORT`/`SMTP_USERNAME`/`SMTP_PASSWORD`/
    /// `SMTP_FROM`; missing credentials mean console-only delivery.
    pub fn from_env() -> Self {
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SMTP_USERNAME").ok();
        let password = std::env::var("SMTP_PASSWORD").ok();

        let smtp = match (username, password) {
            (Some(username), Some(password)) => {
                let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());
                Some(SmtpConfig {
                    host,
                    port,
                    username,
                    password,
                    from,
                })
            }
            _ => {
                println!("[mailer] SMTP credentials not configured - codes go to console only");
                None
            }
        };

        Self { smtp }
    }

    /// Deliver a verification code. Delivery failures are logged, never
    /// surfaced: the console copy of the code is the fallback.
    pub async fn send_verification_code(&self, email: &str, code: &str) {
        println!("[mailer] Verification code for {}: {}", email, code);

        let Some(config) = &self.smtp else {
            return;
        };

        if let Err(e) = send_via_smtp(config, email, code).await {
            eprintln!("[mailer] Failed to send email to {}: {}", email, e);
        } else {
            println!("[mailer] Verification email sent to {}", email);
        }
    }
}

async fn send_via_smtp(config: &SmtpConfig, to_email: &str, code: &str) -> Result<(), String> {
    let body = format!(
        r#"Welcome to Clario!

Your verification code is: {}

Enter this code to complete your registration.

Best regards,
The Clario Team
"#,
        code
    );

    let email = Message::builder()
        .from(config
            .from
            .parse()
            .map_err(|e| format!("From address error: {}", e))?)
        .to(to_email
            .parse()
            .map_err(|e| format!("To address error: {}", e))?)
        .subject("Clario - Email Verification")
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| format!("Email build error: {}", e))?;

    let creds = Credentials::new(config.username.clone(), config.password.clone());

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(config.port)
        .credentials(creds)
        .build();

    transport
        .send(email)
        .await
        .map_err(|e| format!("SMTP send error: {}", e))?;

    Ok(())
}

/// Six-digit numeric verification code.
pub fn generate_verification_code() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:06}", code)
}
