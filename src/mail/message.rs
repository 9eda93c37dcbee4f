//! Email message type and builder.

use super::MailError;

/// A plain-text email ready to send.
///
/// Newsletter bodies are plain text; there is deliberately no HTML or
/// multipart support here.
#[derive(Debug, Clone)]
pub struct Email {
    /// Primary recipients.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Optional reply-to address.
    pub reply_to: Option<String>,
    /// Sender address; the mailer's configured default applies when unset.
    pub from: Option<String>,
}

impl Email {
    /// Create a new email builder.
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    to: Vec<String>,
    subject: Option<String>,
    body: Option<String>,
    reply_to: Option<String>,
    from: Option<String>,
}

impl EmailBuilder {
    /// Add a primary recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Add multiple primary recipients.
    pub fn to_many(mut self, addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the plain-text body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the reply-to address.
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Override the sender address.
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Build the email, validating required fields.
    pub fn build(self) -> Result<Email, MailError> {
        if self.to.is_empty() {
            return Err(MailError::Build("at least one recipient required".into()));
        }

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        let body = self
            .body
            .ok_or_else(|| MailError::Build("body required".into()))?;

        Ok(Email {
            to: self.to,
            subject,
            body,
            reply_to: self.reply_to,
            from: self.from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_email() {
        let email = Email::builder()
            .to("user@example.com")
            .subject("Hello")
            .body("Body text")
            .build()
            .unwrap();

        assert_eq!(email.to, vec!["user@example.com"]);
        assert_eq!(email.subject, "Hello");
        assert_eq!(email.body, "Body text");
        assert!(email.from.is_none());
    }

    #[test]
    fn build_with_recipient_list() {
        let email = Email::builder()
            .to_many(["a@example.com", "b@example.com"])
            .subject("Hi")
            .body("Body")
            .build()
            .unwrap();

        assert_eq!(email.to.len(), 2);
    }

    #[test]
    fn build_requires_recipient() {
        let result = Email::builder().subject("Hi").body("Body").build();
        assert!(result.is_err());
    }

    #[test]
    fn build_requires_subject() {
        let result = Email::builder().to("a@b.com").body("Body").build();
        assert!(result.is_err());
    }

    #[test]
    fn build_requires_body() {
        let result = Email::builder().to("a@b.com").subject("Hi").build();
        assert!(result.is_err());
    }
}
