pub struct ContactMessage {}

impl ContactMessage {
    pub fn subject(subject: &str) -> String {
        format!("Contact Form: {subject}")
    }

    pub fn generate(name: &str, email: &str, subject: &str, message: &str) -> String {
        format!(
            "New Contact Form Submission\n\
             \n\
             From: {name}\n\
             Email: {email}\n\
             Subject: {subject}\n\
             \n\
             Message:\n\
             {message}\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_message() {
        assert_eq!(ContactMessage::subject("Help"), "Contact Form: Help");

        let body = ContactMessage::generate("Sam", "sam@example.com", "Help", "It broke");
        assert!(body.starts_with("New Contact Form Submission\n"));
        assert!(body.contains("From: Sam\n"));
        assert!(body.contains("Email: sam@example.com\n"));
        assert!(body.contains("Subject: Help\n"));
        assert!(body.ends_with("Message:\nIt broke\n"));
    }
}
