mod mock_sender;
mod smtp;

pub use mock_sender::{MockSender, SentEmail};
pub use smtp::SmtpSender;
