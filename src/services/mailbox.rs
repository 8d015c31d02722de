// src/services/mailbox.rs

//! Mailbox scan for puzzles delivered by newsletter.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeDelta};
use mailparse::{MailHeaderMap, ParsedMail};

use crate::error::{AppError, Result};
use crate::formats::ContainerFormat;
use crate::models::{Record, SourceConfig};
use crate::services::{FetchContext, Strategy};

/// Search-and-fetch access to a mail folder.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Ids of messages from `sender` received on or after `since`.
    async fn search(&self, sender: &str, since: NaiveDate) -> Result<Vec<u32>>;

    /// Raw RFC 822 bytes of one message.
    async fn fetch(&self, id: u32) -> Result<Vec<u8>>;
}

/// Subject and first puzzle attachment of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub attachment: Option<(String, Vec<u8>)>,
}

/// Parse a raw message, looking through nested parts for an attachment
/// named like a puzzle container.
pub fn parse_message(raw: &[u8]) -> Result<MailMessage> {
    let mail = mailparse::parse_mail(raw).map_err(AppError::mailbox)?;
    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    Ok(MailMessage {
        subject,
        attachment: find_attachment(&mail),
    })
}

fn find_attachment(part: &ParsedMail<'_>) -> Option<(String, Vec<u8>)> {
    let file_name = part
        .get_content_disposition()
        .params
        .get("filename")
        .cloned()
        .or_else(|| part.ctype.params.get("name").cloned());

    if let Some(name) = file_name {
        if ContainerFormat::from_name(&name).is_some() {
            if let Ok(body) = part.get_body_raw() {
                return Some((name, body));
            }
        }
    }

    part.subparts.iter().find_map(find_attachment)
}

/// One record per message from the source's sender since yesterday.
pub struct MailboxScan;

#[async_trait]
impl Strategy for MailboxScan {
    fn name(&self) -> &'static str {
        "mailbox"
    }

    fn applies(&self, source: &SourceConfig) -> bool {
        source.sender().is_some()
    }

    async fn attempt(
        &self,
        ctx: &FetchContext,
        source: &SourceConfig,
        today: NaiveDate,
    ) -> Result<Vec<Record>> {
        let Some(sender) = source.sender() else {
            return Ok(Vec::new());
        };
        let mailbox = ctx.mailbox.as_ref().ok_or_else(|| {
            AppError::mailbox(format!("no mailbox configured to check mail from {sender}"))
        })?;

        let since = today - TimeDelta::days(1);
        let ids = mailbox.search(sender, since).await?;
        log::debug!("{} messages from {sender} since {since}", ids.len());

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let message = parse_message(&mailbox.fetch(id).await?)?;
            let mut record = Record {
                name: source.name.clone(),
                page_title: message.subject,
                ..Record::default()
            };
            if let Some((file_name, bytes)) = message.attachment {
                record.puzzle_file = Some(ctx.storage.save_puzzle(&file_name, &bytes).await?);
            }
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(feature = "imap")]
pub use self::imap_mailbox::ImapMailbox;

#[cfg(feature = "imap")]
mod imap_mailbox {
    use std::net::TcpStream;
    use std::sync::{Arc, Mutex};

    use native_tls::{TlsConnector, TlsStream};

    use super::*;
    use crate::models::MailConfig;

    type Session = imap::Session<TlsStream<TcpStream>>;

    /// IMAP-over-TLS mailbox with the configured folder selected.
    pub struct ImapMailbox {
        session: Arc<Mutex<Session>>,
    }

    impl ImapMailbox {
        /// Log in with the password read from `password_env`.
        pub fn connect(config: &MailConfig) -> Result<Self> {
            let password = std::env::var(&config.password_env).map_err(|_| {
                AppError::config(format!("{} is not set", config.password_env))
            })?;

            let tls = TlsConnector::builder().build().map_err(AppError::mailbox)?;
            let client = imap::connect((config.server.as_str(), config.port), &config.server, &tls)
                .map_err(AppError::mailbox)?;
            let mut session = client
                .login(&config.username, &password)
                .map_err(|(e, _)| AppError::mailbox(e))?;
            session.select(&config.folder).map_err(AppError::mailbox)?;

            log::info!("Connected to {} as {}", config.server, config.username);
            Ok(Self {
                session: Arc::new(Mutex::new(session)),
            })
        }

        async fn with_session<T, F>(&self, op: F) -> Result<T>
        where
            T: Send + 'static,
            F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
        {
            let session = Arc::clone(&self.session);
            tokio::task::spawn_blocking(move || {
                let mut session = session
                    .lock()
                    .map_err(|_| AppError::mailbox("IMAP session lock poisoned"))?;
                op(&mut session)
            })
            .await
            .map_err(AppError::mailbox)?
        }
    }

    #[async_trait]
    impl Mailbox for ImapMailbox {
        async fn search(&self, sender: &str, since: NaiveDate) -> Result<Vec<u32>> {
            let query = format!(
                "FROM \"{}\" SINCE {}",
                sender.replace('"', ""),
                since.format("%d-%b-%Y")
            );
            self.with_session(move |session| {
                let mut ids: Vec<u32> = session
                    .search(&query)
                    .map_err(AppError::mailbox)?
                    .into_iter()
                    .collect();
                ids.sort_unstable();
                Ok(ids)
            })
            .await
        }

        async fn fetch(&self, id: u32) -> Result<Vec<u8>> {
            self.with_session(move |session| {
                let messages = session
                    .fetch(id.to_string(), "RFC822")
                    .map_err(AppError::mailbox)?;
                messages
                    .iter()
                    .find_map(|m| m.body().map(<[u8]>::to_vec))
                    .ok_or_else(|| AppError::mailbox(format!("message {id} has no body")))
            })
            .await
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{StubMailbox, newsletter};
    use super::*;
    use crate::services::external::testing::StubScraper;
    use crate::services::testing::context;
    use crate::utils::http::testing::StubFetcher;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn source() -> SourceConfig {
        SourceConfig {
            name: "Newsletter".into(),
            email: Some("puzzles@example.com".into()),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_parse_message_with_attachment() {
        let raw = newsletter("Puzzle for Sunday", Some(("Sunday.PUZ", "PUZZLEBYTES")));
        let message = parse_message(&raw).unwrap();
        assert_eq!(message.subject, "Puzzle for Sunday");

        let (name, body) = message.attachment.unwrap();
        assert_eq!(name, "Sunday.PUZ");
        assert_eq!(body.trim_ascii(), b"PUZZLEBYTES");
    }

    #[test]
    fn test_parse_message_ignores_other_attachments() {
        let raw = newsletter("Newsletter", Some(("solution.pdf", "PDF")));
        assert_eq!(parse_message(&raw).unwrap().attachment, None);
    }

    #[tokio::test]
    async fn test_scan_saves_attachment_per_message() {
        let mailbox = Arc::new(
            StubMailbox::new()
                .with("puzzles@example.com", newsletter("Today", Some(("today.jpz", "XML"))))
                .with("puzzles@example.com", newsletter("Just news", None))
                .with("other@example.com", newsletter("Spam", None)),
        );
        let (ctx, tmp) = context(StubFetcher::new(), StubScraper::new());
        let ctx = ctx.with_mailbox(mailbox.clone());

        let records = MailboxScan.attempt(&ctx, &source(), day()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].page_title, "Today");
        assert_eq!(records[0].puzzle_file, Some(tmp.path().join("today.jpz")));
        assert_eq!(records[1].page_title, "Just news");
        assert!(!records[1].is_fetched());

        let searches = mailbox.searches();
        assert_eq!(
            searches,
            vec![(
                "puzzles@example.com".to_string(),
                NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
            )]
        );
    }

    #[tokio::test]
    async fn test_scan_without_mailbox_fails() {
        let (ctx, _tmp) = context(StubFetcher::new(), StubScraper::new());
        assert!(matches!(
            MailboxScan.attempt(&ctx, &source(), day()).await,
            Err(AppError::Mailbox(_))
        ));
    }
}
