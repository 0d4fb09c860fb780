//! Work that happens after the request that asked for it has finished.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::db::Store;
use crate::email::reset_password::MigratedMemberEmail;
use crate::email::{Email, EmailMessage, Mailer};
use crate::error::{GigoError, GigoResult};
use crate::models::band::Band;
use crate::models::member::{Member, PasswordReset};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Job {
    /// Welcome a member created by a band migration and ask them to set a password.
    MigratedMemberPasswordReset { band: i64, member: i64 },
    SendEmails(Vec<EmailMessage>),
}

/// Somewhere to hand off jobs without waiting for them to run.
pub trait TaskQueue: Send + Sync {
    fn submit(&self, job: Job) -> GigoResult<()>;
}

/// Feeds jobs to a [JobRunner] on a background tokio task.
pub struct ChannelTaskQueue {
    sender: UnboundedSender<Job>,
}

impl ChannelTaskQueue {
    /// Must be called from within a tokio runtime.
    pub fn start(runner: JobRunner) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(runner.run(receiver));

        Self { sender }
    }
}

impl TaskQueue for ChannelTaskQueue {
    fn submit(&self, job: Job) -> GigoResult<()> {
        self.sender.send(job).map_err(|_| GigoError::QueueClosed)
    }
}

pub struct JobRunner {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl JobRunner {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, base_url: String) -> Self {
        Self {
            store,
            mailer,
            base_url,
        }
    }

    pub async fn run(self, mut jobs: UnboundedReceiver<Job>) {
        while let Some(job) = jobs.recv().await {
            if let Err(error) = self.execute(job).await {
                tracing::error!(?error, "background job failed");
            }
        }

        tracing::info!("task queue closed");
    }

    pub async fn execute(&self, job: Job) -> GigoResult<()> {
        match job {
            Job::MigratedMemberPasswordReset { band, member } => {
                self.send_migrated_member_email(band, member).await
            }
            Job::SendEmails(messages) => {
                let total = messages.len();
                let sent = self.send_all(messages).await;
                tracing::info!(sent, failed = total - sent, "sent email batch");
                Ok(())
            }
        }
    }

    async fn send_migrated_member_email(&self, band_id: i64, member_id: i64) -> GigoResult<()> {
        let store = self.store.as_ref();
        let band = Band::with_id(band_id, store).await?;
        let member = Member::with_id(member_id, store).await?;
        let token = PasswordReset::generate(member.id, store).await?;

        let email = MigratedMemberEmail {
            member: &member,
            band: &band,
            reset_url: format!("{}/member/reset/{}", self.base_url, token),
        }
        .compose()?;
        self.mailer.send(&email).await?;
        tracing::info!(member = member.id, band = band.id, "sent password reset to migrated member");

        Ok(())
    }

    /// Sends every message, returning how many made it out.
    async fn send_all(&self, messages: Vec<EmailMessage>) -> usize {
        let mut sent = 0;
        for message in messages {
            match self.mailer.send(&message).await {
                Ok(()) => sent += 1,
                Err(error) => {
                    tracing::warn!(to = %message.to, ?error, "failed to send email");
                }
            }
        }

        sent
    }
}

/// Keeps submitted jobs in memory instead of running them.
#[derive(Default)]
pub struct RecordingTaskQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingTaskQueue {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs
            .lock()
            .map(|jobs| jobs.clone())
            .unwrap_or_default()
    }
}

impl TaskQueue for RecordingTaskQueue {
    fn submit(&self, job: Job) -> GigoResult<()> {
        self.jobs
            .lock()
            .map_err(|_| GigoError::QueueClosed)?
            .push(job);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex as AsyncMutex;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::email::EmailAddress;
    use crate::tests::mock::seed_band_with_member;

    #[derive(Default)]
    struct FlakyMailer {
        sent: AsyncMutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, message: &EmailMessage) -> GigoResult<()> {
            if message.to.address.starts_with("bounce") {
                return Err(GigoError::Mail("mailbox unavailable".to_owned()));
            }

            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    fn message_to(address: &str) -> EmailMessage {
        EmailMessage {
            to: EmailAddress {
                name: "Someone".to_owned(),
                address: address.to_owned(),
            },
            reply_to: None,
            subject: "Reminder: Parade".to_owned(),
            body: "<p>hi</p>".to_owned(),
        }
    }

    #[tokio::test]
    async fn failed_messages_do_not_stop_the_batch() {
        let store = Arc::new(MemoryStore::default());
        let mailer = Arc::new(FlakyMailer::default());
        let runner = JobRunner::new(store, mailer.clone(), "https://gigs.example.com".to_owned());

        runner
            .execute(Job::SendEmails(vec![
                message_to("first@x.com"),
                message_to("bounce@x.com"),
                message_to("last@x.com"),
            ]))
            .await
            .unwrap();

        let sent = mailer.sent.lock().await;
        let recipients: Vec<_> = sent.iter().map(|m| m.to.address.as_str()).collect();
        assert_eq!(recipients, vec!["first@x.com", "last@x.com"]);
    }

    #[tokio::test]
    async fn migrated_members_get_a_reset_link() {
        let store = Arc::new(MemoryStore::default());
        let seeded = seed_band_with_member(store.as_ref(), "Brass Band", "tuba@x.com").await;
        let mailer = Arc::new(FlakyMailer::default());
        let runner = JobRunner::new(
            store.clone(),
            mailer.clone(),
            "https://gigs.example.com".to_owned(),
        );

        runner
            .execute(Job::MigratedMemberPasswordReset {
                band: seeded.band.id,
                member: seeded.member.id,
            })
            .await
            .unwrap();

        let tokens = store.password_resets_for(seeded.member.id).await;
        assert_eq!(tokens.len(), 1);
        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.address, "tuba@x.com");
        assert!(sent[0]
            .body
            .contains(&format!("https://gigs.example.com/member/reset/{}", tokens[0])));
    }

    #[tokio::test]
    async fn channel_queue_runs_jobs_in_the_background() {
        let store = Arc::new(MemoryStore::default());
        let mailer = Arc::new(FlakyMailer::default());
        let queue = ChannelTaskQueue::start(JobRunner::new(
            store,
            mailer.clone(),
            "https://gigs.example.com".to_owned(),
        ));

        queue
            .submit(Job::SendEmails(vec![message_to("first@x.com")]))
            .unwrap();

        for _ in 0..50 {
            if !mailer.sent.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[test]
    fn recording_queue_keeps_jobs_in_order() {
        let queue = RecordingTaskQueue::default();
        queue
            .submit(Job::MigratedMemberPasswordReset { band: 1, member: 2 })
            .unwrap();
        queue.submit(Job::SendEmails(vec![])).unwrap();

        assert_eq!(
            queue.jobs(),
            vec![
                Job::MigratedMemberPasswordReset { band: 1, member: 2 },
                Job::SendEmails(vec![]),
            ]
        );
    }
}
