//! Poll subcommands: list, show, vote.
//!
//! User-facing output uses writeln! to the given writer (stdout in the binary).

use std::io::Write;

use anyhow::{anyhow, bail};
use dialoguer::{Confirm, Select};
use time::OffsetDateTime;
use tracing::{info, warn};

use plenary_core::poll::{Alternative, AlternativeId, Poll, PollError, PollGateway, PollId};
use plenary_core::results::compute_results;
use plenary_core::{DeviceIdentity, FlowError, VoteSession, VoteState};

use crate::poll_fmt::{write_poll_detail, write_poll_table, write_results};

/// Poll subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum PollAction {
    /// List polls currently open for voting.
    List,
    /// Show one poll with its current results.
    Show {
        /// Poll ID.
        id: PollId,
    },
    /// Cast this device's vote. Votes cannot be changed afterwards.
    Vote {
        /// Poll ID.
        id: PollId,
        /// Alternative ID to vote for (prompts when omitted).
        #[arg(short, long)]
        alternative: Option<AlternativeId>,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Interactive decisions taken during a vote.
pub trait VotePrompt {
    /// Pick an alternative. `current` is the previous choice when returning
    /// to selection after a failed submit.
    fn choose_alternative(
        &mut self,
        poll: &Poll,
        current: Option<AlternativeId>,
    ) -> anyhow::Result<AlternativeId>;

    /// Final acknowledgement before the irrevocable submit.
    fn confirm_vote(&mut self, poll: &Poll, alternative: &Alternative) -> anyhow::Result<bool>;

    /// Whether to go back to selection after a retryable failure.
    fn offer_retry(&mut self, error: &PollError) -> anyhow::Result<bool>;
}

/// Terminal prompts, short-circuited by command-line flags.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    pub preset: Option<AlternativeId>,
    pub assume_yes: bool,
}

impl VotePrompt for TerminalPrompt {
    fn choose_alternative(
        &mut self,
        poll: &Poll,
        current: Option<AlternativeId>,
    ) -> anyhow::Result<AlternativeId> {
        if let Some(id) = self.preset.take() {
            return Ok(id);
        }
        if poll.alternatives.is_empty() {
            bail!("Poll #{} has no alternatives to vote for", poll.id);
        }
        let items: Vec<&str> = poll.alternatives.iter().map(|a| a.text.as_str()).collect();
        let default = current
            .and_then(|id| poll.alternatives.iter().position(|a| a.id == id))
            .unwrap_or(0);
        let selection = Select::new()
            .with_prompt(poll.title.as_str())
            .items(&items)
            .default(default)
            .interact()?;
        Ok(poll.alternatives[selection].id)
    }

    fn confirm_vote(&mut self, poll: &Poll, alternative: &Alternative) -> anyhow::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Vote \"{}\" on \"{}\"? Votes cannot be changed afterwards",
                alternative.text, poll.title
            ))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }

    fn offer_retry(&mut self, error: &PollError) -> anyhow::Result<bool> {
        if self.assume_yes {
            return Ok(false);
        }
        let retry = Confirm::new()
            .with_prompt(format!("{} Try again?", error.user_message()))
            .default(false)
            .interact()?;
        Ok(retry)
    }
}

/// Execute a polls subcommand.
pub async fn run<G: PollGateway>(
    gateway: &G,
    device: &DeviceIdentity,
    action: PollAction,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        PollAction::List => {
            let polls = gateway.list_active_polls().await?;
            write_poll_table(out, &polls)?;
        }
        PollAction::Show { id } => {
            let poll = gateway.get_poll(id).await?;
            let voted = gateway.has_voted(id, &device.device_id()).await;
            write_poll_detail(out, &poll, OffsetDateTime::now_utc())?;
            writeln!(out, "  Voted:    {}", if voted { "yes" } else { "no" })?;
            writeln!(out)?;
            write_results(out, &compute_results(&poll))?;
        }
        PollAction::Vote {
            id,
            alternative,
            yes,
        } => {
            let mut prompt = TerminalPrompt {
                preset: alternative,
                assume_yes: yes,
            };
            run_vote(gateway, device.device_id(), id, &mut prompt, out).await?;
        }
    }
    Ok(())
}

/// Drive one vote session to completion.
pub async fn run_vote<G: PollGateway>(
    gateway: &G,
    device_id: String,
    poll_id: PollId,
    prompt: &mut impl VotePrompt,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let poll = gateway.get_poll(poll_id).await?;
    let mut session = VoteSession::new(gateway, poll, device_id);
    session.start().await?;

    if let Some(results) = session.results() {
        writeln!(out, "This device has already voted on this poll.")?;
        write_results(out, results)?;
        return Ok(());
    }

    let mut current = None;
    loop {
        let choice = prompt.choose_alternative(session.poll(), current)?;
        session.select(choice)?;
        current = Some(choice);
        session.request_confirmation()?;
        let alternative = session
            .poll()
            .alternative(choice)
            .cloned()
            .ok_or_else(|| anyhow!("Alternative {choice} is not part of this poll"))?;
        if !prompt.confirm_vote(session.poll(), &alternative)? {
            session.cancel()?;
            writeln!(out, "Vote cancelled.")?;
            return Ok(());
        }

        let outcome = session.confirm().await.map(|_| ());
        match outcome {
            Ok(()) => {
                info!(poll_id, alternative = choice, "Vote submitted");
                writeln!(out, "Vote recorded for \"{}\".", alternative.text)?;
                if let Some(results) = session.results() {
                    write_results(out, results)?;
                }
                return Ok(());
            }
            Err(FlowError::Gateway(PollError::DuplicateVote(message))) => {
                writeln!(out, "{message}")?;
                if let Some(results) = session.results() {
                    write_results(out, results)?;
                }
                return Ok(());
            }
            Err(FlowError::Gateway(err))
                if matches!(session.state(), VoteState::Committed { .. }) =>
            {
                // The vote stands; only the tally fetch failed. One more try.
                warn!(poll_id, error = %err, "Results reload after vote failed");
                let refreshed = session.refresh_results().await.map(|_| ());
                match refreshed {
                    Ok(()) => {
                        writeln!(out, "Vote recorded for \"{}\".", alternative.text)?;
                        if let Some(results) = session.results() {
                            write_results(out, results)?;
                        }
                    }
                    Err(FlowError::Gateway(again)) => writeln!(
                        out,
                        "Vote recorded, but results could not be loaded: {}",
                        again.user_message()
                    )?,
                    Err(other) => return Err(other.into()),
                }
                return Ok(());
            }
            Err(FlowError::Gateway(err)) => {
                if err.is_retryable() && prompt.offer_retry(&err)? {
                    session.retry()?;
                    continue;
                }
                bail!("{}", err.user_message());
            }
            Err(other) => return Err(other.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use plenary_core::poll::{PollStatus, VoteAck};

    use super::*;

    struct StubGateway {
        poll: Mutex<Poll>,
        voters: Mutex<HashSet<String>>,
        failures: Mutex<Vec<PollError>>,
        failing_gets_after_vote: AtomicUsize,
        submits: AtomicUsize,
    }

    impl StubGateway {
        fn new() -> Self {
            Self {
                poll: Mutex::new(Poll {
                    id: 3,
                    title: "Farmers market location".into(),
                    description: None,
                    closing_time: OffsetDateTime::now_utc() + time::Duration::days(1),
                    status: PollStatus::Active,
                    attachment_url: None,
                    alternatives: vec![
                        Alternative {
                            id: 7,
                            text: "Central square".into(),
                            vote_count: 2,
                        },
                        Alternative {
                            id: 8,
                            text: "Riverside".into(),
                            vote_count: 2,
                        },
                    ],
                    total_votes: 4,
                    created_at: None,
                    updated_at: None,
                }),
                voters: Mutex::new(HashSet::new()),
                failures: Mutex::new(Vec::new()),
                failing_gets_after_vote: AtomicUsize::new(0),
                submits: AtomicUsize::new(0),
            }
        }
    }

    impl PollGateway for StubGateway {
        async fn list_active_polls(&self) -> Result<Vec<Poll>, PollError> {
            Ok(vec![self.poll.lock().unwrap().clone()])
        }

        async fn get_poll(&self, _poll_id: PollId) -> Result<Poll, PollError> {
            if self.submits.load(Ordering::SeqCst) > 0
                && self
                    .failing_gets_after_vote
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(PollError::Network("connection reset".into()));
            }
            Ok(self.poll.lock().unwrap().clone())
        }

        async fn has_voted(&self, _poll_id: PollId, device_id: &str) -> bool {
            self.voters.lock().unwrap().contains(device_id)
        }

        async fn submit_vote(
            &self,
            _poll_id: PollId,
            alternative_id: AlternativeId,
            device_id: &str,
        ) -> Result<VoteAck, PollError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            if !self.voters.lock().unwrap().insert(device_id.to_string()) {
                return Err(PollError::DuplicateVote("Already voted".into()));
            }
            let mut poll = self.poll.lock().unwrap();
            for alt in &mut poll.alternatives {
                if alt.id == alternative_id {
                    alt.vote_count += 1;
                }
            }
            poll.total_votes += 1;
            Ok(VoteAck::default())
        }
    }

    /// Scripted answers in place of the terminal.
    /// The last entry in `choices` repeats once the others are used up.
    struct Scripted {
        choices: Vec<AlternativeId>,
        confirm: bool,
        retry: bool,
        retries_offered: usize,
        previous_choices: Vec<Option<AlternativeId>>,
    }

    impl Scripted {
        fn new(choice: AlternativeId, confirm: bool) -> Self {
            Self {
                choices: vec![choice],
                confirm,
                retry: false,
                retries_offered: 0,
                previous_choices: Vec::new(),
            }
        }
    }

    impl VotePrompt for Scripted {
        fn choose_alternative(
            &mut self,
            _poll: &Poll,
            current: Option<AlternativeId>,
        ) -> anyhow::Result<AlternativeId> {
            self.previous_choices.push(current);
            if self.choices.len() > 1 {
                Ok(self.choices.remove(0))
            } else {
                Ok(self.choices[0])
            }
        }

        fn confirm_vote(&mut self, _poll: &Poll, _alt: &Alternative) -> anyhow::Result<bool> {
            Ok(self.confirm)
        }

        fn offer_retry(&mut self, _error: &PollError) -> anyhow::Result<bool> {
            self.retries_offered += 1;
            Ok(std::mem::replace(&mut self.retry, false))
        }
    }

    async fn vote(gw: &StubGateway, prompt: &mut Scripted) -> (anyhow::Result<()>, String) {
        let mut out = Vec::new();
        let result = run_vote(gw, "device-1-abcdefghi".into(), 3, prompt, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn confirmed_vote_prints_results() {
        let gw = StubGateway::new();
        let (result, text) = vote(&gw, &mut Scripted::new(8, true)).await;
        result.unwrap();
        assert!(text.contains("Vote recorded for \"Riverside\""), "{text}");
        assert!(text.contains("Total votes: 5"), "{text}");
    }

    #[tokio::test]
    async fn declined_confirmation_submits_nothing() {
        let gw = StubGateway::new();
        let (result, text) = vote(&gw, &mut Scripted::new(7, false)).await;
        result.unwrap();
        assert_eq!(text, "Vote cancelled.\n");
        assert_eq!(gw.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn already_voted_device_sees_results_only() {
        let gw = StubGateway::new();
        gw.voters.lock().unwrap().insert("device-1-abcdefghi".into());
        let (result, text) = vote(&gw, &mut Scripted::new(7, true)).await;
        result.unwrap();
        assert!(text.starts_with("This device has already voted"));
        assert_eq!(gw.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_alternative_is_an_error() {
        let gw = StubGateway::new();
        let (result, _) = vote(&gw, &mut Scripted::new(99, true)).await;
        assert!(result.unwrap_err().to_string().contains("99"));
        assert_eq!(gw.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_failure_retries_only_when_asked() {
        let gw = StubGateway::new();
        gw.failures
            .lock()
            .unwrap()
            .push(PollError::Network("timed out".into()));
        let mut prompt = Scripted::new(7, true);
        prompt.retry = true;
        let (result, text) = vote(&gw, &mut prompt).await;
        result.unwrap();
        assert_eq!(prompt.retries_offered, 1);
        assert_eq!(gw.submits.load(Ordering::SeqCst), 2);
        assert!(text.contains("Vote recorded"));
    }

    #[tokio::test]
    async fn retry_lets_the_voter_pick_again() {
        let gw = StubGateway::new();
        gw.failures
            .lock()
            .unwrap()
            .push(PollError::Server {
                status: 503,
                message: "Unavailable".into(),
            });
        let mut prompt = Scripted::new(7, true);
        prompt.choices = vec![7, 8];
        prompt.retry = true;
        let (result, text) = vote(&gw, &mut prompt).await;
        result.unwrap();
        assert_eq!(prompt.previous_choices, vec![None, Some(7)]);
        assert!(text.contains("Vote recorded for \"Riverside\""), "{text}");
        let poll = gw.poll.lock().unwrap();
        assert_eq!(poll.alternatives[0].vote_count, 2);
        assert_eq!(poll.alternatives[1].vote_count, 3);
    }

    #[tokio::test]
    async fn failed_results_reload_is_tried_once_more() {
        let gw = StubGateway::new();
        gw.failing_gets_after_vote.store(1, Ordering::SeqCst);
        let (result, text) = vote(&gw, &mut Scripted::new(7, true)).await;
        result.unwrap();
        assert!(text.contains("Vote recorded for \"Central square\""), "{text}");
        assert!(text.contains("Total votes: 5"), "{text}");
        assert_eq!(gw.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn results_unavailable_after_vote_still_reports_success() {
        let gw = StubGateway::new();
        gw.failing_gets_after_vote.store(2, Ordering::SeqCst);
        let (result, text) = vote(&gw, &mut Scripted::new(7, true)).await;
        result.unwrap();
        assert!(
            text.starts_with("Vote recorded, but results could not be loaded"),
            "{text}"
        );
        assert_eq!(gw.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_poll_is_reported_without_retry() {
        let gw = StubGateway::new();
        gw.failures
            .lock()
            .unwrap()
            .push(PollError::PollClosed("This poll is closed".into()));
        let mut prompt = Scripted::new(7, true);
        let (result, _) = vote(&gw, &mut prompt).await;
        assert_eq!(result.unwrap_err().to_string(), "This poll is closed");
        assert_eq!(prompt.retries_offered, 0);
        assert_eq!(gw.submits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn preset_alternative_skips_selection() {
        let gw = StubGateway::new();
        let poll = gw.poll.lock().unwrap().clone();
        let mut prompt = TerminalPrompt {
            preset: Some(8),
            assume_yes: true,
        };
        assert_eq!(prompt.choose_alternative(&poll, None).unwrap(), 8);
        assert!(prompt.confirm_vote(&poll, &poll.alternatives[1]).unwrap());
        assert!(!prompt
            .offer_retry(&PollError::Network("reset".into()))
            .unwrap());
    }
}
