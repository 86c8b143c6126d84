use std::{pin::Pin, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, Sleep},
};

use crate::{
    models::UserProfile,
    profile::ProfileService,
    questions::QuestionSource,
    websocket::messages::ServerMessage,
};

use super::{Effect, QuizError, QuizEvent, QuizSession, QuizSettings, QuizSummary, TimerId};

/// Length of one countdown step
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Player input forwarded to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCommand {
    Select(usize),
    Skip,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(QuizSummary),
    /// The player left before the end; nothing was awarded
    Abandoned,
    Failed(QuizError),
}

/// The single timer a session may have running
enum PendingTimer {
    Idle,
    Countdown { timer: TimerId, interval: Interval },
    Settle { timer: TimerId, sleep: Pin<Box<Sleep>> },
}

impl PendingTimer {
    fn id(&self) -> Option<TimerId> {
        match self {
            PendingTimer::Idle => None,
            PendingTimer::Countdown { timer, .. } | PendingTimer::Settle { timer, .. } => {
                Some(*timer)
            }
        }
    }
}

/// Drives one [`QuizSession`] on a tokio task.
///
/// Player commands and timer events are handled one at a time in a single
/// loop. Dropping the command sender ends the session and its countdown.
pub struct QuizRunner {
    session: QuizSession,
    source: Arc<dyn QuestionSource>,
    profiles: ProfileService,
    outbox: mpsc::Sender<ServerMessage>,
    awarded: Option<UserProfile>,
}

impl QuizRunner {
    pub fn new(
        stage_id: impl Into<String>,
        settings: QuizSettings,
        source: Arc<dyn QuestionSource>,
        profiles: ProfileService,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            session: QuizSession::new(stage_id, settings),
            source,
            profiles,
            outbox,
            awarded: None,
        }
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<QuizCommand>) -> RunOutcome {
        let session_id = self.session.id();
        let stage_id = self.session.stage_id().to_string();
        tracing::info!("Starting quiz session {} on stage '{}'", session_id, stage_id);

        self.send(ServerMessage::SessionStarted {
            session_id,
            stage_id: stage_id.clone(),
        })
        .await;

        let loaded = {
            let load = self.source.load_stage(&stage_id);
            tokio::pin!(load);
            loop {
                tokio::select! {
                    result = &mut load => break result,
                    command = commands.recv() => match command {
                        Some(command) => {
                            tracing::debug!(
                                "Session {} ignoring {:?} while loading",
                                session_id,
                                command
                            );
                        }
                        None => {
                            tracing::info!("Quiz session {} left while loading", session_id);
                            return RunOutcome::Abandoned;
                        }
                    },
                }
            }
        };

        let questions = match loaded {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!("Quiz session {} could not load questions: {}", session_id, e);
                self.send(ServerMessage::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                })
                .await;
                return RunOutcome::Failed(e);
            }
        };

        let mut pending = PendingTimer::Idle;
        self.apply(QuizEvent::QuestionsLoaded(questions), &mut pending).await;

        while !self.session.is_completed() {
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Some(QuizCommand::Select(choice)) => QuizEvent::Select(choice),
                    Some(QuizCommand::Skip) => QuizEvent::Skip,
                    None => {
                        tracing::info!(
                            "Quiz session {} abandoned at question {} ({:?}, {}s left)",
                            session_id,
                            self.session.current_index() + 1,
                            self.session.phase(),
                            self.session.time_remaining()
                        );
                        return RunOutcome::Abandoned;
                    }
                },
                event = next_timer_event(&mut pending) => event,
            };
            self.apply(event, &mut pending).await;
        }

        RunOutcome::Completed(self.session.summary())
    }

    async fn apply(&mut self, event: QuizEvent, pending: &mut PendingTimer) {
        match self.session.handle(event) {
            Ok(effects) => {
                for effect in effects {
                    self.perform(effect, pending).await;
                }
            }
            Err(e) => {
                tracing::debug!("Session {} rejected input: {}", self.session.id(), e);
                self.send(ServerMessage::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                })
                .await;
            }
        }
    }

    async fn perform(&mut self, effect: Effect, pending: &mut PendingTimer) {
        match effect {
            Effect::Present(question) => {
                self.send(ServerMessage::Question { question }).await;
            }
            Effect::StartCountdown { timer, .. } => {
                let interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
                *pending = PendingTimer::Countdown { timer, interval };
            }
            Effect::CountdownTick { remaining } => {
                self.send(ServerMessage::Tick {
                    time_remaining: remaining,
                })
                .await;
            }
            Effect::CancelTimer(timer) => {
                if pending.id() == Some(timer) {
                    *pending = PendingTimer::Idle;
                }
            }
            Effect::AnswerJudged {
                choice,
                correct,
                score,
            } => {
                self.send(ServerMessage::AnswerResult {
                    choice,
                    correct,
                    score,
                })
                .await;
            }
            Effect::ScheduleAdvance { timer, delay } => {
                *pending = PendingTimer::Settle {
                    timer,
                    sleep: Box::pin(time::sleep(delay)),
                };
            }
            Effect::AwardExperience(points) => match self.profiles.award_experience(points) {
                Ok(profile) => self.awarded = Some(profile),
                Err(e) => {
                    tracing::error!("Failed to award {} xp: {}", points, e);
                    self.send(ServerMessage::Error {
                        message: "failed to save progress".to_string(),
                        retryable: false,
                    })
                    .await;
                }
            },
            Effect::Completed(summary) => {
                *pending = PendingTimer::Idle;
                let profile = match self.awarded.take() {
                    Some(profile) => profile,
                    None => self.profiles.get_or_init().unwrap_or_default(),
                };
                self.send(ServerMessage::QuizCompleted {
                    score: summary.score,
                    correct_answers: summary.correct_answers,
                    total_questions: summary.total_questions,
                    level: profile.level,
                    experience: profile.experience,
                    games_played: profile.games_played,
                })
                .await;
            }
        }
    }

    async fn send(&self, message: ServerMessage) {
        if self.outbox.send(message).await.is_err() {
            tracing::debug!("Session {} outbox closed", self.session.id());
        }
    }
}

/// Wait for the running timer, if any
async fn next_timer_event(pending: &mut PendingTimer) -> QuizEvent {
    match pending {
        PendingTimer::Countdown { timer, interval } => {
            interval.tick().await;
            QuizEvent::Tick(*timer)
        }
        PendingTimer::Settle { timer, sleep } => {
            let timer = *timer;
            sleep.as_mut().await;
            *pending = PendingTimer::Idle;
            QuizEvent::SettleElapsed(timer)
        }
        PendingTimer::Idle => std::future::pending().await,
    }
}
