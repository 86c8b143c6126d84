use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Question;

use super::{QuizError, Scorer};

/// Seconds a player gets for each question
pub const QUESTION_TIME_BUDGET: u32 = 20;
/// Pause between a judged answer and the next question
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Identifies one started timer (countdown or settle delay).
/// Timer events carrying an id other than the active one are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum QuizPhase {
    AwaitingQuestions,
    Presenting { index: usize },
    /// An answer was accepted, waiting for the settle delay
    Locked { index: usize },
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    pub time_budget: u32,
    pub settle_delay: Duration,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            time_budget: QUESTION_TIME_BUDGET,
            settle_delay: SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    QuestionsLoaded(Vec<Question>),
    Select(usize),
    Skip,
    /// One second of the countdown elapsed
    Tick(TimerId),
    SettleElapsed(TimerId),
}

/// Side effects the driver must perform after a transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Present(QuestionView),
    StartCountdown { timer: TimerId, seconds: u32 },
    CountdownTick { remaining: u32 },
    CancelTimer(TimerId),
    AnswerJudged { choice: usize, correct: bool, score: u32 },
    ScheduleAdvance { timer: TimerId, delay: Duration },
    AwardExperience(u32),
    Completed(QuizSummary),
}

/// Everything needed to show the current question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_media: Option<String>,
    pub time_remaining: u32,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub score: u32,
    pub correct_answers: u32,
    pub total_questions: usize,
}

/// One play-through of a stage.
///
/// All state changes go through [`QuizSession::handle`], which returns the
/// effects to perform instead of performing them.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    stage_id: String,
    settings: QuizSettings,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    input_locked: bool,
    time_remaining: u32,
    phase: QuizPhase,
    active_timer: Option<TimerId>,
    timers_issued: u64,
}

impl QuizSession {
    pub fn new(stage_id: impl Into<String>, settings: QuizSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_id: stage_id.into(),
            settings,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            input_locked: false,
            time_remaining: settings.time_budget,
            phase: QuizPhase::AwaitingQuestions,
            active_timer: None,
            timers_issued: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[cfg(test)]
    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn active_timer(&self) -> Option<TimerId> {
        self.active_timer
    }

    pub fn is_completed(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            score: self.score,
            correct_answers: Scorer::correct_answers(self.score),
            total_questions: self.questions.len(),
        }
    }

    /// Apply one event and return the effects it produced.
    ///
    /// Events that do not apply to the current phase (a selection while
    /// locked, a stale timer, anything after completion) produce no effects.
    pub fn handle(&mut self, event: QuizEvent) -> Result<Vec<Effect>, QuizError> {
        match event {
            QuizEvent::QuestionsLoaded(questions) => Ok(self.on_loaded(questions)),
            QuizEvent::Select(choice) => self.on_select(choice),
            QuizEvent::Skip => Ok(self.on_skip()),
            QuizEvent::Tick(timer) => Ok(self.on_tick(timer)),
            QuizEvent::SettleElapsed(timer) => Ok(self.on_settle(timer)),
        }
    }

    fn on_loaded(&mut self, questions: Vec<Question>) -> Vec<Effect> {
        if self.phase != QuizPhase::AwaitingQuestions {
            tracing::debug!("Session {} already has questions", self.id);
            return Vec::new();
        }

        self.questions = questions;
        if self.questions.is_empty() {
            return self.complete();
        }
        self.present(0)
    }

    fn on_select(&mut self, choice: usize) -> Result<Vec<Effect>, QuizError> {
        let QuizPhase::Presenting { index } = self.phase else {
            tracing::debug!("Session {} ignoring selection in {:?}", self.id, self.phase);
            return Ok(Vec::new());
        };
        if self.input_locked {
            return Ok(Vec::new());
        }

        let question = &self.questions[index];
        if choice >= question.choices.len() {
            return Err(QuizError::InvalidSelection {
                choice,
                choices: question.choices.len(),
            });
        }

        let correct = question.is_correct(choice);
        self.input_locked = true;
        self.score += Scorer::points_for(correct);
        self.phase = QuizPhase::Locked { index };

        let mut effects = self.cancel_active_timer();
        effects.push(Effect::AnswerJudged {
            choice,
            correct,
            score: self.score,
        });

        let timer = self.issue_timer();
        effects.push(Effect::ScheduleAdvance {
            timer,
            delay: self.settings.settle_delay,
        });
        Ok(effects)
    }

    fn on_skip(&mut self) -> Vec<Effect> {
        match self.phase {
            QuizPhase::Presenting { .. } | QuizPhase::Locked { .. } => {
                let mut effects = self.cancel_active_timer();
                effects.extend(self.advance());
                effects
            }
            QuizPhase::AwaitingQuestions | QuizPhase::Completed => Vec::new(),
        }
    }

    fn on_tick(&mut self, timer: TimerId) -> Vec<Effect> {
        let presenting = matches!(self.phase, QuizPhase::Presenting { .. });
        if !presenting || self.active_timer != Some(timer) {
            tracing::debug!("Session {} ignoring stale tick {:?}", self.id, timer);
            return Vec::new();
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return vec![Effect::CountdownTick {
                remaining: self.time_remaining,
            }];
        }

        let mut effects = vec![Effect::CountdownTick { remaining: 0 }];
        effects.extend(self.cancel_active_timer());
        effects.extend(self.advance());
        effects
    }

    fn on_settle(&mut self, timer: TimerId) -> Vec<Effect> {
        if !matches!(self.phase, QuizPhase::Locked { .. }) || self.active_timer != Some(timer) {
            tracing::debug!("Session {} ignoring stale settle timer {:?}", self.id, timer);
            return Vec::new();
        }

        self.active_timer = None;
        self.advance()
    }

    fn advance(&mut self) -> Vec<Effect> {
        self.input_locked = false;
        self.current_index += 1;
        if self.current_index < self.questions.len() {
            self.present(self.current_index)
        } else {
            self.complete()
        }
    }

    fn present(&mut self, index: usize) -> Vec<Effect> {
        self.current_index = index;
        self.phase = QuizPhase::Presenting { index };
        self.time_remaining = self.settings.time_budget;

        let question = &self.questions[index];
        let view = QuestionView {
            index,
            total: self.questions.len(),
            text: question.text.clone(),
            choices: question.choices.clone(),
            hint: question.hint.clone(),
            sign_media: question.sign_media.clone(),
            time_remaining: self.time_remaining,
            score: self.score,
        };

        let timer = self.issue_timer();
        vec![
            Effect::Present(view),
            Effect::StartCountdown {
                timer,
                seconds: self.settings.time_budget,
            },
        ]
    }

    fn complete(&mut self) -> Vec<Effect> {
        self.phase = QuizPhase::Completed;
        self.input_locked = false;
        self.active_timer = None;
        tracing::info!(
            "Session {} on stage '{}' completed with score {}",
            self.id,
            self.stage_id,
            self.score
        );
        vec![
            Effect::AwardExperience(self.score),
            Effect::Completed(self.summary()),
        ]
    }

    fn issue_timer(&mut self) -> TimerId {
        self.timers_issued += 1;
        let timer = TimerId(self.timers_issued);
        self.active_timer = Some(timer);
        timer
    }

    fn cancel_active_timer(&mut self) -> Vec<Effect> {
        self.active_timer
            .take()
            .map(Effect::CancelTimer)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: usize) -> Question {
        Question {
            text: format!("question with answer {}", correct_index),
            choices: vec!["a".into(), "b".into(), "c".into()],
            correct_index,
            hint: None,
            sign_media: None,
        }
    }

    fn loaded_session(count: usize) -> (QuizSession, Vec<Effect>) {
        let mut session = QuizSession::new("stage1", QuizSettings::default());
        let questions = (0..count).map(|i| question(i % 3)).collect();
        let effects = session.handle(QuizEvent::QuestionsLoaded(questions)).unwrap();
        (session, effects)
    }

    fn awards(effects: &[Effect]) -> Vec<u32> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::AwardExperience(points) => Some(*points),
                _ => None,
            })
            .collect()
    }

    fn correct_choice(session: &QuizSession) -> usize {
        session.current_index() % 3
    }

    fn wrong_choice(session: &QuizSession) -> usize {
        (session.current_index() + 1) % 3
    }

    /// Answer, then let the settle delay elapse
    fn answer(session: &mut QuizSession, choice: usize) -> Vec<Effect> {
        let mut effects = session.handle(QuizEvent::Select(choice)).unwrap();
        let timer = session.active_timer().expect("settle timer scheduled");
        effects.extend(session.handle(QuizEvent::SettleElapsed(timer)).unwrap());
        effects
    }

    /// Let the countdown run out
    fn time_out(session: &mut QuizSession) -> Vec<Effect> {
        let timer = session.active_timer().expect("countdown running");
        let mut effects = Vec::new();
        for _ in 0..QUESTION_TIME_BUDGET {
            effects.extend(session.handle(QuizEvent::Tick(timer)).unwrap());
        }
        effects
    }

    #[test]
    fn test_loading_presents_first_question_with_full_countdown() {
        let (session, effects) = loaded_session(2);

        assert_eq!(session.phase(), QuizPhase::Presenting { index: 0 });
        assert_eq!(session.time_remaining(), QUESTION_TIME_BUDGET);
        assert!(matches!(&effects[0], Effect::Present(view) if view.index == 0 && view.total == 2));
        assert!(matches!(
            effects[1],
            Effect::StartCountdown { seconds: QUESTION_TIME_BUDGET, .. }
        ));
    }

    #[test]
    fn test_empty_stage_completes_immediately_with_zero() {
        let (session, effects) = loaded_session(0);

        assert!(session.is_completed());
        assert_eq!(awards(&effects), vec![0]);
        assert!(matches!(
            effects.last(),
            Some(Effect::Completed(QuizSummary { score: 0, total_questions: 0, .. }))
        ));
    }

    #[test]
    fn test_two_correct_answers_score_twenty() {
        let (mut session, _) = loaded_session(2);
        let mut effects = Vec::new();

        let choice = correct_choice(&session);
        effects.extend(answer(&mut session, choice));
        let choice = correct_choice(&session);
        effects.extend(answer(&mut session, choice));

        assert!(session.is_completed());
        assert_eq!(session.score(), 20);
        assert_eq!(awards(&effects), vec![20]);
    }

    #[test]
    fn test_skip_then_timeout_scores_zero() {
        let (mut session, _) = loaded_session(2);
        let mut effects = session.handle(QuizEvent::Skip).unwrap();
        effects.extend(time_out(&mut session));

        assert!(session.is_completed());
        assert_eq!(awards(&effects), vec![0]);
    }

    #[test]
    fn test_selection_locks_then_scores_then_schedules_advance() {
        let (mut session, _) = loaded_session(2);
        let countdown = session.active_timer().unwrap();
        let choice = correct_choice(&session);

        let effects = session.handle(QuizEvent::Select(choice)).unwrap();

        assert!(session.input_locked());
        assert_eq!(session.phase(), QuizPhase::Locked { index: 0 });
        assert_eq!(effects[0], Effect::CancelTimer(countdown));
        assert_eq!(
            effects[1],
            Effect::AnswerJudged {
                choice,
                correct: true,
                score: 10
            }
        );
        assert!(matches!(
            effects[2],
            Effect::ScheduleAdvance { delay, .. } if delay == SETTLE_DELAY
        ));
    }

    #[test]
    fn test_second_selection_while_locked_is_ignored() {
        let (mut session, _) = loaded_session(2);
        let choice = correct_choice(&session);
        session.handle(QuizEvent::Select(choice)).unwrap();

        let effects = session.handle(QuizEvent::Select(choice)).unwrap();
        assert!(effects.is_empty());
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_wrong_answer_scores_nothing() {
        let (mut session, _) = loaded_session(1);
        let choice = wrong_choice(&session);
        let effects = answer(&mut session, choice);

        assert!(effects.contains(&Effect::AnswerJudged {
            choice,
            correct: false,
            score: 0
        }));
        assert_eq!(awards(&effects), vec![0]);
    }

    #[test]
    fn test_out_of_range_selection_is_rejected_without_mutation() {
        let (mut session, _) = loaded_session(1);

        let err = session.handle(QuizEvent::Select(3)).unwrap_err();
        assert!(matches!(err, QuizError::InvalidSelection { choice: 3, choices: 3 }));
        assert!(!session.input_locked());
        assert_eq!(session.score(), 0);
        assert_eq!(session.phase(), QuizPhase::Presenting { index: 0 });

        // Still answerable afterwards
        let choice = correct_choice(&session);
        answer(&mut session, choice);
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_skip_while_locked_advances_without_extra_score() {
        let (mut session, _) = loaded_session(2);
        let choice = correct_choice(&session);
        session.handle(QuizEvent::Select(choice)).unwrap();
        let settle = session.active_timer().unwrap();

        let effects = session.handle(QuizEvent::Skip).unwrap();
        assert_eq!(effects[0], Effect::CancelTimer(settle));
        assert_eq!(session.phase(), QuizPhase::Presenting { index: 1 });
        assert!(!session.input_locked());

        // The old settle timer must not advance the new question
        assert!(session.handle(QuizEvent::SettleElapsed(settle)).unwrap().is_empty());
        assert_eq!(session.phase(), QuizPhase::Presenting { index: 1 });
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_stale_tick_after_skip_does_not_double_advance() {
        let (mut session, _) = loaded_session(3);
        let first_countdown = session.active_timer().unwrap();

        session.handle(QuizEvent::Skip).unwrap();
        for _ in 0..QUESTION_TIME_BUDGET {
            assert!(session.handle(QuizEvent::Tick(first_countdown)).unwrap().is_empty());
        }

        assert_eq!(session.phase(), QuizPhase::Presenting { index: 1 });
        assert_eq!(session.time_remaining(), QUESTION_TIME_BUDGET);
    }

    #[test]
    fn test_new_question_resets_countdown() {
        let (mut session, _) = loaded_session(2);
        let timer = session.active_timer().unwrap();
        for _ in 0..5 {
            session.handle(QuizEvent::Tick(timer)).unwrap();
        }
        assert_eq!(session.time_remaining(), QUESTION_TIME_BUDGET - 5);

        let effects = session.handle(QuizEvent::Skip).unwrap();
        assert_eq!(session.time_remaining(), QUESTION_TIME_BUDGET);
        assert_ne!(session.active_timer(), Some(timer));
        assert!(effects.contains(&Effect::CancelTimer(timer)));
    }

    #[test]
    fn test_countdown_expiry_stops_timer_and_advances() {
        let (mut session, _) = loaded_session(2);
        let timer = session.active_timer().unwrap();

        let effects = time_out(&mut session);

        assert!(effects.contains(&Effect::CountdownTick { remaining: 0 }));
        assert!(effects.contains(&Effect::CancelTimer(timer)));
        assert_eq!(session.phase(), QuizPhase::Presenting { index: 1 });
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_completed_session_ignores_everything() {
        let (mut session, _) = loaded_session(1);
        session.handle(QuizEvent::Skip).unwrap();
        assert!(session.is_completed());

        assert!(session.handle(QuizEvent::Skip).unwrap().is_empty());
        assert!(session.handle(QuizEvent::Select(0)).unwrap().is_empty());
        assert!(session
            .handle(QuizEvent::QuestionsLoaded(vec![question(0)]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_events_before_questions_load_are_ignored() {
        let mut session = QuizSession::new("stage1", QuizSettings::default());
        assert!(session.handle(QuizEvent::Skip).unwrap().is_empty());
        assert!(session.handle(QuizEvent::Select(0)).unwrap().is_empty());
        assert_eq!(session.phase(), QuizPhase::AwaitingQuestions);
    }

    #[derive(Debug, Clone, Copy)]
    enum Move {
        Correct,
        Wrong,
        Skip,
        Timeout,
    }

    const MOVES: [Move; 4] = [Move::Correct, Move::Wrong, Move::Skip, Move::Timeout];

    fn all_plays(len: usize) -> Vec<Vec<Move>> {
        (0..len).fold(vec![Vec::new()], |plays, _| {
            plays
                .into_iter()
                .flat_map(|play| {
                    MOVES.iter().map(move |m| {
                        let mut next = play.clone();
                        next.push(*m);
                        next
                    })
                })
                .collect()
        })
    }

    #[test]
    fn test_every_play_completes_once_with_ten_per_correct_answer() {
        for count in 0..=4 {
            for play in all_plays(count) {
                let (mut session, mut effects) = loaded_session(count);

                for step in &play {
                    let produced = match step {
                        Move::Correct => {
                            let choice = correct_choice(&session);
                            answer(&mut session, choice)
                        }
                        Move::Wrong => {
                            let choice = wrong_choice(&session);
                            answer(&mut session, choice)
                        }
                        Move::Skip => session.handle(QuizEvent::Skip).unwrap(),
                        Move::Timeout => time_out(&mut session),
                    };
                    effects.extend(produced);
                }

                let correct = play.iter().filter(|m| matches!(m, Move::Correct)).count() as u32;
                assert!(session.is_completed(), "play {:?} did not complete", play);
                assert_eq!(awards(&effects), vec![10 * correct], "play {:?}", play);
                assert_eq!(session.summary().correct_answers, correct);
            }
        }
    }
}
