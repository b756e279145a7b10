//! Player session: the step cursor, answer checking, and the terminal
//! reward gate for one play-through.
//!
//! One session owns its document; there is no ambient shared play state.
//! Invariants:
//!   - while playing, the cursor index stays in `[0, steps.len())`
//!   - completion is terminal and reached exactly once; after it, only an
//!     explicit restart re-enters question rendering
//!   - step views never carry the stored answer

use crate::answer::answers_match;
use crate::domain::{DocumentError, Experience, Step};
use crate::protocol::{RewardView, StepView};

/// What the recipient is entitled to at the end. The demo variant carries
/// only a payment route, never the gift text.
#[derive(Clone, Debug)]
pub enum RewardAccess {
  Full { gift: String },
  Demo { pay_route: String },
}

impl RewardAccess {
  fn to_view(&self) -> RewardView {
    match self {
      RewardAccess::Full { gift } => RewardView::Unlocked { gift: gift.clone() },
      RewardAccess::Demo { pay_route } => RewardView::Locked { pay_route: pay_route.clone() },
    }
  }
}

/// Current renderable state of the session.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayState {
  Step { index: usize, total: usize, view: StepView },
  Reward(RewardView),
}

/// Why a player action was refused. The session state is unchanged in
/// every case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayError {
  /// `continue` on a level step: answering is required to advance.
  ContinueOnLevel,
  /// `submit_answer` on the intro banner.
  AnswerOnIntro,
}

impl std::fmt::Display for PlayError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PlayError::ContinueOnLevel => write!(f, "this step needs an answer"),
      PlayError::AnswerOnIntro => write!(f, "the intro has nothing to answer"),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmitOutcome {
  pub correct: bool,
  pub state: PlayState,
}

pub struct PlayerSession {
  doc: Experience,
  access: RewardAccess,
  idx: usize,
  complete: bool,
}

impl PlayerSession {
  /// Validates the document up front; a malformed document never becomes
  /// a playable session.
  pub fn new(doc: Experience, access: RewardAccess) -> Result<Self, DocumentError> {
    doc.validate()?;
    Ok(Self { doc, access, idx: 0, complete: false })
  }

  pub fn current_index(&self) -> usize {
    self.idx
  }

  pub fn is_complete(&self) -> bool {
    self.complete
  }

  fn step_view(&self) -> StepView {
    match &self.doc.steps[self.idx] {
      Step::Intro { title, subtitle } => {
        StepView::Intro { title: title.clone(), subtitle: subtitle.clone() }
      }
      Step::Level { level_number, level_title, question, module, .. } => StepView::Level {
        level_label: format!("LEVEL {:02}", level_number.unwrap_or(self.idx as u32)),
        level_title: level_title.clone(),
        question: question.clone(),
        module: *module,
      },
    }
  }

  /// Renderable state for the current position.
  pub fn state(&self) -> PlayState {
    if self.complete {
      return PlayState::Reward(self.access.to_view());
    }
    PlayState::Step { index: self.idx, total: self.doc.steps.len(), view: self.step_view() }
  }

  /// Move past the current step, or into the terminal reward on the last
  /// one. Never wraps back to the start.
  fn advance(&mut self) -> PlayState {
    if self.idx + 1 < self.doc.steps.len() {
      self.idx += 1;
    } else {
      self.complete = true;
    }
    self.state()
  }

  /// "Continue" action on the intro banner. Idempotently returns the
  /// reward once complete.
  pub fn proceed(&mut self) -> Result<PlayState, PlayError> {
    if self.complete {
      return Ok(self.state());
    }
    if !self.doc.steps[self.idx].is_intro() {
      return Err(PlayError::ContinueOnLevel);
    }
    Ok(self.advance())
  }

  /// Check a free-text answer against the current level. A wrong answer
  /// leaves the cursor where it is; retries are unlimited.
  pub fn submit_answer(&mut self, raw: &str) -> Result<SubmitOutcome, PlayError> {
    if self.complete {
      return Ok(SubmitOutcome { correct: true, state: self.state() });
    }
    let expected = match &self.doc.steps[self.idx] {
      Step::Intro { .. } => return Err(PlayError::AnswerOnIntro),
      Step::Level { answer, .. } => answer.clone(),
    };
    if answers_match(raw, &expected) {
      Ok(SubmitOutcome { correct: true, state: self.advance() })
    } else {
      Ok(SubmitOutcome { correct: false, state: self.state() })
    }
  }

  /// Explicit replay from the top.
  pub fn restart(&mut self) -> PlayState {
    self.idx = 0;
    self.complete = false;
    self.state()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Experience, Step};

  fn two_step_doc() -> Experience {
    Experience {
      title: Some("Reto".into()),
      steps: vec![
        Step::Intro { title: "Hi".into(), subtitle: "Go".into() },
        Step::Level {
          level_number: Some(1),
          level_title: "L1".into(),
          question: "2+2?".into(),
          answer: "4".into(),
          module: None,
        },
      ],
      ..Default::default()
    }
  }

  fn full_session(doc: Experience) -> PlayerSession {
    PlayerSession::new(doc, RewardAccess::Full { gift: "Vuelo a París".into() }).expect("session")
  }

  #[test]
  fn intro_then_level_then_reward() {
    let mut s = full_session(two_step_doc());
    match s.state() {
      PlayState::Step { index: 0, total: 2, view: StepView::Intro { .. } } => {}
      other => panic!("expected intro, got {:?}", other),
    }

    let after_intro = s.proceed().expect("continue");
    match after_intro {
      PlayState::Step { index: 1, view: StepView::Level { ref question, .. }, .. } => {
        assert_eq!(question, "2+2?");
      }
      other => panic!("expected level, got {:?}", other),
    }

    let out = s.submit_answer("4").expect("submit");
    assert!(out.correct);
    assert_eq!(out.state, PlayState::Reward(RewardView::Unlocked { gift: "Vuelo a París".into() }));
    assert!(s.is_complete());
  }

  #[test]
  fn wrong_answer_leaves_cursor_in_place() {
    let mut s = full_session(two_step_doc());
    s.proceed().expect("continue");
    let out = s.submit_answer("five").expect("submit");
    assert!(!out.correct);
    assert_eq!(s.current_index(), 1);
    assert!(!s.is_complete());
    // Unlimited retries: the right answer still goes through.
    assert!(s.submit_answer("4").expect("submit").correct);
  }

  #[test]
  fn cursor_stays_in_bounds_through_any_action_sequence() {
    let mut s = full_session(two_step_doc());
    let total = 2;
    let _ = s.proceed();
    let _ = s.submit_answer("nope");
    let _ = s.proceed(); // invalid on a level
    assert!(s.current_index() < total);
    let _ = s.submit_answer("4");
    let _ = s.restart();
    assert!(s.current_index() < total);
  }

  #[test]
  fn completion_is_terminal_until_restart() {
    let mut s = full_session(two_step_doc());
    s.proceed().expect("continue");
    s.submit_answer("4").expect("submit");

    // Any further action keeps yielding the reward, never a question.
    assert!(matches!(s.proceed().expect("proceed"), PlayState::Reward(_)));
    assert!(matches!(s.submit_answer("4").expect("submit").state, PlayState::Reward(_)));

    // Only an explicit restart re-enters question rendering.
    match s.restart() {
      PlayState::Step { index: 0, .. } => {}
      other => panic!("expected first step, got {:?}", other),
    }
  }

  #[test]
  fn demo_reward_has_payment_route_and_no_gift() {
    let mut s = PlayerSession::new(
      two_step_doc(),
      RewardAccess::Demo { pay_route: "/pay/abc12345".into() },
    )
    .expect("session");
    s.proceed().expect("continue");
    let out = s.submit_answer("4").expect("submit");
    match out.state {
      PlayState::Reward(RewardView::Locked { pay_route }) => {
        assert_eq!(pay_route, "/pay/abc12345");
      }
      other => panic!("expected locked reward, got {:?}", other),
    }
    // Belt and braces: the serialized form carries no gift either.
    let json = serde_json::to_string(&s.state_view_for_test()).unwrap();
    assert!(!json.contains("gift"));
  }

  #[test]
  fn answer_submission_on_intro_is_refused() {
    let mut s = full_session(two_step_doc());
    assert_eq!(s.submit_answer("4"), Err(PlayError::AnswerOnIntro));
    assert_eq!(s.current_index(), 0);
  }

  #[test]
  fn accented_answer_matches_plain_stored_answer() {
    let mut doc = two_step_doc();
    if let Step::Level { answer, .. } = &mut doc.steps[1] {
      *answer = "CAFE".into();
    }
    let mut s = full_session(doc);
    s.proceed().expect("continue");
    assert!(s.submit_answer("  café ").expect("submit").correct);
  }

  #[test]
  fn empty_document_never_becomes_a_session() {
    let doc = Experience::default();
    assert!(PlayerSession::new(doc, RewardAccess::Full { gift: "x".into() }).is_err());
  }

  impl PlayerSession {
    fn state_view_for_test(&self) -> RewardView {
      self.access.to_view()
    }
  }
}
