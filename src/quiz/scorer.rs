/// Points added to the running score for a correct answer
pub const POINTS_PER_CORRECT: u32 = 10;
/// Experience needed to gain one level
pub const EXPERIENCE_PER_LEVEL: u32 = 50;

pub struct Scorer;

impl Scorer {
    /// Points awarded for a single answer.
    /// Wrong answers, skips and timeouts all score nothing.
    pub fn points_for(correct: bool) -> u32 {
        if correct { POINTS_PER_CORRECT } else { 0 }
    }

    /// Level for a given amount of accumulated experience.
    ///
    /// Levels start at 1 and go up every 50 experience points:
    /// - 0..=49 -> 1
    /// - 50..=99 -> 2
    pub fn level_for(experience: u32) -> u32 {
        experience / EXPERIENCE_PER_LEVEL + 1
    }

    /// Number of correct answers a final score corresponds to
    pub fn correct_answers(score: u32) -> u32 {
        score / POINTS_PER_CORRECT
    }
}
