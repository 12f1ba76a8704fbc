//! Evaluation counters.
//!
//! A state adds its counts after each sentence; reporting code reads the
//! score after a pass and clears the counters.

use std::fmt;

/// An accumulator of evaluation counts.
pub trait Eval: fmt::Debug {
    /// The primary score, as a percentage.
    fn score(&self) -> f64;

    /// Resets every counter.
    fn clear(&mut self);
}

fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        100.0 * numerator as f64 / denominator as f64
    }
}

/// Token accuracy.
#[derive(Debug, Clone, Default)]
pub struct AccuracyEval {
    correct: usize,
    total: usize,
}

impl AccuracyEval {
    pub fn add(&mut self, correct: usize, total: usize) {
        self.correct += correct;
        self.total += total;
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Eval for AccuracyEval {
    fn score(&self) -> f64 {
        percent(self.correct, self.total)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for AccuracyEval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACC: {:5.2}", self.score())
    }
}

/// Precision, recall and F1 over predicted and gold items.
#[derive(Debug, Clone, Default)]
pub struct F1Eval {
    correct: usize,
    system: usize,
    gold: usize,
}

impl F1Eval {
    pub fn add(&mut self, correct: usize, system: usize, gold: usize) {
        self.correct += correct;
        self.system += system;
        self.gold += gold;
    }

    pub fn precision(&self) -> f64 {
        percent(self.correct, self.system)
    }

    pub fn recall(&self) -> f64 {
        percent(self.correct, self.gold)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl Eval for F1Eval {
    fn score(&self) -> f64 {
        self.f1()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for F1Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "F1: {:5.2}, P: {:5.2}, R: {:5.2}",
            self.f1(),
            self.precision(),
            self.recall()
        )
    }
}

/// Labeled and unlabeled attachment scores.
#[derive(Debug, Clone, Default)]
pub struct AttachmentEval {
    las: usize,
    uas: usize,
    total: usize,
}

impl AttachmentEval {
    pub fn add(&mut self, las: usize, uas: usize, total: usize) {
        self.las += las;
        self.uas += uas;
        self.total += total;
    }

    pub fn las(&self) -> f64 {
        percent(self.las, self.total)
    }

    pub fn uas(&self) -> f64 {
        percent(self.uas, self.total)
    }
}

impl Eval for AttachmentEval {
    fn score(&self) -> f64 {
        self.las()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for AttachmentEval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LAS: {:5.2}, UAS: {:5.2}", self.las(), self.uas())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let mut eval = AccuracyEval::default();
        assert_eq!(eval.score(), 0.0);
        eval.add(3, 4);
        eval.add(1, 4);
        assert_eq!(eval.score(), 50.0);
        assert_eq!(eval.to_string(), "ACC: 50.00");
        eval.clear();
        assert_eq!(eval.total(), 0);
    }

    #[test]
    fn test_f1() {
        let mut eval = F1Eval::default();
        eval.add(2, 4, 2);
        assert_eq!(eval.precision(), 50.0);
        assert_eq!(eval.recall(), 100.0);
        assert!((eval.score() - 200.0 / 3.0).abs() < 1e-9);

        let empty = F1Eval::default();
        assert_eq!(empty.score(), 0.0);
    }

    #[test]
    fn test_attachment() {
        let mut eval = AttachmentEval::default();
        eval.add(3, 4, 5);
        assert_eq!(eval.las(), 60.0);
        assert_eq!(eval.uas(), 80.0);
        assert_eq!(eval.score(), 60.0);
    }
}
