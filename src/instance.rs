//! Training and decoding instances.

use crate::vector::FeatureVector;

/// One decision point: a feature vector together with its zero-cost labels
/// (empty when decoding) and, once scored, the model's output.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    gold_labels: Vec<String>,
    gold: Vec<usize>,
    x: FeatureVector,
    scores: Vec<f32>,
    predicted: Option<usize>,
}

impl Instance {
    /// An instance whose correct labels are `gold_labels`. Any of them is an
    /// acceptable answer.
    pub fn new(gold_labels: Vec<String>, x: FeatureVector) -> Self {
        Self {
            gold_labels,
            x,
            ..Self::default()
        }
    }

    /// An instance without a gold label.
    pub fn unlabeled(x: FeatureVector) -> Self {
        Self::new(Vec::new(), x)
    }

    pub fn gold_labels(&self) -> &[String] {
        &self.gold_labels
    }

    pub fn has_gold(&self) -> bool {
        !self.gold_labels.is_empty()
    }

    /// Indices of the gold labels, set when the instance is trained on.
    pub fn gold(&self) -> &[usize] {
        &self.gold
    }

    pub(crate) fn set_gold(&mut self, gold: Vec<usize>) {
        self.gold = gold;
    }

    pub fn is_gold(&self, label: usize) -> bool {
        self.gold.contains(&label)
    }

    /// The gold label with the highest current score, the earliest one on
    /// ties.
    pub fn target(&self) -> Option<usize> {
        let score = |y: usize| self.scores.get(y).copied().unwrap_or(0.0);
        let mut best: Option<usize> = None;
        for &y in &self.gold {
            if best.map_or(true, |b| score(y) > score(b)) {
                best = Some(y);
            }
        }
        best
    }

    pub fn x(&self) -> &FeatureVector {
        &self.x
    }

    pub fn x_mut(&mut self) -> &mut FeatureVector {
        &mut self.x
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn set_scores(&mut self, scores: Vec<f32>) {
        self.scores = scores;
    }

    pub fn predicted(&self) -> Option<usize> {
        self.predicted
    }

    pub fn set_predicted(&mut self, label: usize) {
        self.predicted = Some(label);
    }

    /// Returns `true` if the prediction is one of the gold labels.
    pub fn is_correct(&self) -> bool {
        self.predicted.is_some_and(|y| self.is_gold(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_prefers_highest_score() {
        let mut instance = Instance::new(vec!["A".into(), "B".into()], FeatureVector::default());
        instance.set_gold(vec![0, 2]);
        assert_eq!(instance.target(), Some(0));

        instance.set_scores(vec![0.1, 5.0, 0.3]);
        assert_eq!(instance.target(), Some(2));

        instance.set_predicted(1);
        assert!(!instance.is_correct());
        instance.set_predicted(2);
        assert!(instance.is_correct());
    }
}
