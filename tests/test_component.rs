use onlp::feature::{FeatureItem, FeatureTemplate, Field, Source};
use onlp::task::{DepParsing, NerTagging, PosTagging, SrlLabeling};
use onlp::train::{Algorithm, HyperParameter};
use onlp::{Error, Eval, Lexicon, Mode, Node, OnlineComponent, Sentence, TaskPolicy};

fn pos_corpus() -> Vec<Sentence> {
    vec![
        Sentence::new(vec![
            Node::new("The").with_pos("DT"),
            Node::new("dog").with_pos("NN"),
            Node::new("barks").with_pos("VBZ"),
        ]),
        Sentence::new(vec![
            Node::new("A").with_pos("DT"),
            Node::new("cat").with_pos("NN"),
            Node::new("sleeps").with_pos("VBZ"),
            Node::new(".").with_pos("."),
        ]),
    ]
}

fn word_template() -> FeatureTemplate {
    let mut template = FeatureTemplate::new();
    template
        .add(vec![FeatureItem::input(0, Field::WordFormLowercase)])
        .unwrap();
    template
        .add(vec![FeatureItem::input(-1, Field::WordFormLowercase)])
        .unwrap();
    template
}

/// Follows the gold path in every epoch.
fn gold_params(algorithm: Algorithm) -> HyperParameter {
    HyperParameter::new(algorithm)
        .with_learning_rate(0.1)
        .unwrap()
        .with_rollin(0, 1.0)
        .unwrap()
}

fn train<P: TaskPolicy>(component: &mut OnlineComponent<P>, corpus: &[Sentence], epochs: usize) {
    for _ in 0..epochs {
        for sentence in corpus {
            component.train(&mut sentence.clone()).unwrap();
        }
        component.end_epoch();
    }
}

fn evaluate<P: TaskPolicy>(component: &mut OnlineComponent<P>, corpus: &[Sentence]) -> f64 {
    component.set_mode(Mode::Evaluate);
    component.eval_mut().clear();
    for sentence in corpus {
        component.process(&mut sentence.clone()).unwrap();
    }
    component.eval().score()
}

#[test]
fn test_pos_tagging() {
    let corpus = pos_corpus();
    let params = gold_params(Algorithm::Perceptron);
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    train(&mut tagger, &corpus, 10);

    assert_eq!(tagger.epoch(), 10);
    assert_eq!(tagger.labels().len(), 4);
    assert_eq!(evaluate(&mut tagger, &corpus), 100.0);

    tagger.set_mode(Mode::Decode);
    let mut sentence = Sentence::from_forms(&["The", "cat", "barks"]);
    tagger.process(&mut sentence).unwrap();
    assert_eq!(sentence[1].pos.as_deref(), Some("DT"));
    assert_eq!(sentence[2].pos.as_deref(), Some("NN"));
    assert_eq!(sentence[3].pos.as_deref(), Some("VBZ"));
}

#[test]
fn test_every_algorithm_learns_tags() {
    let corpus = pos_corpus();
    let algorithms = [
        Algorithm::Perceptron,
        Algorithm::AdaGrad,
        Algorithm::AdaGradMiniBatch,
        Algorithm::AdaDeltaMiniBatch,
        Algorithm::Softmax,
        Algorithm::AdaGradRegression,
    ];
    for algorithm in algorithms {
        let params = gold_params(algorithm).with_batch_size(2);
        let mut tagger =
            OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
        train(&mut tagger, &corpus, 40);
        assert_eq!(evaluate(&mut tagger, &corpus), 100.0, "{}", algorithm);
    }
}

#[test]
fn test_feed_forward_tagger() {
    let corpus = pos_corpus();
    let params = HyperParameter::new(Algorithm::FeedForwardSoftmax)
        .with_learning_rate(0.1)
        .unwrap()
        .with_bias(1.0)
        .unwrap()
        .with_hidden_layers(vec![8], vec![onlp::Activation::Sigmoid])
        .unwrap()
        .with_rollin(0, 1.0)
        .unwrap();
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    train(&mut tagger, &corpus, 5);
    assert_eq!(tagger.labels().len(), 4);
    assert_eq!(tagger.optimizer().name(), "FeedForward-Softmax");

    tagger.set_mode(Mode::Decode);
    let mut sentence = Sentence::from_forms(&["A", "dog", "sleeps"]);
    tagger.process(&mut sentence).unwrap();
    assert!(sentence.tokens().iter().all(|n| n.pos.is_some()));
}

#[test]
fn test_named_entities() {
    let corpus = vec![
        Sentence::new(vec![
            Node::new("John").with_nament("B-PER"),
            Node::new("Smith").with_nament("L-PER"),
            Node::new("lives").with_nament("O"),
            Node::new("in").with_nament("O"),
            Node::new("Paris").with_nament("U-LOC"),
        ]),
        Sentence::new(vec![
            Node::new("Mary").with_nament("U-PER"),
            Node::new("visited").with_nament("O"),
            Node::new("New").with_nament("B-LOC"),
            Node::new("York").with_nament("L-LOC"),
        ]),
    ];
    let mut template = word_template();
    template
        .add_set(FeatureItem::input(0, Field::NamedEntityGazetteers))
        .unwrap();
    let mut lexicon = Lexicon::new();
    lexicon.add_gazetteer(&["paris"], "LOC");

    let params = gold_params(Algorithm::AdaGrad);
    let mut tagger = OnlineComponent::new(NerTagging::new(), template, &params)
        .unwrap()
        .with_lexicon(lexicon);
    train(&mut tagger, &corpus, 20);
    assert_eq!(evaluate(&mut tagger, &corpus), 100.0);
    assert_eq!(tagger.eval().precision(), 100.0);
    assert_eq!(tagger.eval().recall(), 100.0);
}

fn dep_corpus() -> Vec<Sentence> {
    vec![
        Sentence::new(vec![
            Node::new("He").with_pos("PRP").with_head(2, "nsubj"),
            Node::new("sent").with_pos("VBD").with_head(0, "root"),
            Node::new("her").with_pos("PRP").with_head(2, "dative"),
            Node::new("red").with_pos("JJ").with_head(5, "amod"),
            Node::new("flowers").with_pos("NNS").with_head(2, "dobj"),
        ]),
        Sentence::new(vec![
            Node::new("A").with_pos("DT").with_head(2, "det"),
            Node::new("hearing").with_pos("NN").with_head(4, "nsubj"),
            Node::new("is").with_pos("VBZ").with_head(4, "aux"),
            Node::new("scheduled").with_pos("VBN").with_head(0, "root"),
            Node::new("on").with_pos("IN").with_head(2, "prep"),
            Node::new("the").with_pos("DT").with_head(7, "det"),
            Node::new("issue").with_pos("NN").with_head(5, "pobj"),
            Node::new("today").with_pos("NN").with_head(4, "tmod"),
        ]),
    ]
}

#[test]
fn test_dependency_parsing() {
    let corpus = dep_corpus();
    let mut template = FeatureTemplate::new();
    template
        .add(vec![
            FeatureItem::new(Source::Stack, 0, Field::WordFormLowercase),
            FeatureItem::input(0, Field::WordFormLowercase),
        ])
        .unwrap();
    template
        .add(vec![FeatureItem::new(Source::Stack, 0, Field::PartOfSpeechTag)])
        .unwrap();
    template
        .add(vec![FeatureItem::input(0, Field::PartOfSpeechTag)])
        .unwrap();

    let params = gold_params(Algorithm::Perceptron);
    let mut parser = OnlineComponent::new(DepParsing::default(), template, &params).unwrap();
    train(&mut parser, &corpus, 50);
    assert_eq!(evaluate(&mut parser, &corpus), 100.0);
    assert_eq!(parser.eval().uas(), 100.0);

    // Decoding always yields a tree, even for unseen input
    parser.set_mode(Mode::Decode);
    let mut sentence = Sentence::new(vec![
        Node::new("Dogs").with_pos("NNS"),
        Node::new("bark").with_pos("VBP"),
        Node::new("loudly").with_pos("RB"),
    ]);
    parser.process(&mut sentence).unwrap();
    assert!(sentence.is_tree());
    assert!(sentence.tokens().iter().all(|n| n.has_head()));
}

#[test]
fn test_semantic_roles() {
    let corpus = vec![Sentence::new(vec![
        Node::new("John")
            .with_head(2, "nsubj")
            .with_semantic_head(2, "A0"),
        Node::new("gave")
            .with_head(0, "root")
            .with_feat("pb", "give.01"),
        Node::new("Mary")
            .with_head(2, "iobj")
            .with_semantic_head(2, "A2"),
        Node::new("a").with_head(5, "det"),
        Node::new("book")
            .with_head(2, "dobj")
            .with_semantic_head(2, "A1"),
    ])];
    let mut template = FeatureTemplate::new();
    template
        .add(vec![
            FeatureItem::new(Source::Predicate, 0, Field::WordFormLowercase),
            FeatureItem::new(Source::Argument, 0, Field::WordFormLowercase),
        ])
        .unwrap();
    template
        .add(vec![FeatureItem::new(Source::Argument, 0, Field::DependencyLabel)])
        .unwrap();

    let params = gold_params(Algorithm::Perceptron);
    let policy = SrlLabeling::with_params("pb", &params);
    let mut labeler = OnlineComponent::new(policy, template, &params).unwrap();
    train(&mut labeler, &corpus, 20);
    assert_eq!(evaluate(&mut labeler, &corpus), 100.0);

    labeler.set_mode(Mode::Decode);
    let mut sentence = corpus[0].clone();
    sentence.clear_semantic_heads();
    labeler.process(&mut sentence).unwrap();
    assert_eq!(sentence[1].semantic_label(2), Some("A0"));
    assert_eq!(sentence[3].semantic_label(2), Some("A2"));
    assert_eq!(sentence[5].semantic_label(2), Some("A1"));
    assert_eq!(sentence[4].semantic_label(2), None);
}

#[test]
fn test_train_batch() {
    let corpus = pos_corpus();
    let params = gold_params(Algorithm::AdaGradMiniBatch);
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    for _ in 0..20 {
        let mut batch = corpus.clone();
        tagger.train_batch(&mut batch).unwrap();
        tagger.end_epoch();
    }
    assert_eq!(evaluate(&mut tagger, &corpus), 100.0);
}

#[test]
fn test_unannotated_sentences_are_skipped() {
    let params = gold_params(Algorithm::Perceptron);
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    tagger
        .train(&mut Sentence::from_forms(&["no", "tags"]))
        .unwrap();
    assert_eq!(tagger.features().size(), 1);
    assert!(tagger.labels().is_empty());

    // An untrained component still labels every token
    tagger.set_mode(Mode::Decode);
    let mut sentence = Sentence::from_forms(&["a", "b"]);
    tagger.process(&mut sentence).unwrap();
    assert!(sentence.tokens().iter().all(|n| n.pos.is_none()));
}

#[test]
fn test_freeze() {
    let corpus = pos_corpus();
    let params = gold_params(Algorithm::Perceptron);
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    train(&mut tagger, &corpus, 5);
    tagger.freeze();
    let size = tagger.features().size();

    // Known sentences can still be trained on
    tagger.train(&mut corpus[0].clone()).unwrap();

    let mut unseen = Sentence::new(vec![
        Node::new("Birds").with_pos("NNS"),
        Node::new("sing").with_pos("VBP"),
    ]);
    let result = tagger.train(&mut unseen);
    assert!(matches!(result, Err(Error::FrozenVocabulary { .. })));
    assert_eq!(tagger.features().size(), size);
    assert_eq!(unseen[1].pos.as_deref(), Some("NNS"));

    // Decoding only needs a shared reference
    let tagger = &tagger;
    let mut sentence = Sentence::from_forms(&["The", "dog"]);
    tagger.decode(&mut sentence);
    assert_eq!(sentence[2].pos.as_deref(), Some("NN"));
}

#[test]
fn test_training_keeps_gold_annotation() {
    // Predictions drive the walk from the second epoch on
    let params = HyperParameter::new(Algorithm::Perceptron)
        .with_rollin(0, 0.0)
        .unwrap();
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    let mut corpus = pos_corpus();
    let gold = pos_corpus();
    for _ in 0..3 {
        for sentence in corpus.iter_mut() {
            tagger.train(sentence).unwrap();
        }
        tagger.train_batch(&mut corpus).unwrap();
        tagger.end_epoch();
        for (trained, gold) in corpus.iter().zip(&gold) {
            let tags: Vec<_> = trained.tokens().iter().map(|n| n.pos.clone()).collect();
            let expected: Vec<_> = gold.tokens().iter().map(|n| n.pos.clone()).collect();
            assert_eq!(tags, expected);
        }
    }

    let mut parser = OnlineComponent::new(DepParsing::default(), word_template(), &params).unwrap();
    let mut corpus = dep_corpus();
    for _ in 0..2 {
        for sentence in corpus.iter_mut() {
            parser.train(sentence).unwrap();
        }
        parser.end_epoch();
    }
    for (trained, gold) in corpus.iter().zip(&dep_corpus()) {
        for (a, b) in trained.tokens().iter().zip(gold.tokens()) {
            assert_eq!(a.head(), b.head());
            assert_eq!(a.deprel(), b.deprel());
        }
        assert!(trained.is_tree());
    }
}

#[test]
fn test_roll_in_decays() {
    let params = HyperParameter::new(Algorithm::Perceptron)
        .with_rollin(2, 0.5)
        .unwrap();
    let mut tagger = OnlineComponent::new(PosTagging::new(), word_template(), &params).unwrap();
    let corpus = pos_corpus();
    train(&mut tagger, &corpus, 4);
    assert_eq!(tagger.roll_in().fixed_stage(), 0);
    assert_eq!(tagger.roll_in().gold_probability(), 0.25);
}
