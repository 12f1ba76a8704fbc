use onlp::feature::{FeatureItem, FeatureTemplate, Field, Relation, Source};
use onlp::task::PosTagging;
use onlp::{FeatureMap, Lexicon, Node, Sentence, State, Vocabulary};

fn the_dog_barks() -> Sentence {
    Sentence::from_forms(&["The", "dog", "barks"])
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

#[test]
fn test_extract_at_second_token() {
    let policy = PosTagging::new();
    let template = word_template();
    let mut sentence = the_dog_barks();
    let mut state = State::new(&policy, &mut sentence);
    state.next("DT");

    let strings = template.extract(&state);
    let items: Vec<(usize, &str)> = strings.iter().map(|i| (i.ty, i.value.as_str())).collect();
    assert_eq!(items, vec![(0, "dog"), (1, "the")]);

    let mut features = FeatureMap::new();
    let x = template
        .create_feature_vector(&state, &mut features, true)
        .unwrap();
    assert_eq!(x.sparse.len(), 2);
    assert!(x.dense.is_none());
    assert_eq!(features.index(0, "dog"), Some(1));
    assert_eq!(features.index(1, "the"), Some(2));
    assert_eq!(features.size(), 3);
}

#[test]
fn test_missing_context_drops_feature() {
    let policy = PosTagging::new();
    let mut template = FeatureTemplate::new();
    template
        .add(vec![
            FeatureItem::input(-1, Field::WordFormLowercase),
            FeatureItem::input(0, Field::WordFormLowercase),
        ])
        .unwrap();

    let mut sentence = the_dog_barks();
    let mut state = State::new(&policy, &mut sentence);
    // The root is never a neighbour of the first token
    assert!(template.extract(&state).is_empty());

    state.next("DT");
    let strings = template.extract(&state);
    assert_eq!(strings.len(), 1);
    assert_eq!(strings.iter().next().unwrap().value, "the_dog");
}

#[test]
fn test_lookup_never_grows_map() {
    let policy = PosTagging::new();
    let template = word_template();
    let mut features = FeatureMap::new();

    let mut sentence = the_dog_barks();
    let state = State::new(&policy, &mut sentence);
    let trained = template
        .create_feature_vector(&state, &mut features, true)
        .unwrap();
    let size = features.size();

    // Reading the same decision point twice gives the same vector
    let decoded = template
        .create_feature_vector(&state, &mut features, false)
        .unwrap();
    assert_eq!(trained, decoded);
    assert_eq!(features.size(), size);

    let mut unseen = Sentence::from_forms(&["A", "cat", "sleeps"]);
    let state = State::new(&policy, &mut unseen);
    let x = template.lookup_feature_vector(&state, &features);
    assert!(x.sparse.is_empty());
    assert_eq!(features.size(), size);
}

#[test]
fn test_frozen_map() {
    let policy = PosTagging::new();
    let template = word_template();
    let mut features = FeatureMap::new();

    let mut sentence = the_dog_barks();
    let state = State::new(&policy, &mut sentence);
    template
        .create_feature_vector(&state, &mut features, true)
        .unwrap();
    features.freeze();
    assert_eq!(features.status(), Vocabulary::Frozen);

    // Known strings still resolve
    assert!(template
        .create_feature_vector(&state, &mut features, true)
        .is_ok());

    let mut unseen = Sentence::from_forms(&["Cats", "sleep"]);
    let state = State::new(&policy, &mut unseen);
    assert!(template
        .create_feature_vector(&state, &mut features, true)
        .is_err());
    assert!(template
        .create_feature_vector(&state, &mut features, false)
        .is_ok());
}

#[test]
fn test_equal_strings_in_different_slots() {
    let policy = PosTagging::new();
    let mut template = FeatureTemplate::new();
    template
        .add(vec![FeatureItem::input(0, Field::WordFormLowercase)])
        .unwrap();
    template
        .add(vec![FeatureItem::input(0, Field::WordForm)])
        .unwrap();

    let mut sentence = Sentence::from_forms(&["dog"]);
    let state = State::new(&policy, &mut sentence);
    let mut features = FeatureMap::new();
    let x = template
        .create_sparse_vector(&state, &mut features, true)
        .unwrap();
    assert_eq!(x.len(), 2);
    assert_ne!(features.index(0, "dog"), features.index(1, "dog"));
}

#[test]
fn test_set_and_weighted_fields() {
    let policy = PosTagging::new();
    let mut template = FeatureTemplate::new();
    template
        .add_set(FeatureItem::input(0, Field::Positional))
        .unwrap();
    template
        .add_set_weighted(FeatureItem::input(0, Field::BagOfWordsCount(false)))
        .unwrap();
    assert_eq!(template.slots(), 2);

    let mut sentence = Sentence::from_forms(&["the", "dog", "saw", "the", "cat", "."]);
    let state = State::new(&policy, &mut sentence);
    let strings = template.extract(&state);

    let positional: Vec<&str> = strings
        .iter()
        .filter(|i| i.ty == 0)
        .map(|i| i.value.as_str())
        .collect();
    assert_eq!(positional, vec!["0"]);

    let bag: Vec<(&str, f32)> = strings
        .iter()
        .filter(|i| i.ty == 1)
        .map(|i| (i.value.as_str(), i.weight))
        .collect();
    assert_eq!(bag, vec![("cat", 1.0), ("dog", 1.0), ("saw", 1.0), ("the", 2.0)]);
}

#[test]
fn test_registration_errors() {
    let mut template = FeatureTemplate::new();
    assert!(template.add(vec![]).is_err());
    assert!(template
        .add(vec![FeatureItem::input(0, Field::Orthographic)])
        .is_err());
    assert!(template
        .add_set(FeatureItem::input(0, Field::BagOfWordsCount(true)))
        .is_err());
    assert!(template
        .add_dense(FeatureItem::input(0, Field::WordForm), 3)
        .is_err());
    assert!(template
        .add_dense(FeatureItem::input(0, Field::WordEmbedding), 0)
        .is_err());
    assert_eq!(template.slots(), 0);
}

#[test]
fn test_dense_embeddings() {
    let policy = PosTagging::new();
    let mut template = FeatureTemplate::new();
    template
        .add_dense(FeatureItem::input(0, Field::WordEmbedding), 3)
        .unwrap();
    template
        .add_dense(FeatureItem::input(1, Field::WordEmbedding), 2)
        .unwrap();
    assert_eq!(template.dense_size(), 5);

    let mut lexicon = Lexicon::new();
    lexicon.add_word_embedding("dog", vec![0.1, 0.2, 0.3]).unwrap();
    lexicon.add_word_embedding("the", vec![0.5, 0.6, 0.7]).unwrap();

    let mut sentence = the_dog_barks();
    lexicon.apply(&mut sentence);
    let mut state = State::new(&policy, &mut sentence);

    // "the" then the first two values of "dog"
    let dense = template.create_dense_vector(&state).unwrap();
    assert_eq!(dense, vec![0.5, 0.6, 0.7, 0.1, 0.2]);

    // "barks" has no embedding and nothing follows it
    state.next("DT");
    state.next("NN");
    let dense = template.create_dense_vector(&state).unwrap();
    assert_eq!(dense, vec![0.0; 5]);
}

#[test]
fn test_relation_from_input() {
    let policy = PosTagging::new();
    let mut template = FeatureTemplate::new();
    template
        .add(vec![
            FeatureItem::input(0, Field::WordForm).with_relation(Relation::Head),
            FeatureItem::input(0, Field::DependencyLabel),
        ])
        .unwrap();

    let mut sentence = Sentence::new(vec![
        Node::new("He").with_head(2, "nsubj"),
        Node::new("sent").with_head(0, "root"),
        Node::new("flowers").with_head(2, "dobj"),
    ]);
    let mut state = State::new(&policy, &mut sentence);
    let strings = template.extract(&state);
    assert_eq!(strings.iter().next().unwrap().value, "sent_nsubj");

    state.next("PRP");
    let strings = template.extract(&state);
    assert_eq!(strings.iter().next().unwrap().value, "@#r$%_root");

    // Stack items mean nothing to a tagger
    let item = FeatureItem::new(Source::Stack, 0, Field::WordForm);
    assert!(item.resolve(&state).is_none());
}
