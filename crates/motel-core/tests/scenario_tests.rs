//! # Scenario Tests
//!
//! End-to-end runs over persistent documents: ingest graph files, extract
//! neighborhoods, evaluate motifs across a dataset, round-trip the image,
//! and drive every ensemble through active learning.

#![allow(clippy::unwrap_used, clippy::panic)]

use motel_core::formats::{read_jsonl_file, write_jsonl_file};
use motel_core::{
    ActiveLearning, Dataset, Document, EdgeWeights, Ensemble, EnsembleKind, Filter, GraphDocument,
    GraphStore, MotelConfig, Motif, MotifEdge, MotifVertex, Partition, Point, Session,
    SparseImage, Split, extract_neighborhoods, precision_recall_curve,
};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::tempdir;

/// "Alice met Bob in Paris": two labeled people, each the subject or object
/// of the verb.
const SENTENCE: &str = r#"{
    "vertices": [
        {"identifier": 10, "attributes": [["pos", "PROPN"], ["lemma", "alice"], ["user:label", "positive"]]},
        {"identifier": 11, "attributes": [["pos", "VERB"], ["lemma", "meet"]]},
        {"identifier": 12, "attributes": [["pos", "PROPN"], ["lemma", "bob"], ["user:label", "positive"]]},
        {"identifier": 13, "attributes": [["pos", "ADP"], ["lemma", "in"]]},
        {"identifier": 14, "attributes": [["pos", "PROPN"], ["lemma", "paris"]]}
    ],
    "edges": [
        {"source": 11, "destination": 10, "label": "spacy:nsubj"},
        {"source": 11, "destination": 12, "label": "spacy:dobj"},
        {"source": 11, "destination": 13, "label": "spacy:prep"},
        {"source": 13, "destination": 14, "label": "spacy:pobj"},
        {"source": 10, "destination": 11, "label": "motel:next"}
    ]
}"#;

fn ingest(path: &Path, text: &str) {
    let document = GraphDocument::from_json(text).expect("parse");
    let mut session = Session::open(path).expect("open");
    session.ingest(&document).expect("ingest");
}

fn proper_noun() -> Motif {
    Motif::new(0, vec![MotifVertex::new(0, Filter::single("pos", "PROPN"))], Vec::new())
        .expect("motif")
}

fn verb_argument() -> Motif {
    Motif::new(
        1,
        vec![
            MotifVertex::new(0, Filter::single("pos", "VERB")),
            MotifVertex::new(1, Filter::empty()),
        ],
        vec![MotifEdge::new(0, "spacy:nsubj", 1)],
    )
    .expect("motif")
}

#[test]
fn documents_flow_through_the_whole_pipeline() {
    let temp = tempdir().expect("temp dir");
    let train = temp.path().join("docs/train.redb");
    let test = temp.path().join("docs/test.redb");
    ingest(&train, SENTENCE);
    ingest(&test, SENTENCE);

    let dataset = Dataset::new(vec![
        Document::new(train.display().to_string()).with_split(Split::Train),
        Document::new(test.display().to_string()).with_split(Split::Test),
        Document::new(temp.path().join("absent.redb").display().to_string()),
    ]);

    // motif file round trip
    let motifs_path = temp.path().join("motifs.jsonl");
    write_jsonl_file(&motifs_path, &[proper_noun(), verb_argument()]).expect("write motifs");
    let motifs: Vec<Motif> = read_jsonl_file(&motifs_path).expect("read motifs");
    assert_eq!(motifs, vec![proper_noun(), verb_argument()]);

    let mut image = SparseImage::new();
    image.register_many(motifs);
    let report = image.evaluate_dataset(&dataset);
    assert_eq!(report.evaluated.len(), 2);
    assert_eq!(report.failed.len(), 1);

    // three proper nouns and one subject per document
    assert_eq!(image.motif_domain(&proper_noun()).map(<[Point]>::len), Some(6));
    assert_eq!(image.motif_domain(&verb_argument()).map(<[Point]>::len), Some(2));
    assert_eq!(image.distinct_domain().len(), 6);

    let image_path = temp.path().join("image.jsonl");
    image.dump(&image_path).expect("dump");
    let image = SparseImage::load(&image_path).expect("load");

    let truth = dataset.ground_truth();
    assert_eq!(truth.len(), 4);

    let config = MotelConfig::default();
    let run = ActiveLearning {
        steps: 3,
        thresholds: vec![0.01, 0.5, 0.99],
        ..ActiveLearning::default()
    };

    for kind in EnsembleKind::ALL {
        let mut ensemble = Ensemble::new(kind, &image, &config);
        let mut partition = Partition::from_dataset(ensemble.domain(), &dataset);
        assert_eq!(partition.learnable().len(), 3);

        let rows = run
            .run(&mut ensemble, &truth, &mut partition, config.classification_threshold)
            .expect("run");
        assert_eq!(rows.len(), 9);
        assert!(rows.iter().all(|row| row.ensemble == kind.as_str()));
        assert!(rows.iter().all(|row| (0.0..=1.0).contains(&row.precision)));

        let curve = precision_recall_curve(&ensemble, &truth);
        assert_eq!(curve.len(), 6);
        assert!(curve.windows(2).all(|pair| pair[0].ranking >= pair[1].ranking));
    }
}

#[test]
fn three_motif_scenario() {
    let mut session = Session::in_memory();
    let ids: Vec<_> = ["a", "ab", "b", "z"]
        .iter()
        .map(|tags| {
            let attributes = tags
                .chars()
                .map(|c| motel_core::Attribute::new(c.to_string(), "yes"))
                .collect();
            session.create_vertex(attributes).expect("vertex")
        })
        .collect();
    let points: Vec<Point> = ids.iter().map(|&id| Point::new(":memory:", id)).collect();

    let tag = |t: &str| {
        Motif::new(0, vec![MotifVertex::new(0, Filter::single(t, "yes"))], Vec::new())
            .expect("motif")
    };
    let mut image = SparseImage::new();
    image.register_many([tag("a"), tag("b"), tag("c")]);
    image.evaluate_store(&session, session.locator()).expect("evaluate");

    let config = MotelConfig::default();
    let disjunction = Ensemble::new(EnsembleKind::Disjunction, &image, &config);
    let expected: BTreeSet<Point> = points[..3].iter().cloned().collect();
    assert_eq!(disjunction.classified_set(None), expected);

    let majority = Ensemble::new(EnsembleKind::MajorityVote, &image, &config);
    let probabilities: Vec<f64> = majority.probabilities();
    assert_eq!(probabilities, vec![0.5, 1.0, 0.5]);
}

#[test]
fn neighborhoods_become_motifs_that_select_their_origin() {
    let temp = tempdir().expect("temp dir");
    let path = temp.path().join("doc.redb");
    ingest(&path, SENTENCE);

    let session = Session::open_existing(&path).expect("open");
    let records = extract_neighborhoods(&session, 2.0, &EdgeWeights::default()).expect("extract");
    assert_eq!(records.len(), 2);

    let positives = session.positive_vertices().expect("positives");
    for record in &records {
        let selected = record.evaluate(&session).expect("evaluate");
        assert!(positives.iter().any(|p| selected.contains(p)));
        let json = record.to_json().expect("encode");
        assert!(!json.contains("user:label"));
        assert_eq!(Motif::from_json(&json).expect("decode"), *record);
    }
}
