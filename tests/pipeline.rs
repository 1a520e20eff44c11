use scout_rank::config::{FeatureGroup, RankingConfig, WeightMap};
use scout_rank::error::RankingError;
use scout_rank::normalize::NORMALIZED_FLOOR;
use scout_rank::pipeline::{rank_normalized, rank_populations};
use scout_rank::player_table::PlayerTable;
use scout_rank::reference::{REFERENCE_LABEL, build_working_table};
use scout_rank::similarity::{self, SimilarityMethod};
use scout_rank::synthetic::{DEFAULT_METRICS, synthetic_population, synthetic_regions};

fn table(columns: &[&str], rows: &[(&str, &[f64])]) -> PlayerTable {
    let mut t = PlayerTable::new(columns.iter().copied());
    for (name, values) in rows {
        t.push_row(*name, values.to_vec()).expect("row should fit");
    }
    t
}

fn scenario() -> PlayerTable {
    table(
        &["a", "b"],
        &[("half", &[0.5, 0.5]), ("full", &[1.0, 1.0]), ("skew", &[0.2, 0.8])],
    )
}

fn ranked_names(report: &scout_rank::RankingReport) -> Vec<&str> {
    report.rows.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn scenario_places_maximal_player_first() {
    let config = RankingConfig::new(["a", "b"]);
    let report = rank_normalized(&scenario(), &config).expect("ranking should succeed");

    assert_eq!(ranked_names(&report), vec!["full", "half", "skew"]);
    assert_eq!(report.reference.values, vec![1.0, 1.0]);
    assert_eq!(report.rows[0].score_percent(), "100.00%");
    assert_eq!(report.rows[0].components.euclidean, Some(1.0));

    let half = report.rows[1].components.euclidean.unwrap();
    let skew = report.rows[2].components.euclidean.unwrap();
    let d_skew = (0.8_f64 * 0.8 + 0.2 * 0.2).sqrt();
    let d_half = (0.5_f64 * 0.5 * 2.0).sqrt();
    assert!((half - (1.0 - d_half / d_skew)).abs() < 1e-12);
    assert_eq!(skew, 0.0);
}

#[test]
fn reference_is_never_ranked() {
    let config = RankingConfig::new(DEFAULT_METRICS);
    let population = synthetic_population(11, 40, &DEFAULT_METRICS);
    let report = rank_populations(&[population], &config).unwrap();
    assert_eq!(report.candidates, 40);
    assert_eq!(report.rows.len(), 30);
    assert!(report.rows.iter().all(|r| r.name != REFERENCE_LABEL));
    assert_eq!(report.reference.label, REFERENCE_LABEL);
}

#[test]
fn reference_is_column_maximum() {
    let working = build_working_table(&scenario()).unwrap();
    assert_eq!(working.reference_values(), [1.0, 1.0]);
    assert_eq!(working.candidates().count(), 3);
}

#[test]
fn composite_stays_in_unit_interval() {
    let config = RankingConfig::new(DEFAULT_METRICS)
        .with_weight("Goals", 10)
        .unwrap()
        .with_weight("Assists", 0)
        .unwrap()
        .with_top_k(500);
    let regions = synthetic_regions(3, &["A", "B", "C"], 50, &DEFAULT_METRICS);
    let report = rank_populations(&regions, &config).unwrap();
    assert_eq!(report.rows.len(), 150);
    for row in &report.rows {
        assert!((0.0..=1.0).contains(&row.score), "{} = {}", row.name, row.score);
    }
    assert!(report.rows.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn repeated_runs_are_identical() {
    let config = RankingConfig::new(DEFAULT_METRICS)
        .with_group(FeatureGroup::new("Attack", ["Goals", "Expected goals"]))
        .with_top_k(25);
    let regions = synthetic_regions(9, &["A", "B"], 40, &DEFAULT_METRICS);
    let first = rank_populations(&regions, &config).unwrap();
    let second = rank_populations(&regions, &config).unwrap();
    let a = serde_json::to_string(&first.rows).unwrap();
    let b = serde_json::to_string(&second.rows).unwrap();
    assert_eq!(a, b);
}

#[test]
fn constant_feature_ties_preserve_row_order() {
    let raw = table(&["g"], &[("x", &[3.0]), ("y", &[3.0]), ("z", &[3.0])]);
    let report = rank_populations(&[raw], &RankingConfig::new(["g"])).unwrap();
    assert_eq!(report.reference.values, vec![NORMALIZED_FLOOR]);
    assert_eq!(ranked_names(&report), vec!["x", "y", "z"]);
    for row in &report.rows {
        assert_eq!(row.components.bray_curtis, Some(1.0));
    }
}

#[test]
fn zero_feature_is_skipped_by_kulczynski() {
    let t = table(&["a", "z"], &[("p", &[0.5, 0.0]), ("q", &[1.0, 0.0])]);
    let working = build_working_table(&t).unwrap();
    let scores = similarity::kulczynski(&working, &WeightMap::new()).unwrap();
    let p = scores.get("p").unwrap();
    assert!((p - (1.0 - 0.5 / 1.5)).abs() < 1e-12);
    assert_eq!(scores.get("q"), Some(1.0));
}

#[test]
fn all_zero_rows_leave_kulczynski_undefined() {
    let t = table(&["a", "b"], &[("p", &[0.0, 0.0]), ("q", &[0.0, 0.0])]);
    let report = rank_normalized(&t, &RankingConfig::new(["a", "b"])).unwrap();

    let note = report
        .undefined
        .iter()
        .find(|n| n.method == SimilarityMethod::Kulczynski)
        .expect("kulczynski should be reported");
    assert_eq!(note.players, vec!["p".to_string(), "q".to_string()]);

    let row = &report.rows[0];
    assert_eq!(row.components.kulczynski, None);
    assert_eq!(row.components.bray_curtis, Some(0.0));
    assert_eq!(row.components.cosine, Some(0.0));
    assert!((row.score - 0.3).abs() < 1e-12);
}

#[test]
fn heavier_weight_on_weakest_feature_never_helps() {
    let t = table(
        &["f1", "f2"],
        &[("p1", &[0.2, 0.9]), ("p2", &[0.6, 0.6]), ("p3", &[0.0, 0.0])],
    );
    let working = build_working_table(&t).unwrap();
    let light = WeightMap::new();
    let mut heavy = WeightMap::new();
    heavy.set("f1", 3).unwrap();

    for method in [
        SimilarityMethod::Euclidean,
        SimilarityMethod::Manhattan,
        SimilarityMethod::Canberra,
    ] {
        let before = method.compute(&working, &light).unwrap().get("p1").unwrap();
        let after = method.compute(&working, &heavy).unwrap().get("p1").unwrap();
        assert!(after <= before + 1e-12, "{method}: {after} > {before}");
    }
}

#[test]
fn duplicate_name_is_scored_from_its_best_row() {
    let t = table(
        &["a", "b"],
        &[("dup", &[0.2, 0.2]), ("other", &[0.6, 0.6]), ("dup", &[1.0, 1.0])],
    );
    let report = rank_normalized(&t, &RankingConfig::new(["a", "b"])).unwrap();

    assert_eq!(ranked_names(&report), vec!["dup", "other"]);
    let dup = &report.rows[0];
    assert_eq!(dup.components.bray_curtis, Some(1.0));
    assert_eq!(dup.components.euclidean, Some(1.0));
    assert_eq!(dup.components.manhattan, Some(1.0));
    assert!(dup.score > 0.99);
    assert!(report.rows[1].score < dup.score);
}

#[test]
fn regions_are_normalized_independently() {
    let north = table(&["g", "a"], &[("n1", &[10.0, 10.0]), ("n2", &[5.0, 5.0])]);
    let south = table(&["g", "a"], &[("s1", &[100.0, 100.0]), ("s2", &[50.0, 50.0])]);
    let report = rank_populations(&[north, south], &RankingConfig::new(["g", "a"])).unwrap();
    assert_eq!(ranked_names(&report), vec!["n1", "s1", "n2", "s2"]);
    assert_eq!(report.rows[0].score, report.rows[1].score);
}

#[test]
fn grouping_compares_group_columns() {
    let config = RankingConfig::new(DEFAULT_METRICS)
        .with_group(FeatureGroup::new("Attack", ["Goals", "Expected goals", "Assists"]))
        .with_group(FeatureGroup::new("Defence", ["Tackles won", "Interceptions"]))
        .with_group(FeatureGroup::new("Unused", Vec::<String>::new()));
    let population = synthetic_population(5, 30, &DEFAULT_METRICS);
    let report = rank_populations(&[population], &config).unwrap();
    assert_eq!(
        report.features,
        vec![
            "Key passes",
            "Successful dribbles",
            "Aerial duels won",
            "Attack",
            "Defence"
        ]
    );
    assert_eq!(report.reference.values.len(), 5);
}

#[test]
fn group_wider_than_population_is_insufficient() {
    let t = table(&["a", "b", "c"], &[("p", &[1.0, 2.0, 3.0]), ("q", &[2.0, 1.0, 0.0])]);
    let config = RankingConfig::new(["a", "b", "c"]).with_group(FeatureGroup::new("G", ["a", "b", "c"]));
    let err = rank_populations(&[t], &config).unwrap_err();
    assert_eq!(err.kind(), "InsufficientData");
}

#[test]
fn invalid_inputs_surface_typed_errors() {
    let t = scenario();
    assert_eq!(
        rank_normalized(&t, &RankingConfig::new(Vec::<String>::new())).unwrap_err(),
        RankingError::NoFeaturesSelected
    );
    assert_eq!(
        rank_populations(&[t.clone()], &RankingConfig::new(["a", "missing"])).unwrap_err(),
        RankingError::UnknownFeature("missing".to_string())
    );
    let empty = PlayerTable::new(["a"]);
    assert!(matches!(
        rank_populations(&[empty], &RankingConfig::new(["a"])),
        Err(RankingError::InsufficientData { .. })
    ));
    let err = rank_normalized(&t, &RankingConfig::new(["a"]).with_top_k(0)).unwrap_err();
    assert_eq!(err.kind(), "InvalidConfig");
}
