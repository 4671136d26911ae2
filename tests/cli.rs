use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("yolo-curate").unwrap();
    cmd.env_remove("CURATE_SEED").env_remove("CURATE_CLASSES");
    cmd
}

/// Three raw images: `a` and `b` have detections, `c` has none.
fn raw_fixture(root: &Path) {
    for stem in ["a", "b", "c"] {
        common::write_image(&root.join(format!("raw/{stem}.png")), 64, 48);
    }
    let detections = root.join("detections");
    common::write_detections(
        &detections,
        "a",
        r#"[{"bbox": [8, 8, 40, 40], "class_name": "cat", "confidence": 0.9}]"#,
    );
    common::write_detections(
        &detections,
        "b",
        r#"[{"bbox": [10, 4, 30, 20], "class_name": "dog", "confidence": 0.6},
            {"bbox": [0, 0, 10, 10], "class_name": "bird", "confidence": 0.95}]"#,
    );
    common::write_classes(&root.join("classes.yaml"), &["cat", "dog"]);
}

/// A labeled dataset root with two train images and one val image.
fn labeled_fixture(root: &Path) {
    common::write_image(&root.join("train/images/cat1.jpg"), 64, 48);
    common::write_label(
        &root.join("train/labels/cat1.txt"),
        "0 0.5 0.5 0.2 0.3\n0 0.2 0.5 0.1 0.1\n",
    );
    common::write_image(&root.join("train/images/dog1.png"), 64, 48);
    common::write_label(&root.join("train/labels/dog1.txt"), "1 0.4 0.6 0.3 0.3\n");
    common::write_image(&root.join("val/images/val1.png"), 32, 32);
    common::write_label(&root.join("val/labels/val1.txt"), "1 0.5 0.5 0.5 0.5\n");
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn runs() {
    cmd().assert().success();
}

#[test]
fn outputs_tool_name() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout("yolo-curate 0.1.0\n");
}

// Label subcommand tests

#[test]
fn label_writes_annotations_and_partitions() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());
    let out = temp.path().join("labeled");

    cmd()
        .current_dir(temp.path())
        .args([
            "label",
            "--input",
            "raw",
            "--output",
            "labeled",
            "--classes",
            "classes.yaml",
            "--detections",
            "detections",
            "--seed",
            "3",
            "--train-ratio",
            "1",
            "--val-ratio",
            "0",
            "--test-ratio",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("written: 2 (2 object(s))"))
        .stdout(predicate::str::contains("removed (no usable detections): 1"))
        .stdout(predicate::str::contains("Split: 2 image(s) (seed 3)"));

    assert_eq!(common::file_names(&out.join("labels")), vec!["a.txt", "b.txt"]);
    assert_eq!(
        common::file_names(&out.join("train/images")),
        vec!["a.png", "b.png"]
    );
    assert_eq!(
        common::file_names(&out.join("train/labels")),
        vec!["a.txt", "b.txt"]
    );
    assert_eq!(
        common::file_names(&temp.path().join("raw")),
        vec!["a.png", "b.png"]
    );
    assert_eq!(
        fs::read_to_string(out.join("labels/b.txt")).unwrap(),
        "1 0.312500 0.250000 0.312500 0.333333\n"
    );
}

#[test]
fn label_json_output_and_rerun() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());
    let args = [
        "label",
        "--input",
        "raw",
        "--output",
        "labeled",
        "--classes",
        "classes.yaml",
        "--detections",
        "detections",
        "--seed",
        "11",
        "--output-format",
        "json",
    ];

    let first = cmd()
        .current_dir(temp.path())
        .args(args)
        .output()
        .unwrap();
    assert!(first.status.success());
    let json = stdout_json(&first);
    assert_eq!(json["label"]["written"], 2);
    assert_eq!(json["label"]["dropped_unknown_class"], 1);
    assert_eq!(json["split"]["seed"], 11);

    let second = cmd()
        .current_dir(temp.path())
        .args(args)
        .output()
        .unwrap();
    assert!(second.status.success());
    let json = stdout_json(&second);
    assert_eq!(json["label"]["written"], 0);
    assert_eq!(json["label"]["skipped"], 2);
    assert_eq!(json["split"]["train"]["assigned"], 0);
}

#[test]
fn label_no_split_only_writes_labels() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());

    cmd()
        .current_dir(temp.path())
        .args([
            "label",
            "--input",
            "raw",
            "--output",
            "labeled",
            "--classes",
            "classes.yaml",
            "--detections",
            "detections",
            "--no-split",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Split:").not());

    assert!(!temp.path().join("labeled/train").exists());
}

#[test]
fn label_missing_class_schema_fails() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());

    cmd()
        .current_dir(temp.path())
        .args([
            "label",
            "--input",
            "raw",
            "--output",
            "labeled",
            "--classes",
            "missing.yaml",
            "--detections",
            "detections",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));

    // Nothing is touched when startup fails.
    assert_eq!(common::file_names(&temp.path().join("raw")).len(), 3);
    assert!(!temp.path().join("labeled").exists());
}

#[test]
fn label_requires_a_detector_source() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());

    cmd()
        .current_dir(temp.path())
        .args([
            "label",
            "--input",
            "raw",
            "--output",
            "labeled",
            "--classes",
            "classes.yaml",
        ])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn label_rejects_ratios_above_one() {
    let temp = tempfile::tempdir().unwrap();
    raw_fixture(temp.path());

    cmd()
        .current_dir(temp.path())
        .args([
            "label",
            "--input",
            "raw",
            "--output",
            "labeled",
            "--classes",
            "classes.yaml",
            "--detections",
            "detections",
            "--train-ratio",
            "0.8",
            "--val-ratio",
            "0.3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid split ratios"));
}

// Split subcommand tests

#[test]
fn split_only_assigns_new_images() {
    let temp = tempfile::tempdir().unwrap();
    for i in 0..5 {
        common::write_image(&temp.path().join(format!("images/img{i}.png")), 8, 8);
        common::write_label(
            &temp.path().join(format!("labels/img{i}.txt")),
            "0 0.5 0.5 0.5 0.5\n",
        );
    }
    // Images without an annotation file are not candidates.
    common::write_image(&temp.path().join("images/orphan.png"), 8, 8);

    let split = |seed: &str| {
        cmd()
            .current_dir(temp.path())
            .args([
                "split",
                "--images",
                "images",
                "--labels",
                "labels",
                "--output",
                "dataset",
                "--seed",
                seed,
                "--output-format",
                "json",
            ])
            .output()
            .unwrap()
    };

    let first = split("1");
    assert!(first.status.success());
    let json = stdout_json(&first);
    let total = |json: &serde_json::Value| {
        ["train", "val", "test"]
            .iter()
            .map(|p| json[p]["assigned"].as_u64().unwrap())
            .sum::<u64>()
    };
    assert_eq!(total(&json), 5);

    let second = split("2");
    assert!(second.status.success());
    assert_eq!(total(&stdout_json(&second)), 0);

    let placed: usize = ["train", "val", "test"]
        .iter()
        .map(|p| common::file_names(&temp.path().join(format!("dataset/{p}/images"))).len())
        .sum();
    assert_eq!(placed, 5);
}

// Augment subcommand tests

#[test]
fn augment_writes_processed_dataset_and_stats() {
    let temp = tempfile::tempdir().unwrap();
    labeled_fixture(&temp.path().join("labeled"));

    let output = cmd()
        .current_dir(temp.path())
        .args([
            "augment",
            "--input",
            "labeled",
            "--output",
            "processed",
            "--seed",
            "9",
            "--output-format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["augment"]["seed"], 9);
    assert_eq!(json["augment"]["copied"], 2);

    let processed = temp.path().join("processed");
    let stats: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(processed.join("stats.json")).unwrap()).unwrap();
    let augmented = json["augment"]["augmented"].as_u64().unwrap();
    assert_eq!(stats["train"]["total_images"].as_u64().unwrap(), 2 + augmented);
    assert_eq!(stats["val"]["total_images"], 1);
    assert!(stats.get("test").is_none());

    assert_eq!(
        common::file_names(&processed.join("val/labels")),
        vec!["val1.txt"]
    );
}

#[test]
fn augment_is_reproducible_and_skips_processed_images() {
    let temp = tempfile::tempdir().unwrap();
    labeled_fixture(&temp.path().join("labeled"));
    let config = temp.path().join("augment.yaml");
    fs::write(
        &config,
        "flip:\n  p: 1.0\nrotate:\n  p: 0.0\nbrightness_contrast:\n  p: 0.0\nhsv:\n  p: 0.0\n\
         noise:\n  p: 0.0\nmotion_blur:\n  p: 0.0\ndropout:\n  p: 0.0\n",
    )
    .unwrap();

    let run = || {
        cmd()
            .current_dir(temp.path())
            .args([
                "augment",
                "--input",
                "labeled",
                "--output",
                "processed",
                "--config",
                "augment.yaml",
                "--seed",
                "4",
                "--no-mirror",
            ])
            .assert()
            .success()
    };

    run().stdout(predicate::str::contains("augmented pairs written: 2"));
    assert_eq!(
        fs::read_to_string(temp.path().join("processed/train/labels/cat1_aug.txt")).unwrap(),
        "0 0.500000 0.500000 0.187500 0.291667\n0 0.796875 0.500000 0.093750 0.083333\n"
    );
    assert!(!temp.path().join("processed/val").exists());

    run().stdout(predicate::str::contains("skipped (already processed): 2"));
}

#[test]
fn augment_rejects_invalid_config() {
    let temp = tempfile::tempdir().unwrap();
    labeled_fixture(&temp.path().join("labeled"));
    fs::write(temp.path().join("bad.yaml"), "flip:\n  p: 2.0\n").unwrap();

    cmd()
        .current_dir(temp.path())
        .args([
            "augment",
            "--input",
            "labeled",
            "--output",
            "processed",
            "--config",
            "bad.yaml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid augmentation config"));

    assert!(!temp.path().join("processed").exists());
}

// Stats subcommand tests

#[test]
fn stats_json_output() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("processed");
    for (stem, label) in [
        ("img1", "0 0.5 0.5 0.1 0.1\n0 0.2 0.2 0.1 0.1\n"),
        ("img2", "0 0.5 0.5 0.1 0.1\n"),
        ("img3", "0 0.5 0.5 0.1 0.1\n0 0.3 0.3 0.1 0.1\n"),
    ] {
        common::write_image(&root.join(format!("train/images/{stem}.png")), 8, 8);
        common::write_label(&root.join(format!("train/labels/{stem}.txt")), label);
    }

    let output = cmd()
        .arg("stats")
        .arg(&root)
        .args(["--split", "train", "--output-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["train"]["total_images"], 3);
    assert_eq!(json["train"]["total_labels"], 3);
    assert_eq!(json["train"]["total_objects"], 5);
    assert_eq!(json["train"]["avg_objects_per_image"], 1.67);
    assert_eq!(json["train"]["objects_per_class"]["0"], 5);
}

#[test]
fn stats_text_output_names_classes_and_writes_file() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("processed");
    common::write_image(&root.join("val/images/a.png"), 8, 8);
    common::write_label(&root.join("val/labels/a.txt"), "1 0.5 0.5 0.1 0.1\n");
    common::write_classes(&temp.path().join("classes.yaml"), &["cat", "dog"]);

    cmd()
        .current_dir(temp.path())
        .args([
            "stats",
            "processed",
            "--classes",
            "classes.yaml",
            "--write",
            "report.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("val"))
        .stdout(predicate::str::contains("dog"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(written["val"]["total_objects"], 1);
}

// Overlay subcommand tests

#[test]
fn overlay_renders_images() {
    let temp = tempfile::tempdir().unwrap();
    common::write_image(&temp.path().join("images/a.png"), 40, 40);
    common::write_label(&temp.path().join("labels/a.txt"), "0 0.5 0.5 0.5 0.5\n");

    cmd()
        .current_dir(temp.path())
        .args([
            "overlay", "--images", "images", "--labels", "labels", "--output", "vis",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 image(s) written"));

    assert_eq!(common::file_names(&temp.path().join("vis")), vec!["a.png"]);
}
