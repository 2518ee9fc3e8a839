//! Property tests for score arithmetic, the row editor and the renderer.

use proptest::prelude::*;

use lti_grader::components::TestListEditor;
use lti_grader::grading::{ScoreReport, TestResult, TestStatus};
use lti_grader::page::render::{render_result, result_id};

proptest! {
    #[test]
    fn score_is_floor_of_ratio(total in 1usize..500, successes_frac in 0.0f64..=1.0) {
        let successes = ((total as f64) * successes_frac).floor() as usize;
        let report = ScoreReport::from_counts(successes, total).unwrap();
        prop_assert_eq!(report.percentage as usize, successes * 100 / total);
        prop_assert!(report.percentage <= 100);
        if successes == total {
            prop_assert_eq!(report.percentage, 100);
        }
    }

    #[test]
    fn score_counts_successes(statuses in prop::collection::vec(any::<bool>(), 1..50)) {
        let results: Vec<TestResult> = statuses
            .iter()
            .map(|ok| if *ok { TestResult::success() } else { TestResult::failed("e") })
            .collect();
        let successes = statuses.iter().filter(|ok| **ok).count();
        let report = ScoreReport::from_results(&results).unwrap();
        prop_assert_eq!(report.percentage as usize, successes * 100 / statuses.len());
    }

    #[test]
    fn editor_add_keeps_single_control_in_last_row(start in 0u32..1000, adds in 0usize..40) {
        let mut editor = TestListEditor::starting_at(start);
        for _ in 0..adds {
            editor.add().unwrap();
        }
        prop_assert_eq!(editor.len(), adds + 1);

        let indices: Vec<u32> = editor.rows().iter().map(|r| r.index).collect();
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(*indices.last().unwrap(), editor.add_control_row());

        let tree = editor.render();
        prop_assert_eq!(tree.count(&|e| e.id.as_deref() == Some("add-btn")), 1);
        let last = tree.child_elements().last().unwrap();
        prop_assert!(last.find_by_id("add-btn").is_some());
    }

    #[test]
    fn editor_removals_never_reuse_suffixes(adds in 1usize..20, remove_mask in prop::collection::vec(any::<bool>(), 20)) {
        let mut editor = TestListEditor::new();
        for _ in 0..adds {
            editor.add().unwrap();
        }
        let removable: Vec<u32> = editor
            .rows()
            .iter()
            .map(|r| r.index)
            .filter(|i| *i != editor.add_control_row())
            .collect();
        for (idx, remove) in removable.iter().zip(&remove_mask) {
            if *remove {
                editor.remove(*idx).unwrap();
            }
        }
        let before_max = editor.add_control_row();
        let next = editor.add().unwrap();
        prop_assert!(next > before_max);
        let mut seen = std::collections::HashSet::new();
        prop_assert!(editor.rows().iter().all(|r| seen.insert(r.index)));
    }

    #[test]
    fn renderer_never_panics_and_names_one_node(
        name in "[a-z][a-z0-9_-]{0,12}",
        status in ".{0,12}",
        error in proptest::option::of(".{0,64}"),
    ) {
        let result = TestResult { status: TestStatus::from(status), error };
        let el = render_result(&name, &result);
        let id = result_id(&name);
        prop_assert_eq!(el.count(&|e| e.id.as_deref() == Some(id.as_str())), 1);
        prop_assert!(el.has_class("alert"));
    }
}
