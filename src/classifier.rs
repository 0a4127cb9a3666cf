//! Result classification
//!
//! Maps the outcome of a finished run, together with the outcome of the
//! last meaningful run before it, onto a [`NotificationCategory`].

use crate::errors::{NotifyError, NotifyResult};
use crate::model::{NotificationCategory, Run, RunResult};

/// Classify a completed run.
///
/// A missing `previous` result means there is no usable history and a
/// successful run is reported as back to normal. Only terminal results can
/// be classified; `Unknown` is rejected with [`NotifyError::InvalidState`].
pub fn classify(
    previous: Option<RunResult>,
    current: RunResult,
) -> NotifyResult<NotificationCategory> {
    let category = match current {
        RunResult::Aborted => NotificationCategory::Aborted,
        RunResult::Failure => NotificationCategory::Failure,
        RunResult::NotBuilt => NotificationCategory::NotBuilt,
        RunResult::Unstable => NotificationCategory::Unstable,
        RunResult::Success if previous == Some(RunResult::Success) => NotificationCategory::Success,
        RunResult::Success => NotificationCategory::BackToNormal,
        RunResult::Unknown => {
            return Err(NotifyError::InvalidState {
                result: current.to_string(),
            })
        }
    };
    Ok(category)
}

/// Classify a run that has finished, looking up its history first
pub fn classify_run(run: &dyn Run) -> NotifyResult<NotificationCategory> {
    let current = run.result().ok_or_else(|| NotifyError::InvalidState {
        result: "in progress".to_string(),
    })?;
    classify(find_previous_result(run), current)
}

/// Result of the closest earlier run that actually built something.
///
/// Aborted and not-built runs are skipped. Returns `None` when history runs
/// out or the walk reaches a run that is still building.
pub fn find_previous_result(run: &dyn Run) -> Option<RunResult> {
    let mut cursor = run.previous_run();
    while let Some(previous) = cursor {
        if previous.is_building() {
            return None;
        }
        match previous.result() {
            Some(RunResult::Aborted) | Some(RunResult::NotBuilt) => {
                cursor = previous.previous_run();
            }
            result => return result,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunSnapshot;

    fn finished(result: RunResult) -> RunSnapshot {
        RunSnapshot::new("demo", "#1").with_result(result)
    }

    #[test]
    fn test_success_transitions() {
        assert_eq!(
            classify(Some(RunResult::Success), RunResult::Success).unwrap(),
            NotificationCategory::Success
        );
        assert_eq!(
            classify(Some(RunResult::Failure), RunResult::Success).unwrap(),
            NotificationCategory::BackToNormal
        );
        assert_eq!(
            classify(Some(RunResult::Unstable), RunResult::Success).unwrap(),
            NotificationCategory::BackToNormal
        );
        assert_eq!(
            classify(None, RunResult::Success).unwrap(),
            NotificationCategory::BackToNormal
        );
    }

    #[test]
    fn test_failure_ignores_previous() {
        let previous = [
            None,
            Some(RunResult::Success),
            Some(RunResult::Failure),
            Some(RunResult::Unstable),
        ];
        for prev in previous {
            assert_eq!(
                classify(prev, RunResult::Failure).unwrap(),
                NotificationCategory::Failure
            );
        }
    }

    #[test]
    fn test_other_terminal_results() {
        assert_eq!(
            classify(None, RunResult::Aborted).unwrap(),
            NotificationCategory::Aborted
        );
        assert_eq!(
            classify(None, RunResult::NotBuilt).unwrap(),
            NotificationCategory::NotBuilt
        );
        assert_eq!(
            classify(Some(RunResult::Success), RunResult::Unstable).unwrap(),
            NotificationCategory::Unstable
        );
    }

    #[test]
    fn test_unknown_result_is_invalid_state() {
        let err = classify(None, RunResult::Unknown).unwrap_err();
        assert!(matches!(err, NotifyError::InvalidState { .. }));
    }

    #[test]
    fn test_in_progress_run_cannot_be_classified() {
        let run = RunSnapshot::new("demo", "#2");
        assert!(matches!(
            classify_run(&run),
            Err(NotifyError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_previous_result_skips_aborted_and_not_built() {
        let run = finished(RunResult::Success).with_previous(
            finished(RunResult::Aborted)
                .with_previous(finished(RunResult::NotBuilt).with_previous(finished(RunResult::Failure))),
        );
        assert_eq!(find_previous_result(&run), Some(RunResult::Failure));
        assert_eq!(
            classify_run(&run).unwrap(),
            NotificationCategory::BackToNormal
        );
    }

    #[test]
    fn test_previous_result_without_history() {
        let run = finished(RunResult::Success);
        assert_eq!(find_previous_result(&run), None);

        let run = finished(RunResult::Success).with_previous(finished(RunResult::Aborted));
        assert_eq!(find_previous_result(&run), None);
    }

    #[test]
    fn test_previous_run_still_building() {
        let building = RunSnapshot::new("demo", "#1").with_previous(finished(RunResult::Success));
        let run = finished(RunResult::Success).with_previous(building);
        assert_eq!(find_previous_result(&run), None);
    }

    #[test]
    fn test_repeated_success() {
        let run = finished(RunResult::Success).with_previous(finished(RunResult::Success));
        assert_eq!(classify_run(&run).unwrap(), NotificationCategory::Success);
    }
}
