use super::*;
use parking_lot::Mutex;

#[derive(Default)]
struct RecordingObserver {
    started: Mutex<Vec<Action>>,
    completed: Mutex<Vec<ActionResult>>,
}

impl ActionObserver for RecordingObserver {
    fn on_start(&self, action: &Action) {
        self.started.lock().push(action.clone());
    }
    fn on_complete(&self, _action: &Action, result: &ActionResult) {
        self.completed.lock().push(result.clone());
    }
}

fn file_action(path: &str, op: FileOperation, content: &str) -> Action {
    Action::File { file_path: path.to_string(), operation: op, content: content.to_string() }
}

#[tokio::test]
async fn create_then_update_then_delete_runs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let actions = vec![
        file_action("out.txt", FileOperation::Create, "one"),
        file_action("out.txt", FileOperation::Update, "two"),
    ];
    let observer = RecordingObserver::default();
    let results = run_actions(dir.path(), &actions, None, &observer).await;
    assert!(results.iter().all(|r| r.success));
    assert_eq!(tokio::fs::read_to_string(dir.path().join("out.txt")).await.unwrap(), "two");

    let delete = vec![Action::File {
        file_path: "out.txt".to_string(),
        operation: FileOperation::Delete,
        content: String::new(),
    }];
    let results = run_actions(dir.path(), &delete, None, &observer).await;
    assert!(results[0].success);
    assert!(!dir.path().join("out.txt").exists());
}

#[tokio::test]
async fn a_failing_action_does_not_stop_the_remaining_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let actions = vec![
        Action::File { file_path: "nope".to_string(), operation: FileOperation::Delete, content: String::new() },
        file_action("ok.txt", FileOperation::Create, "fine"),
    ];
    let observer = RecordingObserver::default();
    let results = run_actions(dir.path(), &actions, None, &observer).await;
    assert!(!results[0].success);
    assert!(results[1].success);
    assert!(dir.path().join("ok.txt").exists());
}

#[tokio::test]
async fn shell_action_without_a_command_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let actions = vec![Action::Shell { command: None, content: String::new() }];
    let observer = RecordingObserver::default();
    let results = run_actions(dir.path(), &actions, None, &observer).await;
    assert!(!results[0].success);
    assert!(results[0].error.is_some());
}

#[tokio::test]
async fn shell_action_runs_and_reports_output() {
    let dir = tempfile::tempdir().unwrap();
    let actions = vec![Action::Shell { command: Some("echo hi".to_string()), content: String::new() }];
    let observer = RecordingObserver::default();
    let results = run_actions(dir.path(), &actions, None, &observer).await;
    assert!(results[0].success);
    assert_eq!(results[0].output.as_deref(), Some("hi\n"));
}

#[tokio::test]
async fn observer_sees_start_and_complete_for_every_action() {
    let dir = tempfile::tempdir().unwrap();
    let actions = vec![file_action("a.txt", FileOperation::Create, "a"), file_action("b.txt", FileOperation::Create, "b")];
    let observer = RecordingObserver::default();
    run_actions(dir.path(), &actions, None, &observer).await;
    assert_eq!(observer.started.lock().len(), 2);
    assert_eq!(observer.completed.lock().len(), 2);
}
